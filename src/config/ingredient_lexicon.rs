use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Built-in alias table: lowercase alias -> canonical ingredient name
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    // Acids
    ("vitamin c", "Ascorbic Acid"),
    ("ascorbic", "Ascorbic Acid"),
    ("hyaluronic", "Hyaluronic Acid"),
    ("salicylic", "Salicylic Acid"),
    ("glycolic", "Glycolic Acid"),
    ("lactic", "Lactic Acid"),
    ("mandelic", "Mandelic Acid"),
    ("azelaic", "Azelaic Acid"),
    ("kojic", "Kojic Acid"),
    ("ferulic", "Ferulic Acid"),
    // Botanicals
    ("aloe", "Aloe Vera"),
    ("snail", "Snail Mucin"),
    ("witch hazel", "Witch Hazel"),
    ("green tea", "Green Tea"),
    ("chamomile", "Chamomile"),
    ("calendula", "Calendula"),
    ("rosehip", "Rosehip Oil"),
    ("jojoba", "Jojoba Oil"),
    ("argan", "Argan Oil"),
    ("coconut", "Coconut Oil"),
    ("shea", "Shea Butter"),
    ("cucumber", "Cucumber"),
    // Other actives
    ("niacinamide", "Niacinamide"),
    ("retinol", "Retinol"),
    ("retinoid", "Retinol"),
    ("vitamin e", "Tocopherol"),
    ("tocopherol", "Tocopherol"),
    ("ceramide", "Ceramides"),
    ("peptide", "Peptides"),
    ("collagen", "Collagen"),
    ("caffeine", "Caffeine"),
    ("zinc", "Zinc"),
    ("copper", "Copper"),
    ("squalane", "Squalane"),
];

#[derive(Debug, Deserialize)]
struct LexiconFile {
    aliases: BTreeMap<String, String>,
}

/// Immutable alias -> canonical ingredient mapping, loaded once per run.
///
/// Alias keys are stored trimmed and lowercased so matching against
/// lowercased product text is case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLexicon {
    aliases: BTreeMap<String, String>,
}

impl IngredientLexicon {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let aliases = pairs
            .into_iter()
            .filter_map(|(alias, canonical)| {
                let alias = alias.as_ref().trim().to_lowercase();
                let canonical = canonical.into().trim().to_string();
                if alias.is_empty() || canonical.is_empty() {
                    None
                } else {
                    Some((alias, canonical))
                }
            })
            .collect();

        IngredientLexicon { aliases }
    }

    /// Load an `[aliases]` table from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ingredient lexicon: {}", path))?;

        let file: LexiconFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse ingredient lexicon: {}", path))?;

        let lexicon = Self::new(file.aliases);
        if lexicon.is_empty() {
            return Err(anyhow!("Ingredient lexicon {} defines no aliases", path));
        }

        Ok(lexicon)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
    }

    #[cfg(test)]
    pub fn canonical_for(&self, alias: &str) -> Option<&str> {
        self.aliases
            .get(&alias.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn canonical_names(&self) -> BTreeSet<&str> {
        self.aliases.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for IngredientLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_ALIASES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexicon_maps_aliases() {
        let lexicon = IngredientLexicon::default();
        assert_eq!(lexicon.canonical_for("vitamin c"), Some("Ascorbic Acid"));
        assert_eq!(lexicon.canonical_for("Vitamin E"), Some("Tocopherol"));
        assert_eq!(lexicon.canonical_for("retinoid"), Some("Retinol"));
        assert_eq!(lexicon.canonical_for("unobtainium"), None);
        assert_eq!(lexicon.len(), DEFAULT_ALIASES.len());
    }

    #[test]
    fn test_keys_are_normalized() {
        let lexicon = IngredientLexicon::new([
            ("  Witch HAZEL ", "Witch Hazel"),
            ("", "Nothing"),
            ("blank", "  "),
        ]);
        assert_eq!(lexicon.len(), 1);
        assert_eq!(lexicon.iter().next(), Some(("witch hazel", "Witch Hazel")));
    }

    #[test]
    fn test_many_to_one_canonical_names() {
        let lexicon = IngredientLexicon::new([
            ("vitamin c", "Ascorbic Acid"),
            ("ascorbic", "Ascorbic Acid"),
            ("niacinamide", "Niacinamide"),
        ]);
        let names: Vec<&str> = lexicon.canonical_names().into_iter().collect();
        assert_eq!(names, vec!["Ascorbic Acid", "Niacinamide"]);
    }

    #[test]
    fn test_from_file_reads_alias_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingredients.toml");
        std::fs::write(
            &path,
            "[aliases]\n\"Vitamin C\" = \"Ascorbic Acid\"\nbakuchiol = \"Bakuchiol\"\n",
        )
        .unwrap();

        let lexicon = IngredientLexicon::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.canonical_for("vitamin c"), Some("Ascorbic Acid"));
    }

    #[test]
    fn test_from_file_missing_is_error() {
        assert!(IngredientLexicon::from_file("does/not/exist.toml").is_err());
    }
}
