pub mod csv_writer;
pub mod report_builder;

pub use csv_writer::*;
pub use report_builder::*;
