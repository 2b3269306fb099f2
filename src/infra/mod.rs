//! File input and report output around the domain engine.

pub mod csv_source;
pub mod report;

pub use csv_source::{load_price_file, load_recipe_file, LoadError, PriceRows, RecipeRows, Rows};
pub use report::{write_report, OutputFormat, ReportError};
