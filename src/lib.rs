pub mod app;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod domain;
pub mod utils;

pub use app::{CsvPipeline, IdeasPipeline};
pub use config::{cli::LocalStorage, toml_config::HunterConfig, CliConfig};
pub use core::{analyzer::ProductAnalyzer, etl::HunterEngine};
pub use utils::error::{HunterError, Result};
