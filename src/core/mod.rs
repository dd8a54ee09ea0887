pub mod analyzer;
pub mod embedding;
pub mod etl;
pub mod generator;
pub mod geo;
pub mod origin;
pub mod report;
pub mod sales;
pub mod sourcing;

pub use crate::domain::model::{AnalysisBatch, Product, ProductAnalysis};
pub use crate::domain::ports::{ConfigProvider, OutputFormat, Pipeline, Storage};
pub use crate::utils::error::Result;
