pub mod pipelines;

pub use pipelines::csv_pipeline::CsvPipeline;
pub use pipelines::ideas_pipeline::IdeasPipeline;
