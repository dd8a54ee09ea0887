pub mod batch;
pub mod csv_pipeline;
pub mod ideas_pipeline;
pub mod output;
