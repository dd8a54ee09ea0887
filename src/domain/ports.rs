use crate::domain::model::{AnalysisBatch, Product};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "html" => Some(OutputFormat::Html),
            _ => None,
        }
    }

    pub fn default_filename(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "classified_products.csv",
            OutputFormat::Json => "classified_products.json",
            OutputFormat::Html => "dashboard.html",
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn chunk_size(&self) -> usize;
    fn concurrent_requests(&self) -> usize;
    fn max_records(&self) -> Option<usize>;
    fn compression_enabled(&self) -> bool;

    fn archive_filename(&self) -> String {
        "tariffhunter_analysis.zip".to_string()
    }

    fn output_filename(&self, format: OutputFormat) -> String {
        format.default_filename().to_string()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Product>>;
    async fn transform(&self, products: Vec<Product>) -> Result<AnalysisBatch>;
    async fn load(&self, batch: AnalysisBatch) -> Result<String>;
}

/// Turns text into dense vectors for similarity scoring.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn name(&self) -> &str;
}

/// Free-form text completion from a language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String>;

    fn name(&self) -> &str;
}
