use crate::app::pipelines::batch::{analyze_in_chunks, build_batch};
use crate::app::pipelines::output::write_outputs;
use crate::core::analyzer::ProductAnalyzer;
use crate::core::report::parse_products_csv;
use crate::core::{AnalysisBatch, ConfigProvider, Pipeline, Product, Storage};
use crate::utils::error::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bulk classification of a product CSV.
pub struct CsvPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
    analyzer: Arc<ProductAnalyzer>,
    skipped_rows: AtomicUsize,
}

impl<S: Storage, C: ConfigProvider> CsvPipeline<S, C> {
    /// `source` resolves the input path, `sink` receives the outputs.
    pub fn new(source: S, sink: S, config: C, analyzer: Arc<ProductAnalyzer>) -> Self {
        Self {
            source,
            sink,
            config,
            analyzer,
            skipped_rows: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CsvPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Product>> {
        tracing::debug!("Reading products from {}", self.config.input_path());
        let data = self.source.read_file(self.config.input_path()).await?;
        let parsed = parse_products_csv(&data, self.config.max_records())?;

        if parsed.skipped > 0 {
            tracing::warn!("⚠️ Skipped {} invalid rows", parsed.skipped);
        }
        if parsed.products.is_empty() {
            tracing::warn!("No valid products found in {}", self.config.input_path());
        }
        self.skipped_rows.store(parsed.skipped, Ordering::Relaxed);
        Ok(parsed.products)
    }

    async fn transform(&self, products: Vec<Product>) -> Result<AnalysisBatch> {
        let (analyses, failed) = analyze_in_chunks(
            &self.analyzer,
            products,
            self.config.chunk_size(),
            self.config.concurrent_requests(),
        )
        .await;
        Ok(build_batch(
            analyses,
            self.skipped_rows.load(Ordering::Relaxed) + failed,
        ))
    }

    async fn load(&self, batch: AnalysisBatch) -> Result<String> {
        write_outputs(&self.sink, &self.config, &batch).await
    }
}
