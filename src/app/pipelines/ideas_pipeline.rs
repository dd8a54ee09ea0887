use crate::app::pipelines::batch::{analyze_in_chunks, build_batch};
use crate::app::pipelines::output::write_outputs;
use crate::core::analyzer::ProductAnalyzer;
use crate::core::report::parse_ideas;
use crate::core::{AnalysisBatch, ConfigProvider, Pipeline, Product, Storage};
use crate::utils::error::{HunterError, Result};
use std::sync::Arc;

/// Analyze typed product ideas ("title - description", one per line).
pub struct IdeasPipeline<S: Storage, C: ConfigProvider> {
    ideas: String,
    sink: S,
    config: C,
    analyzer: Arc<ProductAnalyzer>,
}

impl<S: Storage, C: ConfigProvider> IdeasPipeline<S, C> {
    pub fn new(ideas: String, sink: S, config: C, analyzer: Arc<ProductAnalyzer>) -> Self {
        Self {
            ideas,
            sink,
            config,
            analyzer,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for IdeasPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Product>> {
        let mut products = parse_ideas(&self.ideas);
        if let Some(max) = self.config.max_records() {
            products.truncate(max);
        }
        if products.is_empty() {
            return Err(HunterError::ValidationError {
                message: "no product ideas given".to_string(),
            });
        }
        Ok(products)
    }

    async fn transform(&self, products: Vec<Product>) -> Result<AnalysisBatch> {
        let (analyses, failed) = analyze_in_chunks(
            &self.analyzer,
            products,
            self.config.chunk_size(),
            self.config.concurrent_requests(),
        )
        .await;
        Ok(build_batch(analyses, failed))
    }

    async fn load(&self, batch: AnalysisBatch) -> Result<String> {
        write_outputs(&self.sink, &self.config, &batch).await
    }
}
