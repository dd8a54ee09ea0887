use crate::core::analyzer::ProductAnalyzer;
use crate::core::report::summarize;
use crate::domain::model::{AnalysisBatch, ClassifiedRow, Product, ProductAnalysis};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Analyze products chunk by chunk, at most `concurrency` at a time.
///
/// Results keep input order. A product whose analysis fails is logged and
/// counted, and the run continues.
pub async fn analyze_in_chunks(
    analyzer: &Arc<ProductAnalyzer>,
    products: Vec<Product>,
    chunk_size: usize,
    concurrency: usize,
) -> (Vec<ProductAnalysis>, usize) {
    let total = products.len();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut analyses = Vec::with_capacity(total);
    let mut failed = 0;
    let mut processed = 0;

    for chunk in products.chunks(chunk_size.max(1)) {
        let mut tasks = JoinSet::new();
        for (offset, product) in chunk.iter().cloned().enumerate() {
            let analyzer = Arc::clone(analyzer);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = analyzer.analyze(&product).await;
                (offset, product.title, result)
            });
        }

        let mut finished = Vec::with_capacity(chunk.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((offset, _, Ok(analysis))) => finished.push((offset, analysis)),
                Ok((_, title, Err(e))) => {
                    tracing::warn!("⚠️ Skipping '{}': {}", title, e);
                    failed += 1;
                }
                Err(e) => {
                    tracing::error!("Analysis task panicked or was cancelled: {}", e);
                    failed += 1;
                }
            }
        }
        finished.sort_by_key(|(offset, _)| *offset);
        analyses.extend(finished.into_iter().map(|(_, analysis)| analysis));

        processed += chunk.len();
        tracing::info!("Analyzed product {} of {}", processed, total);
    }

    (analyses, failed)
}

pub fn build_batch(analyses: Vec<ProductAnalysis>, skipped_products: usize) -> AnalysisBatch {
    let rows: Vec<ClassifiedRow> = analyses.iter().map(ClassifiedRow::from).collect();
    let summary = summarize(&rows);
    AnalysisBatch {
        analyses,
        rows,
        summary,
        skipped_products,
    }
}
