use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct HunterEngine<P: Pipeline> {
    pipeline: P,
    monitor: ResourceMonitor,
}

impl<P: Pipeline> HunterEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting product analysis");
        self.monitor.log_phase("Start", 0);

        let products = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} products", products.len());
        self.monitor.log_phase("Extract", products.len());

        let batch = self.pipeline.transform(products).await?;
        tracing::info!(
            "🔍 Analyzed {} products ({} China-sourced, {} skipped)",
            batch.analyses.len(),
            batch.summary.china_sourced,
            batch.skipped_products
        );
        self.monitor.log_phase("Transform", batch.analyses.len());
        let analyzed = batch.analyses.len();

        let output_path = self.pipeline.load(batch).await?;
        tracing::info!("💾 Output saved to: {}", output_path);
        self.monitor.log_phase("Load", analyzed);
        self.monitor.log_final(analyzed);

        Ok(output_path)
    }
}
