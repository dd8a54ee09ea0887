use crate::config::profiles::SourcingProfiles;
use crate::core::embedding::{EmbeddingProvider, EmbeddingSettings, HttpEmbedder, LexicalEmbedder};
use crate::core::generator::{GeneratorProvider, GeneratorSettings, HttpGenerator};
use crate::core::origin::{ClassifierSettings, OriginAnalyzer};
use crate::core::sales::{SalesAnalyzer, SalesSettings};
use crate::core::sourcing::{SourcingAdvisor, SourcingSettings};
use crate::domain::model::{OriginReport, Product, ProductAnalysis};
use crate::domain::ports::{TextEmbedder, TextGenerator};
use crate::utils::error::Result;
use crate::utils::validation::{validate_endpoint, validate_range, validate_thresholds, Validate};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Everything needed to build a [`ProductAnalyzer`]. Shared by the CLI flags
/// and the TOML config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalyzerSettings {
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub sales: SalesSettings,
    #[serde(default)]
    pub sourcing: SourcingSettings,
}

impl Validate for AnalyzerSettings {
    fn validate(&self) -> Result<()> {
        validate_thresholds(
            self.classifier.yes_threshold,
            self.classifier.unclear_threshold,
        )?;
        validate_range(
            "classifier.similarity_weight",
            self.classifier.similarity_weight,
            0.0..=1.0,
        )?;
        if self.embedding.provider == EmbeddingProvider::Http {
            validate_endpoint("embedding.endpoint", &self.embedding.endpoint)?;
        }
        if self.generator.provider == GeneratorProvider::Http {
            validate_endpoint("generator.endpoint", &self.generator.endpoint)?;
        }
        validate_range(
            "sourcing.china_tariff_rate",
            self.sourcing.china_tariff_rate,
            0.0..=5.0,
        )?;
        Ok(())
    }
}

/// Runs origin, sales and sourcing analysis for one product.
pub struct ProductAnalyzer {
    origin: OriginAnalyzer,
    sales: SalesAnalyzer,
    sourcing: SourcingAdvisor,
}

impl ProductAnalyzer {
    pub fn new(origin: OriginAnalyzer, sales: SalesAnalyzer, sourcing: SourcingAdvisor) -> Self {
        Self {
            origin,
            sales,
            sourcing,
        }
    }

    pub fn from_settings(settings: &AnalyzerSettings) -> Result<Self> {
        let embedder: Arc<dyn TextEmbedder> = match settings.embedding.provider {
            EmbeddingProvider::Lexical => {
                Arc::new(LexicalEmbedder::new(settings.embedding.dimensions))
            }
            EmbeddingProvider::Http => Arc::new(HttpEmbedder::new(&settings.embedding)?),
        };
        let generator: Option<Arc<dyn TextGenerator>> = match settings.generator.provider {
            GeneratorProvider::None => None,
            GeneratorProvider::Http => Some(Arc::new(HttpGenerator::new(&settings.generator)?)),
        };
        tracing::info!(
            "🧠 Analyzer ready (embedding: {}, generator: {})",
            embedder.name(),
            generator.as_ref().map(|g| g.name()).unwrap_or("profiles only")
        );

        let profiles =
            SourcingProfiles::load(settings.sourcing.profiles_path.as_deref().map(Path::new))?;

        Ok(Self::new(
            OriginAnalyzer::new(embedder, settings.classifier.clone()),
            SalesAnalyzer::new(settings.sales.clone())?,
            SourcingAdvisor::new(
                profiles,
                generator,
                settings.generator.max_new_tokens,
                &settings.sourcing,
            ),
        ))
    }

    /// Origin classification only.
    pub async fn classify(&self, product: &Product) -> Result<OriginReport> {
        self.origin.analyze(&product.title, &product.description).await
    }

    pub async fn analyze(&self, product: &Product) -> Result<ProductAnalysis> {
        let now = Utc::now();
        let origin = self.classify(product).await?;
        let sales = self.sales.estimate_metrics(product, now).await;
        let sourcing = self.sourcing.suggest(product, &origin).await;

        Ok(ProductAnalysis {
            product: product.clone(),
            tariff_vulnerability: origin.tariff_vulnerability(),
            origin,
            sales,
            sourcing,
            analyzed_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generator::GeneratorProvider;
    use crate::domain::model::{OriginVerdict, TariffVulnerability};

    fn offline_settings() -> AnalyzerSettings {
        let mut settings = AnalyzerSettings::default();
        settings.sales.seed = Some(11);
        settings.sales.scrape = false;
        settings
    }

    #[test]
    fn test_default_settings_validate() {
        assert!(offline_settings().validate().is_ok());
    }

    #[test]
    fn test_http_generator_requires_endpoint() {
        let mut settings = offline_settings();
        settings.generator.provider = GeneratorProvider::Http;
        assert!(settings.validate().is_err());

        settings.generator.endpoint = Some("http://localhost:8080/generate".to_string());
        assert!(settings.validate().is_ok());
    }

    #[tokio::test]
    async fn test_full_analysis_offline() {
        let analyzer = ProductAnalyzer::from_settings(&offline_settings()).unwrap();
        let product = Product::new(
            "USB Charger",
            "Fast charger manufactured in China, shipped from Shenzhen",
            19.99,
        );

        let analysis = analyzer.analyze(&product).await.unwrap();
        assert_eq!(analysis.origin.made_in_china, OriginVerdict::Yes);
        assert_eq!(analysis.tariff_vulnerability, TariffVulnerability::High);
        assert_eq!(analysis.sales.current_price, 19.99);
        assert_eq!(analysis.sales.price_history.len(), 7);
        assert_eq!(analysis.sourcing.alternatives[0], "Vietnam");
        assert!(!analysis.sourcing.country_comparisons.is_empty());
    }
}
