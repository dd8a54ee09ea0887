use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Whether a listing looks like it was manufactured in China.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OriginVerdict {
    Yes,
    Unclear,
    No,
}

impl OriginVerdict {
    pub const ALL: [OriginVerdict; 3] = [OriginVerdict::Yes, OriginVerdict::Unclear, OriginVerdict::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            OriginVerdict::Yes => "Yes",
            OriginVerdict::Unclear => "Unclear",
            OriginVerdict::No => "No",
        }
    }

    pub fn vulnerability(&self) -> TariffVulnerability {
        match self {
            OriginVerdict::Yes => TariffVulnerability::High,
            OriginVerdict::Unclear => TariffVulnerability::Medium,
            OriginVerdict::No => TariffVulnerability::Low,
        }
    }
}

impl fmt::Display for OriginVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OriginVerdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(OriginVerdict::Yes),
            "unclear" => Ok(OriginVerdict::Unclear),
            "no" => Ok(OriginVerdict::No),
            other => Err(format!("unknown origin verdict '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TariffVulnerability {
    High,
    Medium,
    Low,
}

impl TariffVulnerability {
    pub const ALL: [TariffVulnerability; 3] = [
        TariffVulnerability::High,
        TariffVulnerability::Medium,
        TariffVulnerability::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TariffVulnerability::High => "High",
            TariffVulnerability::Medium => "Medium",
            TariffVulnerability::Low => "Low",
        }
    }
}

impl fmt::Display for TariffVulnerability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TariffVulnerability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(TariffVulnerability::High),
            "medium" => Ok(TariffVulnerability::Medium),
            "low" => Ok(TariffVulnerability::Low),
            other => Err(format!("unknown tariff vulnerability '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Apparel,
    Home,
    Toys,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Apparel => "apparel",
            Category::Home => "home",
            Category::Toys => "toys",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electronics" => Ok(Category::Electronics),
            "apparel" => Ok(Category::Apparel),
            "home" | "home goods" => Ok(Category::Home),
            "toys" => Ok(Category::Toys),
            "general" | "other" => Ok(Category::General),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Product {
    pub fn new(title: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            price,
            url: None,
            category: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionType {
    #[serde(rename = "OEM")]
    Oem,
    #[serde(rename = "ODM")]
    Odm,
    #[serde(rename = "Private Label")]
    PrivateLabel,
    Unknown,
}

impl fmt::Display for ProductionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProductionType::Oem => "OEM",
            ProductionType::Odm => "ODM",
            ProductionType::PrivateLabel => "Private Label",
            ProductionType::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierTier {
    #[serde(rename = "Tier 1 (Manufacturer)")]
    Manufacturer,
    #[serde(rename = "Tier 2 (Trading Company)")]
    TradingCompany,
    #[serde(rename = "Tier 3 (Distributor)")]
    Distributor,
    Unknown,
}

impl fmt::Display for SupplierTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SupplierTier::Manufacturer => "Tier 1 (Manufacturer)",
            SupplierTier::TradingCompany => "Tier 2 (Trading Company)",
            SupplierTier::Distributor => "Tier 3 (Distributor)",
            SupplierTier::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChinaDetails {
    pub likely_province: Option<String>,
    pub factory_mentioned: bool,
    pub supplier_mentioned: bool,
    pub origin_phrases: Option<String>,
    pub production_type: ProductionType,
    pub supplier_tier: SupplierTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherOrigin {
    pub likely_country: String,
    #[serde(default)]
    pub likely_cities: Vec<String>,
}

impl OtherOrigin {
    pub fn unknown() -> Self {
        Self {
            likely_country: "Unknown".to_string(),
            likely_cities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OriginDetails {
    China(ChinaDetails),
    Elsewhere(OtherOrigin),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginReport {
    pub made_in_china: OriginVerdict,
    /// Confidence in the verdict itself, in [0, 1].
    pub confidence: f64,
    pub similarity: f64,
    pub keyword_score: f64,
    pub details: OriginDetails,
}

impl OriginReport {
    pub fn tariff_vulnerability(&self) -> TariffVulnerability {
        self.made_in_china.vulnerability()
    }

    /// Human readable origin: the province for Chinese products, the
    /// detected country otherwise.
    pub fn likely_origin(&self) -> String {
        match &self.details {
            OriginDetails::China(details) => match &details.likely_province {
                Some(province) => format!("China ({})", title_case(province)),
                None => "China".to_string(),
            },
            OriginDetails::Elsewhere(other) => other.likely_country.clone(),
        }
    }

    pub fn production_type(&self) -> ProductionType {
        match &self.details {
            OriginDetails::China(details) => details.production_type,
            OriginDetails::Elsewhere(_) => ProductionType::Unknown,
        }
    }

    pub fn supplier_tier(&self) -> SupplierTier {
        match &self.details {
            OriginDetails::China(details) => details.supplier_tier,
            OriginDetails::Elsewhere(_) => SupplierTier::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    Scraped,
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// `YYYY-MM`
    pub date: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesMetrics {
    pub current_price: f64,
    pub best_seller_rank: u64,
    pub estimated_monthly_sales: u64,
    pub review_count: u64,
    pub average_rating: f64,
    pub price_history: Vec<PricePoint>,
    pub in_stock: bool,
    pub source: MetricsSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryComparison {
    pub country: String,
    pub estimated_cost: f64,
    pub lead_time: String,
    pub lead_time_days: u32,
    /// Labor cost relative to China (1.0 = same as China).
    pub labor_cost_index: f64,
    pub tariff_rate: f64,
    pub landed_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSavings {
    pub best_alternative: String,
    pub saving_per_unit: f64,
    pub potential_saving_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcingReport {
    pub category: Category,
    pub alternatives: Vec<String>,
    pub suggestion_text: String,
    pub ai_generated: bool,
    pub country_comparisons: Vec<CountryComparison>,
    pub cost_savings: Option<CostSavings>,
    pub key_considerations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub product: Product,
    pub origin: OriginReport,
    pub tariff_vulnerability: TariffVulnerability,
    pub sales: SalesMetrics,
    pub sourcing: SourcingReport,
    pub analyzed_at: DateTime<Utc>,
}

/// Flat CSV form of an analysis. The first six columns are the classic
/// `classified_products.csv` layout; the rest are optional on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub made_in_china: OriginVerdict,
    pub tariff_vulnerability: TariffVulnerability,
    pub alt_sourcing: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub likely_origin: Option<String>,
    #[serde(default)]
    pub production_type: Option<String>,
    #[serde(default)]
    pub supplier_tier: Option<String>,
    #[serde(default)]
    pub estimated_monthly_sales: Option<u64>,
    #[serde(default)]
    pub best_seller_rank: Option<u64>,
    #[serde(default)]
    pub analyzed_at: Option<String>,
}

impl From<&ProductAnalysis> for ClassifiedRow {
    fn from(analysis: &ProductAnalysis) -> Self {
        Self {
            title: analysis.product.title.clone(),
            price: analysis.product.price,
            description: analysis.product.description.clone(),
            made_in_china: analysis.origin.made_in_china,
            tariff_vulnerability: analysis.tariff_vulnerability,
            alt_sourcing: analysis.sourcing.suggestion_text.clone(),
            confidence: Some(round_to(analysis.origin.confidence, 4)),
            category: Some(analysis.sourcing.category),
            likely_origin: Some(analysis.origin.likely_origin()),
            production_type: Some(analysis.origin.production_type().to_string()),
            supplier_tier: Some(analysis.origin.supplier_tier().to_string()),
            estimated_monthly_sales: Some(analysis.sales.estimated_monthly_sales),
            best_seller_rank: Some(analysis.sales.best_seller_rank),
            analyzed_at: Some(analysis.analyzed_at.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_products: usize,
    pub china_sourced: usize,
    pub china_sourced_pct: f64,
    pub high_risk: usize,
    /// None when nothing is China-sourced.
    pub high_risk_pct_of_china: Option<f64>,
    pub origin_breakdown: BTreeMap<String, usize>,
    pub risk_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct AnalysisBatch {
    pub analyses: Vec<ProductAnalysis>,
    pub rows: Vec<ClassifiedRow>,
    pub summary: AnalysisSummary,
    pub skipped_products: usize,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_maps_to_vulnerability() {
        assert_eq!(OriginVerdict::Yes.vulnerability(), TariffVulnerability::High);
        assert_eq!(OriginVerdict::Unclear.vulnerability(), TariffVulnerability::Medium);
        assert_eq!(OriginVerdict::No.vulnerability(), TariffVulnerability::Low);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("yes".parse::<OriginVerdict>().unwrap(), OriginVerdict::Yes);
        assert_eq!(" Medium ".parse::<TariffVulnerability>().unwrap(), TariffVulnerability::Medium);
        assert_eq!("Home Goods".parse::<Category>().unwrap(), Category::Home);
        assert!("maybe".parse::<OriginVerdict>().is_err());
    }

    #[test]
    fn test_likely_origin_uses_province() {
        let report = OriginReport {
            made_in_china: OriginVerdict::Yes,
            confidence: 0.8,
            similarity: 0.9,
            keyword_score: 0.3,
            details: OriginDetails::China(ChinaDetails {
                likely_province: Some("guangdong".to_string()),
                factory_mentioned: true,
                supplier_mentioned: false,
                origin_phrases: None,
                production_type: ProductionType::Oem,
                supplier_tier: SupplierTier::Manufacturer,
            }),
        };
        assert_eq!(report.likely_origin(), "China (Guangdong)");
        assert_eq!(report.supplier_tier().to_string(), "Tier 1 (Manufacturer)");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(3.04, 1), 3.0);
    }
}
