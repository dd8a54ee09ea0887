use crate::config::profiles::{CountryProfile, IndustryProfile, SourcingProfiles};
use crate::core::generator::{extract_answer, parse_countries, sourcing_prompt};
use crate::core::geo::CHINA;
use crate::core::sales::guess_category;
use crate::domain::model::{
    round_to, Category, CostSavings, CountryComparison, OriginReport, OriginVerdict, Product,
    SourcingReport,
};
use crate::domain::ports::TextGenerator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Share of retail price assumed to be cost of goods.
pub const COGS_SHARE: f64 = 0.6;
pub const CHINA_LEAD_TIME: &str = "2-4 weeks";

// 產業設定檔未指定時，替代國家的預設關稅
const DEFAULT_ALTERNATIVE_TARIFF: f64 = 0.10;

const LAST_RESORT_ALTERNATIVES: &[&str] = &["Vietnam", "India"];
const MIN_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcingSettings {
    pub profiles_path: Option<String>,
    pub china_tariff_rate: f64,
}

impl Default for SourcingSettings {
    fn default() -> Self {
        Self {
            profiles_path: None,
            china_tariff_rate: 0.25,
        }
    }
}

/// Days for a lead time like "4-6 weeks": the lower bound in weeks times 7.
pub fn lead_time_days(lead_time: &str) -> u32 {
    lead_time
        .split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|n| n.parse::<u32>().ok())
        .map(|weeks| weeks * 7)
        .unwrap_or(0)
}

pub struct SourcingAdvisor {
    profiles: SourcingProfiles,
    generator: Option<Arc<dyn TextGenerator>>,
    max_new_tokens: u32,
    china_tariff_rate: f64,
}

impl SourcingAdvisor {
    pub fn new(
        profiles: SourcingProfiles,
        generator: Option<Arc<dyn TextGenerator>>,
        max_new_tokens: u32,
        settings: &SourcingSettings,
    ) -> Self {
        Self {
            profiles,
            generator,
            max_new_tokens,
            china_tariff_rate: settings.china_tariff_rate,
        }
    }

    pub async fn suggest(&self, product: &Product, origin: &OriginReport) -> SourcingReport {
        let category = product
            .category
            .unwrap_or_else(|| guess_category(&product.title, &product.description));
        let profile = self.profiles.for_category(category);
        let profile_alternatives: Vec<String> = profile
            .map(|p| p.common_alternatives.clone())
            .unwrap_or_default();

        let (mut alternatives, suggestion_text, ai_generated) =
            match self.ask_model(product).await {
                Some((countries, answer)) => (countries, answer, true),
                None => {
                    let text = profile_alternatives
                        .iter()
                        .filter(|c| c.as_str() != CHINA)
                        .take(MIN_ALTERNATIVES)
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ");
                    (Vec::new(), text, false)
                }
            };

        let fallbacks = profile_alternatives
            .iter()
            .map(String::as_str)
            .chain(LAST_RESORT_ALTERNATIVES.iter().copied());
        for candidate in fallbacks {
            if alternatives.len() >= MIN_ALTERNATIVES.max(profile_alternatives.len()) {
                break;
            }
            if candidate != CHINA && !alternatives.iter().any(|a| a == candidate) {
                alternatives.push(candidate.to_string());
            }
        }
        let suggestion_text = if suggestion_text.is_empty() {
            alternatives.iter().take(MIN_ALTERNATIVES).cloned().collect::<Vec<_>>().join(", ")
        } else {
            suggestion_text
        };

        let (country_comparisons, cost_savings) = if origin.made_in_china == OriginVerdict::No {
            (Vec::new(), None)
        } else {
            let comparisons = self.compare_countries(product.price, &alternatives, profile);
            let savings = best_savings(&comparisons);
            (comparisons, savings)
        };

        let mut key_considerations: Vec<String> =
            profile.map(|p| p.considerations.clone()).unwrap_or_default();
        if origin.made_in_china == OriginVerdict::Unclear {
            key_considerations.push(
                "Origin is unclear: confirm country of origin with the supplier before relying on these estimates"
                    .to_string(),
            );
        }

        SourcingReport {
            category,
            alternatives,
            suggestion_text,
            ai_generated,
            country_comparisons,
            cost_savings,
            key_considerations,
        }
    }

    /// Countries suggested by the language model, or None when there is no
    /// model or its answer names no usable country.
    async fn ask_model(&self, product: &Product) -> Option<(Vec<String>, String)> {
        let generator = self.generator.as_ref()?;
        let prompt = sourcing_prompt(product);

        match generator.generate(&prompt, self.max_new_tokens).await {
            Ok(generated) => {
                let answer = extract_answer(&generated);
                let countries = parse_countries(&answer);
                if countries.is_empty() {
                    tracing::warn!(
                        "Model answer for '{}' named no known country: {:?}",
                        product.title,
                        answer
                    );
                    None
                } else {
                    Some((countries, answer))
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Sourcing suggestion from {} failed for '{}': {}",
                    generator.name(),
                    product.title,
                    e
                );
                None
            }
        }
    }

    /// China baseline followed by each alternative. Countries missing from
    /// the country table take the category profile's labor index and lead
    /// time.
    pub fn compare_countries(
        &self,
        price: f64,
        alternatives: &[String],
        profile: Option<&IndustryProfile>,
    ) -> Vec<CountryComparison> {
        let china_cost = round_to(price * COGS_SHARE, 2);
        let mut comparisons = vec![CountryComparison {
            country: CHINA.to_string(),
            estimated_cost: china_cost,
            lead_time: CHINA_LEAD_TIME.to_string(),
            lead_time_days: lead_time_days(CHINA_LEAD_TIME),
            labor_cost_index: 1.0,
            tariff_rate: self.china_tariff_rate,
            landed_cost: round_to(china_cost * (1.0 + self.china_tariff_rate), 2),
        }];

        let profile = profile.or_else(|| self.profiles.for_category(Category::General));
        let unknown = CountryProfile {
            labor_cost_index: profile.map_or(1.0, |p| p.labor_cost_index),
            lead_time: profile.map_or_else(|| CHINA_LEAD_TIME.to_string(), |p| p.lead_time.clone()),
            tariff_rate: profile
                .and_then(|p| p.tariff_rate)
                .unwrap_or(DEFAULT_ALTERNATIVE_TARIFF),
        };
        for country in alternatives {
            let data = self.profiles.country(country).unwrap_or(&unknown);
            let estimated_cost = round_to(china_cost * data.labor_cost_index, 2);
            comparisons.push(CountryComparison {
                country: country.clone(),
                estimated_cost,
                lead_time: data.lead_time.clone(),
                lead_time_days: lead_time_days(&data.lead_time),
                labor_cost_index: data.labor_cost_index,
                tariff_rate: data.tariff_rate,
                landed_cost: round_to(estimated_cost * (1.0 + data.tariff_rate), 2),
            });
        }
        comparisons
    }
}

fn best_savings(comparisons: &[CountryComparison]) -> Option<CostSavings> {
    let china = comparisons.iter().find(|c| c.country == CHINA)?;
    let best = comparisons
        .iter()
        .filter(|c| c.country != CHINA)
        .min_by(|a, b| a.landed_cost.total_cmp(&b.landed_cost))?;

    let saving = china.landed_cost - best.landed_cost;
    if saving <= 0.0 || china.landed_cost <= 0.0 {
        return None;
    }
    Some(CostSavings {
        best_alternative: best.country.clone(),
        saving_per_unit: round_to(saving, 2),
        potential_saving_pct: round_to(saving / china.landed_cost * 100.0, 1),
    })
}
