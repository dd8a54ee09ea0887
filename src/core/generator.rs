use crate::core::geo::{self, CHINA};
use crate::domain::model::Product;
use crate::domain::ports::TextGenerator;
use crate::utils::error::{HunterError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    /// No language model; sourcing falls back to industry profiles.
    #[default]
    None,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub provider: GeneratorProvider,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub max_new_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::None,
            endpoint: None,
            model: None,
            api_key: None,
            max_new_tokens: 100,
            timeout_seconds: 60,
        }
    }
}

pub fn sourcing_prompt(product: &Product) -> String {
    format!(
        "Product:\nTitle: {}\nDescription: {}\n\nSuggest 2 countries (not China) that could manufacture this item cost-effectively.\n\nAnswer:",
        product.title, product.description
    )
}

/// Text after the last "Answer:" marker, trimmed. Models that echo the
/// prompt still yield just the answer.
pub fn extract_answer(generated: &str) -> String {
    generated
        .rsplit("Answer:")
        .next()
        .unwrap_or(generated)
        .trim()
        .to_string()
}

/// Known non-China countries mentioned in `text`, in order of first mention.
pub fn parse_countries(text: &str) -> Vec<String> {
    let cleaned = crate::core::origin::clean_text(text);
    let mut countries = Vec::new();
    for mention in geo::find_countries(&cleaned) {
        // 城市不算，只接受直接點名的國家
        let named = geo::PLACES
            .iter()
            .find(|p| p.country == mention.country)
            .map(|p| p.aliases.iter().any(|a| geo::contains_word(&cleaned, a)))
            .unwrap_or(false);
        if named && mention.country != CHINA {
            countries.push(mention.country.to_string());
        }
    }
    countries
}

#[derive(Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

/// Client for a text-generation-inference style endpoint
/// (`{"inputs": ..., "parameters": {...}}` -> `[{"generated_text": ...}]`).
pub struct HttpGenerator {
    client: Client,
    endpoint: String,
    model: Option<String>,
    api_key: Option<String>,
}

impl HttpGenerator {
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .clone()
            .ok_or_else(|| HunterError::MissingConfigError {
                field: "generator.endpoint".to_string(),
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String> {
        tracing::debug!("Requesting generation from {}", self.endpoint);
        let mut request = self.client.post(&self.endpoint).json(&GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens,
                return_full_text: false,
            },
            model: self.model.as_deref(),
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HunterError::ModelError {
                provider: self.name().to_string(),
                message: format!("generation endpoint returned {}: {}", status, body),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = match parsed {
            GenerateResponse::Many(items) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| HunterError::ModelError {
                    provider: self.name().to_string(),
                    message: "empty generation response".to_string(),
                })?,
            GenerateResponse::One(g) => g.generated_text,
        };
        Ok(text)
    }

    fn name(&self) -> &str {
        "http-generator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let product = Product::new("Desk Lamp", "LED lamp with USB port", 24.5);
        let prompt = sourcing_prompt(&product);
        assert!(prompt.starts_with("Product:\nTitle: Desk Lamp\nDescription: LED lamp"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_extract_answer_takes_last_marker() {
        let echoed = "Product: ...\n\nAnswer: ignore\n\nAnswer:  Vietnam and India \n";
        assert_eq!(extract_answer(echoed), "Vietnam and India");
        assert_eq!(extract_answer(" Mexico "), "Mexico");
    }

    #[test]
    fn test_parse_countries_skips_china_and_cities() {
        let text = "1. Vietnam - lower labor costs. 2. India. Unlike China or Shenzhen, Mumbai ...";
        assert_eq!(parse_countries(text), vec!["Vietnam".to_string(), "India".to_string()]);
        assert!(parse_countries("Shenzhen, Hanoi").is_empty());
    }
}
