use crate::domain::ports::TextEmbedder;
use crate::utils::error::{HunterError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Words that carry no origin signal; dropped before hashing or windowing.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "the", "of", "in", "from", "for", "with", "to", "on", "by", "at", "is",
    "are", "this", "that", "our", "your", "it",
];

const DEFAULT_DIMENSIONS: usize = 4096;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Lexical,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Lexical,
            endpoint: None,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key: None,
            timeout_seconds: 30,
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

/// Lowercased alphanumeric tokens with stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

// FNV-1a，保證跨版本穩定的雜湊
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Offline embedder: hashed word unigrams, bigrams and character trigrams.
///
/// Deterministic and dependency free, so classification works without any
/// model endpoint. Texts sharing words or spelling fragments land close
/// together.
#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dimensions: usize,
}

impl LexicalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn add(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let index = (fnv1a(feature.as_bytes()) % self.dimensions as u64) as usize;
        vector[index] += weight;
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let tokens = tokenize(text);

        for token in &tokens {
            self.add(&mut vector, &format!("w:{}", token), 1.0);

            let padded: Vec<char> = format!("#{}#", token).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add(&mut vector, &format!("c:{}", gram), 0.5);
            }
        }
        for pair in tokens.windows(2) {
            self.add(&mut vector, &format!("b:{} {}", pair[0], pair[1]), 1.0);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl TextEmbedder for LexicalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn name(&self) -> &str {
        "lexical"
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .clone()
            .ok_or_else(|| HunterError::MissingConfigError {
                field: "embedding.endpoint".to_string(),
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
impl TextEmbedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Requesting {} embeddings from {}", texts.len(), self.endpoint);
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
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
                message: format!("embedding endpoint returned {}: {}", status, body),
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(HunterError::ModelError {
                provider: self.name().to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    parsed.data.len()
                ),
            });
        }
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        "http-embedding"
    }
}
