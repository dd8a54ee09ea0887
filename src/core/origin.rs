use crate::core::embedding::{cosine_similarity, tokenize};
use crate::core::geo::{self, CHINA};
use crate::domain::model::{
    ChinaDetails, OriginDetails, OriginReport, OriginVerdict, OtherOrigin, ProductionType,
    SupplierTier,
};
use crate::domain::ports::TextEmbedder;
use crate::utils::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};

pub const CHINA_PHRASES: &[&str] = &[
    "made in china",
    "manufactured in china",
    "product of china",
    "shenzhen",
    "guangzhou",
    "yiwu",
    "chinese supplier",
    "factory in china",
    "produced in china",
];

const FACTORY_KEYWORDS: &[&str] = &["factory", "manufacturer", "facility", "works", "plant"];
const SUPPLIER_KEYWORDS: &[&str] = &["supplier", "vendor", "distributor", "wholesaler"];

// 每種視窗長度的上限
const MAX_WINDOWS_PER_SIZE: usize = 256;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"));

static ORIGIN_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:made in|manufactured in|produced in|factory in|origin|sourced from)\s+(\w+)(?:\s+(\w+))?",
    )
    .expect("valid origin phrase pattern")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub yes_threshold: f64,
    pub unclear_threshold: f64,
    /// Weight of embedding similarity against the exact keyword score.
    pub similarity_weight: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            yes_threshold: 0.65,
            unclear_threshold: 0.4,
            similarity_weight: 0.7,
        }
    }
}

/// Lowercase, trim and strip punctuation.
pub fn clean_text(text: &str) -> String {
    PUNCTUATION
        .replace_all(text.to_lowercase().trim(), "")
        .into_owned()
}

pub struct OriginAnalyzer {
    embedder: Arc<dyn TextEmbedder>,
    settings: ClassifierSettings,
}

impl OriginAnalyzer {
    pub fn new(embedder: Arc<dyn TextEmbedder>, settings: ClassifierSettings) -> Self {
        Self { embedder, settings }
    }

    pub async fn analyze(&self, title: &str, description: &str) -> Result<OriginReport> {
        let text = clean_text(&format!("{} {}", title, description));

        let (similarity, keyword_score) = self.china_scores(&text).await?;
        let weight = self.settings.similarity_weight;
        let combined = (weight * similarity + (1.0 - weight) * keyword_score).clamp(0.0, 1.0);

        let (made_in_china, confidence) = self.verdict(combined);
        tracing::debug!(
            "Origin scores: similarity={:.3} keywords={:.3} combined={:.3} -> {}",
            similarity,
            keyword_score,
            combined,
            made_in_china
        );

        let details = if made_in_china == OriginVerdict::Yes {
            OriginDetails::China(chinese_details(&text))
        } else {
            OriginDetails::Elsewhere(other_origin(&text))
        };

        Ok(OriginReport {
            made_in_china,
            confidence,
            similarity,
            keyword_score,
            details,
        })
    }

    /// Thresholds are strict: a score equal to a threshold falls to the
    /// lower verdict.
    pub fn verdict(&self, combined: f64) -> (OriginVerdict, f64) {
        if combined > self.settings.yes_threshold {
            (OriginVerdict::Yes, combined)
        } else if combined > self.settings.unclear_threshold {
            (OriginVerdict::Unclear, combined)
        } else {
            (OriginVerdict::No, 1.0 - combined)
        }
    }

    /// Max embedding similarity between the China phrases and the text, and
    /// the fraction of phrases that appear verbatim.
    ///
    /// Each phrase is also compared with the windows of the text that have
    /// the same number of tokens and share at least one token with some
    /// phrase, so a single "made in china" anywhere in a long description
    /// still scores as a near match.
    async fn china_scores(&self, text: &str) -> Result<(f64, f64)> {
        let keyword_hits = CHINA_PHRASES.iter().filter(|p| text.contains(*p)).count();
        let keyword_score = keyword_hits as f64 / CHINA_PHRASES.len() as f64;

        let phrase_tokens: Vec<Vec<String>> = CHINA_PHRASES.iter().map(|p| tokenize(p)).collect();
        let phrase_lengths: Vec<usize> = phrase_tokens.iter().map(Vec::len).collect();
        let vocabulary: HashSet<&str> = phrase_tokens.iter().flatten().map(String::as_str).collect();
        let window_sizes: BTreeSet<usize> = phrase_lengths.iter().copied().collect();

        let tokens = tokenize(text);
        let mut seen = HashSet::new();
        let mut windows: Vec<(String, usize)> = Vec::new();
        for size in window_sizes {
            let mut kept = 0;
            for window in tokens.windows(size) {
                if kept >= MAX_WINDOWS_PER_SIZE {
                    break;
                }
                if !window.iter().any(|t| vocabulary.contains(t.as_str())) {
                    continue;
                }
                let joined = window.join(" ");
                if seen.insert(joined.clone()) {
                    windows.push((joined, size));
                    kept += 1;
                }
            }
        }

        let mut inputs: Vec<String> = CHINA_PHRASES.iter().map(|p| p.to_string()).collect();
        inputs.push(text.to_string());
        inputs.extend(windows.iter().map(|(w, _)| w.clone()));

        let vectors = self.embedder.embed(&inputs).await?;
        let (phrase_vectors, rest) = vectors.split_at(CHINA_PHRASES.len());
        let Some((text_vector, window_vectors)) = rest.split_first() else {
            return Ok((0.0, keyword_score));
        };

        let mut best = 0.0f64;
        for (phrase_vector, phrase_len) in phrase_vectors.iter().zip(&phrase_lengths) {
            best = best.max(cosine_similarity(text_vector, phrase_vector));
            for ((_, size), window_vector) in windows.iter().zip(window_vectors) {
                if size == phrase_len {
                    best = best.max(cosine_similarity(window_vector, phrase_vector));
                }
            }
        }

        Ok((best.clamp(0.0, 1.0), keyword_score))
    }
}

fn chinese_details(text: &str) -> ChinaDetails {
    let likely_province = geo::CHINA_PROVINCES
        .iter()
        .filter_map(|p| geo::find_word(text, p).map(|pos| (pos, *p)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, p)| p.to_string());

    ChinaDetails {
        likely_province,
        factory_mentioned: FACTORY_KEYWORDS.iter().any(|kw| text.contains(kw)),
        supplier_mentioned: SUPPLIER_KEYWORDS.iter().any(|kw| text.contains(kw)),
        origin_phrases: origin_phrases(text),
        production_type: production_type(text),
        supplier_tier: supplier_tier(text),
    }
}

fn other_origin(text: &str) -> OtherOrigin {
    geo::find_countries(text)
        .into_iter()
        .find(|m| m.country != CHINA)
        .map(|m| OtherOrigin {
            likely_country: m.country.to_string(),
            likely_cities: m.cities,
        })
        .unwrap_or_else(OtherOrigin::unknown)
}

/// Places named after "made in", "sourced from" and similar phrases,
/// deduplicated and joined with "; ".
pub fn origin_phrases(text: &str) -> Option<String> {
    let mut found = BTreeSet::new();
    for caps in ORIGIN_PHRASE.captures_iter(text) {
        let first = &caps[1];
        // 兩個字的地名（sri lanka、south korea）才取第二個字
        let phrase = match caps.get(2) {
            Some(second) if geo::is_known_place(&format!("{} {}", first, second.as_str())) => {
                format!("{} {}", first, second.as_str())
            }
            _ => first.to_string(),
        };
        found.insert(phrase);
    }

    if found.is_empty() {
        None
    } else {
        Some(found.into_iter().collect::<Vec<_>>().join("; "))
    }
}

pub fn production_type(text: &str) -> ProductionType {
    if geo::contains_word(text, "oem") {
        ProductionType::Oem
    } else if geo::contains_word(text, "odm") {
        ProductionType::Odm
    } else if text.contains("private label") || text.contains("white label") {
        ProductionType::PrivateLabel
    } else {
        ProductionType::Unknown
    }
}

pub fn supplier_tier(text: &str) -> SupplierTier {
    if ["manufacturer", "factory"].iter().any(|kw| text.contains(kw)) {
        SupplierTier::Manufacturer
    } else if ["trading company", "export company"].iter().any(|kw| text.contains(kw)) {
        SupplierTier::TradingCompany
    } else if ["distributor", "wholesaler"].iter().any(|kw| text.contains(kw)) {
        SupplierTier::Distributor
    } else {
        SupplierTier::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedding::LexicalEmbedder;

    fn analyzer() -> OriginAnalyzer {
        OriginAnalyzer::new(
            Arc::new(LexicalEmbedder::default()),
            ClassifierSettings::default(),
        )
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Made in CHINA! (OEM)  "), "made in china oem");
    }

    #[test]
    fn test_verdict_thresholds_are_strict() {
        let analyzer = analyzer();
        assert_eq!(analyzer.verdict(0.66).0, OriginVerdict::Yes);
        assert_eq!(analyzer.verdict(0.65).0, OriginVerdict::Unclear);
        assert_eq!(analyzer.verdict(0.41).0, OriginVerdict::Unclear);
        assert_eq!(analyzer.verdict(0.4).0, OriginVerdict::No);

        let (verdict, confidence) = analyzer.verdict(0.1);
        assert_eq!(verdict, OriginVerdict::No);
        assert!((confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_made_in_china_listing() {
        let report = analyzer()
            .analyze(
                "Bluetooth Earbuds",
                "OEM earbuds made in China by our Shenzhen factory in Guangdong.",
            )
            .await
            .unwrap();

        assert_eq!(report.made_in_china, OriginVerdict::Yes);
        assert!(report.confidence > 0.65 && report.confidence <= 1.0);
        match report.details {
            OriginDetails::China(details) => {
                assert_eq!(details.likely_province.as_deref(), Some("guangdong"));
                assert!(details.factory_mentioned);
                assert_eq!(details.production_type, ProductionType::Oem);
                assert_eq!(details.supplier_tier, SupplierTier::Manufacturer);
                assert_eq!(details.origin_phrases.as_deref(), Some("china; guangdong"));
            }
            other => panic!("expected China details, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_vietnam_listing_is_not_china() {
        let report = analyzer()
            .analyze(
                "Bamboo Basket",
                "Handwoven basket, made in Vietnam by artisans in Hanoi.",
            )
            .await
            .unwrap();

        assert_eq!(report.made_in_china, OriginVerdict::No);
        assert_eq!(report.tariff_vulnerability().as_str(), "Low");
        match report.details {
            OriginDetails::Elsewhere(other) => {
                assert_eq!(other.likely_country, "Vietnam");
                assert_eq!(other.likely_cities, vec!["hanoi".to_string()]);
            }
            other => panic!("expected other origin, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_origin_signal_is_unknown() {
        let report = analyzer()
            .analyze("Ceramic Mug", "Dishwasher safe, 350ml.")
            .await
            .unwrap();
        assert_eq!(report.made_in_china, OriginVerdict::No);
        assert_eq!(report.likely_origin(), "Unknown");
    }

    #[tokio::test]
    async fn test_origin_at_end_of_long_description() {
        let filler: Vec<String> = (0..600).map(|i| format!("word{}", i)).collect();
        let description = format!("{} made in china", filler.join(" "));

        let report = analyzer().analyze("Mug", &description).await.unwrap();
        assert_eq!(report.made_in_china, OriginVerdict::Yes);
        assert!(report.similarity > 0.99);
    }

    #[tokio::test]
    async fn test_empty_text() {
        let report = analyzer().analyze("", "").await.unwrap();
        assert_eq!(report.made_in_china, OriginVerdict::No);
        assert_eq!(report.confidence, 1.0);
    }

    #[test]
    fn test_origin_phrases_keep_two_word_places() {
        assert_eq!(
            origin_phrases("made in sri lanka and sourced from china mainland"),
            Some("china; sri lanka".to_string())
        );
        assert_eq!(origin_phrases("great quality"), None);
    }

    #[test]
    fn test_production_type_and_tier() {
        assert_eq!(production_type("white label bottles"), ProductionType::PrivateLabel);
        assert_eq!(production_type("odm design service"), ProductionType::Odm);
        assert_eq!(supplier_tier("export company in ningbo"), SupplierTier::TradingCompany);
        assert_eq!(supplier_tier("sold by a wholesaler"), SupplierTier::Distributor);
        assert_eq!(supplier_tier("handmade"), SupplierTier::Unknown);
    }
}
