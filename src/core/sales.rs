use crate::domain::model::{round_to, Category, MetricsSource, PricePoint, Product, SalesMetrics};
use crate::utils::error::{HunterError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

/// Best Seller Rank ranges (inclusive) to typical monthly unit sales.
const BSR_TO_SALES: &[(u64, u64, u64)] = &[
    (1, 100, 10_000),
    (101, 1_000, 5_000),
    (1_001, 5_000, 2_500),
    (5_001, 10_000, 1_000),
    (10_001, 50_000, 500),
    (50_001, 100_000, 250),
    (100_001, 500_000, 100),
    (500_001, u64::MAX, 50),
];

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));
static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?(\d+(?:,\d{3})*(?:\.\d{1,2})?)")
        .expect("valid price pattern")
});
static BSR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s?([\d,]+)\s+in\b").expect("valid rank pattern"));
static REVIEWS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,]+)\s+(?:global\s+)?(?:ratings|reviews)").expect("valid review pattern")
});
static RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d(?:\.\d)?)\s+out\s+of\s+5").expect("valid rating pattern")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesSettings {
    /// Fetch product URLs for live metrics.
    pub scrape: bool,
    /// Seed for the estimator, for reproducible runs.
    pub seed: Option<u64>,
    pub timeout_seconds: u64,
}

impl Default for SalesSettings {
    fn default() -> Self {
        Self {
            scrape: true,
            seed: None,
            timeout_seconds: 10,
        }
    }
}

pub fn guess_category(title: &str, description: &str) -> Category {
    let text = format!("{} {}", title, description).to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|kw| text.contains(kw));

    if has_any(&["electronic", "cable", "charger"]) {
        Category::Electronics
    } else if has_any(&["clothing", "shirt", "dress"]) {
        Category::Apparel
    } else if has_any(&["home", "kitchen", "decor"]) {
        Category::Home
    } else if has_any(&["toy", "game", "play"]) {
        Category::Toys
    } else {
        Category::General
    }
}

/// Typical BSR for a category.
pub fn category_base_bsr(category: Category) -> u64 {
    match category {
        Category::Electronics => 5_000,
        Category::Apparel => 10_000,
        Category::Home => 8_000,
        Category::Toys => 15_000,
        Category::General => 20_000,
    }
}

pub fn base_sales_for_rank(bsr: u64) -> Option<u64> {
    BSR_TO_SALES
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&bsr))
        .map(|(_, _, sales)| *sales)
}

/// Metrics scraped out of a product page's text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageMetrics {
    pub price: Option<f64>,
    pub best_seller_rank: Option<u64>,
    pub review_count: Option<u64>,
    pub average_rating: Option<f64>,
    pub in_stock: bool,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

pub fn parse_product_page(html: &str) -> PageMetrics {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = text.to_lowercase();

    PageMetrics {
        price: PRICE.captures(&text).and_then(|c| parse_number(&c[1])),
        best_seller_rank: BSR
            .captures(&text)
            .and_then(|c| parse_number(&c[1]))
            .map(|n| n as u64),
        review_count: REVIEWS
            .captures(&text)
            .and_then(|c| parse_number(&c[1]))
            .map(|n| n as u64),
        average_rating: RATING.captures(&text).and_then(|c| parse_number(&c[1])),
        in_stock: !(lower.contains("currently unavailable") || lower.contains("out of stock")),
    }
}

pub struct SalesAnalyzer {
    client: Client,
    settings: SalesSettings,
    rng: Mutex<StdRng>,
}

impl SalesAnalyzer {
    pub fn new(settings: SalesSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            client,
            settings,
            rng: Mutex::new(rng),
        })
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // 鎖中毒時沿用內部狀態即可
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Live metrics when the product has a scrapable URL, estimates otherwise.
    pub async fn estimate_metrics(&self, product: &Product, now: DateTime<Utc>) -> SalesMetrics {
        if self.settings.scrape {
            if let Some(url) = product
                .url
                .as_deref()
                .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            {
                match self.scrape(url, product, now).await {
                    Ok(metrics) => return metrics,
                    Err(e) => tracing::warn!("Scraping failed, using estimates: {}", e),
                }
            }
        }

        self.estimated_metrics(product, now)
    }

    pub async fn scrape(
        &self,
        url: &str,
        product: &Product,
        now: DateTime<Utc>,
    ) -> Result<SalesMetrics> {
        tracing::debug!("Scraping product page {}", url);
        let response = self.client.get(url).send().await.map_err(|e| HunterError::ScrapeError {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(HunterError::ScrapeError {
                url: url.to_string(),
                message: format!("status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| HunterError::ScrapeError {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let page = parse_product_page(&body);

        if page.price.is_none() && page.best_seller_rank.is_none() {
            return Err(HunterError::ScrapeError {
                url: url.to_string(),
                message: "no price or best seller rank found on page".to_string(),
            });
        }

        let category = product
            .category
            .unwrap_or_else(|| guess_category(&product.title, &product.description));
        let current_price = round_to(page.price.unwrap_or(product.price), 2);
        let best_seller_rank = page
            .best_seller_rank
            .unwrap_or_else(|| category_base_bsr(category));

        Ok(SalesMetrics {
            current_price,
            best_seller_rank,
            estimated_monthly_sales: self.estimate_from_bsr(best_seller_rank),
            review_count: page.review_count.unwrap_or(0),
            average_rating: page.average_rating.unwrap_or(0.0),
            price_history: self.price_history(current_price, now),
            in_stock: page.in_stock,
            source: MetricsSource::Scraped,
        })
    }

    /// Plausible metrics drawn around the category baseline.
    pub fn estimated_metrics(&self, product: &Product, now: DateTime<Utc>) -> SalesMetrics {
        let category = product
            .category
            .unwrap_or_else(|| guess_category(&product.title, &product.description));
        let base_bsr = category_base_bsr(category) as f64;
        let spread = Normal::new(base_bsr, base_bsr / 2.0).ok();
        let price = round_to(product.price, 2);

        let (bsr, review_count, average_rating, in_stock) = self.with_rng(|rng| {
            let sampled = spread.map_or(base_bsr, |normal| normal.sample(rng));
            (
                sampled.max(1.0) as u64,
                rng.random_range(0..=10_000u64),
                round_to(rng.random_range(3.0..=5.0), 1),
                rng.random_bool(0.5),
            )
        });

        SalesMetrics {
            current_price: price,
            best_seller_rank: bsr,
            estimated_monthly_sales: self.estimate_from_bsr(bsr),
            review_count,
            average_rating,
            price_history: self.price_history(price, now),
            in_stock,
            source: MetricsSource::Estimated,
        }
    }

    /// Monthly sales for a rank, jittered by up to ±10%.
    pub fn estimate_from_bsr(&self, bsr: u64) -> u64 {
        match base_sales_for_rank(bsr) {
            Some(sales) => {
                let spread = (sales / 10) as i64;
                let jitter = self.with_rng(|rng| rng.random_range(-spread..=spread));
                (sales as i64 + jitter).max(0) as u64
            }
            None => 50,
        }
    }

    /// Six monthly points ending with the current price.
    pub fn price_history(&self, current_price: f64, now: DateTime<Utc>) -> Vec<PricePoint> {
        let mut history = self.with_rng(|rng| {
            (1..=6i64)
                .rev()
                .map(|i| {
                    let date = (now - ChronoDuration::days(30 * i)).format("%Y-%m").to_string();
                    let mut fluctuation = rng.random_range(0.8..1.2);
                    if i > 3 {
                        fluctuation *= rng.random_range(0.9..1.1);
                    }
                    PricePoint {
                        date,
                        price: round_to(current_price * fluctuation, 2),
                    }
                })
                .collect::<Vec<_>>()
        });

        history.push(PricePoint {
            date: now.format("%Y-%m").to_string(),
            price: current_price,
        });
        history
    }
}
