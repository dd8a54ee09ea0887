use crate::domain::model::{
    round_to, AnalysisSummary, Category, ClassifiedRow, OriginVerdict, Product,
    TariffVulnerability,
};
use crate::utils::error::{HunterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REQUIRED_COLUMNS: [&str; 3] = ["title", "description", "price"];
pub const IDEA_DEFAULT_PRICE: f64 = 14.99;

/// Products read from an input CSV plus the number of rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedProducts {
    pub products: Vec<Product>,
    pub skipped: usize,
}

fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Read products from CSV. Header names are matched case-insensitively;
/// `url` and `category` columns are optional.
pub fn parse_products_csv(data: &[u8], max_records: Option<usize>) -> Result<ParsedProducts> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let (Some(title_idx), Some(desc_idx), Some(price_idx)) =
        (column("title"), column("description"), column("price"))
    else {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| column(c).is_none())
            .collect();
        return Err(HunterError::ValidationError {
            message: format!("input CSV is missing required column(s): {}", missing.join(", ")),
        });
    };
    let url_idx = column("url");
    let category_idx = column("category");

    let mut parsed = ParsedProducts::default();
    for (line, record) in reader.records().enumerate() {
        if max_records.is_some_and(|max| parsed.products.len() >= max) {
            break;
        }
        let record = record?;
        // 第 1 行是標題列
        let row_number = line + 2;

        let title = record.get(title_idx).unwrap_or("").to_string();
        if title.is_empty() {
            tracing::warn!("Skipping row {}: empty title", row_number);
            parsed.skipped += 1;
            continue;
        }
        let raw_price = record.get(price_idx).unwrap_or("");
        let Some(price) = parse_price(raw_price) else {
            tracing::warn!("Skipping row {} ('{}'): invalid price {:?}", row_number, title, raw_price);
            parsed.skipped += 1;
            continue;
        };

        let mut product = Product::new(title, record.get(desc_idx).unwrap_or(""), price);
        if let Some(url) = url_idx.and_then(|i| record.get(i)).filter(|u| !u.is_empty()) {
            product.url = Some(url.to_string());
        }
        if let Some(raw) = category_idx.and_then(|i| record.get(i)).filter(|c| !c.is_empty()) {
            match raw.parse::<Category>() {
                Ok(category) => product.category = Some(category),
                Err(e) => tracing::debug!("Row {}: {}, category will be guessed", row_number, e),
            }
        }
        parsed.products.push(product);
    }

    Ok(parsed)
}

/// Free-text product ideas, one per line: `title - description` or just a
/// title. Every idea gets the placeholder price.
pub fn parse_ideas(text: &str) -> Vec<Product> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let title = line.split(" - ").next().unwrap_or(line).trim();
            Product::new(title, line, IDEA_DEFAULT_PRICE)
        })
        .collect()
}

pub fn write_rows_csv(rows: &[ClassifiedRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| HunterError::ProcessingError {
        message: format!("failed to finish CSV output: {}", e),
    })
}

pub fn read_rows_csv(data: &[u8]) -> Result<Vec<ClassifiedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<ClassifiedRow>, _>>()
        .map_err(HunterError::from)
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(part as f64 / whole as f64 * 100.0, 1)
    }
}

pub fn summarize(rows: &[ClassifiedRow]) -> AnalysisSummary {
    let total_products = rows.len();
    let china_sourced = rows
        .iter()
        .filter(|r| r.made_in_china == OriginVerdict::Yes)
        .count();
    let high_risk = rows
        .iter()
        .filter(|r| {
            r.made_in_china == OriginVerdict::Yes
                && r.tariff_vulnerability == TariffVulnerability::High
        })
        .count();

    let mut origin_breakdown = BTreeMap::new();
    let mut risk_breakdown = BTreeMap::new();
    for row in rows {
        *origin_breakdown
            .entry(row.made_in_china.to_string())
            .or_insert(0) += 1;
        *risk_breakdown
            .entry(row.tariff_vulnerability.to_string())
            .or_insert(0) += 1;
    }

    AnalysisSummary {
        total_products,
        china_sourced,
        china_sourced_pct: pct(china_sourced, total_products),
        high_risk,
        high_risk_pct_of_china: (china_sourced > 0).then(|| pct(high_risk, china_sourced)),
        origin_breakdown,
        risk_breakdown,
    }
}

/// Dashboard filter. `None` means "All".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub made_in_china: Option<OriginVerdict>,
    pub vulnerability: Option<TariffVulnerability>,
}

fn parse_choice<T: std::str::FromStr<Err = String>>(raw: Option<&str>) -> Result<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|message| HunterError::ValidationError { message }),
    }
}

impl RowFilter {
    /// Build from UI labels such as "All", "Yes", "High".
    pub fn from_labels(made_in_china: Option<&str>, vulnerability: Option<&str>) -> Result<Self> {
        Ok(Self {
            made_in_china: parse_choice(made_in_china)?,
            vulnerability: parse_choice(vulnerability)?,
        })
    }

    /// Query string for links that should keep the active filter.
    pub fn query_string(&self) -> String {
        format!(
            "made_in_china={}&vulnerability={}",
            self.made_in_china.map_or("All", |v| v.as_str()),
            self.vulnerability.map_or("All", |v| v.as_str())
        )
    }

    pub fn matches(&self, row: &ClassifiedRow) -> bool {
        self.made_in_china.is_none_or(|v| row.made_in_china == v)
            && self.vulnerability.is_none_or(|v| row.tariff_vulnerability == v)
    }
}

pub fn filter_rows(rows: &[ClassifiedRow], filter: &RowFilter) -> Vec<ClassifiedRow> {
    rows.iter().filter(|r| filter.matches(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, verdict: OriginVerdict) -> ClassifiedRow {
        ClassifiedRow {
            title: title.to_string(),
            price: 10.0,
            description: format!("{} description", title),
            made_in_china: verdict,
            tariff_vulnerability: verdict.vulnerability(),
            alt_sourcing: "Vietnam, India".to_string(),
            confidence: Some(0.7),
            category: None,
            likely_origin: None,
            production_type: None,
            supplier_tier: None,
            estimated_monthly_sales: None,
            best_seller_rank: None,
            analyzed_at: None,
        }
    }

    #[test]
    fn test_parse_products_csv_skips_bad_rows() {
        let csv = "Title,Description,Price,url\n\
                   Earbuds,Made in China,$19.99,https://example.com/e\n\
                   ,no title,5.00,\n\
                   Lamp,LED lamp,abc,\n\
                   \"Mug, large\",Ceramic,\"1,200.50\",\n";
        let parsed = parse_products_csv(csv.as_bytes(), None).unwrap();

        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[0].price, 19.99);
        assert_eq!(parsed.products[0].url.as_deref(), Some("https://example.com/e"));
        assert_eq!(parsed.products[1].title, "Mug, large");
        assert_eq!(parsed.products[1].price, 1200.5);
        assert!(parsed.products[1].url.is_none());
    }

    #[test]
    fn test_parse_products_csv_requires_columns() {
        let err = parse_products_csv(b"title,price\nA,1\n", None).unwrap_err();
        match err {
            HunterError::ValidationError { message } => assert!(message.contains("description")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_products_csv_max_records_and_category() {
        let csv = "title,description,price,category\nA,a,1,toys\nB,b,2,spaceships\nC,c,3,\n";
        let parsed = parse_products_csv(csv.as_bytes(), Some(2)).unwrap();
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[0].category, Some(Category::Toys));
        assert_eq!(parsed.products[1].category, None);
    }

    #[test]
    fn test_parse_ideas() {
        let ideas = parse_ideas("Yoga Mat - non-slip TPE mat\n\n  Bamboo Toothbrush  \n");
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].title, "Yoga Mat");
        assert_eq!(ideas[0].description, "Yoga Mat - non-slip TPE mat");
        assert_eq!(ideas[1].title, "Bamboo Toothbrush");
        assert_eq!(ideas[1].price, IDEA_DEFAULT_PRICE);
    }

    #[test]
    fn test_rows_csv_round_trip_and_legacy_columns() {
        let rows = vec![row("Earbuds", OriginVerdict::Yes), row("Basket", OriginVerdict::No)];
        let bytes = write_rows_csv(&rows).unwrap();
        let header = String::from_utf8(bytes.clone()).unwrap();
        assert!(header.starts_with(
            "title,price,description,made_in_china,tariff_vulnerability,alt_sourcing,confidence"
        ));
        assert_eq!(read_rows_csv(&bytes).unwrap(), rows);

        let legacy = "title,price,description,made_in_china,tariff_vulnerability,alt_sourcing\n\
                      Kettle,29.99,Steel kettle,Unclear,Medium,\"Vietnam, India\"\n";
        let parsed = read_rows_csv(legacy.as_bytes()).unwrap();
        assert_eq!(parsed[0].made_in_china, OriginVerdict::Unclear);
        assert_eq!(parsed[0].confidence, None);
    }

    #[test]
    fn test_summarize() {
        let rows = vec![
            row("a", OriginVerdict::Yes),
            row("b", OriginVerdict::Yes),
            row("c", OriginVerdict::Unclear),
            row("d", OriginVerdict::No),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.total_products, 4);
        assert_eq!(summary.china_sourced, 2);
        assert_eq!(summary.china_sourced_pct, 50.0);
        assert_eq!(summary.high_risk, 2);
        assert_eq!(summary.high_risk_pct_of_china, Some(100.0));
        assert_eq!(summary.origin_breakdown["Unclear"], 1);
        assert_eq!(summary.risk_breakdown["Low"], 1);

        let summary = summarize(&[row("d", OriginVerdict::No)]);
        assert_eq!(summary.high_risk_pct_of_china, None);
        assert_eq!(summarize(&[]).china_sourced_pct, 0.0);
    }

    #[test]
    fn test_filter_rows() {
        let rows = vec![
            row("a", OriginVerdict::Yes),
            row("b", OriginVerdict::Unclear),
            row("c", OriginVerdict::No),
        ];
        let all = RowFilter::from_labels(Some("All"), Some("All")).unwrap();
        assert_eq!(filter_rows(&rows, &all), rows);

        let yes = RowFilter::from_labels(Some("Yes"), None).unwrap();
        assert_eq!(filter_rows(&rows, &yes).len(), 1);

        let mismatch = RowFilter::from_labels(Some("Yes"), Some("Low")).unwrap();
        assert!(filter_rows(&rows, &mismatch).is_empty());

        assert!(RowFilter::from_labels(Some("Perhaps"), None).is_err());
    }
}
