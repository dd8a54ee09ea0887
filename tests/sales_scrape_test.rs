use chrono::Utc;
use httpmock::prelude::*;
use tariff_hunter::core::sales::{SalesAnalyzer, SalesSettings};
use tariff_hunter::domain::model::{MetricsSource, Product};
use tariff_hunter::HunterError;

const PRODUCT_PAGE: &str = r#"
<html><body>
  <span id="productTitle">Wireless Earbuds</span>
  <span class="a-price"><span class="a-offscreen">$24.99</span></span>
  <div id="detailBullets">Best Sellers Rank: #1,234 in Electronics (See Top 100)</div>
  <span class="a-icon-alt">4.5 out of 5 stars</span>
  <span id="acrCustomerReviewText">2,345 global ratings</span>
  <div id="availability">In Stock.</div>
</body></html>
"#;

fn analyzer() -> SalesAnalyzer {
    SalesAnalyzer::new(SalesSettings {
        scrape: true,
        seed: Some(1),
        timeout_seconds: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_scrapes_product_page() {
    let server = MockServer::start_async().await;
    let page_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/dp/B0TEST");
            then.status(200)
                .header("Content-Type", "text/html")
                .body(PRODUCT_PAGE);
        })
        .await;

    let product = Product::new("Wireless Earbuds", "Bluetooth earbuds", 19.99)
        .with_url(server.url("/dp/B0TEST"));
    let metrics = analyzer().estimate_metrics(&product, Utc::now()).await;

    page_mock.assert_async().await;
    assert_eq!(metrics.source, MetricsSource::Scraped);
    assert_eq!(metrics.current_price, 24.99);
    assert_eq!(metrics.best_seller_rank, 1234);
    assert!((2250..=2750).contains(&metrics.estimated_monthly_sales));
    assert_eq!(metrics.review_count, 2345);
    assert_eq!(metrics.average_rating, 4.5);
    assert!(metrics.in_stock);
    assert_eq!(metrics.price_history.len(), 7);
    assert_eq!(metrics.price_history.last().unwrap().price, 24.99);
}

#[tokio::test]
async fn test_failed_scrape_falls_back_to_estimates() {
    let server = MockServer::start_async().await;
    let page_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/dp/MISSING");
            then.status(404);
        })
        .await;

    let product = Product::new("Wireless Earbuds", "Bluetooth earbuds", 19.99)
        .with_url(server.url("/dp/MISSING"));
    let analyzer = analyzer();

    let err = analyzer
        .scrape(&server.url("/dp/MISSING"), &product, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, HunterError::ScrapeError { .. }));
    assert_eq!(err.exit_code(), 0);

    let metrics = analyzer.estimate_metrics(&product, Utc::now()).await;
    assert_eq!(metrics.source, MetricsSource::Estimated);
    assert_eq!(metrics.current_price, 19.99);
    page_mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_page_without_metrics_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/captcha");
            then.status(200).body("<html>Enter the characters you see below</html>");
        })
        .await;

    let product = Product::new("Lamp", "Desk lamp", 30.0);
    let err = analyzer()
        .scrape(&server.url("/captcha"), &product, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, HunterError::ScrapeError { .. }));
}

#[tokio::test]
async fn test_scraping_disabled_never_fetches() {
    let server = MockServer::start_async().await;
    let page_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/dp/B0TEST");
            then.status(200).body(PRODUCT_PAGE);
        })
        .await;

    let analyzer = SalesAnalyzer::new(SalesSettings {
        scrape: false,
        seed: Some(1),
        timeout_seconds: 5,
    })
    .unwrap();
    let product =
        Product::new("Earbuds", "Bluetooth", 19.99).with_url(server.url("/dp/B0TEST"));
    let metrics = analyzer.estimate_metrics(&product, Utc::now()).await;

    assert_eq!(metrics.source, MetricsSource::Estimated);
    page_mock.assert_hits_async(0).await;
}
