use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tariff_hunter::core::analyzer::AnalyzerSettings;
use tariff_hunter::dashboard::{router, AppState};
use tariff_hunter::domain::model::{ClassifiedRow, OriginVerdict};
use tariff_hunter::ProductAnalyzer;
use tower::ServiceExt;

fn row(title: &str, verdict: OriginVerdict) -> ClassifiedRow {
    ClassifiedRow {
        title: title.to_string(),
        price: 12.0,
        description: format!("{} description", title),
        made_in_china: verdict,
        tariff_vulnerability: verdict.vulnerability(),
        alt_sourcing: "Vietnam, India".to_string(),
        confidence: Some(0.8),
        category: None,
        likely_origin: None,
        production_type: None,
        supplier_tier: None,
        estimated_monthly_sales: None,
        best_seller_rank: None,
        analyzed_at: None,
    }
}

fn state() -> AppState {
    let mut settings = AnalyzerSettings::default();
    settings.sales.seed = Some(21);
    settings.sales.scrape = false;
    let analyzer = Arc::new(ProductAnalyzer::from_settings(&settings).unwrap());

    let rows = vec![
        row("Earbuds", OriginVerdict::Yes),
        row("Basket", OriginVerdict::No),
        row("<script>alert(1)</script>", OriginVerdict::Unclear),
    ];
    AppState::new(rows, analyzer)
}

fn app() -> axum::Router {
    router(Arc::new(state()))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_healthz() {
    let response = app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn test_dashboard_page_escapes_and_filters() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/?made_in_china=All&vulnerability=All")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Earbuds"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<script>alert(1)</script>"));

    let response = app()
        .oneshot(
            Request::builder()
                .uri("/?made_in_china=No")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Basket"));
    assert!(!html.contains("Earbuds"));
}

#[tokio::test]
async fn test_products_api_filters() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/products?vulnerability=High")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let products = body_json(response).await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["title"], "Earbuds");
}

#[tokio::test]
async fn test_unknown_filter_label_is_bad_request() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/products?made_in_china=Maybe")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["kind"], "Data");
}

#[tokio::test]
async fn test_summary() {
    let response = app()
        .oneshot(Request::builder().uri("/api/summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["total_products"], 3);
    assert_eq!(summary["china_sourced"], 1);
    assert_eq!(summary["high_risk"], 1);
}

#[tokio::test]
async fn test_download_csv_is_attachment() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/download.csv?made_in_china=Yes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));

    let csv = body_text(response).await;
    assert!(csv.starts_with("title,price,description,made_in_china"));
    assert!(csv.contains("Earbuds"));
    assert!(!csv.contains("Basket"));
}

#[tokio::test]
async fn test_analyze_adds_product() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({
                "title": "USB Charger",
                "description": "Fast charger manufactured in China, shipped from Shenzhen",
                "price": 19.99,
                "category": "Auto-detect"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let analysis = body_json(response).await;
    assert_eq!(analysis["origin"]["made_in_china"], "Yes");
    assert_eq!(analysis["tariff_vulnerability"], "High");
    assert_eq!(analysis["sales"]["price_history"].as_array().unwrap().len(), 7);

    let response = app
        .oneshot(Request::builder().uri("/api/summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["total_products"], 4);
    assert_eq!(summary["china_sourced"], 2);
}

#[tokio::test]
async fn test_analyze_rejects_blank_title() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title": "   "}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ideas_endpoint() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/ideas")
        .body(Body::from(
            "Phone Case - made in China at a Dongguan factory\nLinen Tote - handmade in Portugal\n",
        ))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let analyses = body_json(response).await;
    let analyses = analyses.as_array().unwrap();
    assert_eq!(analyses.len(), 2);
    assert_eq!(analyses[0]["product"]["title"], "Phone Case");
    assert_eq!(analyses[1]["product"]["title"], "Linen Tote");

    let empty = Request::builder()
        .method("POST")
        .uri("/api/ideas")
        .body(Body::from("\n  \n"))
        .unwrap();
    let response = app().oneshot(empty).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_row_table_is_capped() {
    let app = router(Arc::new(state().with_max_rows(3)));
    let request = Request::builder()
        .method("POST")
        .uri("/api/ideas")
        .body(Body::from("Desk Lamp - made in China\nWool Rug - woven in India\n"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/products").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let products = body_json(response).await;
    let titles: Vec<&str> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["<script>alert(1)</script>", "Desk Lamp", "Wool Rug"]);
}
