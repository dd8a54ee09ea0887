use httpmock::prelude::*;
use serde_json::json;
use tariff_hunter::core::analyzer::AnalyzerSettings;
use tariff_hunter::core::embedding::{EmbeddingProvider, EmbeddingSettings, HttpEmbedder};
use tariff_hunter::core::generator::GeneratorProvider;
use tariff_hunter::domain::model::{Category, OriginVerdict, Product};
use tariff_hunter::domain::ports::TextEmbedder;
use tariff_hunter::{HunterError, ProductAnalyzer};

fn generator_settings(endpoint: String) -> AnalyzerSettings {
    let mut settings = AnalyzerSettings::default();
    settings.sales.seed = Some(9);
    settings.sales.scrape = false;
    settings.generator.provider = GeneratorProvider::Http;
    settings.generator.endpoint = Some(endpoint);
    settings.generator.api_key = Some("test-key".to_string());
    settings
}

fn charger() -> Product {
    Product::new(
        "USB Charger",
        "Fast charger manufactured in China, shipped from a Shenzhen factory",
        20.0,
    )
    .with_category(Category::Electronics)
}

#[tokio::test]
async fn test_model_suggestions_lead_alternatives() {
    let server = MockServer::start_async().await;
    let generate_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate")
                .header("authorization", "Bearer test-key")
                .body_contains("Suggest 2 countries (not China)");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([
                    {"generated_text": " Malaysia and Thailand, both avoid China tariffs."}
                ]));
        })
        .await;

    let analyzer =
        ProductAnalyzer::from_settings(&generator_settings(server.url("/generate"))).unwrap();
    let analysis = analyzer.analyze(&charger()).await.unwrap();

    generate_mock.assert_async().await;
    let sourcing = &analysis.sourcing;
    assert!(sourcing.ai_generated);
    assert_eq!(&sourcing.alternatives[..2], ["Malaysia", "Thailand"]);
    assert!(sourcing.alternatives.len() >= 2);
    assert!(!sourcing.alternatives.iter().any(|c| c == "China"));
    assert!(sourcing.suggestion_text.contains("Malaysia"));
    assert_eq!(sourcing.country_comparisons[0].country, "China");
}

#[tokio::test]
async fn test_generator_failure_falls_back_to_profiles() {
    let server = MockServer::start_async().await;
    let generate_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/generate");
            then.status(503).body("model loading");
        })
        .await;

    let analyzer =
        ProductAnalyzer::from_settings(&generator_settings(server.url("/generate"))).unwrap();
    let analysis = analyzer.analyze(&charger()).await.unwrap();

    generate_mock.assert_async().await;
    assert_eq!(analysis.origin.made_in_china, OriginVerdict::Yes);
    assert!(!analysis.sourcing.ai_generated);
    assert_eq!(
        analysis.sourcing.alternatives,
        vec!["Vietnam", "Malaysia", "Taiwan", "Mexico"]
    );
    assert_eq!(analysis.sourcing.suggestion_text, "Vietnam, Malaysia");
}

#[tokio::test]
async fn test_http_embedder_orders_by_index() {
    let server = MockServer::start_async().await;
    let embed_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .json_body_partial(r#"{"model": "mini"}"#);
            then.status(200).json_body(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            }));
        })
        .await;

    let settings = EmbeddingSettings {
        provider: EmbeddingProvider::Http,
        endpoint: Some(server.url("/v1/embeddings")),
        model: "mini".to_string(),
        ..EmbeddingSettings::default()
    };
    let embedder = HttpEmbedder::new(&settings).unwrap();
    let vectors = embedder
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    embed_mock.assert_async().await;
    assert_eq!(vectors, vec![vec![1.0f32, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn test_http_embedder_count_mismatch_is_model_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200)
                .json_body(json!({"data": [{"index": 0, "embedding": [1.0]}]}));
        })
        .await;

    let settings = EmbeddingSettings {
        provider: EmbeddingProvider::Http,
        endpoint: Some(server.url("/v1/embeddings")),
        ..EmbeddingSettings::default()
    };
    let embedder = HttpEmbedder::new(&settings).unwrap();
    let err = embedder
        .embed(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, HunterError::ModelError { .. }));
    assert_eq!(err.exit_code(), 2);
}
