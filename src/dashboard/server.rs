use crate::app::pipelines::batch::analyze_in_chunks;
use crate::core::analyzer::ProductAnalyzer;
use crate::core::report::{filter_rows, parse_ideas, read_rows_csv, summarize, write_rows_csv, RowFilter};
use crate::dashboard::render::render_dashboard;
use crate::domain::model::{AnalysisSummary, Category, ClassifiedRow, Product, ProductAnalysis};
use crate::utils::error::{ErrorCategory, HunterError, Result};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub const DEFAULT_PORT: u16 = 8501;
/// Rows kept in memory; the oldest are evicted first.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    /// Classified CSV shown at startup.
    pub data: Option<PathBuf>,
    pub allow_non_loopback: bool,
    pub chunk_size: usize,
    pub concurrent_requests: usize,
    pub max_rows: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            data: None,
            allow_non_loopback: false,
            chunk_size: 10,
            concurrent_requests: 5,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

pub struct AppState {
    rows: RwLock<Vec<ClassifiedRow>>,
    analyzer: Arc<ProductAnalyzer>,
    chunk_size: usize,
    concurrent_requests: usize,
    max_rows: usize,
}

impl AppState {
    pub fn new(rows: Vec<ClassifiedRow>, analyzer: Arc<ProductAnalyzer>) -> Self {
        Self {
            rows: RwLock::new(rows),
            analyzer,
            chunk_size: 10,
            concurrent_requests: 5,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    pub fn with_limits(mut self, chunk_size: usize, concurrent_requests: usize) -> Self {
        self.chunk_size = chunk_size;
        self.concurrent_requests = concurrent_requests;
        self
    }

    async fn push_rows(&self, analyses: &[ProductAnalysis]) {
        let mut rows = self.rows.write().await;
        rows.extend(analyses.iter().map(ClassifiedRow::from));
        if rows.len() > self.max_rows {
            let evicted = rows.len() - self.max_rows;
            rows.drain(..evicted);
            tracing::debug!("Evicted {} oldest rows from the dashboard table", evicted);
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(dashboard))
        .route("/api/products", get(list_products))
        .route("/api/summary", get(summary))
        .route("/download.csv", get(download_csv))
        .route("/api/analyze", post(analyze_product))
        .route("/api/ideas", post(analyze_ideas))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<()> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(HunterError::InvalidConfigValueError {
            field: "bind".to_string(),
            value: config.bind.to_string(),
            reason: "non-loopback bind requires --allow-non-loopback".to_string(),
        });
    }
    crate::utils::validation::validate_positive_number("chunk_size", config.chunk_size, 1)?;
    crate::utils::validation::validate_positive_number(
        "concurrent_requests",
        config.concurrent_requests,
        1,
    )?;
    crate::utils::validation::validate_positive_number("max_rows", config.max_rows, 1)?;
    Ok(())
}

pub async fn serve(config: ServeConfig, analyzer: Arc<ProductAnalyzer>) -> Result<()> {
    validate_config(&config)?;

    let rows = match &config.data {
        Some(path) => {
            let data = tokio::fs::read(path).await?;
            let rows = read_rows_csv(&data)?;
            tracing::info!("📂 Loaded {} classified products from {}", rows.len(), path.display());
            rows
        }
        None => Vec::new(),
    };

    let state = Arc::new(
        AppState::new(rows, analyzer)
            .with_limits(config.chunk_size, config.concurrent_requests)
            .with_max_rows(config.max_rows),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("🌐 Dashboard listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

/// Error body for JSON endpoints.
pub struct ApiError(HunterError);

impl From<HunterError> for ApiError {
    fn from(err: HunterError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.category() {
            ErrorCategory::Data => StatusCode::BAD_REQUEST,
            ErrorCategory::Network | ErrorCategory::Model => StatusCode::BAD_GATEWAY,
            ErrorCategory::Configuration | ErrorCategory::System => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {}", self.0);
        }
        let body = json!({
            "error": {
                "kind": format!("{:?}", self.0.category()),
                "message": self.0.to_string(),
                "hint": self.0.recovery_suggestion(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub made_in_china: Option<String>,
    pub vulnerability: Option<String>,
}

impl FilterQuery {
    fn to_filter(&self) -> Result<RowFilter> {
        RowFilter::from_labels(self.made_in_china.as_deref(), self.vulnerability.as_deref())
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> std::result::Result<Html<String>, ApiError> {
    let filter = query.to_filter()?;
    let rows = state.rows.read().await;
    Ok(Html(render_dashboard(&rows, &summarize(&rows), &filter)))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> std::result::Result<Json<Vec<ClassifiedRow>>, ApiError> {
    let filter = query.to_filter()?;
    let rows = state.rows.read().await;
    Ok(Json(filter_rows(&rows, &filter)))
}

async fn summary(State(state): State<Arc<AppState>>) -> Json<AnalysisSummary> {
    let rows = state.rows.read().await;
    Json(summarize(&rows))
}

async fn download_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> std::result::Result<Response, ApiError> {
    let filter = query.to_filter()?;
    let data = {
        let rows = state.rows.read().await;
        write_rows_csv(&filter_rows(&rows, &filter))?
    };
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"tariffhunter_analysis.csv\"",
            ),
        ],
        data,
    )
        .into_response())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_price")]
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
    /// A category label, or "Auto-detect".
    #[serde(default)]
    pub category: Option<String>,
}

fn default_price() -> f64 {
    19.99
}

impl AnalyzeRequest {
    fn into_product(self) -> Result<Product> {
        crate::utils::validation::validate_non_empty_string("title", &self.title).map_err(|_| {
            HunterError::ValidationError {
                message: "product title is required".to_string(),
            }
        })?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(HunterError::ValidationError {
                message: format!("invalid price {}", self.price),
            });
        }

        let mut product = Product::new(self.title.trim(), self.description, self.price);
        if let Some(url) = self.url.filter(|u| !u.trim().is_empty()) {
            product = product.with_url(url);
        }
        match self.category.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(label) if label.eq_ignore_ascii_case("auto-detect") => {}
            Some(label) => {
                let category = label
                    .parse::<Category>()
                    .map_err(|message| HunterError::ValidationError { message })?;
                product = product.with_category(category);
            }
        }
        Ok(product)
    }
}

async fn analyze_product(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> std::result::Result<Json<ProductAnalysis>, ApiError> {
    let product = request.into_product()?;
    let analysis = state.analyzer.analyze(&product).await?;
    state.push_rows(std::slice::from_ref(&analysis)).await;
    Ok(Json(analysis))
}

async fn analyze_ideas(
    State(state): State<Arc<AppState>>,
    body: String,
) -> std::result::Result<Json<Vec<ProductAnalysis>>, ApiError> {
    let products = parse_ideas(&body);
    if products.is_empty() {
        return Err(HunterError::ValidationError {
            message: "no product ideas given".to_string(),
        }
        .into());
    }
    let (analyses, failed) = analyze_in_chunks(
        &state.analyzer,
        products,
        state.chunk_size,
        state.concurrent_requests,
    )
    .await;
    if failed > 0 {
        tracing::warn!("⚠️ {} ideas could not be analyzed", failed);
    }
    state.push_rows(&analyses).await;
    Ok(Json(analyses))
}
