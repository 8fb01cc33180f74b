//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/v1/sentiment` | Analyze a form-encoded `text` at the requested granularities |
//! | `POST` | `/v1.0.0/vader_sentiment` | Same handler, under the path earlier clients use |
//! | `GET`  | `/admin/status` | Uptime, request count, average response time, service name |
//! | `GET`  | `/admin/table` | Dump a whitelisted table (`table_name=queries`) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # `POST /v1/sentiment`
//!
//! Form fields: `text` (required, non-empty) and the optional flags
//! `word_level`, `sentence_level`, `paragraph_level`, `document_level`.
//! An absent flag means `true`; a present flag is true only for `true` or
//! `1`. Every successful analysis is appended to the query log.
//!
//! # `GET /admin/status`
//!
//! Query parameters: `include_keys` and `exclude_keys` (comma-separated),
//! `request_interval` (entries averaged), `time_interval` (seconds counted).
//! Omitted windows fall back to the `[status]` config section.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": 1412, "message": "You must pass the 'text' parameter" } }
//! ```
//!
//! Codes: `1412` missing input (400), `1400` malformed parameter (400),
//! `1404` unknown table (404), `1500` internal (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser clients on
//! other domains can call the API.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::{rejection::FormRejection, ConnectInfo, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sentiment_harness_core::error::SentimentError;
use sentiment_harness_core::models::{AnalysisResult, Granularity, RequestDescriptor};
use sentiment_harness_core::pipeline::SentimentPipeline;
use sentiment_harness_core::status::{ServiceInfo, StatusAggregator, StatusQuery, StatusSnapshot};
use sentiment_harness_core::store::QueryLog;

use crate::analyze::{build_pipeline, QueryRecorder};
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_log::SqliteQueryLog;

const BAD_PARAMETER_CODE: u32 = 1400;
const INTERNAL_ERROR_CODE: u32 = 1500;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pipeline: Arc<SentimentPipeline>,
    recorder: Arc<QueryRecorder>,
    status: Arc<StatusAggregator>,
    log: Arc<dyn QueryLog>,
}

impl AppState {
    /// Load the lexicon and wire every component to `log`.
    ///
    /// The service start time used for `uptime` is taken here.
    pub fn new(config: &Config, log: Arc<dyn QueryLog>) -> Result<Self> {
        let info = Arc::new(ServiceInfo::new(config.service.name.clone()));
        Ok(Self {
            config: Arc::new(config.clone()),
            pipeline: Arc::new(build_pipeline(config)?),
            recorder: Arc::new(QueryRecorder::from_config(config, log.clone())),
            status: Arc::new(StatusAggregator::new(info, log.clone())),
            log,
        })
    }
}

/// Starts the HTTP server against the configured SQLite query log.
///
/// Runs migrations first, so a fresh database works without `senti init`.
/// The server runs until the process is terminated.
pub async fn run_server(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    run_server_with_log(config, Arc::new(SqliteQueryLog::new(pool))).await
}

/// Like [`run_server`], but with a caller-supplied query log backend.
pub async fn run_server_with_log(config: &Config, log: Arc<dyn QueryLog>) -> Result<()> {
    let state = AppState::new(config, log)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        service = %config.service.name,
        "sentiment server listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the router with CORS, request tracing, and the request-start stamp.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/sentiment", post(handle_sentiment))
        .route("/v1.0.0/vader_sentiment", post(handle_sentiment))
        .route("/admin/status", get(handle_status))
        .route("/admin/table", get(handle_table))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(stamp_request_start))
        .with_state(state)
}

// ============ Request-start marker ============

/// When the request reached the outermost layer.
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

async fn stamp_request_start(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(RequestStart(Instant::now()));
    next.run(req).await
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: u32,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: u32,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SentimentError> for AppError {
    fn from(err: SentimentError) -> Self {
        let status = match err {
            SentimentError::Validation { .. } => StatusCode::BAD_REQUEST,
            SentimentError::TableNotFound(_) => StatusCode::NOT_FOUND,
        };
        AppError {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(known) = err.downcast_ref::<SentimentError>() {
            return known.clone().into();
        }
        tracing::error!(error = %err, "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: INTERNAL_ERROR_CODE,
            message: err.to_string(),
        }
    }
}

fn bad_parameter(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: BAD_PARAMETER_CODE,
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /v1/sentiment ============

/// Parse a granularity flag: absent → true, otherwise `true`/`1`.
fn parse_flag(form: &BTreeMap<String, String>, name: &str) -> bool {
    match form.get(name) {
        None => true,
        Some(v) => v.eq_ignore_ascii_case("true") || v == "1",
    }
}

fn granularity(form: &BTreeMap<String, String>) -> Granularity {
    Granularity {
        word_level: parse_flag(form, "word_level"),
        sentence_level: parse_flag(form, "sentence_level"),
        paragraph_level: parse_flag(form, "paragraph_level"),
        document_level: parse_flag(form, "document_level"),
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

#[allow(clippy::too_many_arguments)]
async fn handle_sentiment(
    State(state): State<AppState>,
    Extension(RequestStart(started)): Extension<RequestStart>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(args): Query<BTreeMap<String, String>>,
    form: Result<Form<BTreeMap<String, String>>, FormRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    // An unreadable body is treated like a missing `text` field.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "form body rejected");
            BTreeMap::new()
        }
    };

    let result = state.pipeline.analyze_since(
        form.get("text").map(String::as_str),
        granularity(&form),
        started,
    )?;

    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let descriptor = RequestDescriptor {
        method: method.to_string(),
        base_url: format!("http://{}{}", host, uri.path()),
        remote_addr: Some(remote.ip().to_string()),
        args,
        form,
        headers: header_map(&headers),
    };
    state.recorder.record(&descriptor, &result).await;

    Ok(Json(result))
}

// ============ GET /admin/status ============

#[derive(Debug, Deserialize)]
struct StatusParams {
    include_keys: Option<String>,
    exclude_keys: Option<String>,
    request_interval: Option<String>,
    time_interval: Option<String>,
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl StatusParams {
    fn into_query(self, config: &Config) -> Result<StatusQuery, AppError> {
        let request_interval = match self.request_interval.as_deref() {
            None => config.status.request_interval,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(bad_parameter(format!(
                        "request_interval must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
        };

        let time_interval = match self.time_interval.as_deref() {
            None => config.status.time_interval,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    return Err(bad_parameter(format!(
                        "time_interval must be a non-negative number of seconds, got '{}'",
                        raw
                    )))
                }
            },
        };

        Ok(StatusQuery {
            include_keys: self.include_keys.as_deref().map(split_keys),
            exclude_keys: self
                .exclude_keys
                .as_deref()
                .map(split_keys)
                .unwrap_or_default(),
            request_interval,
            time_interval,
        })
    }
}

async fn handle_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<StatusSnapshot>, AppError> {
    let query = params.into_query(&state.config)?;
    Ok(Json(state.status.status(&query).await))
}

// ============ GET /admin/table ============

#[derive(Debug, Deserialize)]
struct TableParams {
    #[serde(default)]
    table_name: String,
}

async fn handle_table(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let rows = state.log.dump(&params.table_name).await?;
    Ok(Json(serde_json::json!({ "contents": rows })))
}
