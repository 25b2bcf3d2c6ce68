// crates/api/src/lib.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use retort_config::ApiConfig;
use retort_core::{ReplySet, RetortError, RetortResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub mod handlers;
pub mod history;

pub use handlers::ApiHandlers;
use history::HistoryEntry;

pub const INVALID_INPUT_MESSAGE: &str = "请提供有效的输入内容";
pub const GENERATION_FAILED_MESSAGE: &str = "生成失败，请稍后重试";

/// API server
pub struct ApiServer {
    config: ApiConfig,
    metrics_enabled: bool,
    handlers: Arc<ApiHandlers>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, handlers: Arc<ApiHandlers>) -> Self {
        Self {
            config,
            metrics_enabled: true,
            handlers,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub async fn serve(self) -> RetortResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> RetortResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(
            self.handlers.clone(),
            RouterOptions {
                cors_enabled: self.config.cors_enabled,
                metrics_enabled: self.metrics_enabled,
            },
        );

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RetortError::Network(format!("Failed to bind {}: {}", addr, e)))?;

        info!("API server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RetortError::Network(e.to_string()))?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub cors_enabled: bool,
    pub metrics_enabled: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors_enabled: true,
            metrics_enabled: true,
        }
    }
}

pub fn create_router(handlers: Arc<ApiHandlers>, options: RouterOptions) -> Router {
    let mut routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/generate", post(generate_handler))
        .route("/api/history", get(history_handler).delete(clear_history_handler));

    if options.metrics_enabled {
        routes = routes.route("/metrics", get(metrics_handler));
    }

    let mut app = routes
        .layer(TraceLayer::new_for_http())
        .with_state(handlers);

    if options.cors_enabled {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

// Health check endpoint
async fn health_check(State(handlers): State<Arc<ApiHandlers>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "configured": handlers.is_configured(),
        "details": handlers.health(),
        "timestamp": chrono::Utc::now()
    }))
}

// Metrics endpoint
async fn metrics_handler(State(handlers): State<Arc<ApiHandlers>>) -> Response {
    match handlers.get_metrics() {
        Ok(text) => text.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Body of `POST /api/generate`. Fields stay loosely typed so that a wrong type
/// surfaces as a 400 with the usual error payload.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub intensity: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub responses: ReplySet,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps domain errors onto status codes and the user-facing message.
pub struct ApiError(RetortError);

impl From<RetortError> for ApiError {
    fn from(err: RetortError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RetortError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, INVALID_INPUT_MESSAGE.to_string())
            }
            RetortError::ServiceMisconfigured(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("API Key 未配置，请检查服务配置（{reason}）"),
            ),
            other => {
                error!("Generation failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERATION_FAILED_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// Rebuttal generation endpoint
async fn generate_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) =
        body.map_err(|e| handlers.reject_malformed(format!("malformed body: {e}")))?;

    let responses = handlers.generate(request).await?;
    Ok(Json(GenerateResponse { responses }))
}

async fn history_handler(State(handlers): State<Arc<ApiHandlers>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        entries: handlers.history(),
    })
}

async fn clear_history_handler(State(handlers): State<Arc<ApiHandlers>>) -> StatusCode {
    handlers.clear_history();
    StatusCode::NO_CONTENT
}
