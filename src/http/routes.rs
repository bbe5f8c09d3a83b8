//! HTTP route definitions

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::app::AppState;
use crate::assets::{ModelEntry, StoreError};
use crate::http::middleware::limit_model_requests;
use crate::obj::{LoadError, ModelSummary, ParsedObject};
use crate::util::time::uptime_secs;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_origin);
    let body_limit = usize::try_from(state.config.max_model_bytes).unwrap_or(usize::MAX);

    // Model routes share one rate limiter
    let model_routes = Router::new()
        .route("/models", get(list_models_handler))
        .route("/models/parse", post(parse_model_handler))
        .route("/models/:name", get(model_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), limit_model_requests));

    Router::new()
        .route("/health", get(health_handler))
        .merge(model_routes)
        .nest_service("/assets", ServeDir::new(&state.config.asset_dir))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for a comma-separated origin list, `*` allows any origin
fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if client_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();

    cors.allow_origin(allowed_origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    cached_models: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        cached_models: state.models.cached_count(),
    })
}

// ============================================================================
// Model endpoints
// ============================================================================

#[derive(Serialize)]
struct ModelListResponse {
    models: Vec<ModelEntry>,
}

#[derive(Serialize)]
struct ModelResponse {
    name: Option<String>,
    summary: ModelSummary,
    objects: Arc<Vec<ParsedObject>>,
}

impl ModelResponse {
    fn new(name: Option<String>, objects: Arc<Vec<ParsedObject>>) -> Self {
        Self {
            name,
            summary: ModelSummary::of(&objects),
            objects,
        }
    }
}

async fn list_models_handler(
    State(state): State<AppState>,
) -> Result<Json<ModelListResponse>, AppError> {
    let models = state.models.list().await?;
    Ok(Json(ModelListResponse { models }))
}

async fn model_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ModelResponse>, AppError> {
    let objects = state.models.get(&name).await?;
    Ok(Json(ModelResponse::new(Some(name), objects)))
}

/// Parse OBJ text posted by the client
async fn parse_model_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ModelResponse>, AppError> {
    let objects = state.models.parse_text(body).await?;
    Ok(Json(ModelResponse::new(None, Arc::new(objects))))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unprocessable model: {0}")]
    Unprocessable(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidName(_) => AppError::BadRequest(err.to_string()),
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::Parse(_) | StoreError::Load(LoadError::Parse { .. }) => {
                warn!(error = %err, "Model parse failed");
                AppError::Unprocessable(err.to_string())
            }
            StoreError::Load(LoadError::TooLarge { .. }) => {
                AppError::PayloadTooLarge(err.to_string())
            }
            StoreError::Load(LoadError::Io { .. }) | StoreError::Io(_) | StoreError::Task(_) => {
                error!(error = %err, "Model store failure");
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::TooManyRequests => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::Config;

    const P90: &str = "\
# weapon
mtllib p90.mtl
o Barrel
usemtl steel
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
o Grip
v 0 0 1
v 1 0 1
v 0 1 1
f -3 -2 -1
";

    fn test_state(dir: &std::path::Path, rate_limit: u32) -> AppState {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.asset_dir = dir.to_path_buf();
        config.parse_rate_limit = rate_limit;
        config.max_model_bytes = 4096;
        AppState::new(config)
    }

    fn app_with(files: &[(&str, &str)], rate_limit: u32) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        let router = build_router(test_state(dir.path(), rate_limit));
        (dir, router)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, router) = app_with(&[], 100);
        let (status, json) = send(router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cached_models"], 0);
    }

    #[tokio::test]
    async fn test_list_models() {
        let (_dir, router) = app_with(&[("p90.obj", P90), ("notes.txt", "hi")], 100);
        let (status, json) = send(router, get("/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["models"][0]["name"], "p90");
        assert_eq!(json["models"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_model() {
        let (_dir, router) = app_with(&[("p90.obj", P90)], 100);
        let (status, json) = send(router, get("/models/p90")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "p90");
        assert_eq!(json["summary"]["objects"], 2);
        assert_eq!(json["summary"]["triangles"], 3);
        assert_eq!(json["objects"][0]["name"], "Barrel");
        assert_eq!(json["objects"][0]["materialName"], "steel");
        assert_eq!(json["objects"][1]["materialName"], "");
        assert_eq!(
            json["objects"][1]["geometry"]["positions"].as_array().unwrap().len(),
            9
        );
    }

    #[tokio::test]
    async fn test_missing_model_is_404() {
        let (_dir, router) = app_with(&[], 100);
        let (status, json) = send(router, get("/models/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_invalid_name_is_400() {
        let (_dir, router) = app_with(&[], 100);
        let (status, _) = send(router, get("/models/..")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_broken_model_is_422() {
        let (_dir, router) = app_with(&[("broken.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 99\n")], 100);
        let (status, json) = send(router, get("/models/broken")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("99"));
    }

    #[tokio::test]
    async fn test_parse_posted_text() {
        let (_dir, router) = app_with(&[], 100);
        let (status, json) = send(router, post("/models/parse", P90)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["name"].is_null());
        assert_eq!(json["summary"]["triangles"], 3);
        assert_eq!(json["summary"]["bounds"]["max"], serde_json::json!([1.0, 1.0, 1.0]));
    }

    #[tokio::test]
    async fn test_parse_posted_bad_number_is_422() {
        let (_dir, router) = app_with(&[], 100);
        let (status, _) = send(router, post("/models/parse", "v 1 two 3\n")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_oversize_post_rejected() {
        let (_dir, router) = app_with(&[], 100);
        let body = "v 0 0 0\n".repeat(1024);
        let (status, _) = send(router, post("/models/parse", &body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_model_routes_rate_limited() {
        let (_dir, router) = app_with(&[("p90.obj", P90)], 1);
        let (status, _) = send(router.clone(), get("/models")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(router.clone(), get("/models")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], "Too many requests");

        // Health is outside the limiter
        let (status, _) = send(router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_raw_assets_served() {
        let (_dir, router) = app_with(&[("p90.obj", P90)], 100);
        let response = router.oneshot(get("/assets/p90.obj")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, P90.as_bytes());
    }
}
