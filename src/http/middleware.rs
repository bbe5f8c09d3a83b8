//! Request throttling for the model endpoints

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::http::routes::AppError;

/// Reject model requests once the shared per-second quota is spent
pub async fn limit_model_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.model_limiter.check().is_err() {
        warn!(path = %request.uri().path(), "Rate limited model request");
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(request).await)
}
