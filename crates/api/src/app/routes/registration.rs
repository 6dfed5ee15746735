use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::Value as JsonValue;

use vitalscan_bridge::RegistrationRequest;

use crate::app::errors::json_error;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", post(register))
}

/// `POST /api/registration` — synchronous registration with fallback.
///
/// The body is decoded by hand so a missing `image` reads as a 400 with a
/// useful message instead of a generic extractor rejection.
async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<JsonValue>,
) -> Response {
    let request: RegistrationRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, "invalid_request", e.to_string()),
    };

    if request.image.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "invalid_request", "image is required");
    }

    let result = services.registration.register(&request).await;
    Json(result).into_response()
}
