use std::sync::Arc;

use axum::{Extension, Json, response::IntoResponse};

use vitalscan_broker::BrokerState;

use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let broker = match services.broker.state() {
        BrokerState::Connected => "connected",
        BrokerState::Disconnected => "disconnected",
    };

    Json(serde_json::json!({
        "status": "ok",
        "broker": broker,
    }))
}
