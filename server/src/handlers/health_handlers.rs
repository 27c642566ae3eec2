// Health and service info handlers.

use axum::Json;

use crate::types::{HealthResponse, ServerInfoResponse};

pub(crate) async fn index_handler() -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: "corkboard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
