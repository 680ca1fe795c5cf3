//! Health check handler.

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. No auth, no storage access.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "imglens",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
