use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(s): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "opensase-marketplace",
        "events": s.publisher.is_enabled(),
    }))
}
