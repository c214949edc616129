use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::features::{faculty, students};
use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState, api_keys: ApiKeys) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .nest("/api/faculty", faculty::routes::routes(api_keys.clone()))
        .nest("/api/students", students::routes::routes(api_keys))
        .with_state(state)
}
