use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{component_marks, course_result, entire_result, verify_marks};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/marks/component", get(component_marks))
        .route("/marks/entire-result", get(entire_result))
        .route("/marks/result", get(course_result))
        .route("/marks/verify", post(verify_marks))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
