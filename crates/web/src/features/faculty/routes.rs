use axum::{Router, middleware, routing::get};

use super::handlers::{list_courses, list_marks, list_students, submit_marks, update_mark};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/students", get(list_students))
        .route(
            "/marks",
            get(list_marks).post(submit_marks).put(update_mark),
        )
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
