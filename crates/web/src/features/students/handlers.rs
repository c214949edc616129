use axum::{
    Json,
    extract::{Query, State},
};
use storage::dto::{
    marks::{
        ComponentQuery, CourseQuery, StudentComponentMark, VerifyMarkRequest, VerifyMarkResponse,
    },
    result::CourseResult,
};

use crate::error::ApiResult;
use crate::middleware::caller::StudentCaller;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/students/marks/component",
    params(ComponentQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The caller's marks for one component in every course", body = Vec<StudentComponentMark>),
        (status = 400, description = "Unknown component"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a student")
    ),
    tag = "students"
)]
pub async fn component_marks(
    State(state): State<AppState>,
    StudentCaller(caller): StudentCaller,
    Query(query): Query<ComponentQuery>,
) -> ApiResult<Json<Vec<StudentComponentMark>>> {
    let marks = services::component_marks(state.backend(), caller.id, query.component).await?;

    Ok(Json(marks))
}

#[utoipa::path(
    get,
    path = "/api/students/marks/entire-result",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Aggregated result for every enrolled course", body = Vec<CourseResult>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "Student not found")
    ),
    tag = "students"
)]
pub async fn entire_result(
    State(state): State<AppState>,
    StudentCaller(caller): StudentCaller,
) -> ApiResult<Json<Vec<CourseResult>>> {
    let results = services::entire_result(state.backend(), caller.id).await?;

    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/students/marks/result",
    params(CourseQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Aggregated result for one course", body = CourseResult),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "Student or course not found")
    ),
    tag = "students"
)]
pub async fn course_result(
    State(state): State<AppState>,
    StudentCaller(caller): StudentCaller,
    Query(query): Query<CourseQuery>,
) -> ApiResult<Json<CourseResult>> {
    let result = services::course_result(state.backend(), caller.id, query.course_id).await?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/students/marks/verify",
    request_body = VerifyMarkRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Mark verified, or already verified", body = VerifyMarkResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the graded student"),
        (status = 404, description = "No mark recorded for this course component")
    ),
    tag = "students"
)]
pub async fn verify_marks(
    State(state): State<AppState>,
    StudentCaller(caller): StudentCaller,
    Json(req): Json<VerifyMarkRequest>,
) -> ApiResult<Json<VerifyMarkResponse>> {
    let response = services::verify(state.backend(), &caller, &req).await?;

    Ok(Json(response))
}
