use axum::{
    Json,
    extract::{Query, State},
};
use storage::{
    dto::{
        marks::{
            BatchUpsertReport, FacultyCourse, FacultyMarksQuery, MarkEntry, RosterMark,
            SubmitMarksRequest,
        },
        roster::RosterFilter,
    },
    models::{MarkRecord, Student},
};
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::caller::FacultyCaller;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/faculty/courses",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Courses assigned to the calling faculty member", body = Vec<FacultyCourse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not faculty")
    ),
    tag = "faculty"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    FacultyCaller(caller): FacultyCaller,
) -> ApiResult<Json<Vec<FacultyCourse>>> {
    let courses = services::list_courses(state.backend(), caller.id).await?;

    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/faculty/students",
    params(RosterFilter),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Students matching the roster filter", body = Vec<Student>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not faculty")
    ),
    tag = "faculty"
)]
pub async fn list_students(
    State(state): State<AppState>,
    FacultyCaller(_caller): FacultyCaller,
    Query(filter): Query<RosterFilter>,
) -> ApiResult<Json<Vec<Student>>> {
    let students = services::list_students(state.backend(), &filter).await?;

    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/faculty/marks",
    params(FacultyMarksQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Marks for the course component, one row per student", body = Vec<RosterMark>),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not faculty")
    ),
    tag = "faculty"
)]
pub async fn list_marks(
    State(state): State<AppState>,
    FacultyCaller(_caller): FacultyCaller,
    Query(query): Query<FacultyMarksQuery>,
) -> ApiResult<Json<Vec<RosterMark>>> {
    let rows = services::roster_marks(state.backend(), &query).await?;

    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/faculty/marks",
    request_body = SubmitMarksRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Per-entry outcome; rejected entries do not block the others", body = BatchUpsertReport),
        (status = 400, description = "Empty submission"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not faculty")
    ),
    tag = "faculty"
)]
pub async fn submit_marks(
    State(state): State<AppState>,
    FacultyCaller(caller): FacultyCaller,
    Json(req): Json<SubmitMarksRequest>,
) -> ApiResult<Json<BatchUpsertReport>> {
    req.validate()?;

    let report = services::submit_marks(state.backend(), state.policy, &req.marks).await?;
    tracing::info!(
        "Faculty {} submitted {} marks: {} saved, {} rejected",
        caller.id,
        req.marks.len(),
        report.saved,
        report.rejected
    );

    Ok(Json(report))
}

#[utoipa::path(
    put,
    path = "/api/faculty/marks",
    request_body = MarkEntry,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Mark saved", body = MarkRecord),
        (status = 400, description = "Marks out of range, component not graded in this course, or marks already verified"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not faculty"),
        (status = 404, description = "Student or course not found")
    ),
    tag = "faculty"
)]
pub async fn update_mark(
    State(state): State<AppState>,
    FacultyCaller(_caller): FacultyCaller,
    Json(entry): Json<MarkEntry>,
) -> ApiResult<Json<MarkRecord>> {
    let record = services::update_mark(state.backend(), state.policy, &entry).await?;

    Ok(Json(record))
}
