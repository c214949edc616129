use std::collections::HashMap;

use storage::{
    Backend,
    dto::{
        marks::{CourseSummary, StudentComponentMark, VerifyMarkRequest, VerifyMarkResponse},
        result::CourseResult,
    },
    error::Result,
    models::{Caller, Component, Course},
    services::{aggregation, marks, verification},
};
use uuid::Uuid;

/// One component's marks across all of a student's courses
pub async fn component_marks(
    backend: &dyn Backend,
    student_id: Uuid,
    component: Component,
) -> Result<Vec<StudentComponentMark>> {
    let records = marks::list_by_student_component(backend, student_id, component).await?;

    let course_ids: Vec<Uuid> = records.iter().map(|r| r.course_id).collect();
    let courses: HashMap<Uuid, Course> = backend
        .find_courses(&course_ids)
        .await?
        .into_iter()
        .map(|c| (c.course_id, c))
        .collect();

    Ok(records
        .into_iter()
        .filter_map(|record| {
            let course = courses.get(&record.course_id)?;
            Some(StudentComponentMark {
                course: CourseSummary::from(course),
                component: record.component,
                marks: record.marks,
                verification_status: record.verification_status,
            })
        })
        .collect())
}

/// Aggregated result for every course the student takes
pub async fn entire_result(backend: &dyn Backend, student_id: Uuid) -> Result<Vec<CourseResult>> {
    aggregation::aggregate_all(backend, student_id).await
}

/// Aggregated result for a single course
pub async fn course_result(
    backend: &dyn Backend,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<CourseResult> {
    aggregation::aggregate(backend, student_id, course_id).await
}

/// Verify the caller's own mark
pub async fn verify(
    backend: &dyn Backend,
    caller: &Caller,
    request: &VerifyMarkRequest,
) -> Result<VerifyMarkResponse> {
    let outcome = verification::verify(
        backend,
        caller,
        caller.id,
        request.course_id,
        request.component,
    )
    .await?;

    Ok(VerifyMarkResponse {
        record: outcome.record,
        changed: outcome.changed,
    })
}
