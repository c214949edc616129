use storage::{
    Backend,
    dto::{
        marks::{BatchUpsertReport, FacultyCourse, FacultyMarksQuery, MarkEntry, RosterMark},
        roster::RosterFilter,
    },
    error::Result,
    models::{MarkRecord, Student},
    services::{MarkPolicy, components, marks},
};
use serde_json::Value;
use uuid::Uuid;

/// Courses assigned to a faculty member with the components to grade
pub async fn list_courses(backend: &dyn Backend, faculty_id: Uuid) -> Result<Vec<FacultyCourse>> {
    let courses = backend.courses_for_faculty(faculty_id).await?;

    Ok(courses
        .into_iter()
        .map(|course| FacultyCourse {
            components: components::required_components(course.credit),
            course_id: course.course_id,
            name: course.name,
            code: course.code,
            credit: course.credit.into(),
        })
        .collect())
}

/// Students matching a batch/program/division filter
pub async fn list_students(backend: &dyn Backend, filter: &RosterFilter) -> Result<Vec<Student>> {
    backend.filter_students(filter).await
}

/// Marks for one course component.
///
/// With a roster filter, every rostered student gets a row in roster order.
/// Without one, only students that already have a mark are listed.
pub async fn roster_marks(backend: &dyn Backend, query: &FacultyMarksQuery) -> Result<Vec<RosterMark>> {
    let Some(filter) = query.roster_filter() else {
        let records = backend
            .list_by_course_component(query.course_id, query.component)
            .await?;
        return Ok(records.iter().map(RosterMark::from).collect());
    };

    let student_ids: Vec<Uuid> = backend
        .filter_students(&filter)
        .await?
        .into_iter()
        .map(|s| s.student_id)
        .collect();

    marks::list_by_course_component(backend, query.course_id, query.component, &student_ids).await
}

/// Save marks for many students. Rows arrive as raw JSON and are parsed one
/// by one.
pub async fn submit_marks(
    backend: &dyn Backend,
    policy: MarkPolicy,
    rows: &[Value],
) -> Result<BatchUpsertReport> {
    marks::upsert_submitted(backend, policy, rows).await
}

/// Save or correct one student's mark
pub async fn update_mark(
    backend: &dyn Backend,
    policy: MarkPolicy,
    entry: &MarkEntry,
) -> Result<MarkRecord> {
    marks::upsert_one(backend, policy, entry).await
}
