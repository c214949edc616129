use std::collections::BTreeMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::marks::CourseSummary;
use crate::dto::result::{ComponentDetail, CourseResult, VerificationRollup};
use crate::error::{Result, StorageError};
use crate::models::{Component, Course, MarkRecord};
use crate::repository::Backend;

use super::components;

/// Summarises one student's marks in one course.
///
/// Only components the course's credit requires are considered. Required
/// components without a record are pending, not zero.
pub fn course_result(course: &Course, records: &[MarkRecord]) -> CourseResult {
    let required = components::required_components(course.credit);

    let mut component_detail = BTreeMap::new();
    let mut pending_components = Vec::new();
    for component in &required {
        match records
            .iter()
            .find(|r| r.course_id == course.course_id && r.component == *component)
        {
            Some(record) => {
                component_detail.insert(
                    *component,
                    ComponentDetail {
                        marks: record.marks,
                        verification_status: record.verification_status,
                    },
                );
            }
            None => pending_components.push(*component),
        }
    }

    let ca_marks: Vec<Decimal> = component_detail
        .iter()
        .filter(|(component, _)| component.is_continuous_assessment())
        .map(|(_, detail)| detail.marks)
        .collect();

    let total_cas = (!ca_marks.is_empty()).then(|| ca_marks.iter().copied().sum::<Decimal>());
    let avg_cas = total_cas.map(|total| (total / Decimal::from(ca_marks.len())).round_dp(2));
    let ese = component_detail
        .get(&Component::Ese)
        .map(|detail| detail.marks);

    let verified = component_detail
        .values()
        .filter(|detail| detail.verification_status.is_verified())
        .count();
    let verification = VerificationRollup {
        required: required.len(),
        recorded: component_detail.len(),
        verified,
        complete: verified == required.len(),
    };

    CourseResult {
        course: CourseSummary::from(course),
        total_cas,
        avg_cas,
        ese,
        component_detail,
        pending_components,
        verification,
    }
}

/// Aggregated result for one student in one course.
pub async fn aggregate<S: Backend + ?Sized>(
    store: &S,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<CourseResult> {
    let course = store.find_course(course_id).await?;
    if !store.student_exists(student_id).await? {
        return Err(StorageError::NotFound("student"));
    }

    let records: Vec<MarkRecord> = store
        .list_by_student(student_id)
        .await?
        .into_iter()
        .filter(|r| r.course_id == course_id)
        .collect();

    Ok(course_result(&course, &records))
}

/// Aggregated results for every course the student is enrolled in.
pub async fn aggregate_all<S: Backend + ?Sized>(
    store: &S,
    student_id: Uuid,
) -> Result<Vec<CourseResult>> {
    if !store.student_exists(student_id).await? {
        return Err(StorageError::NotFound("student"));
    }

    let courses = store.enrolled_courses(student_id).await?;
    let records = store.list_by_student(student_id).await?;

    Ok(courses
        .iter()
        .map(|course| course_result(course, &records))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use crate::models::{Credit, MarkKey, Student, VerificationStatus};
    use crate::repository::MarkStore;
    use chrono::Utc;

    fn course(credit: i16) -> Course {
        Course {
            course_id: Uuid::new_v4(),
            name: "Linear Algebra".to_string(),
            code: Some("MA102".to_string()),
            credit: Credit::try_from(credit).unwrap(),
            faculty_id: None,
        }
    }

    fn record(
        course: &Course,
        component: Component,
        marks: i64,
        status: VerificationStatus,
    ) -> MarkRecord {
        let now = Utc::now().naive_utc();
        MarkRecord {
            mark_id: Uuid::new_v4(),
            student_id: Uuid::nil(),
            course_id: course.course_id,
            component,
            marks: Decimal::from(marks),
            verification_status: status,
            created_at: now,
            updated_at: now,
            verified_at: None,
        }
    }

    #[test]
    fn test_partial_grading_excludes_ungraded_components() {
        let course = course(2);
        let records = vec![record(&course, Component::Ca1, 40, VerificationStatus::NotVerified)];

        let result = course_result(&course, &records);

        assert_eq!(result.total_cas, Some(Decimal::from(40)));
        assert_eq!(result.avg_cas, Some(Decimal::from(40)));
        assert_eq!(result.ese, None);
        assert_eq!(result.pending_components, vec![Component::Ca2, Component::Ese]);
        assert!(!result.verification.complete);
    }

    #[test]
    fn test_fully_graded_three_credit_course() {
        let course = course(3);
        let records: Vec<MarkRecord> = [
            (Component::Ca1, 30),
            (Component::Ca2, 30),
            (Component::Ca3, 30),
            (Component::Ese, 60),
        ]
        .into_iter()
        .map(|(component, marks)| record(&course, component, marks, VerificationStatus::Verified))
        .collect();

        let result = course_result(&course, &records);

        assert_eq!(result.total_cas, Some(Decimal::from(90)));
        assert_eq!(result.avg_cas, Some(Decimal::from(30)));
        assert_eq!(result.ese, Some(Decimal::from(60)));
        assert!(result.pending_components.is_empty());
        assert_eq!(
            result.verification,
            VerificationRollup {
                required: 4,
                recorded: 4,
                verified: 4,
                complete: true,
            }
        );
    }

    #[test]
    fn test_nothing_graded_yields_nulls() {
        let course = course(4);
        let result = course_result(&course, &[]);

        assert_eq!(result.total_cas, None);
        assert_eq!(result.avg_cas, None);
        assert_eq!(result.ese, None);
        assert!(result.component_detail.is_empty());
        assert_eq!(result.pending_components.len(), 5);
        assert_eq!(result.verification.recorded, 0);
    }

    #[test]
    fn test_graded_zero_counts_toward_average() {
        let course = course(2);
        let records = vec![
            record(&course, Component::Ca1, 0, VerificationStatus::NotVerified),
            record(&course, Component::Ca2, 15, VerificationStatus::NotVerified),
        ];

        let result = course_result(&course, &records);

        assert_eq!(result.total_cas, Some(Decimal::from(15)));
        assert_eq!(result.avg_cas, Some(Decimal::new(750, 2)));
    }

    #[test]
    fn test_average_rounds_to_two_places() {
        let course = course(3);
        let records = vec![
            record(&course, Component::Ca1, 10, VerificationStatus::NotVerified),
            record(&course, Component::Ca2, 10, VerificationStatus::NotVerified),
            record(&course, Component::Ca3, 11, VerificationStatus::NotVerified),
        ];

        let result = course_result(&course, &records);
        assert_eq!(result.avg_cas, Some(Decimal::new(1033, 2)));
    }

    #[test]
    fn test_records_for_other_courses_are_ignored() {
        let course_a = course(1);
        let course_b = course(1);
        let records = vec![
            record(&course_a, Component::Ca1, 20, VerificationStatus::NotVerified),
            record(&course_b, Component::Ca1, 90, VerificationStatus::NotVerified),
        ];

        let result = course_result(&course_a, &records);
        assert_eq!(result.total_cas, Some(Decimal::from(20)));
    }

    #[tokio::test]
    async fn test_aggregate_reads_from_store() {
        let store = MemoryStore::new();
        let course = course(2);
        let student_id = Uuid::new_v4();
        store.insert_course(course.clone()).await;
        store
            .insert_student(Student {
                student_id,
                name: "Nisha".to_string(),
                roll_number: None,
                batch_id: None,
                program_id: None,
                division_id: None,
            })
            .await;
        store.enroll(student_id, course.course_id).await;
        store
            .upsert_mark(
                MarkKey::new(student_id, course.course_id, Component::Ca1),
                Decimal::from(40),
                true,
            )
            .await
            .unwrap();

        let result = aggregate(&store, student_id, course.course_id).await.unwrap();
        assert_eq!(result.total_cas, Some(Decimal::from(40)));
        assert_eq!(result.avg_cas, Some(Decimal::from(40)));
        assert_eq!(result.ese, None);

        let all = aggregate_all(&store, student_id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].course.course_id, course.course_id);

        let err = aggregate(&store, Uuid::new_v4(), course.course_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound("student")));
    }
}
