use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Caller, Component, MarkKey, MarkRecord};
use crate::repository::Backend;

#[derive(Debug, Clone)]
pub struct Verification {
    pub record: MarkRecord,
    /// False when the record was already verified and nothing was written.
    pub changed: bool,
}

/// Moves a mark record from `NotVerified` to `Verified`.
///
/// Only the graded student may verify, and only a record that exists.
/// Verifying an already verified record succeeds without writing. There is
/// no way back to `NotVerified` from here.
pub async fn verify<S: Backend + ?Sized>(
    store: &S,
    caller: &Caller,
    student_id: Uuid,
    course_id: Uuid,
    component: Component,
) -> Result<Verification> {
    if !caller.is_student(student_id) {
        tracing::warn!(
            "Caller {} tried to verify marks belonging to student {}",
            caller.id,
            student_id
        );
        return Err(StorageError::Forbidden(
            "only the graded student can verify these marks".to_string(),
        ));
    }

    let key = MarkKey::new(student_id, course_id, component);
    let existing = store
        .find_mark(key)
        .await?
        .ok_or(StorageError::NotFound("mark record"))?;

    if existing.verification_status.is_verified() {
        return Ok(Verification {
            record: existing,
            changed: false,
        });
    }

    let record = store
        .mark_verified(key)
        .await?
        .ok_or(StorageError::NotFound("mark record"))?;

    tracing::info!(
        "Student {} verified {} marks in course {}",
        student_id,
        component,
        course_id
    );

    Ok(Verification {
        record,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use crate::models::{Course, Credit, Role, Student, VerificationStatus};
    use crate::repository::MarkStore;
    use rust_decimal::Decimal;

    async fn graded_store() -> (MemoryStore, Uuid, Uuid) {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        store
            .insert_course(Course {
                course_id,
                name: "Networks".to_string(),
                code: None,
                credit: Credit::try_from(2).unwrap(),
                faculty_id: None,
            })
            .await;
        store
            .insert_student(Student {
                student_id,
                name: "Kiran".to_string(),
                roll_number: None,
                batch_id: None,
                program_id: None,
                division_id: None,
            })
            .await;
        store
            .upsert_mark(
                MarkKey::new(student_id, course_id, Component::Ca1),
                Decimal::from(44),
                true,
            )
            .await
            .unwrap();

        (store, student_id, course_id)
    }

    #[tokio::test]
    async fn test_verify_missing_record_is_not_found() {
        let (store, student_id, course_id) = graded_store().await;
        let caller = Caller::new(student_id, Role::Student);

        let err = verify(&store, &caller, student_id, course_id, Component::Ca2)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound("mark record")));
    }

    #[tokio::test]
    async fn test_verify_is_idempotent() {
        let (store, student_id, course_id) = graded_store().await;
        let caller = Caller::new(student_id, Role::Student);

        let first = verify(&store, &caller, student_id, course_id, Component::Ca1)
            .await
            .unwrap();
        assert!(first.changed);
        assert_eq!(first.record.verification_status, VerificationStatus::Verified);
        assert_eq!(first.record.marks, Decimal::from(44));

        let second = verify(&store, &caller, student_id, course_id, Component::Ca1)
            .await
            .unwrap();
        assert!(!second.changed);
        assert_eq!(second.record.verification_status, VerificationStatus::Verified);
        assert_eq!(second.record.verified_at, first.record.verified_at);
    }

    #[tokio::test]
    async fn test_only_owner_can_verify() {
        let (store, student_id, course_id) = graded_store().await;

        for caller in [
            Caller::new(Uuid::new_v4(), Role::Student),
            Caller::new(student_id, Role::Faculty),
        ] {
            let err = verify(&store, &caller, student_id, course_id, Component::Ca1)
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::Forbidden(_)));
        }

        let record = store
            .find_mark(MarkKey::new(student_id, course_id, Component::Ca1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.verification_status, VerificationStatus::NotVerified);
    }
}
