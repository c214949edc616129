use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::Database;
use crate::error::{Result, StorageError};
use crate::models::{Component, MarkKey, MarkRecord};

use super::{MarkStore, UpsertOutcome};

const MARK_COLUMNS: &str = "mark_id, student_id, course_id, component, marks, \
     verification_status, created_at, updated_at, verified_at";

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    record: MarkRecord,
    inserted: bool,
}

/// Repository for mark record database operations
pub struct MarkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MarkRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update the marks for a key in one statement.
    ///
    /// The unique constraint on (student_id, course_id, component) serialises
    /// concurrent writers. When `freeze_verified` is set, the conditional
    /// `DO UPDATE ... WHERE` leaves verified rows untouched and returns nothing.
    pub async fn upsert(
        &self,
        key: MarkKey,
        marks: Decimal,
        freeze_verified: bool,
    ) -> Result<UpsertOutcome> {
        let sql = format!(
            r#"
            INSERT INTO mark_records (student_id, course_id, component, marks)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, course_id, component)
            DO UPDATE SET
                marks = EXCLUDED.marks,
                updated_at = CURRENT_TIMESTAMP
            WHERE mark_records.verification_status = 'Not Verified' OR NOT $5
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            MARK_COLUMNS
        );

        let row = sqlx::query_as::<_, UpsertRow>(&sql)
            .bind(key.student_id)
            .bind(key.course_id)
            .bind(key.component)
            .bind(marks)
            .bind(freeze_verified)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| missing_reference(StorageError::from(e)))?;

        match row {
            Some(UpsertRow {
                record,
                inserted: true,
            }) => Ok(UpsertOutcome::Inserted(record)),
            Some(UpsertRow { record, .. }) => Ok(UpsertOutcome::Updated(record)),
            None => {
                let existing = self
                    .find(key)
                    .await?
                    .ok_or(StorageError::NotFound("mark record"))?;
                Ok(UpsertOutcome::Frozen(existing))
            }
        }
    }

    pub async fn find(&self, key: MarkKey) -> Result<Option<MarkRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM mark_records
            WHERE student_id = $1 AND course_id = $2 AND component = $3
            "#,
            MARK_COLUMNS
        );

        let record = sqlx::query_as::<_, MarkRecord>(&sql)
            .bind(key.student_id)
            .bind(key.course_id)
            .bind(key.component)
            .fetch_optional(self.pool)
            .await?;

        Ok(record)
    }

    pub async fn set_verified(&self, key: MarkKey) -> Result<Option<MarkRecord>> {
        let sql = format!(
            r#"
            UPDATE mark_records
            SET verification_status = 'Verified',
                verified_at = COALESCE(verified_at, CURRENT_TIMESTAMP)
            WHERE student_id = $1 AND course_id = $2 AND component = $3
            RETURNING {}
            "#,
            MARK_COLUMNS
        );

        let record = sqlx::query_as::<_, MarkRecord>(&sql)
            .bind(key.student_id)
            .bind(key.course_id)
            .bind(key.component)
            .fetch_optional(self.pool)
            .await?;

        Ok(record)
    }

    pub async fn list_by_course_component(
        &self,
        course_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM mark_records
            WHERE course_id = $1 AND component = $2
            ORDER BY created_at, student_id
            "#,
            MARK_COLUMNS
        );

        let records = sqlx::query_as::<_, MarkRecord>(&sql)
            .bind(course_id)
            .bind(component)
            .fetch_all(self.pool)
            .await?;

        Ok(records)
    }

    pub async fn list_by_student_component(
        &self,
        student_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM mark_records
            WHERE student_id = $1 AND component = $2
            ORDER BY created_at, course_id
            "#,
            MARK_COLUMNS
        );

        let records = sqlx::query_as::<_, MarkRecord>(&sql)
            .bind(student_id)
            .bind(component)
            .fetch_all(self.pool)
            .await?;

        Ok(records)
    }

    pub async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<MarkRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM mark_records
            WHERE student_id = $1
            ORDER BY course_id, component
            "#,
            MARK_COLUMNS
        );

        let records = sqlx::query_as::<_, MarkRecord>(&sql)
            .bind(student_id)
            .fetch_all(self.pool)
            .await?;

        Ok(records)
    }
}

/// Maps a foreign key violation on insert to the entity that does not exist.
fn missing_reference(error: StorageError) -> StorageError {
    if !error.is_foreign_key_violation() {
        return error;
    }

    match &error {
        StorageError::Database(sqlx::Error::Database(db_err))
            if db_err.constraint().is_some_and(|c| c.contains("course")) =>
        {
            StorageError::NotFound("course")
        }
        _ => StorageError::NotFound("student"),
    }
}

#[async_trait]
impl MarkStore for Database {
    async fn upsert_mark(
        &self,
        key: MarkKey,
        marks: Decimal,
        freeze_verified: bool,
    ) -> Result<UpsertOutcome> {
        MarkRepository::new(self.pool())
            .upsert(key, marks, freeze_verified)
            .await
    }

    async fn find_mark(&self, key: MarkKey) -> Result<Option<MarkRecord>> {
        MarkRepository::new(self.pool()).find(key).await
    }

    async fn mark_verified(&self, key: MarkKey) -> Result<Option<MarkRecord>> {
        MarkRepository::new(self.pool()).set_verified(key).await
    }

    async fn list_by_course_component(
        &self,
        course_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>> {
        MarkRepository::new(self.pool())
            .list_by_course_component(course_id, component)
            .await
    }

    async fn list_by_student_component(
        &self,
        student_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>> {
        MarkRepository::new(self.pool())
            .list_by_student_component(student_id, component)
            .await
    }

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<MarkRecord>> {
        MarkRepository::new(self.pool())
            .list_by_student(student_id)
            .await
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;

    async fn seed(pool: &PgPool) -> (Uuid, Uuid) {
        let course_id: Uuid = sqlx::query_scalar(
            "INSERT INTO courses (name, credit) VALUES ('Computer Networks', 2) RETURNING course_id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let student_id: Uuid =
            sqlx::query_scalar("INSERT INTO students (name) VALUES ('Nila') RETURNING student_id")
                .fetch_one(pool)
                .await
                .unwrap();

        (student_id, course_id)
    }

    #[sqlx::test]
    async fn test_upsert_inserts_then_updates(pool: PgPool) {
        let (student_id, course_id) = seed(&pool).await;
        let repo = MarkRepository::new(&pool);
        let key = MarkKey::new(student_id, course_id, Component::Ca1);

        let first = repo.upsert(key, Decimal::new(4050, 2), true).await.unwrap();
        let UpsertOutcome::Inserted(record) = first else {
            panic!("expected an insert");
        };
        assert_eq!(record.marks, Decimal::new(4050, 2));
        assert!(!record.verification_status.is_verified());

        let second = repo.upsert(key, Decimal::from(42), true).await.unwrap();
        let UpsertOutcome::Updated(updated) = second else {
            panic!("expected an update");
        };
        assert_eq!(updated.mark_id, record.mark_id);
        assert_eq!(updated.marks, Decimal::from(42));

        let rows = repo
            .list_by_course_component(course_id, Component::Ca1)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[sqlx::test]
    async fn test_verified_record_is_frozen(pool: PgPool) {
        let (student_id, course_id) = seed(&pool).await;
        let repo = MarkRepository::new(&pool);
        let key = MarkKey::new(student_id, course_id, Component::Ese);

        repo.upsert(key, Decimal::from(55), true).await.unwrap();
        let verified = repo.set_verified(key).await.unwrap().unwrap();
        assert!(verified.verification_status.is_verified());
        assert!(verified.verified_at.is_some());

        let frozen = repo.upsert(key, Decimal::from(70), true).await.unwrap();
        let UpsertOutcome::Frozen(record) = frozen else {
            panic!("expected the verified record to stay frozen");
        };
        assert_eq!(record.marks, Decimal::from(55));

        let overwritten = repo.upsert(key, Decimal::from(70), false).await.unwrap();
        let UpsertOutcome::Updated(record) = overwritten else {
            panic!("expected an update with freezing off");
        };
        assert_eq!(record.marks, Decimal::from(70));
        assert!(record.verification_status.is_verified());
    }

    #[sqlx::test]
    async fn test_missing_references_map_to_not_found(pool: PgPool) {
        let (student_id, course_id) = seed(&pool).await;
        let repo = MarkRepository::new(&pool);

        let unknown_course = MarkKey::new(student_id, Uuid::new_v4(), Component::Ca1);
        assert!(matches!(
            repo.upsert(unknown_course, Decimal::from(10), true).await,
            Err(StorageError::NotFound("course"))
        ));

        let unknown_student = MarkKey::new(Uuid::new_v4(), course_id, Component::Ca1);
        assert!(matches!(
            repo.upsert(unknown_student, Decimal::from(10), true).await,
            Err(StorageError::NotFound("student"))
        ));

        assert!(repo
            .set_verified(MarkKey::new(student_id, course_id, Component::Ca2))
            .await
            .unwrap()
            .is_none());
    }
}
