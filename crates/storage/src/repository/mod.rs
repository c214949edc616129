use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::roster::RosterFilter;
use crate::error::Result;
use crate::models::{Component, Course, MarkKey, MarkRecord, Student};

pub mod mark;
pub mod registry;

/// What an upsert did to the stored record.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Inserted(MarkRecord),
    Updated(MarkRecord),
    /// The record is verified and verified marks are frozen; nothing was written.
    Frozen(MarkRecord),
}

/// Persistence for mark records. The backend owns the uniqueness of
/// (student, course, component); concurrent writes to one key are
/// last-write-wins on `marks`.
#[async_trait]
pub trait MarkStore: Send + Sync {
    /// Inserts or overwrites `marks` for `key`. Verification status is never
    /// touched. With `freeze_verified`, verified records are left as they are.
    async fn upsert_mark(
        &self,
        key: MarkKey,
        marks: Decimal,
        freeze_verified: bool,
    ) -> Result<UpsertOutcome>;

    async fn find_mark(&self, key: MarkKey) -> Result<Option<MarkRecord>>;

    /// Sets the record to verified. Returns `None` if no record exists.
    async fn mark_verified(&self, key: MarkKey) -> Result<Option<MarkRecord>>;

    async fn list_by_course_component(
        &self,
        course_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>>;

    async fn list_by_student_component(
        &self,
        student_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>>;

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<MarkRecord>>;
}

/// Read access to the course registry and the enrollment roster.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Fails with `NotFound("course")` for unknown ids.
    async fn find_course(&self, course_id: Uuid) -> Result<Course>;

    async fn find_courses(&self, course_ids: &[Uuid]) -> Result<Vec<Course>>;

    async fn student_exists(&self, student_id: Uuid) -> Result<bool>;

    /// Courses a student is enrolled in or already holds marks for.
    async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>>;

    async fn courses_for_faculty(&self, faculty_id: Uuid) -> Result<Vec<Course>>;

    async fn filter_students(&self, filter: &RosterFilter) -> Result<Vec<Student>>;
}

/// Everything the marks services need from a storage backend.
pub trait Backend: MarkStore + Registry {}

impl<T: MarkStore + Registry + ?Sized> Backend for T {}
