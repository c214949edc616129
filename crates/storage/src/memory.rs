//! In-process backend holding marks and registry data in maps.
//!
//! Behaves like the Postgres backend: one record per key, last write wins on
//! `marks`, and upserts never change verification status.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::roster::RosterFilter;
use crate::error::{Result, StorageError};
use crate::models::{Component, Course, MarkKey, MarkRecord, Student, VerificationStatus};
use crate::repository::{MarkStore, Registry, UpsertOutcome};

#[derive(Default)]
struct Inner {
    marks: HashMap<MarkKey, MarkRecord>,
    courses: HashMap<Uuid, Course>,
    students: HashMap<Uuid, Student>,
    enrollments: HashSet<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_course(&self, course: Course) {
        self.inner
            .write()
            .await
            .courses
            .insert(course.course_id, course);
    }

    pub async fn insert_student(&self, student: Student) {
        self.inner
            .write()
            .await
            .students
            .insert(student.student_id, student);
    }

    pub async fn enroll(&self, student_id: Uuid, course_id: Uuid) {
        self.inner
            .write()
            .await
            .enrollments
            .insert((student_id, course_id));
    }

    pub async fn mark_count(&self) -> usize {
        self.inner.read().await.marks.len()
    }
}

fn sorted(mut records: Vec<MarkRecord>) -> Vec<MarkRecord> {
    records.sort_by_key(|r| (r.created_at, r.course_id, r.student_id, r.component));
    records
}

#[async_trait]
impl MarkStore for MemoryStore {
    async fn upsert_mark(
        &self,
        key: MarkKey,
        marks: Decimal,
        freeze_verified: bool,
    ) -> Result<UpsertOutcome> {
        let mut inner = self.inner.write().await;

        if !inner.students.contains_key(&key.student_id) {
            return Err(StorageError::NotFound("student"));
        }
        if !inner.courses.contains_key(&key.course_id) {
            return Err(StorageError::NotFound("course"));
        }

        let now = Utc::now().naive_utc();
        match inner.marks.get_mut(&key) {
            Some(record) if freeze_verified && record.verification_status.is_verified() => {
                Ok(UpsertOutcome::Frozen(record.clone()))
            }
            Some(record) => {
                record.marks = marks;
                record.updated_at = now;
                Ok(UpsertOutcome::Updated(record.clone()))
            }
            None => {
                let record = MarkRecord {
                    mark_id: Uuid::new_v4(),
                    student_id: key.student_id,
                    course_id: key.course_id,
                    component: key.component,
                    marks,
                    verification_status: VerificationStatus::NotVerified,
                    created_at: now,
                    updated_at: now,
                    verified_at: None,
                };
                inner.marks.insert(key, record.clone());
                Ok(UpsertOutcome::Inserted(record))
            }
        }
    }

    async fn find_mark(&self, key: MarkKey) -> Result<Option<MarkRecord>> {
        Ok(self.inner.read().await.marks.get(&key).cloned())
    }

    async fn mark_verified(&self, key: MarkKey) -> Result<Option<MarkRecord>> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.marks.get_mut(&key) else {
            return Ok(None);
        };

        record.verification_status = VerificationStatus::Verified;
        record
            .verified_at
            .get_or_insert_with(|| Utc::now().naive_utc());

        Ok(Some(record.clone()))
    }

    async fn list_by_course_component(
        &self,
        course_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>> {
        let inner = self.inner.read().await;
        let records = inner
            .marks
            .values()
            .filter(|r| r.course_id == course_id && r.component == component)
            .cloned()
            .collect();

        Ok(sorted(records))
    }

    async fn list_by_student_component(
        &self,
        student_id: Uuid,
        component: Component,
    ) -> Result<Vec<MarkRecord>> {
        let inner = self.inner.read().await;
        let records = inner
            .marks
            .values()
            .filter(|r| r.student_id == student_id && r.component == component)
            .cloned()
            .collect();

        Ok(sorted(records))
    }

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<MarkRecord>> {
        let inner = self.inner.read().await;
        let records = inner
            .marks
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();

        Ok(sorted(records))
    }
}

#[async_trait]
impl Registry for MemoryStore {
    async fn find_course(&self, course_id: Uuid) -> Result<Course> {
        self.inner
            .read()
            .await
            .courses
            .get(&course_id)
            .cloned()
            .ok_or(StorageError::NotFound("course"))
    }

    async fn find_courses(&self, course_ids: &[Uuid]) -> Result<Vec<Course>> {
        let inner = self.inner.read().await;
        let mut courses: Vec<Course> = course_ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| inner.courses.get(id).cloned())
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(courses)
    }

    async fn student_exists(&self, student_id: Uuid) -> Result<bool> {
        Ok(self.inner.read().await.students.contains_key(&student_id))
    }

    async fn enrolled_courses(&self, student_id: Uuid) -> Result<Vec<Course>> {
        let inner = self.inner.read().await;
        let course_ids: HashSet<Uuid> = inner
            .enrollments
            .iter()
            .filter(|(student, _)| *student == student_id)
            .map(|(_, course)| *course)
            .chain(
                inner
                    .marks
                    .values()
                    .filter(|r| r.student_id == student_id)
                    .map(|r| r.course_id),
            )
            .collect();

        let mut courses: Vec<Course> = course_ids
            .iter()
            .filter_map(|id| inner.courses.get(id).cloned())
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(courses)
    }

    async fn courses_for_faculty(&self, faculty_id: Uuid) -> Result<Vec<Course>> {
        let inner = self.inner.read().await;
        let mut courses: Vec<Course> = inner
            .courses
            .values()
            .filter(|c| c.faculty_id == Some(faculty_id))
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(courses)
    }

    async fn filter_students(&self, filter: &RosterFilter) -> Result<Vec<Student>> {
        let inner = self.inner.read().await;
        let mut students: Vec<Student> = inner
            .students
            .values()
            .filter(|s| filter.matches(s.batch_id, s.program_id, s.division_id))
            .cloned()
            .collect();
        students.sort_by(|a, b| {
            (a.roll_number.is_none(), &a.roll_number, &a.name).cmp(&(
                b.roll_number.is_none(),
                &b.roll_number,
                &b.name,
            ))
        });

        Ok(students)
    }
}
