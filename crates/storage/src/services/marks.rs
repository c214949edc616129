use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::dto::marks::{BatchUpsertReport, EntryError, EntryRef, MarkEntry, RosterMark};
use crate::error::{Result, StorageError};
use crate::models::{Component, Credit, MarkRecord};
use crate::repository::{Backend, UpsertOutcome};

use super::components;

/// Grading rules that are a deployment decision rather than a data rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkPolicy {
    /// Reject faculty edits to marks the student has already verified.
    pub freeze_verified: bool,
}

impl Default for MarkPolicy {
    fn default() -> Self {
        Self {
            freeze_verified: true,
        }
    }
}

/// Marks are stored with two decimal places and must lie in [0, 100].
/// Out-of-range or over-precise values are rejected, never clamped.
pub fn validate_marks(marks: Decimal) -> Result<()> {
    if marks < Decimal::ZERO || marks > Decimal::ONE_HUNDRED {
        return Err(StorageError::validation(
            "marks",
            format!("must be between 0 and 100, got {}", marks),
        ));
    }

    if marks.normalize().scale() > 2 {
        return Err(StorageError::validation(
            "marks",
            format!("must have at most two decimal places, got {}", marks),
        ));
    }

    Ok(())
}

pub fn validate_component(credit: Credit, component: Component) -> Result<()> {
    if components::is_required(credit, component) {
        Ok(())
    } else {
        Err(StorageError::validation(
            "component",
            format!(
                "{} is not graded in a {}-credit course",
                component,
                credit.get()
            ),
        ))
    }
}

/// Lookups shared across the entries of one request.
#[derive(Default)]
struct LookupCache {
    credits: HashMap<Uuid, Credit>,
    students: HashSet<Uuid>,
}

async fn write_entry<S: Backend + ?Sized>(
    store: &S,
    policy: MarkPolicy,
    entry: &MarkEntry,
    cache: &mut LookupCache,
) -> Result<MarkRecord> {
    validate_marks(entry.marks)?;

    let credit = match cache.credits.get(&entry.course_id) {
        Some(credit) => *credit,
        None => {
            let course = store.find_course(entry.course_id).await?;
            cache.credits.insert(course.course_id, course.credit);
            course.credit
        }
    };
    validate_component(credit, entry.component)?;

    if !cache.students.contains(&entry.student_id) {
        if !store.student_exists(entry.student_id).await? {
            return Err(StorageError::NotFound("student"));
        }
        cache.students.insert(entry.student_id);
    }

    match store
        .upsert_mark(entry.key(), entry.marks, policy.freeze_verified)
        .await?
    {
        UpsertOutcome::Inserted(record) => {
            tracing::info!(
                "Recorded {} marks for student {} in course {}",
                record.component,
                record.student_id,
                record.course_id
            );
            Ok(record)
        }
        UpsertOutcome::Updated(record) => {
            tracing::info!(
                "Updated {} marks for student {} in course {}",
                record.component,
                record.student_id,
                record.course_id
            );
            Ok(record)
        }
        UpsertOutcome::Frozen(_) => Err(StorageError::validation(
            "verificationStatus",
            "marks were verified by the student and can no longer be changed",
        )),
    }
}

/// Insert or update a single student's mark.
pub async fn upsert_one<S: Backend + ?Sized>(
    store: &S,
    policy: MarkPolicy,
    entry: &MarkEntry,
) -> Result<MarkRecord> {
    write_entry(store, policy, entry, &mut LookupCache::default()).await
}

/// Insert or update marks for many students.
///
/// Each entry is validated and written on its own; a rejected entry is
/// reported and the rest still go through. Backend failures abort the
/// request, leaving earlier entries written.
pub async fn upsert_many<S: Backend + ?Sized>(
    store: &S,
    policy: MarkPolicy,
    entries: &[MarkEntry],
) -> Result<BatchUpsertReport> {
    let rows = entries
        .iter()
        .map(|entry| (EntryRef::from(entry), Ok(entry.clone())))
        .collect();

    write_batch(store, policy, rows).await
}

/// Same as [`upsert_many`] for rows still in their submitted JSON form.
/// A row that does not parse is rejected like any other invalid entry.
pub async fn upsert_submitted<S: Backend + ?Sized>(
    store: &S,
    policy: MarkPolicy,
    rows: &[Value],
) -> Result<BatchUpsertReport> {
    let rows = rows
        .iter()
        .map(|row| (EntryRef::from_json(row), MarkEntry::from_json(row)))
        .collect();

    write_batch(store, policy, rows).await
}

async fn write_batch<S: Backend + ?Sized>(
    store: &S,
    policy: MarkPolicy,
    rows: Vec<(EntryRef, Result<MarkEntry>)>,
) -> Result<BatchUpsertReport> {
    let mut cache = LookupCache::default();
    let mut report = BatchUpsertReport::default();

    for (index, (entry_ref, parsed)) in rows.into_iter().enumerate() {
        let outcome = match parsed {
            Ok(entry) => write_entry(store, policy, &entry, &mut cache)
                .await
                .map(|record| (entry, record)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((entry, record)) => report.push_saved(index, &entry, record),
            Err(e) if e.is_entry_scoped() => {
                tracing::warn!("Rejected mark entry {}: {}", index, e);
                report.push_rejected(index, entry_ref, EntryError::from_storage(&e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Current marks of the given students for one course component, in the
/// order the students were requested. Ungraded students get an empty row.
pub async fn list_by_course_component<S: Backend + ?Sized>(
    store: &S,
    course_id: Uuid,
    component: Component,
    student_ids: &[Uuid],
) -> Result<Vec<RosterMark>> {
    let records = store.list_by_course_component(course_id, component).await?;
    let by_student: HashMap<Uuid, &MarkRecord> =
        records.iter().map(|r| (r.student_id, r)).collect();

    Ok(student_ids
        .iter()
        .map(|student_id| match by_student.get(student_id) {
            Some(record) => RosterMark::from(*record),
            None => RosterMark {
                student_id: *student_id,
                marks: None,
                verification_status: None,
            },
        })
        .collect())
}

pub async fn list_by_student_component<S: Backend + ?Sized>(
    store: &S,
    student_id: Uuid,
    component: Component,
) -> Result<Vec<MarkRecord>> {
    store.list_by_student_component(student_id, component).await
}

pub async fn list_by_student<S: Backend + ?Sized>(
    store: &S,
    student_id: Uuid,
) -> Result<Vec<MarkRecord>> {
    store.list_by_student(student_id).await
}
