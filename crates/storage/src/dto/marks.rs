use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::StorageError;
use crate::models::{Component, MarkKey, MarkRecord, VerificationStatus};

use super::roster::RosterFilter;

/// One mark as submitted by faculty. `marks` is read from a JSON number or
/// a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub component: Component,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64, minimum = 0, maximum = 100)]
    pub marks: Decimal,
}

impl MarkEntry {
    pub fn key(&self) -> MarkKey {
        MarkKey::new(self.student_id, self.course_id, self.component)
    }

    /// Reads one submitted row field by field, so a malformed row is
    /// rejected on its own with the offending field named.
    pub fn from_json(row: &Value) -> Result<Self, StorageError> {
        let row = row
            .as_object()
            .ok_or_else(|| StorageError::validation("entry", "must be a JSON object"))?;

        Ok(Self {
            student_id: uuid_field(row, "studentId")?,
            course_id: uuid_field(row, "courseId")?,
            component: component_field(row)?,
            marks: marks_field(row)?,
        })
    }
}

fn uuid_field(row: &Map<String, Value>, field: &'static str) -> Result<Uuid, StorageError> {
    row.get(field)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StorageError::validation(field, "must be a UUID"))
}

fn component_field(row: &Map<String, Value>) -> Result<Component, StorageError> {
    match row.get("component").and_then(Value::as_str) {
        Some(code) => Component::from_code(code).ok_or_else(|| {
            StorageError::validation("component", format!("unknown component '{}'", code))
        }),
        None => Err(StorageError::validation(
            "component",
            "must be one of CA1, CA2, CA3, CA4, ESE",
        )),
    }
}

fn marks_field(row: &Map<String, Value>) -> Result<Decimal, StorageError> {
    let text = match row.get("marks") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        _ => return Err(StorageError::validation("marks", "must be a number")),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| StorageError::validation("marks", format!("'{}' is not a number", text)))
}

/// Request payload for saving marks for a whole roster at once.
///
/// Rows stay raw JSON here; each is parsed on its own so that one malformed
/// row is reported in the batch outcome instead of failing the request.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitMarksRequest {
    #[validate(length(min = 1, message = "At least one mark entry is required"))]
    #[schema(value_type = Vec<MarkEntry>)]
    pub marks: Vec<Value>,
}

/// Whatever identifies a submitted row, as far as it could be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryRef {
    pub student_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub component: Option<Component>,
}

impl EntryRef {
    pub fn from_json(row: &Value) -> Self {
        let Some(row) = row.as_object() else {
            return Self::default();
        };

        Self {
            student_id: uuid_field(row, "studentId").ok(),
            course_id: uuid_field(row, "courseId").ok(),
            component: component_field(row).ok(),
        }
    }
}

impl From<&MarkEntry> for EntryRef {
    fn from(entry: &MarkEntry) -> Self {
        Self {
            student_id: Some(entry.student_id),
            course_id: Some(entry.course_id),
            component: Some(entry.component),
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FacultyMarksQuery {
    pub course_id: Uuid,
    pub component: Component,
    pub batch_id: Option<Uuid>,
    pub program_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

impl FacultyMarksQuery {
    /// The roster to project marks onto, if the caller narrowed one down.
    pub fn roster_filter(&self) -> Option<RosterFilter> {
        let filter = RosterFilter {
            batch_id: self.batch_id,
            program_id: self.program_id,
            division_id: self.division_id,
        };
        (!filter.is_empty()).then_some(filter)
    }
}

/// A row of the faculty marks-entry table. `marks` is null for students
/// that have not been graded in this component yet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterMark {
    pub student_id: Uuid,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub marks: Option<Decimal>,
    pub verification_status: Option<VerificationStatus>,
}

impl From<&MarkRecord> for RosterMark {
    fn from(record: &MarkRecord) -> Self {
        Self {
            student_id: record.student_id,
            marks: Some(record.marks),
            verification_status: Some(record.verification_status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryError {
    pub kind: ErrorKind,
    pub field: Option<String>,
    pub message: String,
}

impl EntryError {
    /// Builds the per-row error for an entry-scoped storage error.
    pub fn from_storage(error: &StorageError) -> Self {
        let (kind, field) = match error {
            StorageError::Validation { field, .. } => (ErrorKind::Validation, Some(field.to_string())),
            StorageError::NotFound(entity) => (ErrorKind::NotFound, id_field(entity)),
            _ => (ErrorKind::Conflict, None),
        };

        Self {
            kind,
            field,
            message: error.to_string(),
        }
    }
}

fn id_field(entity: &str) -> Option<String> {
    match entity {
        "student" => Some("studentId".to_string()),
        "course" => Some("courseId".to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryOutcome {
    /// Position of the entry in the submitted list.
    pub index: usize,
    /// Null when the row was too malformed to read the field.
    pub student_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub component: Option<Component>,
    pub saved: bool,
    pub record: Option<MarkRecord>,
    pub error: Option<EntryError>,
}

/// Per-entry result of a batch submission. Rejected rows never block the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpsertReport {
    pub saved: usize,
    pub rejected: usize,
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchUpsertReport {
    pub fn push_saved(&mut self, index: usize, entry: &MarkEntry, record: MarkRecord) {
        self.saved += 1;
        self.outcomes.push(EntryOutcome {
            index,
            student_id: Some(entry.student_id),
            course_id: Some(entry.course_id),
            component: Some(entry.component),
            saved: true,
            record: Some(record),
            error: None,
        });
    }

    pub fn push_rejected(&mut self, index: usize, entry: EntryRef, error: EntryError) {
        self.rejected += 1;
        self.outcomes.push(EntryOutcome {
            index,
            student_id: entry.student_id,
            course_id: entry.course_id,
            component: entry.component,
            saved: false,
            record: None,
            error: Some(error),
        });
    }

    pub fn failed(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| !o.saved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMarkRequest {
    pub course_id: Uuid,
    pub component: Component,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMarkResponse {
    pub record: MarkRecord,
    /// False when the record had already been verified.
    pub changed: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ComponentQuery {
    pub component: Component,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CourseQuery {
    pub course_id: Uuid,
}

/// One course's mark for a single component, as shown to the student.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentComponentMark {
    pub course: CourseSummary,
    pub component: Component,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub marks: Decimal,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub credit: i16,
}

impl From<&crate::models::Course> for CourseSummary {
    fn from(course: &crate::models::Course) -> Self {
        Self {
            course_id: course.course_id,
            name: course.name.clone(),
            code: course.code.clone(),
            credit: course.credit.into(),
        }
    }
}

/// A course assigned to a faculty member, with the components it is graded on.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacultyCourse {
    pub course_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub credit: i16,
    pub components: Vec<Component>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_entry_accepts_numbers_and_strings() {
        let course_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let json = format!(
            r#"{{"studentId":"{}","courseId":"{}","component":"CA2","marks":"37.5"}}"#,
            student_id, course_id
        );
        let entry: MarkEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry.marks, Decimal::new(375, 1));
        assert_eq!(entry.component, Component::Ca2);

        let json = format!(
            r#"{{"studentId":"{}","courseId":"{}","component":"ESE","marks":81}}"#,
            student_id, course_id
        );
        let entry: MarkEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry.marks, Decimal::from(81));
    }

    #[test]
    fn test_row_parsing_names_the_bad_field() {
        let student_id = Uuid::new_v4();
        let course_id = Uuid::new_v4();

        let entry = MarkEntry::from_json(&serde_json::json!({
            "studentId": student_id,
            "courseId": course_id,
            "component": "CA1",
            "marks": " 37.5 "
        }))
        .unwrap();
        assert_eq!(entry.marks, Decimal::new(375, 1));
        assert_eq!(entry.key(), MarkKey::new(student_id, course_id, Component::Ca1));

        let rejected_field = |row: serde_json::Value| match MarkEntry::from_json(&row) {
            Err(StorageError::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {:?}", other),
        };
        assert_eq!(
            rejected_field(serde_json::json!({
                "studentId": student_id, "courseId": course_id, "component": "CA1", "marks": "abc"
            })),
            "marks"
        );
        assert_eq!(
            rejected_field(serde_json::json!({
                "studentId": student_id, "courseId": course_id, "component": "CA5", "marks": 10
            })),
            "component"
        );
        assert_eq!(
            rejected_field(serde_json::json!({
                "studentId": "42", "courseId": course_id, "component": "CA1", "marks": 10
            })),
            "studentId"
        );
        assert_eq!(rejected_field(serde_json::json!([1, 2])), "entry");
    }

    #[test]
    fn test_entry_ref_keeps_readable_fields() {
        let course_id = Uuid::new_v4();
        let entry = EntryRef::from_json(&serde_json::json!({
            "studentId": "nope",
            "courseId": course_id,
            "component": "ESE",
            "marks": "abc"
        }));
        assert_eq!(entry.student_id, None);
        assert_eq!(entry.course_id, Some(course_id));
        assert_eq!(entry.component, Some(Component::Ese));
    }

    #[test]
    fn test_marks_are_sent_as_numbers() {
        let row = RosterMark {
            student_id: Uuid::new_v4(),
            marks: Some(Decimal::new(4050, 2)),
            verification_status: Some(VerificationStatus::Verified),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["marks"], 40.5);

        let ungraded = RosterMark {
            marks: None,
            verification_status: None,
            ..row
        };
        assert!(serde_json::to_value(&ungraded).unwrap()["marks"].is_null());
    }

    #[test]
    fn test_empty_submission_is_invalid() {
        let request = SubmitMarksRequest { marks: vec![] };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_roster_filter_only_when_narrowed() {
        let mut query = FacultyMarksQuery {
            course_id: Uuid::new_v4(),
            component: Component::Ca1,
            batch_id: None,
            program_id: None,
            division_id: None,
        };
        assert!(query.roster_filter().is_none());

        query.division_id = Some(Uuid::new_v4());
        assert_eq!(query.roster_filter().unwrap().division_id, query.division_id);
    }

    #[test]
    fn test_entry_error_for_missing_student() {
        let error = EntryError::from_storage(&StorageError::NotFound("student"));
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert_eq!(error.field.as_deref(), Some("studentId"));
    }
}
