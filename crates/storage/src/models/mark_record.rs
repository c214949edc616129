use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Component;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "verification_status")]
pub enum VerificationStatus {
    #[default]
    #[serde(rename = "Not Verified")]
    #[sqlx(rename = "Not Verified")]
    NotVerified,
    #[serde(rename = "Verified")]
    #[sqlx(rename = "Verified")]
    Verified,
}

impl VerificationStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Identifies a mark record. At most one record exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkKey {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub component: Component,
}

impl MarkKey {
    pub fn new(student_id: Uuid, course_id: Uuid, component: Component) -> Self {
        Self {
            student_id,
            course_id,
            component,
        }
    }
}

/// The marks one student obtained in one component of one course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkRecord {
    pub mark_id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub component: Component,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, minimum = 0, maximum = 100)]
    pub marks: Decimal,
    pub verification_status: VerificationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub verified_at: Option<NaiveDateTime>,
}

impl MarkRecord {
    pub fn key(&self) -> MarkKey {
        MarkKey::new(self.student_id, self.course_id, self.component)
    }
}
