use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Credit;

/// A course as published by the course registry. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    #[sqlx(try_from = "i16")]
    #[schema(value_type = i16, minimum = 1, maximum = 4)]
    pub credit: Credit,
    pub faculty_id: Option<Uuid>,
}
