use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: Uuid,
    pub name: String,
    pub roll_number: Option<String>,
    pub batch_id: Option<Uuid>,
    pub program_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}
