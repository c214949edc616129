use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Faculty,
    Student,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "faculty" => Ok(Self::Faculty),
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// An already-authenticated caller, as asserted by the auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// A student may only act on their own records.
    pub fn is_student(&self, student_id: Uuid) -> bool {
        self.role == Role::Student && self.id == student_id
    }

    pub fn can_grade(&self) -> bool {
        matches!(self.role, Role::Faculty | Role::Admin)
    }
}
