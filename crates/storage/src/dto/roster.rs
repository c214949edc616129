use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Narrows the student roster by organisational unit. Unset fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RosterFilter {
    pub batch_id: Option<Uuid>,
    pub program_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

impl RosterFilter {
    pub fn is_empty(&self) -> bool {
        self.batch_id.is_none() && self.program_id.is_none() && self.division_id.is_none()
    }

    pub fn matches(
        &self,
        batch_id: Option<Uuid>,
        program_id: Option<Uuid>,
        division_id: Option<Uuid>,
    ) -> bool {
        fn field_matches(wanted: Option<Uuid>, actual: Option<Uuid>) -> bool {
            wanted.is_none() || wanted == actual
        }

        field_matches(self.batch_id, batch_id)
            && field_matches(self.program_id, program_id)
            && field_matches(self.division_id, division_id)
    }
}
