use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Component, VerificationStatus};

use super::marks::CourseSummary;

/// Marks and verification state of one recorded component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDetail {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub marks: Decimal,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRollup {
    /// Components the course's credit requires.
    pub required: usize,
    pub recorded: usize,
    pub verified: usize,
    /// Every required component is recorded and verified.
    pub complete: bool,
}

/// Aggregated result of one student in one course.
///
/// Ungraded components never count as zero: `total_cas` and `avg_cas` only
/// cover recorded CA components and are null while none is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResult {
    pub course: CourseSummary,
    #[serde(rename = "totalCAs", with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub total_cas: Option<Decimal>,
    #[serde(rename = "avgCAs", with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub avg_cas: Option<Decimal>,
    #[serde(rename = "ESE", with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub ese: Option<Decimal>,
    pub component_detail: BTreeMap<Component, ComponentDetail>,
    /// Required components with no recorded mark yet, in rule order.
    pub pending_components: Vec<Component>,
    pub verification: VerificationRollup,
}
