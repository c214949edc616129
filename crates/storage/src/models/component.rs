use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// A gradable unit of a course.
///
/// `Ca1`..`Ca4` are continuous assessments, `Ese` is the end-semester exam.
/// Which of these a course actually uses depends on its [`Credit`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "mark_component")]
pub enum Component {
    #[serde(rename = "CA1")]
    #[sqlx(rename = "CA1")]
    Ca1,
    #[serde(rename = "CA2")]
    #[sqlx(rename = "CA2")]
    Ca2,
    #[serde(rename = "CA3")]
    #[sqlx(rename = "CA3")]
    Ca3,
    #[serde(rename = "CA4")]
    #[sqlx(rename = "CA4")]
    Ca4,
    #[serde(rename = "ESE")]
    #[sqlx(rename = "ESE")]
    Ese,
}

impl Component {
    pub const ALL: [Component; 5] = [
        Component::Ca1,
        Component::Ca2,
        Component::Ca3,
        Component::Ca4,
        Component::Ese,
    ];

    /// Looks a component up by its wire name (`"CA1"` .. `"ESE"`).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ca1 => "CA1",
            Self::Ca2 => "CA2",
            Self::Ca3 => "CA3",
            Self::Ca4 => "CA4",
            Self::Ese => "ESE",
        }
    }

    /// True for the CA family (everything except ESE).
    pub fn is_continuous_assessment(&self) -> bool {
        !matches!(self, Self::Ese)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("credit must be between 1 and 4, got {0}")]
pub struct InvalidCredit(pub i16);

/// Credit value of a course, always within 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Credit(u8);

impl Credit {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 4;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i16> for Credit {
    type Error = InvalidCredit;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidCredit(value))
        }
    }
}

impl From<Credit> for i16 {
    fn from(credit: Credit) -> Self {
        credit.0 as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_wire_names() {
        let json = serde_json::to_string(&Component::Ca3).unwrap();
        assert_eq!(json, "\"CA3\"");

        let parsed: Component = serde_json::from_str("\"ESE\"").unwrap();
        assert_eq!(parsed, Component::Ese);
        assert!(serde_json::from_str::<Component>("\"CA5\"").is_err());
    }

    #[test]
    fn test_component_from_code() {
        assert_eq!(Component::from_code("CA3"), Some(Component::Ca3));
        assert_eq!(Component::from_code("ESE"), Some(Component::Ese));
        assert_eq!(Component::from_code("CA5"), None);
        assert_eq!(Component::from_code("ca1"), None);
    }

    #[test]
    fn test_ese_is_not_continuous_assessment() {
        let cas: Vec<_> = Component::ALL
            .into_iter()
            .filter(Component::is_continuous_assessment)
            .collect();
        assert_eq!(
            cas,
            vec![Component::Ca1, Component::Ca2, Component::Ca3, Component::Ca4]
        );
    }

    #[test]
    fn test_credit_range() {
        assert!(Credit::try_from(0).is_err());
        assert!(Credit::try_from(5).is_err());
        assert_eq!(Credit::try_from(4).unwrap().get(), 4);
        assert!(serde_json::from_str::<Credit>("7").is_err());
    }
}
