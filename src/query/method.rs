//! Query method selection.

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects which client call shape a query runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMethod {
    /// Every matching row, as a JSON array.
    #[default]
    Multiple,
    /// At most one row; `null` when nothing matched.
    Single,
    /// Exactly one row; zero rows is an error.
    SingleRequired,
    /// Side effects only, no payload.
    Execute,
}

impl QueryMethod {
    /// All methods in numeric-code order.
    pub const ALL: [QueryMethod; 4] = [
        Self::Multiple,
        Self::Single,
        Self::SingleRequired,
        Self::Execute,
    ];

    /// Returns the method as a string for persistence and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multiple => "multiple",
            Self::Single => "single",
            Self::SingleRequired => "single_required",
            Self::Execute => "execute",
        }
    }

    /// Returns the numeric code (1-4) of the method.
    pub fn code(&self) -> u8 {
        match self {
            Self::Multiple => 1,
            Self::Single => 2,
            Self::SingleRequired => 3,
            Self::Execute => 4,
        }
    }

    /// Returns true if the method stores a payload that can be parsed.
    pub fn returns_payload(&self) -> bool {
        !matches!(self, Self::Execute)
    }
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMethod {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "multiple" => Ok(Self::Multiple),
            "single" => Ok(Self::Single),
            "single_required" => Ok(Self::SingleRequired),
            "execute" => Ok(Self::Execute),
            other => Err(QueryError::invalid_argument(format!(
                "unknown query method '{other}'"
            ))),
        }
    }
}

impl TryFrom<u8> for QueryMethod {
    type Error = QueryError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|method| method.code() == code)
            .ok_or_else(|| QueryError::invalid_argument(format!("unknown query method code {code}")))
    }
}
