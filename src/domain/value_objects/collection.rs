use serde::{Deserialize, Serialize};
use std::fmt;

/// Named entity collections in the local store. Pending mutations are kept
/// apart in the mutation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Employees,
    TimeEntries,
    PayrollCalculations,
    Metadata,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Employees,
        Collection::TimeEntries,
        Collection::PayrollCalculations,
        Collection::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Employees => "employees",
            Collection::TimeEntries => "time_entries",
            Collection::PayrollCalculations => "payroll_calculations",
            Collection::Metadata => "metadata",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Collection {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Collection::ALL
            .into_iter()
            .find(|collection| collection.as_str() == value)
            .ok_or_else(|| format!("Unknown collection: {value}"))
    }
}
