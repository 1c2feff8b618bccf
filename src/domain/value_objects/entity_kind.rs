use super::Collection;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Employee,
    TimeEntry,
    PayrollCalculation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Employee => "employee",
            EntityKind::TimeEntry => "time_entry",
            EntityKind::PayrollCalculation => "payroll_calculation",
        }
    }

    /// Business collection the optimistic apply writes into.
    pub fn collection(&self) -> Collection {
        match self {
            EntityKind::Employee => Collection::Employees,
            EntityKind::TimeEntry => Collection::TimeEntries,
            EntityKind::PayrollCalculation => Collection::PayrollCalculations,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntityKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "employee" => Ok(EntityKind::Employee),
            "time_entry" => Ok(EntityKind::TimeEntry),
            "payroll_calculation" => Ok(EntityKind::PayrollCalculation),
            other => Err(format!("Unknown entity kind: {other}")),
        }
    }
}
