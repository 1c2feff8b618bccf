use crate::domain::value_objects::EntityId;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryStatus {
    Working,
    Break,
    Lunch,
    ClockedOut,
    Absent,
}

/// One employee-day on the time clock.
///
/// `total_hours` and `overtime_hours` are only ever written by
/// [`TimeEntry::recompute_hours`], so they always agree with the recorded
/// clock times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: EntityId,
    pub employee_id: EntityId,
    pub date: NaiveDate,
    #[serde(default, with = "clock_time")]
    pub clock_in: Option<NaiveTime>,
    #[serde(default, with = "clock_time")]
    pub clock_out: Option<NaiveTime>,
    #[serde(default, with = "clock_time")]
    pub break_start: Option<NaiveTime>,
    #[serde(default, with = "clock_time")]
    pub break_end: Option<NaiveTime>,
    #[serde(default, with = "clock_time")]
    pub lunch_start: Option<NaiveTime>,
    #[serde(default, with = "clock_time")]
    pub lunch_end: Option<NaiveTime>,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub overtime_hours: f64,
    pub status: TimeEntryStatus,
    #[serde(default)]
    pub notes: String,
}

impl TimeEntry {
    pub fn clocked_in(
        id: EntityId,
        employee_id: EntityId,
        date: NaiveDate,
        clock_in: NaiveTime,
    ) -> Self {
        Self {
            id,
            employee_id,
            date,
            clock_in: Some(clock_in),
            clock_out: None,
            break_start: None,
            break_end: None,
            lunch_start: None,
            lunch_end: None,
            total_hours: 0.0,
            overtime_hours: 0.0,
            status: TimeEntryStatus::Working,
            notes: String::new(),
        }
    }

    pub fn absent(id: EntityId, employee_id: EntityId, date: NaiveDate, notes: String) -> Self {
        Self {
            id,
            employee_id,
            date,
            clock_in: None,
            clock_out: None,
            break_start: None,
            break_end: None,
            lunch_start: None,
            lunch_end: None,
            total_hours: 0.0,
            overtime_hours: 0.0,
            status: TimeEntryStatus::Absent,
            notes,
        }
    }

    /// Clocked in and not yet clocked out.
    pub fn is_open(&self) -> bool {
        self.status != TimeEntryStatus::Absent
            && self.clock_in.is_some()
            && self.clock_out.is_none()
    }

    pub fn start_break(&mut self, at: NaiveTime) -> Result<(), String> {
        self.ensure_working("start a break")?;
        if self.break_start.is_some() {
            return Err("Break was already taken for this entry".to_string());
        }
        self.break_start = Some(at);
        self.status = TimeEntryStatus::Break;
        Ok(())
    }

    pub fn end_break(&mut self, at: NaiveTime) -> Result<(), String> {
        if self.status != TimeEntryStatus::Break {
            return Err("No break in progress".to_string());
        }
        self.break_end = Some(at);
        self.status = TimeEntryStatus::Working;
        Ok(())
    }

    pub fn start_lunch(&mut self, at: NaiveTime) -> Result<(), String> {
        self.ensure_working("start lunch")?;
        if self.lunch_start.is_some() {
            return Err("Lunch was already taken for this entry".to_string());
        }
        self.lunch_start = Some(at);
        self.status = TimeEntryStatus::Lunch;
        Ok(())
    }

    pub fn end_lunch(&mut self, at: NaiveTime) -> Result<(), String> {
        if self.status != TimeEntryStatus::Lunch {
            return Err("No lunch in progress".to_string());
        }
        self.lunch_end = Some(at);
        self.status = TimeEntryStatus::Working;
        Ok(())
    }

    /// Closes the entry, ending any break or lunch still running at `at`.
    pub fn clock_out(&mut self, at: NaiveTime, standard_shift_hours: f64) -> Result<(), String> {
        if !self.is_open() {
            return Err("Entry is not clocked in".to_string());
        }
        match self.status {
            TimeEntryStatus::Break => self.break_end = Some(at),
            TimeEntryStatus::Lunch => self.lunch_end = Some(at),
            _ => {}
        }
        self.clock_out = Some(at);
        self.status = TimeEntryStatus::ClockedOut;
        self.recompute_hours(standard_shift_hours);
        Ok(())
    }

    /// Re-derives `total_hours` and `overtime_hours` from the clock times.
    pub fn recompute_hours(&mut self, standard_shift_hours: f64) {
        let total = self.worked_hours().unwrap_or(0.0);
        self.total_hours = total;
        self.overtime_hours = round_hours((total - standard_shift_hours).max(0.0));
    }

    /// Elapsed time between clock-in and clock-out minus break and lunch.
    /// `None` until both ends of the shift are recorded.
    pub fn worked_hours(&self) -> Option<f64> {
        let span = span_minutes(self.clock_in?, self.clock_out?);
        let paused = interval_minutes(self.break_start, self.break_end)
            + interval_minutes(self.lunch_start, self.lunch_end);
        Some(round_hours((span - paused).max(0) as f64 / 60.0))
    }

    pub fn is_late(&self, threshold: NaiveTime) -> bool {
        match self.clock_in {
            Some(clock_in) => self.status != TimeEntryStatus::Absent && clock_in > threshold,
            None => false,
        }
    }

    fn ensure_working(&self, action: &str) -> Result<(), String> {
        if !self.is_open() {
            return Err(format!("Cannot {action}: entry is not clocked in"));
        }
        if self.status != TimeEntryStatus::Working {
            return Err(format!("Cannot {action} while {:?}", self.status));
        }
        Ok(())
    }
}

fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) / 60
}

/// Minutes from `start` to `end`, wrapping past midnight.
fn span_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    let diff = minute_of_day(end) - minute_of_day(start);
    if diff < 0 {
        diff + MINUTES_PER_DAY
    } else {
        diff
    }
}

fn interval_minutes(start: Option<NaiveTime>, end: Option<NaiveTime>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => span_minutes(start, end),
        _ => 0,
    }
}

pub(crate) fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// `HH:MM` wire format for optional clock times. `HH:MM:SS` is accepted on read.
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(value) if !value.trim().is_empty() => crate::shared::config::parse_clock(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid clock time: {value}"))),
            _ => Ok(None),
        }
    }
}
