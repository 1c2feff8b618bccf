use super::ledger_service::LedgerService;
use crate::domain::entities::{TimeEntry, TimeEntryStatus};
use crate::domain::value_objects::{Collection, EntityId, EntityKind, MutationKind, PayPeriod};
use crate::shared::error::AppError;
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

/// Time-clock transitions, each written as a business mutation.
pub struct TimeClockService {
    ledger: Arc<LedgerService>,
    standard_shift_hours: f64,
}

impl TimeClockService {
    pub fn new(ledger: Arc<LedgerService>, standard_shift_hours: f64) -> Self {
        Self {
            ledger,
            standard_shift_hours,
        }
    }

    pub async fn clock_in(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        at: NaiveTime,
    ) -> Result<TimeEntry, AppError> {
        let entries = self.entries_on(employee_id, date).await?;
        if entries.iter().any(TimeEntry::is_open) {
            return Err(AppError::InvalidState(format!(
                "{employee_id} is already clocked in on {date}"
            )));
        }
        if entries
            .iter()
            .any(|entry| entry.status == TimeEntryStatus::Absent)
        {
            return Err(AppError::InvalidState(format!(
                "{employee_id} is marked absent on {date}"
            )));
        }

        let entry = TimeEntry::clocked_in(EntityId::generate(), employee_id.clone(), date, at);
        self.ledger
            .save_record(MutationKind::Create, EntityKind::TimeEntry, &entry)
            .await?;
        tracing::info!(
            target: "ledger::payroll",
            employee_id = %employee_id,
            %date,
            %at,
            "clocked in"
        );
        Ok(entry)
    }

    pub async fn start_break(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        at: NaiveTime,
    ) -> Result<TimeEntry, AppError> {
        self.transition(employee_id, date, |entry| entry.start_break(at))
            .await
    }

    pub async fn end_break(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        at: NaiveTime,
    ) -> Result<TimeEntry, AppError> {
        self.transition(employee_id, date, |entry| entry.end_break(at))
            .await
    }

    pub async fn start_lunch(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        at: NaiveTime,
    ) -> Result<TimeEntry, AppError> {
        self.transition(employee_id, date, |entry| entry.start_lunch(at))
            .await
    }

    pub async fn end_lunch(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        at: NaiveTime,
    ) -> Result<TimeEntry, AppError> {
        self.transition(employee_id, date, |entry| entry.end_lunch(at))
            .await
    }

    pub async fn clock_out(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        at: NaiveTime,
    ) -> Result<TimeEntry, AppError> {
        let standard_shift_hours = self.standard_shift_hours;
        let entry = self
            .transition(employee_id, date, |entry| {
                entry.clock_out(at, standard_shift_hours)
            })
            .await?;
        tracing::info!(
            target: "ledger::payroll",
            employee_id = %employee_id,
            %date,
            total_hours = entry.total_hours,
            overtime_hours = entry.overtime_hours,
            "clocked out"
        );
        Ok(entry)
    }

    pub async fn mark_absent(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Result<TimeEntry, AppError> {
        if !self.entries_on(employee_id, date).await?.is_empty() {
            return Err(AppError::InvalidState(format!(
                "{employee_id} already has an entry on {date}"
            )));
        }
        let entry = TimeEntry::absent(
            EntityId::generate(),
            employee_id.clone(),
            date,
            notes.into(),
        );
        self.ledger
            .save_record(MutationKind::Create, EntityKind::TimeEntry, &entry)
            .await?;
        Ok(entry)
    }

    /// Committed entries of one employee inside `period`, oldest first.
    pub async fn entries_for(
        &self,
        employee_id: &EntityId,
        period: PayPeriod,
    ) -> Result<Vec<TimeEntry>, AppError> {
        let mut entries: Vec<TimeEntry> = self
            .ledger
            .load_valid::<TimeEntry>(Collection::TimeEntries)
            .await?
            .into_iter()
            .filter(|entry| &entry.employee_id == employee_id && period.contains(entry.date))
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.clock_in.cmp(&b.clock_in)));
        Ok(entries)
    }

    async fn entries_on(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
    ) -> Result<Vec<TimeEntry>, AppError> {
        let entries = self.entries_for(employee_id, PayPeriod::of(date)).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.date == date)
            .collect())
    }

    async fn transition<F>(
        &self,
        employee_id: &EntityId,
        date: NaiveDate,
        apply: F,
    ) -> Result<TimeEntry, AppError>
    where
        F: FnOnce(&mut TimeEntry) -> Result<(), String>,
    {
        let mut entry = self
            .entries_on(employee_id, date)
            .await?
            .into_iter()
            .find(TimeEntry::is_open)
            .ok_or_else(|| {
                AppError::InvalidState(format!("{employee_id} is not clocked in on {date}"))
            })?;
        apply(&mut entry).map_err(AppError::InvalidState)?;
        self.ledger
            .save_record(MutationKind::Update, EntityKind::TimeEntry, &entry)
            .await?;
        Ok(entry)
    }
}
