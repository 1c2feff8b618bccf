use super::ledger_service::LedgerService;
use crate::domain::entities::{
    Employee, PayrollCalculation, PayrollPolicy, SalaryProjection, TimeEntry,
};
use crate::domain::value_objects::{Collection, EntityId, EntityKind, MutationKind, PayPeriod};
use crate::shared::config::{parse_clock, PayrollConfig};
use crate::shared::error::AppError;
use chrono::Duration;
use std::sync::Arc;

impl TryFrom<&PayrollConfig> for PayrollPolicy {
    type Error = AppError;

    fn try_from(config: &PayrollConfig) -> Result<Self, Self::Error> {
        let shift_start = parse_clock(&config.shift_start).ok_or_else(|| {
            AppError::ConfigurationError(format!(
                "Invalid payroll shift start: {}",
                config.shift_start
            ))
        })?;
        Ok(Self {
            shift_start,
            grace: Duration::minutes(i64::from(config.grace_minutes)),
            standard_shift_hours: config.standard_shift_hours,
            overtime_multiplier: config.overtime_multiplier,
            salaried_month_days: config.salaried_month_days,
            salaried_monthly_hours: config.salaried_monthly_hours,
        })
    }
}

/// Derives per-period payroll aggregates from committed time entries.
///
/// Results are written back through [`LedgerService`], so they are queued
/// and synced like any other business record.
pub struct PayrollService {
    ledger: Arc<LedgerService>,
    policy: PayrollPolicy,
}

impl PayrollService {
    pub fn new(ledger: Arc<LedgerService>, policy: PayrollPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }

    pub async fn compute_payroll(
        &self,
        employee_id: &EntityId,
        period: PayPeriod,
    ) -> Result<PayrollCalculation, AppError> {
        let calculation = self.aggregate(employee_id, period).await?;

        let exists = self
            .ledger
            .get(Collection::PayrollCalculations, &calculation.id)
            .await?
            .is_some();
        let kind = if exists {
            MutationKind::Update
        } else {
            MutationKind::Create
        };
        self.ledger
            .save_record(kind, EntityKind::PayrollCalculation, &calculation)
            .await?;

        tracing::info!(
            target: "ledger::payroll",
            employee_id = %employee_id,
            %period,
            total_worked_hours = calculation.total_worked_hours,
            overtime_hours = calculation.overtime_hours,
            absence_days = calculation.absence_days,
            late_arrivals = calculation.late_arrivals,
            "payroll computed"
        );
        Ok(calculation)
    }

    /// Recomputes the period for every active employee.
    pub async fn compute_all(&self, period: PayPeriod) -> Result<Vec<PayrollCalculation>, AppError> {
        let employees: Vec<Employee> = self.ledger.load_valid(Collection::Employees).await?;
        let mut calculations = Vec::with_capacity(employees.len());
        for employee in employees.iter().filter(|employee| employee.active) {
            calculations.push(self.compute_payroll(&employee.id, period).await?);
        }
        Ok(calculations)
    }

    /// Projects pay from a fresh aggregate of the committed time entries.
    /// Nothing is written.
    pub async fn project_salary(
        &self,
        employee_id: &EntityId,
        period: PayPeriod,
    ) -> Result<SalaryProjection, AppError> {
        let employee: Employee = self
            .ledger
            .employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee not found: {employee_id}")))?;
        let calculation = self.aggregate(employee_id, period).await?;
        Ok(SalaryProjection::project(&employee, &calculation, &self.policy))
    }

    async fn aggregate(
        &self,
        employee_id: &EntityId,
        period: PayPeriod,
    ) -> Result<PayrollCalculation, AppError> {
        let entries: Vec<TimeEntry> = self.ledger.load_valid(Collection::TimeEntries).await?;
        PayrollCalculation::from_entries(employee_id, period, &entries, &self.policy)
            .map_err(AppError::ValidationError)
    }
}
