use super::employee::{Employee, PayType};
use super::time_entry::{round_hours, TimeEntry, TimeEntryStatus};
use crate::domain::value_objects::{EntityId, PayPeriod};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// Rules the payroll derivation is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollPolicy {
    pub shift_start: NaiveTime,
    pub grace: Duration,
    pub standard_shift_hours: f64,
    pub overtime_multiplier: f64,
    pub salaried_month_days: u32,
    pub salaried_monthly_hours: u32,
}

impl PayrollPolicy {
    /// Clock-ins strictly after this time count as late.
    pub fn late_threshold(&self) -> NaiveTime {
        self.shift_start + self.grace
    }
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            grace: Duration::minutes(15),
            standard_shift_hours: 8.0,
            overtime_multiplier: 1.5,
            salaried_month_days: 30,
            salaried_monthly_hours: 220,
        }
    }
}

/// Per-employee, per-month aggregate. Always recomputed wholesale from the
/// month's time entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollCalculation {
    pub id: EntityId,
    pub employee_id: EntityId,
    pub period: PayPeriod,
    pub total_worked_hours: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub total_days: u32,
    pub work_days: u32,
    pub absence_days: u32,
    pub late_arrivals: u32,
    pub average_hours_per_day: f64,
}

impl PayrollCalculation {
    pub fn id_for(employee_id: &EntityId, period: PayPeriod) -> Result<EntityId, String> {
        EntityId::new(format!("{employee_id}:{period}"))
    }

    /// Aggregates every entry of `employee_id` dated inside `period`; other
    /// entries are ignored. Hours come from each entry's clock times, never
    /// from its stored totals.
    pub fn from_entries<'a, I>(
        employee_id: &EntityId,
        period: PayPeriod,
        entries: I,
        policy: &PayrollPolicy,
    ) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a TimeEntry>,
    {
        let threshold = policy.late_threshold();
        let mut work_days = 0u32;
        let mut absence_days = 0u32;
        let mut late_arrivals = 0u32;
        let mut total_worked_hours = 0.0f64;
        let mut overtime_hours = 0.0f64;

        for entry in entries
            .into_iter()
            .filter(|entry| &entry.employee_id == employee_id && period.contains(entry.date))
        {
            if entry.status == TimeEntryStatus::Absent {
                absence_days += 1;
            } else {
                work_days += 1;
            }
            if entry.is_late(threshold) {
                late_arrivals += 1;
            }
            let worked = entry.worked_hours().unwrap_or(0.0);
            total_worked_hours += worked;
            overtime_hours += (worked - policy.standard_shift_hours).max(0.0);
        }

        let total_worked_hours = round_hours(total_worked_hours);
        let overtime_hours = round_hours(overtime_hours);
        let average_hours_per_day = if work_days == 0 {
            0.0
        } else {
            round_hours(total_worked_hours / f64::from(work_days))
        };

        Ok(Self {
            id: Self::id_for(employee_id, period)?,
            employee_id: employee_id.clone(),
            period,
            total_worked_hours,
            regular_hours: round_hours(total_worked_hours - overtime_hours),
            overtime_hours,
            total_days: work_days + absence_days,
            work_days,
            absence_days,
            late_arrivals,
            average_hours_per_day,
        })
    }
}

/// Estimated pay for one period. No taxes or benefits are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryProjection {
    pub regular_pay: f64,
    pub overtime_pay: f64,
    pub absence_deduction: f64,
    pub gross_pay: f64,
}

impl SalaryProjection {
    pub fn project(
        employee: &Employee,
        calculation: &PayrollCalculation,
        policy: &PayrollPolicy,
    ) -> Self {
        let (regular_pay, overtime_rate, absence_deduction) = match employee.pay_type {
            PayType::Hourly { rate } => (calculation.regular_hours * rate, rate, 0.0),
            PayType::Salaried { base } => {
                let daily = base / f64::from(policy.salaried_month_days);
                let hourly = base / f64::from(policy.salaried_monthly_hours);
                let deduction = (daily * f64::from(calculation.absence_days)).min(base);
                (base, hourly, deduction)
            }
        };
        let overtime_pay = calculation.overtime_hours * overtime_rate * policy.overtime_multiplier;
        let gross_pay = (regular_pay - absence_deduction + overtime_pay).max(0.0);

        Self {
            regular_pay: round_cents(regular_pay),
            overtime_pay: round_cents(overtime_pay),
            absence_deduction: round_cents(absence_deduction),
            gross_pay: round_cents(gross_pay),
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Weekday};

    fn id(value: &str) -> EntityId {
        EntityId::new(value.to_string()).unwrap()
    }

    fn worked(employee: &str, date: NaiveDate, clock_in: (u32, u32), hours: f64) -> TimeEntry {
        let mut entry = TimeEntry::clocked_in(
            EntityId::generate(),
            id(employee),
            date,
            NaiveTime::from_hms_opt(clock_in.0, clock_in.1, 0).unwrap(),
        );
        let clock_out = entry.clock_in.unwrap() + Duration::minutes((hours * 60.0) as i64);
        entry.clock_out(clock_out, 8.0).unwrap();
        entry
    }

    #[test]
    fn empty_period_yields_zero_aggregate() {
        let period = PayPeriod::new(2024, 3).unwrap();
        let calc = PayrollCalculation::from_entries(
            &id("emp-1"),
            period,
            &Vec::<TimeEntry>::new(),
            &PayrollPolicy::default(),
        )
        .unwrap();

        assert_eq!(calc.total_days, 0);
        assert_eq!(calc.work_days, 0);
        assert_eq!(calc.total_worked_hours, 0.0);
        assert_eq!(calc.average_hours_per_day, 0.0);
        assert_eq!(calc.id.as_str(), "emp-1:2024-03");
    }

    #[test]
    fn weekday_month_with_two_absences() {
        let period = PayPeriod::new(2024, 3).unwrap();
        let weekdays: Vec<NaiveDate> = period
            .days()
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        let entries: Vec<TimeEntry> = weekdays
            .iter()
            .enumerate()
            .map(|(index, day)| {
                if index == 3 || index == 10 {
                    TimeEntry::absent(EntityId::generate(), id("emp-1"), *day, String::new())
                } else {
                    worked("emp-1", *day, (8, 0), 8.0)
                }
            })
            .collect();

        let calc = PayrollCalculation::from_entries(
            &id("emp-1"),
            period,
            &entries,
            &PayrollPolicy::default(),
        )
        .unwrap();

        assert_eq!(calc.total_days as usize, weekdays.len());
        assert_eq!(calc.absence_days, 2);
        assert_eq!(calc.work_days, calc.total_days - 2);
        assert_eq!(calc.average_hours_per_day, 8.0);
    }

    #[test]
    fn other_employees_and_months_are_ignored() {
        let period = PayPeriod::new(2024, 3).unwrap();
        let march = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let entries = vec![
            worked("emp-1", march, (8, 0), 9.0),
            worked("emp-2", march, (8, 0), 8.0),
            worked("emp-1", april, (8, 0), 8.0),
        ];

        let calc = PayrollCalculation::from_entries(
            &id("emp-1"),
            period,
            &entries,
            &PayrollPolicy::default(),
        )
        .unwrap();

        assert_eq!(calc.total_days, 1);
        assert_eq!(calc.total_worked_hours, 9.0);
        assert_eq!(calc.overtime_hours, 1.0);
        assert_eq!(calc.regular_hours, 8.0);
    }

    #[test]
    fn late_arrivals_respect_grace_window() {
        let period = PayPeriod::new(2024, 3).unwrap();
        let entries = vec![
            worked("emp-1", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), (8, 15), 8.0),
            worked("emp-1", NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), (8, 16), 8.0),
            worked("emp-1", NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(), (9, 30), 7.0),
        ];

        let calc = PayrollCalculation::from_entries(
            &id("emp-1"),
            period,
            &entries,
            &PayrollPolicy::default(),
        )
        .unwrap();

        assert_eq!(calc.late_arrivals, 2);
    }

    #[test]
    fn stored_totals_do_not_override_clock_times() {
        let period = PayPeriod::new(2024, 3).unwrap();
        let mut entry = worked("emp-1", NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), (8, 0), 9.0);
        entry.total_hours = 100.0;
        entry.overtime_hours = 92.0;

        let calc = PayrollCalculation::from_entries(
            &id("emp-1"),
            period,
            &[entry],
            &PayrollPolicy::default(),
        )
        .unwrap();

        assert_eq!(calc.total_worked_hours, 9.0);
        assert_eq!(calc.overtime_hours, 1.0);
        assert_eq!(calc.regular_hours, 8.0);
    }

    fn calculation(regular: f64, overtime: f64, absences: u32) -> PayrollCalculation {
        PayrollCalculation {
            id: id("emp-1:2024-03"),
            employee_id: id("emp-1"),
            period: PayPeriod::new(2024, 3).unwrap(),
            total_worked_hours: regular + overtime,
            regular_hours: regular,
            overtime_hours: overtime,
            total_days: 20 + absences,
            work_days: 20,
            absence_days: absences,
            late_arrivals: 0,
            average_hours_per_day: 0.0,
        }
    }

    #[test]
    fn hourly_projection_pays_overtime_at_multiplier() {
        let employee = Employee::new(id("emp-1"), "Ana", PayType::Hourly { rate: 20.0 });
        let projection = SalaryProjection::project(
            &employee,
            &calculation(160.0, 10.0, 0),
            &PayrollPolicy::default(),
        );

        assert_eq!(projection.regular_pay, 3200.0);
        assert_eq!(projection.overtime_pay, 300.0);
        assert_eq!(projection.gross_pay, 3500.0);
    }

    #[test]
    fn salaried_projection_prorates_absences() {
        let employee = Employee::new(id("emp-1"), "Bo", PayType::Salaried { base: 3000.0 });
        let projection = SalaryProjection::project(
            &employee,
            &calculation(160.0, 2.0, 2),
            &PayrollPolicy::default(),
        );

        assert_eq!(projection.absence_deduction, 200.0);
        // 3000 / 220 * 2 * 1.5
        assert_eq!(projection.overtime_pay, 40.91);
        assert_eq!(projection.gross_pay, 2840.91);
    }
}
