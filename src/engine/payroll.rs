use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::day_status::ResolvedDay;
use crate::engine::month;
use crate::error::EngineError;
use crate::model::attendance::DayStatus;
use crate::model::employee::Employee;
use crate::model::organization::Organization;
use crate::store::Store;

/// Week-offs are charged against the payroll denominator as a flat four per
/// month, not an exact weekday count. Changing this changes salary figures.
const WEEK_OFFS_PER_MONTH: u32 = 4;

#[derive(Debug, Serialize, ToSchema)]
pub struct SalaryBreakdown {
    #[schema(example = 30000.0)]
    pub full_salary: f64,

    /// Rounded to the nearest whole currency unit.
    #[schema(example = 22500)]
    pub final_salary: i64,

    #[schema(example = 20)]
    pub paid_days: u32,

    #[schema(example = 5)]
    pub half_days: u32,

    #[schema(example = 5)]
    pub unpaid_days: u32,

    #[schema(example = 30)]
    pub working_days: u32,

    #[schema(example = 1000.0)]
    pub daily_rate: f64,
}

enum PayBucket {
    Paid,
    Half,
    Unpaid,
    Excluded,
}

fn classify(status: DayStatus) -> PayBucket {
    match status {
        DayStatus::Present
        | DayStatus::Late
        | DayStatus::OnLeave
        | DayStatus::ApprovedRegularise => PayBucket::Paid,

        DayStatus::HalfDay => PayBucket::Half,

        // A rejected leave still stamps its days paid_leave; payroll treats
        // them as unpaid. A dangling checked_in (no check-out) is unpaid too.
        DayStatus::Absent
        | DayStatus::RejectRegularise
        | DayStatus::PendingRegularize
        | DayStatus::PaidLeave
        | DayStatus::CheckedIn => PayBucket::Unpaid,

        DayStatus::Holiday
        | DayStatus::WeekOff
        | DayStatus::BeforeJoin
        | DayStatus::NotAvailable => PayBucket::Excluded,
    }
}

/// Number of holiday days (not intervals) falling inside the target month.
pub fn holiday_days_in_month(org: &Organization, year: i32, month: u32) -> u32 {
    org.holidays
        .iter()
        .flat_map(|h| {
            let mut days = Vec::new();
            let mut day = h.start_date;
            while day <= h.end_date {
                if day.year() == year && day.month() == month {
                    days.push(day);
                }
                day = day + chrono::Duration::days(1);
            }
            days
        })
        .count() as u32
}

/// Collapses a month of resolved day statuses into paid/half/unpaid counts
/// and a prorated salary. Pure: identical inputs always yield the identical
/// figure.
pub fn calculate_salary(
    org: &Organization,
    employee: &Employee,
    year: i32,
    month_num: u32,
    days: &[ResolvedDay],
) -> Result<SalaryBreakdown, EngineError> {
    let mut paid_days = 0u32;
    let mut half_days = 0u32;
    let mut unpaid_days = 0u32;

    for day in days {
        match classify(day.status) {
            PayBucket::Paid => paid_days += 1,
            PayBucket::Half => half_days += 1,
            PayBucket::Unpaid => unpaid_days += 1,
            PayBucket::Excluded => {}
        }
    }

    let days_in_month = month::days_in_month(year, month_num)?;
    let week_off_days = if org.week_off.is_some() {
        WEEK_OFFS_PER_MONTH
    } else {
        0
    };
    let holiday_days = holiday_days_in_month(org, year, month_num);

    let working_days = days_in_month
        .checked_sub(holiday_days + week_off_days)
        .filter(|d| *d > 0)
        .ok_or_else(|| EngineError::validation("month has no working days"))?;

    let daily_rate = employee.salary / working_days as f64;
    let payable = paid_days as f64 + half_days as f64 * 0.5;
    let final_salary = (payable * daily_rate).round() as i64;

    Ok(SalaryBreakdown {
        full_salary: employee.salary,
        final_salary,
        paid_days,
        half_days,
        unpaid_days,
        working_days,
        daily_rate,
    })
}

/// Aggregates the month and derives the salary from it.
pub async fn salary_for_month(
    store: &dyn Store,
    employee_id: u64,
    year: i32,
    month_num: u32,
    today: NaiveDate,
) -> Result<SalaryBreakdown, EngineError> {
    let employee = store.employee(employee_id).await?;
    let org = store.organization(employee.organization_id).await?;

    let start = month::first_day(year, month_num)?;
    let end = start + chrono::Duration::days(month::days_in_month(year, month_num)? as i64 - 1);
    let records = store.attendance_between(employee_id, start, end).await?;

    let summary = month::aggregate_month(&org, &employee, year, month_num, &records, today)?;
    calculate_salary(&org, &employee, year, month_num, &summary.days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::Role;
    use crate::model::geo::GeoPoint;
    use crate::model::organization::Holiday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn org() -> Organization {
        Organization {
            id: 1,
            name: "Acme Traders".into(),
            contact_email: "hr@acme.example".into(),
            location: GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
            checkin_time: "09:00".into(),
            checkout_time: "18:00".into(),
            week_off: None,
            holidays: vec![],
            is_active: true,
        }
    }

    fn employee(salary: f64) -> Employee {
        Employee {
            id: 1001,
            organization_id: 1,
            name: "Jane Doe".into(),
            username: "jane.doe".into(),
            email: "jane@acme.example".into(),
            password_hash: String::new(),
            role: Role::Employee,
            is_active: true,
            salary,
            join_date: date(2020, 1, 1),
            work_hours: 8.0,
            alloted_leave: 18,
            leave_taken: 0,
            reporting_manager: None,
        }
    }

    fn resolved(date: NaiveDate, status: DayStatus) -> ResolvedDay {
        ResolvedDay {
            date,
            status,
            check_in: None,
            check_out: None,
        }
    }

    // 30000 salary, 30-day month, no holidays, no week-off, 20 present,
    // 5 half-day, 5 absent -> 22500.
    #[test]
    fn reference_salary_scenario() {
        let org = org();
        let employee = employee(30_000.0);

        let mut days = Vec::new();
        for d in 1..=30u32 {
            let status = if d <= 20 {
                DayStatus::Present
            } else if d <= 25 {
                DayStatus::HalfDay
            } else {
                DayStatus::Absent
            };
            days.push(resolved(date(2026, 4, d), status));
        }

        let breakdown = calculate_salary(&org, &employee, 2026, 4, &days).unwrap();
        assert_eq!(breakdown.paid_days, 20);
        assert_eq!(breakdown.half_days, 5);
        assert_eq!(breakdown.unpaid_days, 5);
        assert_eq!(breakdown.working_days, 30);
        assert!((breakdown.daily_rate - 1000.0).abs() < 1e-9);
        assert_eq!(breakdown.final_salary, 22_500);
    }

    #[test]
    fn calculation_is_idempotent() {
        let org = org();
        let employee = employee(45_250.0);
        let days: Vec<ResolvedDay> = (1..=30)
            .map(|d| resolved(date(2026, 4, d), DayStatus::Present))
            .collect();

        let first = calculate_salary(&org, &employee, 2026, 4, &days).unwrap();
        let second = calculate_salary(&org, &employee, 2026, 4, &days).unwrap();
        assert_eq!(first.final_salary, second.final_salary);
        assert_eq!(first.paid_days, second.paid_days);
    }

    #[test]
    fn week_off_shrinks_the_denominator_by_four() {
        let mut org = org();
        org.week_off = Some("Sunday".into());
        let employee = employee(26_000.0);
        let days: Vec<ResolvedDay> = (1..=30)
            .map(|d| resolved(date(2026, 4, d), DayStatus::Present))
            .collect();

        let breakdown = calculate_salary(&org, &employee, 2026, 4, &days).unwrap();
        assert_eq!(breakdown.working_days, 26);
        assert!((breakdown.daily_rate - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn holidays_count_days_inside_the_month_only() {
        let mut org = org();
        // 3 days inside April, plus an interval straddling the month end
        // contributing only its April days.
        org.holidays.push(Holiday {
            name: "Festival".into(),
            start_date: date(2026, 4, 10),
            end_date: date(2026, 4, 12),
        });
        org.holidays.push(Holiday {
            name: "Spring break".into(),
            start_date: date(2026, 4, 29),
            end_date: date(2026, 5, 2),
        });
        assert_eq!(holiday_days_in_month(&org, 2026, 4), 5);

        let employee = employee(25_000.0);
        let days: Vec<ResolvedDay> = (1..=30)
            .map(|d| resolved(date(2026, 4, d), DayStatus::Present))
            .collect();
        let breakdown = calculate_salary(&org, &employee, 2026, 4, &days).unwrap();
        assert_eq!(breakdown.working_days, 25);
    }

    #[test]
    fn paid_leave_and_regularization_outcomes_classify_per_rule() {
        let org = org();
        let employee = employee(30_000.0);

        let days = vec![
            resolved(date(2026, 4, 1), DayStatus::OnLeave),
            resolved(date(2026, 4, 2), DayStatus::ApprovedRegularise),
            resolved(date(2026, 4, 3), DayStatus::Late),
            resolved(date(2026, 4, 4), DayStatus::PaidLeave),
            resolved(date(2026, 4, 5), DayStatus::RejectRegularise),
            resolved(date(2026, 4, 6), DayStatus::PendingRegularize),
            resolved(date(2026, 4, 7), DayStatus::CheckedIn),
            resolved(date(2026, 4, 8), DayStatus::Holiday),
            resolved(date(2026, 4, 9), DayStatus::NotAvailable),
        ];

        let breakdown = calculate_salary(&org, &employee, 2026, 4, &days).unwrap();
        assert_eq!(breakdown.paid_days, 3);
        assert_eq!(breakdown.half_days, 0);
        assert_eq!(breakdown.unpaid_days, 4);
    }

    #[test]
    fn zero_working_days_is_rejected() {
        let mut org = org();
        org.holidays.push(Holiday {
            name: "Shutdown".into(),
            start_date: date(2026, 2, 1),
            end_date: date(2026, 2, 28),
        });
        let employee = employee(30_000.0);

        let err = calculate_salary(&org, &employee, 2026, 2, &[]).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
