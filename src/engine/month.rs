use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::day_status::{ResolvedDay, resolve_day};
use crate::error::EngineError;
use crate::model::attendance::{AttendanceRecord, DayStatus};
use crate::model::employee::Employee;
use crate::model::organization::Organization;
use crate::store::Store;

/// Per-day sequence and summary counters for one employee-month.
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyAttendance {
    #[schema(example = 2026)]
    pub year: i32,

    #[schema(example = 1)]
    pub month: u32,

    /// One entry per calendar day, ascending.
    pub days: Vec<ResolvedDay>,

    #[schema(example = 20)]
    pub present_days: u32,

    #[schema(example = 5)]
    pub absent_days: u32,

    #[schema(example = 2)]
    pub holiday_days: u32,

    #[schema(example = 3)]
    pub leave_days: u32,

    #[schema(example = 162.5)]
    pub total_work_hours: f64,
}

pub fn first_day(year: i32, month: u32) -> Result<NaiveDate, EngineError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::validation("invalid year/month"))
}

/// Number of calendar days in the month (28/29/30/31).
pub fn days_in_month(year: i32, month: u32) -> Result<u32, EngineError> {
    let start = first_day(year, month)?;
    let next = if month == 12 {
        first_day(year + 1, 1)?
    } else {
        first_day(year, month + 1)?
    };
    Ok((next - start).num_days() as u32)
}

/// Drives the day-status resolver across every day of the month. The output
/// always holds exactly `days_in_month` entries, ascending, no day skipped or
/// duplicated.
pub fn aggregate_month(
    org: &Organization,
    employee: &Employee,
    year: i32,
    month: u32,
    records: &[AttendanceRecord],
    today: NaiveDate,
) -> Result<MonthlyAttendance, EngineError> {
    let start = first_day(year, month)?;
    let day_count = days_in_month(year, month)?;

    let by_date: HashMap<NaiveDate, &AttendanceRecord> =
        records.iter().map(|r| (r.date, r)).collect();

    let mut summary = MonthlyAttendance {
        year,
        month,
        days: Vec::with_capacity(day_count as usize),
        present_days: 0,
        absent_days: 0,
        holiday_days: 0,
        leave_days: 0,
        total_work_hours: 0.0,
    };

    for offset in 0..day_count {
        let date = start + Duration::days(offset as i64);
        let resolved = resolve_day(org, employee, date, by_date.get(&date).copied(), today);

        match resolved.status {
            DayStatus::Present => summary.present_days += 1,
            DayStatus::Absent => summary.absent_days += 1,
            DayStatus::Holiday => summary.holiday_days += 1,
            DayStatus::OnLeave => summary.leave_days += 1,
            _ => {}
        }
        if let (Some(check_in), Some(check_out)) = (resolved.check_in, resolved.check_out) {
            summary.total_work_hours +=
                (check_out - check_in).num_seconds() as f64 / 3600.0;
        }

        summary.days.push(resolved);
    }

    Ok(summary)
}

/// Loads the month's records and aggregates them.
pub async fn monthly_attendance(
    store: &dyn Store,
    employee_id: u64,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<MonthlyAttendance, EngineError> {
    let employee = store.employee(employee_id).await?;
    let org = store.organization(employee.organization_id).await?;

    let start = first_day(year, month)?;
    let end = start + Duration::days(days_in_month(year, month)? as i64 - 1);
    let records = store.attendance_between(employee_id, start, end).await?;

    aggregate_month(&org, &employee, year, month, &records, today)
}
