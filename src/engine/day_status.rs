use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, DayStatus};
use crate::model::employee::Employee;
use crate::model::organization::Organization;

/// Resolver output for a single calendar day.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolvedDay {
    #[schema(example = "2026-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: DayStatus,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
}

/// Full weekday name, matching how organizations configure their week-off.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn is_holiday(org: &Organization, date: NaiveDate) -> bool {
    org.holidays.iter().any(|h| h.contains(date))
}

pub fn is_week_off(org: &Organization, date: NaiveDate) -> bool {
    org.week_off.as_deref() == Some(weekday_name(date))
}

/// Merges the attendance record, holiday calendar, week-off, and join date
/// into one authoritative status. First match wins:
///
/// 1. before the join date -> `before_join`, regardless of any record
/// 2. inside a holiday interval -> `holiday` (organization-wide truth beats
///    whatever was recorded)
/// 3. the configured week-off weekday -> `week_off`
/// 4. a stored record -> its status, verbatim
/// 5. no record, today or later -> `not_available`
/// 6. no record, in the past -> `absent`
///
/// `today` is injected so the same date resolves identically everywhere in a
/// request, whatever the wall clock does.
pub fn resolve_day(
    org: &Organization,
    employee: &Employee,
    date: NaiveDate,
    record: Option<&AttendanceRecord>,
    today: NaiveDate,
) -> ResolvedDay {
    if date < employee.join_date {
        return synthesized(date, DayStatus::BeforeJoin);
    }
    if is_holiday(org, date) {
        return synthesized(date, DayStatus::Holiday);
    }
    if is_week_off(org, date) {
        return synthesized(date, DayStatus::WeekOff);
    }
    if let Some(record) = record {
        return ResolvedDay {
            date,
            status: record.status.into(),
            check_in: record.check_in,
            check_out: record.check_out,
        };
    }
    if date >= today {
        synthesized(date, DayStatus::NotAvailable)
    } else {
        synthesized(date, DayStatus::Absent)
    }
}

fn synthesized(date: NaiveDate, status: DayStatus) -> ResolvedDay {
    ResolvedDay {
        date,
        status,
        check_in: None,
        check_out: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceStatus, Regularization};
    use crate::model::employee::Role;
    use crate::model::geo::GeoPoint;
    use crate::model::organization::Holiday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_org() -> Organization {
        Organization {
            id: 1,
            name: "Acme Traders".into(),
            contact_email: "hr@acme.example".into(),
            location: GeoPoint {
                latitude: 22.3569,
                longitude: 91.7832,
            },
            checkin_time: "09:00".into(),
            checkout_time: "18:00".into(),
            week_off: None,
            holidays: vec![],
            is_active: true,
        }
    }

    fn test_employee(join_date: NaiveDate) -> Employee {
        Employee {
            id: 1001,
            organization_id: 1,
            name: "Jane Doe".into(),
            username: "jane.doe".into(),
            email: "jane.doe@acme.example".into(),
            password_hash: String::new(),
            role: Role::Employee,
            is_active: true,
            salary: 30_000.0,
            join_date,
            work_hours: 8.0,
            alloted_leave: 18,
            leave_taken: 0,
            reporting_manager: Some(1000),
        }
    }

    fn record_with_status(date: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            organization_id: 1,
            employee_id: 1001,
            date,
            status,
            check_in: None,
            check_out: None,
            check_in_location: None,
            check_out_location: None,
            work_hours: None,
            regularization: Regularization::None,
        }
    }

    #[test]
    fn before_join_wins_over_everything() {
        let org = test_org();
        let employee = test_employee(date(2026, 2, 1));
        let day = date(2026, 1, 15);
        let record = record_with_status(day, AttendanceStatus::Present);

        let resolved = resolve_day(&org, &employee, day, Some(&record), date(2026, 3, 1));
        assert_eq!(resolved.status, DayStatus::BeforeJoin);
    }

    #[test]
    fn holiday_wins_over_existing_record() {
        let mut org = test_org();
        org.holidays.push(Holiday {
            name: "Eid".into(),
            start_date: date(2026, 1, 10),
            end_date: date(2026, 1, 12),
        });
        let employee = test_employee(date(2025, 1, 1));
        let day = date(2026, 1, 11);
        let record = record_with_status(day, AttendanceStatus::Present);

        let resolved = resolve_day(&org, &employee, day, Some(&record), date(2026, 2, 1));
        assert_eq!(resolved.status, DayStatus::Holiday);
    }

    #[test]
    fn holiday_interval_is_inclusive_on_both_ends() {
        let mut org = test_org();
        org.holidays.push(Holiday {
            name: "Eid".into(),
            start_date: date(2026, 1, 10),
            end_date: date(2026, 1, 12),
        });
        let employee = test_employee(date(2025, 1, 1));
        let today = date(2026, 2, 1);

        for day in [date(2026, 1, 10), date(2026, 1, 12)] {
            let resolved = resolve_day(&org, &employee, day, None, today);
            assert_eq!(resolved.status, DayStatus::Holiday);
        }
        let resolved = resolve_day(&org, &employee, date(2026, 1, 13), None, today);
        assert_ne!(resolved.status, DayStatus::Holiday);
    }

    #[test]
    fn week_off_weekday_resolves_week_off() {
        let mut org = test_org();
        org.week_off = Some("Sunday".into());
        let employee = test_employee(date(2025, 1, 1));

        // 2026-01-11 is a Sunday.
        let resolved = resolve_day(&org, &employee, date(2026, 1, 11), None, date(2026, 2, 1));
        assert_eq!(resolved.status, DayStatus::WeekOff);
    }

    #[test]
    fn stored_record_status_is_authoritative() {
        let org = test_org();
        let employee = test_employee(date(2025, 1, 1));
        let day = date(2026, 1, 5);
        let record = record_with_status(day, AttendanceStatus::PendingRegularize);

        let resolved = resolve_day(&org, &employee, day, Some(&record), date(2026, 2, 1));
        assert_eq!(resolved.status, DayStatus::PendingRegularize);
    }

    #[test]
    fn missing_record_today_or_future_is_not_available() {
        let org = test_org();
        let employee = test_employee(date(2025, 1, 1));
        let today = date(2026, 1, 15);

        assert_eq!(
            resolve_day(&org, &employee, today, None, today).status,
            DayStatus::NotAvailable
        );
        assert_eq!(
            resolve_day(&org, &employee, date(2026, 1, 20), None, today).status,
            DayStatus::NotAvailable
        );
    }

    #[test]
    fn missing_record_in_the_past_is_absent() {
        let org = test_org();
        let employee = test_employee(date(2025, 1, 1));

        let resolved = resolve_day(&org, &employee, date(2026, 1, 5), None, date(2026, 1, 15));
        assert_eq!(resolved.status, DayStatus::Absent);
    }
}
