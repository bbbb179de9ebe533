use chrono::NaiveDateTime;

use crate::engine::geo;
use crate::error::EngineError;
use crate::model::attendance::{AttendanceStatus, Regularization};
use crate::model::employee::Employee;
use crate::model::geo::GeoPoint;
use crate::store::{CheckOutUpdate, NewAttendance, Store, StoreError};

async fn active_employee(store: &dyn Store, employee_id: u64) -> Result<Employee, EngineError> {
    let employee = store.employee(employee_id).await?;
    if !employee.is_active {
        return Err(EngineError::forbidden("employee is not active"));
    }
    Ok(employee)
}

/// Status a completed day earns: full presence at or above the employee's
/// daily threshold, half day below it.
pub fn checkout_status(worked_hours: f64, required_hours: f64) -> AttendanceStatus {
    if worked_hours >= required_hours {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::HalfDay
    }
}

/// Records a geofenced check-in for `now.date()`. At most one check-in per
/// (employee, day): a placeholder record without a check-in (left by a leave
/// cycle) is upgraded in place, anything else is a conflict.
pub async fn check_in(
    store: &dyn Store,
    employee_id: u64,
    location: GeoPoint,
    now: NaiveDateTime,
) -> Result<(), EngineError> {
    let employee = active_employee(store, employee_id).await?;
    let org = store.organization(employee.organization_id).await?;
    if !org.is_active {
        return Err(EngineError::forbidden("organization is not active"));
    }

    geo::enforce_geofence(&org.location, &location)?;

    let today = now.date();
    match store.attendance_on(employee_id, today).await? {
        Some(record) if record.check_in.is_some() => {
            Err(EngineError::conflict("already checked in today"))
        }
        Some(record) => {
            store.record_check_in(record.id, now, location).await?;
            Ok(())
        }
        None => {
            let result = store
                .insert_attendance(NewAttendance {
                    organization_id: org.id,
                    employee_id,
                    date: today,
                    status: AttendanceStatus::CheckedIn,
                    check_in: Some(now),
                    check_in_location: Some(location),
                    regularization: Regularization::None,
                })
                .await;
            match result {
                Ok(_) => Ok(()),
                // Lost the race for the day slot to a concurrent check-in.
                Err(StoreError::Duplicate) => {
                    Err(EngineError::conflict("already checked in today"))
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Records a geofenced check-out and settles the day's status from the
/// worked duration.
pub async fn check_out(
    store: &dyn Store,
    employee_id: u64,
    location: GeoPoint,
    now: NaiveDateTime,
) -> Result<AttendanceStatus, EngineError> {
    let employee = active_employee(store, employee_id).await?;
    let org = store.organization(employee.organization_id).await?;
    if !org.is_active {
        return Err(EngineError::forbidden("organization is not active"));
    }

    geo::enforce_geofence(&org.location, &location)?;

    let record = store
        .attendance_on(employee_id, now.date())
        .await?
        .ok_or_else(|| EngineError::validation("no check-in found for today"))?;

    let check_in = match (record.check_in, record.check_out) {
        (Some(check_in), None) => check_in,
        (None, _) => return Err(EngineError::validation("no check-in found for today")),
        (_, Some(_)) => return Err(EngineError::validation("already checked out today")),
    };

    let worked_hours = (now - check_in).num_seconds() as f64 / 3600.0;
    if worked_hours < 0.0 {
        return Err(EngineError::validation("check-out precedes check-in"));
    }

    let status = checkout_status(worked_hours, employee.work_hours);
    store
        .record_check_out(
            record.id,
            CheckOutUpdate {
                at: now,
                location,
                status,
                work_hours: worked_hours,
            },
        )
        .await?;

    Ok(status)
}
