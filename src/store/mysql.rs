//! MySQL-backed store. Queries are runtime-bound (`sqlx::query_as`), rows map
//! through flat `FromRow` structs, and the two invariant-critical reviews run
//! inside transactions. Duplicate day slots surface as SQL state 23000 from
//! the `(employee_id, date)` unique key.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::MySqlPool;
use sqlx::prelude::FromRow;

use super::{
    CheckOutUpdate, LeaveListFilter, LeaveReview, NewAttendance, NewEmployee, NewLeave,
    NewOrganization, RegularizationReview, Store, StoreError,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Regularization};
use crate::model::employee::{Employee, Role};
use crate::model::geo::GeoPoint;
use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::organization::{Holiday, Organization};

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn duplicate_key(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(err)
}

#[derive(FromRow)]
struct OrganizationRow {
    id: u64,
    name: String,
    contact_email: String,
    latitude: f64,
    longitude: f64,
    checkin_time: String,
    checkout_time: String,
    week_off: Option<String>,
    is_active: bool,
}

#[derive(FromRow)]
struct HolidayRow {
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl OrganizationRow {
    fn into_organization(self, holidays: Vec<HolidayRow>) -> Organization {
        Organization {
            id: self.id,
            name: self.name,
            contact_email: self.contact_email,
            location: GeoPoint {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            checkin_time: self.checkin_time,
            checkout_time: self.checkout_time,
            week_off: self.week_off,
            holidays: holidays
                .into_iter()
                .map(|h| Holiday {
                    name: h.name,
                    start_date: h.start_date,
                    end_date: h.end_date,
                })
                .collect(),
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    organization_id: u64,
    name: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    salary: f64,
    join_date: NaiveDate,
    work_hours: f64,
    alloted_leave: u32,
    leave_taken: u32,
    reporting_manager: Option<u64>,
}

impl EmployeeRow {
    fn into_employee(self) -> Result<Employee, StoreError> {
        let role = Role::from_str(&self.role)
            .map_err(|_| StoreError::Corrupt(format!("unknown role `{}`", self.role)))?;
        Ok(Employee {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role,
            is_active: self.is_active,
            salary: self.salary,
            join_date: self.join_date,
            work_hours: self.work_hours,
            alloted_leave: self.alloted_leave,
            leave_taken: self.leave_taken,
            reporting_manager: self.reporting_manager,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    organization_id: u64,
    employee_id: u64,
    date: NaiveDate,
    status: String,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    check_in_lat: Option<f64>,
    check_in_lon: Option<f64>,
    check_out_lat: Option<f64>,
    check_out_lon: Option<f64>,
    work_hours: Option<f64>,
    regularize_request: Option<String>,
    regularize_reason: Option<String>,
    regularized_by: Option<u64>,
    regularized_check_in: Option<NaiveDateTime>,
    regularized_check_out: Option<NaiveDateTime>,
}

const ATTENDANCE_COLUMNS: &str = "id, organization_id, employee_id, date, status, check_in, \
     check_out, check_in_lat, check_in_lon, check_out_lat, check_out_lon, work_hours, \
     regularize_request, regularize_reason, regularized_by, regularized_check_in, \
     regularized_check_out";

fn point(lat: Option<f64>, lon: Option<f64>) -> Option<GeoPoint> {
    match (lat, lon) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

impl AttendanceRow {
    fn into_record(self) -> Result<AttendanceRecord, StoreError> {
        let status = AttendanceStatus::from_str(&self.status)
            .map_err(|_| StoreError::Corrupt(format!("unknown status `{}`", self.status)))?;

        let corrupt = |what: &str| StoreError::Corrupt(format!("regularization row missing {what}"));
        let regularization = match self.regularize_request.as_deref() {
            None => Regularization::None,
            Some("pending") => Regularization::Pending {
                check_in: self.regularized_check_in.ok_or_else(|| corrupt("check_in"))?,
                check_out: self
                    .regularized_check_out
                    .ok_or_else(|| corrupt("check_out"))?,
                reason: self.regularize_reason.clone().unwrap_or_default(),
            },
            Some("approved") => Regularization::Approved {
                check_in: self.regularized_check_in.ok_or_else(|| corrupt("check_in"))?,
                check_out: self
                    .regularized_check_out
                    .ok_or_else(|| corrupt("check_out"))?,
                reason: self.regularize_reason.clone().unwrap_or_default(),
                approved_by: self.regularized_by.ok_or_else(|| corrupt("approver"))?,
            },
            Some("rejected") => Regularization::Rejected {
                reason: self.regularize_reason.clone().unwrap_or_default(),
                rejected_by: self.regularized_by.ok_or_else(|| corrupt("approver"))?,
            },
            Some(other) => {
                return Err(StoreError::Corrupt(format!(
                    "unknown regularize_request `{other}`"
                )));
            }
        };

        Ok(AttendanceRecord {
            id: self.id,
            organization_id: self.organization_id,
            employee_id: self.employee_id,
            date: self.date,
            status,
            check_in: self.check_in,
            check_out: self.check_out,
            check_in_location: point(self.check_in_lat, self.check_in_lon),
            check_out_location: point(self.check_out_lat, self.check_out_lon),
            work_hours: self.work_hours,
            regularization,
        })
    }
}

/// The regularization columns a [`Regularization`] variant maps to:
/// (request state, reason, reviewer, requested check-in, requested check-out).
fn regularization_columns(
    reg: &Regularization,
) -> (
    Option<&'static str>,
    Option<String>,
    Option<u64>,
    Option<NaiveDateTime>,
    Option<NaiveDateTime>,
) {
    match reg {
        Regularization::None => (None, None, None, None, None),
        Regularization::Pending {
            check_in,
            check_out,
            reason,
        } => (
            Some("pending"),
            Some(reason.clone()),
            None,
            Some(*check_in),
            Some(*check_out),
        ),
        Regularization::Approved {
            check_in,
            check_out,
            reason,
            approved_by,
        } => (
            Some("approved"),
            Some(reason.clone()),
            Some(*approved_by),
            Some(*check_in),
            Some(*check_out),
        ),
        Regularization::Rejected {
            reason,
            rejected_by,
        } => (
            Some("rejected"),
            Some(reason.clone()),
            Some(*rejected_by),
            None,
            None,
        ),
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    organization_id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    reason: Option<String>,
    approved_by: Option<u64>,
    applied_at: NaiveDateTime,
}

impl LeaveRow {
    fn into_leave(self) -> Result<LeaveRequest, StoreError> {
        let leave_type = LeaveType::from_str(&self.leave_type)
            .map_err(|_| StoreError::Corrupt(format!("unknown leave type `{}`", self.leave_type)))?;
        let status = LeaveStatus::from_str(&self.status)
            .map_err(|_| StoreError::Corrupt(format!("unknown leave status `{}`", self.status)))?;
        Ok(LeaveRequest {
            id: self.id,
            organization_id: self.organization_id,
            employee_id: self.employee_id,
            leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            reason: self.reason,
            approved_by: self.approved_by,
            applied_at: self.applied_at,
        })
    }
}

const LEAVE_COLUMNS: &str =
    "id, organization_id, employee_id, leave_type, start_date, end_date, status, reason, \
     approved_by, applied_at";

#[async_trait]
impl Store for MySqlStore {
    async fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO organizations
                (name, contact_email, latitude, longitude, checkin_time, checkout_time, week_off)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.contact_email)
        .bind(new.location.latitude)
        .bind(new.location.longitude)
        .bind(&new.checkin_time)
        .bind(&new.checkout_time)
        .bind(&new.week_off)
        .execute(&self.pool)
        .await
        .map_err(duplicate_key)?;

        self.organization(result.last_insert_id()).await
    }

    async fn organization(&self, id: u64) -> Result<Organization, StoreError> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, contact_email, latitude, longitude, checkin_time, checkout_time,
                   week_off, is_active
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("organization"))?;

        let holidays = sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT name, start_date, end_date
            FROM organization_holidays
            WHERE organization_id = ?
            ORDER BY start_date
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(row.into_organization(holidays))
    }

    async fn add_holiday(&self, organization_id: u64, holiday: Holiday) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO organization_holidays (organization_id, name, start_date, end_date)
            SELECT id, ?, ?, ? FROM organizations WHERE id = ?
            "#,
        )
        .bind(&holiday.name)
        .bind(holiday.start_date)
        .bind(holiday.end_date)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("organization"));
        }
        Ok(())
    }

    async fn deactivate_organization(&self, id: u64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE organizations SET is_active = FALSE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("organization"));
        }
        Ok(())
    }

    async fn insert_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (organization_id, name, username, email, password_hash, role, salary,
                 join_date, work_hours, alloted_leave, reporting_manager)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.organization_id)
        .bind(&new.name)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.to_string())
        .bind(new.salary)
        .bind(new.join_date)
        .bind(new.work_hours)
        .bind(new.alloted_leave)
        .bind(new.reporting_manager)
        .execute(&self.pool)
        .await
        .map_err(duplicate_key)?;

        self.employee(result.last_insert_id()).await
    }

    async fn employee(&self, id: u64) -> Result<Employee, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, organization_id, name, username, email, password_hash, role, is_active,
                   salary, join_date, work_hours, alloted_leave, leave_taken, reporting_manager
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("employee"))?
        .into_employee()
    }

    async fn employee_by_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, organization_id, name, username, email, password_hash, role, is_active,
                   salary, join_date, work_hours, alloted_leave, leave_taken, reporting_manager
            FROM employees
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(EmployeeRow::into_employee)
        .transpose()
    }

    async fn attendance(&self, id: u64) -> Result<AttendanceRecord, StoreError> {
        sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("attendance record"))?
        .into_record()
    }

    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        ))
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .map(AttendanceRow::into_record)
        .transpose()
    }

    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date"
        ))
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AttendanceRow::into_record).collect()
    }

    async fn insert_attendance(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let (request, reason, by, reg_in, reg_out) = regularization_columns(&new.regularization);

        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (organization_id, employee_id, date, status, check_in, check_in_lat, check_in_lon,
                 regularize_request, regularize_reason, regularized_by,
                 regularized_check_in, regularized_check_out)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.organization_id)
        .bind(new.employee_id)
        .bind(new.date)
        .bind(new.status.to_string())
        .bind(new.check_in)
        .bind(new.check_in_location.map(|p| p.latitude))
        .bind(new.check_in_location.map(|p| p.longitude))
        .bind(request)
        .bind(reason)
        .bind(by)
        .bind(reg_in)
        .bind(reg_out)
        .execute(&self.pool)
        .await
        .map_err(duplicate_key)?;

        self.attendance(result.last_insert_id()).await
    }

    async fn record_check_in(
        &self,
        record_id: u64,
        at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_in = ?, check_in_lat = ?, check_in_lon = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(AttendanceStatus::CheckedIn.to_string())
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("attendance record"));
        }
        Ok(())
    }

    async fn record_check_out(
        &self,
        record_id: u64,
        update: CheckOutUpdate,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, check_out_lat = ?, check_out_lon = ?, status = ?, work_hours = ?
            WHERE id = ?
            "#,
        )
        .bind(update.at)
        .bind(update.location.latitude)
        .bind(update.location.longitude)
        .bind(update.status.to_string())
        .bind(update.work_hours)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("attendance record"));
        }
        Ok(())
    }

    async fn request_regularization(
        &self,
        record_id: u64,
        status: AttendanceStatus,
        regularization: Regularization,
    ) -> Result<(), StoreError> {
        let (request, reason, by, reg_in, reg_out) = regularization_columns(&regularization);

        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET status = ?, regularize_request = ?, regularize_reason = ?, regularized_by = ?,
                regularized_check_in = ?, regularized_check_out = ?
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(request)
        .bind(reason)
        .bind(by)
        .bind(reg_in)
        .bind(reg_out)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("attendance record"));
        }
        Ok(())
    }

    async fn apply_regularization_review(
        &self,
        record_id: u64,
        review: RegularizationReview,
    ) -> Result<(), StoreError> {
        let (request, reason, by, reg_in, reg_out) = regularization_columns(&review.regularization);

        // Guarded on the pending state: the second of two racing reviewers
        // matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET status = ?,
                check_in = COALESCE(?, check_in),
                check_out = COALESCE(?, check_out),
                work_hours = COALESCE(?, work_hours),
                regularize_request = ?, regularize_reason = ?, regularized_by = ?,
                regularized_check_in = ?, regularized_check_out = ?
            WHERE id = ? AND regularize_request = 'pending'
            "#,
        )
        .bind(review.status.to_string())
        .bind(review.check_in)
        .bind(review.check_out)
        .bind(review.work_hours)
        .bind(request)
        .bind(reason)
        .bind(by)
        .bind(reg_in)
        .bind(reg_out)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Stale);
        }
        Ok(())
    }

    async fn pending_regularizations(
        &self,
        organization_id: u64,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE organization_id = ? AND regularize_request = 'pending' ORDER BY date"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AttendanceRow::into_record).collect()
    }

    async fn insert_leave(&self, new: NewLeave) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (organization_id, employee_id, leave_type, start_date, end_date, status, reason)
            VALUES (?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(new.organization_id)
        .bind(new.employee_id)
        .bind(new.leave_type.to_string())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        self.leave(result.last_insert_id()).await
    }

    async fn leave(&self, id: u64) -> Result<LeaveRequest, StoreError> {
        sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("leave request"))?
        .into_leave()
    }

    async fn overlapping_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND status IN ('pending', 'approved') \
               AND start_date <= ? AND end_date >= ? \
             LIMIT 1"
        ))
        .bind(employee_id)
        .bind(end)
        .bind(start)
        .fetch_optional(&self.pool)
        .await?
        .map(LeaveRow::into_leave)
        .transpose()
    }

    async fn leaves(
        &self,
        organization_id: u64,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE organization_id = ?"
        );
        if filter.employee_id.is_some() {
            sql.push_str(" AND employee_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.reporting_manager.is_some() {
            sql.push_str(
                " AND employee_id IN (SELECT id FROM employees WHERE reporting_manager = ?)",
            );
        }
        sql.push_str(" ORDER BY applied_at DESC");

        let mut query = sqlx::query_as::<_, LeaveRow>(&sql).bind(organization_id);
        if let Some(employee_id) = filter.employee_id {
            query = query.bind(employee_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }
        if let Some(manager) = filter.reporting_manager {
            query = query.bind(manager);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(LeaveRow::into_leave).collect()
    }

    async fn apply_leave_review(
        &self,
        leave: &LeaveRequest,
        review: LeaveReview,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approved_by = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(review.status.to_string())
        .bind(review.approved_by)
        .bind(leave.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Stale);
        }

        for date in &review.days {
            let existing = sqlx::query_scalar::<_, u64>(
                "SELECT id FROM attendance WHERE employee_id = ? AND date = ? FOR UPDATE",
            )
            .bind(leave.employee_id)
            .bind(*date)
            .fetch_optional(&mut *tx)
            .await?;

            match existing {
                Some(record_id) => {
                    sqlx::query("UPDATE attendance SET status = ? WHERE id = ?")
                        .bind(review.day_status.to_string())
                        .bind(record_id)
                        .execute(&mut *tx)
                        .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO attendance (organization_id, employee_id, date, status)
                        VALUES (?, ?, ?, ?)
                        "#,
                    )
                    .bind(leave.organization_id)
                    .bind(leave.employee_id)
                    .bind(*date)
                    .bind(review.day_status.to_string())
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        if review.leave_taken_delta > 0 {
            sqlx::query("UPDATE employees SET leave_taken = leave_taken + ? WHERE id = ?")
                .bind(review.leave_taken_delta)
                .bind(leave.employee_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
