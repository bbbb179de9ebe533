pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Regularization};
use crate::model::employee::{Employee, Role};
use crate::model::geo::GeoPoint;
use crate::model::leave::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::organization::{Holiday, Organization};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(&'static str),

    /// Unique-key violation, e.g. a second record for the same (employee, day).
    #[error("duplicate record")]
    Duplicate,

    /// A guarded update matched no row: the target was already resolved by
    /// another writer.
    #[error("no pending row to update")]
    Stale,

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub struct NewOrganization {
    pub name: String,
    pub contact_email: String,
    pub location: GeoPoint,
    pub checkin_time: String,
    pub checkout_time: String,
    pub week_off: Option<String>,
}

pub struct NewEmployee {
    pub organization_id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub salary: f64,
    pub join_date: NaiveDate,
    pub work_hours: f64,
    pub alloted_leave: u32,
    pub reporting_manager: Option<u64>,
}

pub struct NewAttendance {
    pub organization_id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveDateTime>,
    pub check_in_location: Option<GeoPoint>,
    pub regularization: Regularization,
}

pub struct NewLeave {
    pub organization_id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

pub struct CheckOutUpdate {
    pub at: NaiveDateTime,
    pub location: GeoPoint,
    pub status: AttendanceStatus,
    pub work_hours: f64,
}

/// Everything a terminal leave transition writes; applied atomically.
pub struct LeaveReview {
    pub status: LeaveStatus,
    pub approved_by: u64,
    /// Stamped onto every day in the range.
    pub day_status: AttendanceStatus,
    pub days: Vec<NaiveDate>,
    pub leave_taken_delta: u32,
}

/// Everything a terminal regularization transition writes; applied as one
/// guarded update so two concurrent reviews cannot both land.
pub struct RegularizationReview {
    pub status: AttendanceStatus,
    pub regularization: Regularization,
    /// `Some` on approval: the requested times become the live times.
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub work_hours: Option<f64>,
}

#[derive(Default)]
pub struct LeaveListFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    /// Restrict to employees reporting to this manager.
    pub reporting_manager: Option<u64>,
}

/// Persistence seam of the engine. The MySQL implementation backs the
/// server; the in-memory one backs the test suite.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_organization(&self, new: NewOrganization) -> Result<Organization, StoreError>;
    async fn organization(&self, id: u64) -> Result<Organization, StoreError>;
    async fn add_holiday(&self, organization_id: u64, holiday: Holiday) -> Result<(), StoreError>;
    async fn deactivate_organization(&self, id: u64) -> Result<(), StoreError>;

    async fn insert_employee(&self, new: NewEmployee) -> Result<Employee, StoreError>;
    async fn employee(&self, id: u64) -> Result<Employee, StoreError>;
    async fn employee_by_username(&self, username: &str) -> Result<Option<Employee>, StoreError>;

    async fn attendance(&self, id: u64) -> Result<AttendanceRecord, StoreError>;
    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;
    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;
    /// Fails with [`StoreError::Duplicate`] if the (employee, day) slot is
    /// already taken.
    async fn insert_attendance(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError>;
    /// Upgrades a placeholder record with the actual check-in.
    async fn record_check_in(
        &self,
        record_id: u64,
        at: NaiveDateTime,
        location: GeoPoint,
    ) -> Result<(), StoreError>;
    async fn record_check_out(
        &self,
        record_id: u64,
        update: CheckOutUpdate,
    ) -> Result<(), StoreError>;
    async fn request_regularization(
        &self,
        record_id: u64,
        status: AttendanceStatus,
        regularization: Regularization,
    ) -> Result<(), StoreError>;
    /// Guarded on the pending state; [`StoreError::Stale`] when already
    /// resolved.
    async fn apply_regularization_review(
        &self,
        record_id: u64,
        review: RegularizationReview,
    ) -> Result<(), StoreError>;
    async fn pending_regularizations(
        &self,
        organization_id: u64,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn insert_leave(&self, new: NewLeave) -> Result<LeaveRequest, StoreError>;
    async fn leave(&self, id: u64) -> Result<LeaveRequest, StoreError>;
    /// Any pending/approved request of the employee intersecting [start, end].
    async fn overlapping_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<LeaveRequest>, StoreError>;
    async fn leaves(
        &self,
        organization_id: u64,
        filter: LeaveListFilter,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
    /// Commits the request transition, every affected day record, and the
    /// leave-taken increment as one unit, or nothing at all.
    async fn apply_leave_review(
        &self,
        leave: &LeaveRequest,
        review: LeaveReview,
    ) -> Result<(), StoreError>;
}
