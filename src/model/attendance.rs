use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::geo::GeoPoint;

/// Status stored on an attendance record. Closed set; unknown strings are a
/// data error.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    OnLeave,
    PaidLeave,
    CheckedIn,
    PendingRegularize,
    ApprovedRegularise,
    RejectRegularise,
}

/// The single authoritative classification of an employee's day, as produced
/// by the day-status resolver. A superset of [`AttendanceStatus`]: the extra
/// variants are synthesized for days with no stored record.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayStatus {
    BeforeJoin,
    Holiday,
    WeekOff,
    NotAvailable,
    Absent,
    Present,
    Late,
    HalfDay,
    OnLeave,
    PaidLeave,
    CheckedIn,
    PendingRegularize,
    ApprovedRegularise,
    RejectRegularise,
}

impl From<AttendanceStatus> for DayStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => DayStatus::Present,
            AttendanceStatus::Absent => DayStatus::Absent,
            AttendanceStatus::Late => DayStatus::Late,
            AttendanceStatus::HalfDay => DayStatus::HalfDay,
            AttendanceStatus::OnLeave => DayStatus::OnLeave,
            AttendanceStatus::PaidLeave => DayStatus::PaidLeave,
            AttendanceStatus::CheckedIn => DayStatus::CheckedIn,
            AttendanceStatus::PendingRegularize => DayStatus::PendingRegularize,
            AttendanceStatus::ApprovedRegularise => DayStatus::ApprovedRegularise,
            AttendanceStatus::RejectRegularise => DayStatus::RejectRegularise,
        }
    }
}

/// Regularization lifecycle of a record, as one tagged variant so the outer
/// status, the request state, and the applied times cannot drift apart.
/// `Pending` keeps the requested times; approval moves them onto the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Regularization {
    None,
    Pending {
        #[schema(value_type = String, format = "date-time")]
        check_in: NaiveDateTime,
        #[schema(value_type = String, format = "date-time")]
        check_out: NaiveDateTime,
        reason: String,
    },
    Approved {
        #[schema(value_type = String, format = "date-time")]
        check_in: NaiveDateTime,
        #[schema(value_type = String, format = "date-time")]
        check_out: NaiveDateTime,
        reason: String,
        approved_by: u64,
    },
    Rejected {
        reason: String,
        rejected_by: u64,
    },
}

impl Regularization {
    pub fn is_pending(&self) -> bool {
        matches!(self, Regularization::Pending { .. })
    }
}

/// One per (employee, calendar day); created lazily by check-in, leave review,
/// or a regularization request, and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub organization_id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "2026-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,

    pub check_in_location: Option<GeoPoint>,
    pub check_out_location: Option<GeoPoint>,

    /// (check_out - check_in) in hours, set at check-out or regularization.
    #[schema(example = 8.5, nullable = true)]
    pub work_hours: Option<f64>,

    pub regularization: Regularization,
}

impl AttendanceRecord {
    /// True once a regularization has been approved; the record's check-in/out
    /// then equal the requested values.
    pub fn is_regularized(&self) -> bool {
        matches!(self.regularization, Regularization::Approved { .. })
    }
}
