use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    Sick,
    Casual,
    Paid,
}

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Resolved requests are immutable; re-resolution is a conflict.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub organization_id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    pub leave_type: LeaveType,

    #[schema(example = "2026-01-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    /// Inclusive.
    #[schema(example = "2026-01-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    pub status: LeaveStatus,

    #[schema(example = "family function", nullable = true)]
    pub reason: Option<String>,

    #[schema(example = 1000, nullable = true)]
    pub approved_by: Option<u64>,

    #[schema(value_type = String, format = "date-time")]
    pub applied_at: NaiveDateTime,
}

impl LeaveRequest {
    /// Inclusive day count of the range.
    pub fn day_count(&self) -> u32 {
        ((self.end_date - self.start_date).num_days() + 1) as u32
    }

    /// Every date in the range, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(self.day_count() as usize);
        let mut day = self.start_date;
        while day <= self.end_date {
            days.push(day);
            day = day + Duration::days(1);
        }
        days
    }
}
