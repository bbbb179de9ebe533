use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Employee,
    ReportingManager,
    SuperAdmin,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    #[schema(example = 1001)]
    pub id: u64,

    #[schema(example = 1)]
    pub organization_id: u64,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "jane.doe")]
    pub username: String,

    #[schema(example = "jane.doe@acme.example")]
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(value_type = String, write_only)]
    pub password_hash: String,

    pub role: Role,

    /// Inactive employees cannot check in, apply for leave, or regularize.
    pub is_active: bool,

    #[schema(example = 30000.0)]
    pub salary: f64,

    /// Days before this date are "before join", never absent.
    #[schema(example = "2025-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    /// Required daily work duration in hours.
    #[schema(example = 8.0)]
    pub work_hours: f64,

    #[schema(example = 18)]
    pub alloted_leave: u32,

    #[schema(example = 0)]
    pub leave_taken: u32,

    /// Approval authority for this employee's leave and regularization.
    #[schema(example = 1000, nullable = true)]
    pub reporting_manager: Option<u64>,
}
