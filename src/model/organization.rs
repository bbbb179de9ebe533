use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::geo::GeoPoint;

/// A named closed date interval during which the whole organization is off.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[schema(example = "Eid")]
    pub name: String,

    #[schema(example = "2026-03-20", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-03-22", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

impl Holiday {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Acme Traders")]
    pub name: String,

    #[schema(example = "hr@acme.example")]
    pub contact_email: String,

    /// Reference coordinate all check-ins/outs are geofenced against.
    pub location: GeoPoint,

    /// Standard working hours, "HH:MM".
    #[schema(example = "09:00")]
    pub checkin_time: String,

    #[schema(example = "18:00")]
    pub checkout_time: String,

    /// Full weekday name ("Sunday".."Saturday") treated as non-working, if any.
    #[schema(example = "Sunday", nullable = true)]
    pub week_off: Option<String>,

    pub holidays: Vec<Holiday>,

    /// Organizations are never deleted, only deactivated.
    pub is_active: bool,
}
