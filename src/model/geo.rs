use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 22.3569)]
    pub latitude: f64,

    #[schema(example = 91.7832)]
    pub longitude: f64,
}
