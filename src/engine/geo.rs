use crate::error::EngineError;
use crate::model::geo::GeoPoint;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Maximum distance from the organization's reference point at which a
/// check-in/out is accepted.
pub const GEOFENCE_RADIUS_METERS: f64 = 100.0;

fn validate(point: &GeoPoint) -> Result<(), EngineError> {
    if !point.latitude.is_finite() || point.latitude.abs() > 90.0 {
        return Err(EngineError::validation("latitude must be within -90 and 90"));
    }
    if !point.longitude.is_finite() || point.longitude.abs() > 180.0 {
        return Err(EngineError::validation(
            "longitude must be within -180 and 180",
        ));
    }
    Ok(())
}

/// Great-circle distance between two coordinates, haversine on a sphere.
pub fn distance_meters(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Validates both coordinates and returns the distance, rejecting reports
/// outside [`GEOFENCE_RADIUS_METERS`].
pub fn enforce_geofence(reference: &GeoPoint, reported: &GeoPoint) -> Result<f64, EngineError> {
    validate(reference)?;
    validate(reported)?;

    let distance = distance_meters(reference, reported);
    if distance > GEOFENCE_RADIUS_METERS {
        return Err(EngineError::validation(
            "location is not within the allowed range",
        ));
    }
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let p = point(22.3569, 91.7832);
        assert!(distance_meters(&p, &p) < f64::EPSILON);
    }

    #[test]
    fn one_degree_longitude_at_equator_is_about_111_km() {
        let d = distance_meters(&point(0.0, 0.0), &point(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn accepts_report_inside_radius() {
        let office = point(22.3569, 91.7832);
        // ~55 m north
        let nearby = point(22.35740, 91.7832);
        let d = enforce_geofence(&office, &nearby).unwrap();
        assert!(d < GEOFENCE_RADIUS_METERS);
    }

    #[test]
    fn rejects_report_beyond_radius() {
        let office = point(22.3569, 91.7832);
        // ~1.1 km north
        let far = point(22.3669, 91.7832);
        let err = enforce_geofence(&office, &far).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_coordinates() {
        let office = point(22.3569, 91.7832);
        assert!(enforce_geofence(&office, &point(91.0, 0.0)).is_err());
        assert!(enforce_geofence(&office, &point(0.0, 200.0)).is_err());
        assert!(enforce_geofence(&office, &point(f64::NAN, 0.0)).is_err());
    }
}
