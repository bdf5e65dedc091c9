//! Geofence validation
//!
//! Pure great-circle math used to decide whether an employee-initiated
//! check-in happened close enough to the employee's office anchor.
//! No state and no error conditions: every numeric input yields a number.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance in meters between `center` and `point`
pub fn distance_meters(center: GeoPoint, point: GeoPoint) -> f64 {
    let lat1 = center.latitude.to_radians();
    let lat2 = point.latitude.to_radians();
    let d_lat = (point.latitude - center.latitude).to_radians();
    let d_lon = (point.longitude - center.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// `true` when `point` lies on or inside the circle of `radius_m` around `center`
pub fn is_within_radius(center: GeoPoint, point: GeoPoint, radius_m: f64) -> bool {
    distance_meters(center, point) <= radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAKARTA_OFFICE: GeoPoint = GeoPoint::new(-6.2088, 106.8456);

    #[test]
    fn test_identical_points_have_zero_distance() {
        for p in [
            JAKARTA_OFFICE,
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(89.9, -179.9),
            GeoPoint::new(-45.5, 12.25),
        ] {
            assert_eq!(distance_meters(p, p), 0.0);
            assert!(is_within_radius(p, p, 0.0));
            assert!(is_within_radius(p, p, 50.0));
        }
    }

    #[test]
    fn test_nearby_point_is_inside_small_office_radius() {
        let phone = GeoPoint::new(-6.2089, 106.8457);
        let d = distance_meters(JAKARTA_OFFICE, phone);
        assert!(d > 10.0 && d < 20.0, "unexpected distance {}", d);
        assert!(is_within_radius(JAKARTA_OFFICE, phone, 50.0));
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        // 2 * pi * R / 360
        assert!((d - 111_194.93).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(-6.2, 106.8);
        let b = GeoPoint::new(-6.3, 106.9);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let point = GeoPoint::new(-6.2095, 106.8461);
        let exact = distance_meters(JAKARTA_OFFICE, point);
        assert!(is_within_radius(JAKARTA_OFFICE, point, exact));
        assert!(!is_within_radius(JAKARTA_OFFICE, point, exact - 1e-6));
    }

    #[test]
    fn test_far_point_is_outside() {
        let bandung = GeoPoint::new(-6.9175, 107.6191);
        assert!(!is_within_radius(JAKARTA_OFFICE, bandung, 50.0));
        assert!(distance_meters(JAKARTA_OFFICE, bandung) > 100_000.0);
    }
}
