//! Great-circle distance

use crate::entities::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
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
    fn same_point_is_zero() {
        assert_eq!(haversine_km(point(45.07, 7.68), point(45.07, 7.68)), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_km(point(0.0, 0.0), point(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let turin = point(45.0703, 7.6869);
        let milan = point(45.4642, 9.19);
        assert!((haversine_km(turin, milan) - haversine_km(milan, turin)).abs() < 1e-9);
        assert!((haversine_km(turin, milan) - 126.0).abs() < 2.0);
    }
}
