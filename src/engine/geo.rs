//! Great-circle distance on a spherical Earth.

use crate::config::defaults::EARTH_MEAN_RADIUS_KM;
use crate::types::GeoPoint;

/// Haversine distance between two points, in kilometres.
///
/// Uses the IUGG mean Earth radius. Within the matcher's search radius the
/// error against an ellipsoidal geodesic stays well under 0.5%.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_KM * h.sqrt().min(1.0).asin()
}
