//! Great-circle distance on a spherical Earth.

use geo::{Distance, HaversineMeasure, Point};
use outing_shared::GeoPoint;

/// Fares are calibrated against a 3959 mile sphere, not the GRS80 mean
/// radius `geo::Haversine` uses.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

fn point(p: GeoPoint) -> Point<f64> {
    Point::new(p.lng, p.lat)
}

/// Haversine distance between two points, in miles.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_MILES).distance(point(a), point(b))
}
