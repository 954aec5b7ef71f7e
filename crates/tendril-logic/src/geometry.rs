//! Geographic primitives: coordinates, great-circle distance, circles.
//!
//! Pure value types with no side effects. Soils and plants each *have* a
//! [`Circle`] and go through it for every spatial test.
//!
//! The three circle predicates deliberately differ in how they treat the
//! boundary:
//!
//! | Predicate | Test | Boundary |
//! |-----------|------|----------|
//! | [`Circle::contains_point`] | `d < r` | exclusive |
//! | [`Circle::contains_full_circle`] | `d + r₂ <= r` | inclusive |
//! | [`Circle::overlaps_with`] | `d <= r + r₂` | inclusive |
//!
//! ```
//! use tendril_logic::geometry::{Circle, Coordinates};
//!
//! let soil = Circle::new(Coordinates::new(51.5, -0.12), 22.0);
//! let plant = Circle::new(Coordinates::new(51.5, -0.12), 5.0);
//! assert!(soil.contains_full_circle(&plant));
//! assert!(soil.overlaps_with(&plant));
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::geo::EARTH_RADIUS_M;

/// A latitude/longitude pair in degrees. Range checks are the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn lat_rad(&self) -> f64 {
        self.lat.to_radians()
    }

    pub fn lng_rad(&self) -> f64 {
        self.lng.to_radians()
    }

    /// Haversine great-circle distance to `other`, in metres.
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        distance_meters(self, other)
    }
}

/// Haversine great-circle distance between two points, in metres.
pub fn distance_meters(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = b.lat_rad() - a.lat_rad();
    let d_lng = b.lng_rad() - a.lng_rad();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat_rad().cos() * b.lat_rad().cos() * (d_lng / 2.0).sin().powi(2);
    // atan2 form stays stable for antipodal points where h rounds past 1.0
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_M * c
}

/// A circular footprint on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub centre: Coordinates,
    pub radius_m: f64,
}

impl Circle {
    pub fn new(centre: Coordinates, radius_m: f64) -> Self {
        Self { centre, radius_m }
    }

    /// True iff `p` lies strictly inside the circle. A point on the
    /// circumference is not contained.
    pub fn contains_point(&self, p: &Coordinates) -> bool {
        self.centre.distance_m(p) < self.radius_m
    }

    /// True iff `other` lies entirely inside this circle. Internal tangency
    /// counts as contained.
    pub fn contains_full_circle(&self, other: &Circle) -> bool {
        self.centre.distance_m(&other.centre) + other.radius_m <= self.radius_m
    }

    /// True iff the two circles share any area. Touching circles overlap.
    pub fn overlaps_with(&self, other: &Circle) -> bool {
        self.centre.distance_m(&other.centre) <= self.radius_m + other.radius_m
    }

    pub fn area_m2(&self) -> f64 {
        std::f64::consts::PI * self.radius_m * self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Degrees of latitude spanning `metres` along a meridian.
    fn lat_offset(metres: f64) -> f64 {
        (metres / EARTH_RADIUS_M).to_degrees()
    }

    fn rel_err(actual: f64, expected: f64) -> f64 {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Coordinates::new(40.782865, -73.965355);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Coordinates::new(37.774929, -122.419416);
        let b = Coordinates::new(37.804363, -122.271111);
        assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 180.0);
        let expected = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!(rel_err(distance_meters(&a, &b), expected) < 1e-5);

        let north = Coordinates::new(90.0, 0.0);
        let south = Coordinates::new(-90.0, 0.0);
        assert!(rel_err(distance_meters(&north, &south), expected) < 1e-5);
    }

    #[test]
    fn test_distance_short_range_along_meridian() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(lat_offset(10.0), 0.0);
        assert!(rel_err(distance_meters(&a, &b), 10.0) < 1e-5);
    }

    #[test]
    fn test_distance_quarter_circumference() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 90.0);
        let expected = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_M;
        assert!(rel_err(distance_meters(&a, &b), expected) < 1e-5);
    }

    #[test]
    fn test_distance_monotonic_in_separation() {
        let origin = Coordinates::new(10.0, 10.0);
        let mut last = 0.0;
        for step in 1..=18 {
            let p = Coordinates::new(10.0 + step as f64 * 5.0, 10.0);
            let d = distance_meters(&origin, &p);
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn test_contains_point_excludes_boundary() {
        let origin = Coordinates::new(0.0, 0.0);
        let on_edge = Coordinates::new(lat_offset(10.0), 0.0);
        let edge_distance = origin.distance_m(&on_edge);

        let circle = Circle::new(origin, edge_distance);
        assert!(!circle.contains_point(&on_edge));

        let bigger = Circle::new(origin, edge_distance + 0.01);
        assert!(bigger.contains_point(&on_edge));
        assert!(circle.contains_point(&origin));
    }

    #[test]
    fn test_contains_full_circle_reflexive() {
        let c = Circle::new(Coordinates::new(12.5, 99.1), 22.0);
        assert!(c.contains_full_circle(&c));
    }

    #[test]
    fn test_contains_full_circle_cases() {
        let soil = Circle::new(Coordinates::new(0.0, 0.0), 20.0);

        let concentric = Circle::new(Coordinates::new(0.0, 0.0), 10.0);
        assert!(soil.contains_full_circle(&concentric));

        let inside = Circle::new(Coordinates::new(lat_offset(5.0), 0.0), 10.0);
        assert!(soil.contains_full_circle(&inside));

        let straddling = Circle::new(Coordinates::new(lat_offset(15.0), 0.0), 10.0);
        assert!(!soil.contains_full_circle(&straddling));

        let outside = Circle::new(Coordinates::new(lat_offset(40.0), 0.0), 10.0);
        assert!(!soil.contains_full_circle(&outside));

        // The smaller circle never contains the larger one
        assert!(!concentric.contains_full_circle(&soil));
    }

    #[test]
    fn test_contains_full_circle_internal_tangent() {
        let centre = Coordinates::new(0.0, 0.0);
        let offset = Coordinates::new(lat_offset(30.0), 0.0);
        let d = centre.distance_m(&offset);

        // d + d == 2d exactly, so the tangency is not lost to rounding
        let soil = Circle::new(centre, 2.0 * d);
        let tangent = Circle::new(offset, d);
        assert!(soil.contains_full_circle(&tangent));
    }

    #[test]
    fn test_concentric_circles_always_overlap() {
        let centre = Coordinates::new(-33.86, 151.2);
        let tiny = Circle::new(centre, 0.5);
        let huge = Circle::new(centre, 500.0);
        assert!(tiny.overlaps_with(&huge));
        assert!(huge.overlaps_with(&tiny));
        assert!(Circle::new(centre, 0.0).overlaps_with(&Circle::new(centre, 0.0)));
    }

    #[test]
    fn test_tangential_circles_overlap() {
        let a_centre = Coordinates::new(0.0, 0.0);
        let b_centre = Coordinates::new(lat_offset(30.0), 0.0);
        let d = a_centre.distance_m(&b_centre);

        let a = Circle::new(a_centre, d / 2.0);
        let b = Circle::new(b_centre, d / 2.0);
        assert!(a.overlaps_with(&b));

        let apart = Circle::new(b_centre, d / 2.0 - 0.1);
        assert!(!a.overlaps_with(&apart));
    }

    #[test]
    fn test_area() {
        let c = Circle::new(Coordinates::default(), 10.0);
        assert!((c.area_m2() - 314.159_265).abs() < 1e-4);
    }
}
