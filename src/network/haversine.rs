//! Implementation of the Haversine formula for calculating the distance
//! between two points on a sphere.
//!
//! See [Wikipedia](https://en.wikipedia.org/wiki/Haversine_formula) for
//! more.
//!
//! **Distance is returned in kilometers**.

use crate::network::location::Location;

/// Calculate the distance between two points on a sphere.
///
/// # Notes
/// The current formula does ***not*** take into account the altitude of
/// the points.
pub fn distance(start: &Location, end: &Location) -> f64 {
    // km in radians
    let kilometers: f64 = 6371.0;

    let d_lat: f64 = (end.latitude.into_inner() - start.latitude.into_inner()).to_radians();
    let d_lon: f64 = (end.longitude.into_inner() - start.longitude.into_inner()).to_radians();
    let lat1: f64 = (start.latitude.into_inner()).to_radians();
    let lat2: f64 = (end.latitude.into_inner()).to_radians();

    let a: f64 = ((d_lat / 2.0).sin()) * ((d_lat / 2.0).sin())
        + ((d_lon / 2.0).sin()) * ((d_lon / 2.0).sin()) * (lat1.cos()) * (lat2.cos());
    let c: f64 = 2.0 * ((a.sqrt()).atan2((1.0 - a).sqrt()));

    kilometers * c
}

#[cfg(test)]
pub mod haversine_test {
    use super::*;

    #[test]
    fn haversine_distance_in_kilometers() {
        let start = Location::new(38.898556, -77.037852);
        let end = Location::new(38.897147, -77.043934);
        let d = distance(&start, &end);
        assert!((d - 0.549).abs() < 0.01);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        // one degree of latitude is roughly 111 km everywhere
        let start = Location::new(0.0, 0.0);
        let end = Location::new(1.0, 0.0);
        let d = distance(&start, &end);
        assert!((d - 111.2).abs() < 1.0);
    }

    #[test]
    fn haversine_zero_distance() {
        let p = Location::new(40.416775, -3.703790);
        assert_eq!(distance(&p, &p), 0.0);
    }
}
