//! Struct definitions and implementations for [`Location`].

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A [`Location`] represents the geographic position of an airport.
///
/// Altitude is carried for completeness but does not influence the
/// great-circle distances used by the simulation.
#[derive(Debug, PartialEq, Hash, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct Location {
    /// The latitude of the location.
    pub latitude: OrderedFloat<f64>,

    /// The longitude of the location.
    pub longitude: OrderedFloat<f64>,

    /// The altitude of the location in meters.
    pub altitude_meters: OrderedFloat<f64>,
}

impl Location {
    /// Shorthand constructor for a sea-level location.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            latitude: OrderedFloat(latitude),
            longitude: OrderedFloat(longitude),
            altitude_meters: OrderedFloat(0.0),
        }
    }
}
