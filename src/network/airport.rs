//! Struct definitions and implementations for airports, the vertices of
//! the route graph.
//!
//! An airport combines a geographic position with an integer capacity
//! (concurrent gate/runway slots) and two static wind labels, one per
//! altitude band. `Unknown` labels are resolved at simulation time by
//! the wind oracle.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::network::location::Location;

/// Wind regime over an airport for one altitude band.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindLabel {
    /// Tailwind, speeds up the affected phases.
    Favor,
    /// Headwind, slows down the affected phases.
    Against,
    /// No effective wind.
    #[default]
    Neutral,
    /// Not provided by the input table; resolved by the wind oracle.
    Unknown,
}

impl Display for WindLabel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            WindLabel::Favor => write!(f, "favor"),
            WindLabel::Against => write!(f, "against"),
            WindLabel::Neutral => write!(f, "neutral"),
            WindLabel::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for WindLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "favor" => Ok(WindLabel::Favor),
            "against" => Ok(WindLabel::Against),
            "neutral" => Ok(WindLabel::Neutral),
            "" | "unknown" => Ok(WindLabel::Unknown),
            other => Err(format!("unrecognized wind label: {}", other)),
        }
    }
}

/// Altitude band a wind label applies to.
///
/// Taxi, takeoff, approach and landing read the low band; cruise reads
/// the high band.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AltitudeBand {
    /// Terminal-area phases.
    Low,
    /// Cruise.
    High,
}

/// A vertex of the route graph.
///
/// Capacity and position are immutable once the engine starts; occupancy
/// lives in the engine's capacity resources, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    /// Identifier, typically an IATA/ICAO code. Typed as a [`String`] to
    /// allow synthetic ids for airfields without one.
    pub id: String,

    /// Geographic position of the airport.
    pub location: Location,

    /// Concurrent gate/runway slots, at least 1.
    pub capacity: u32,

    /// Wind label for terminal-area phases.
    pub wind_low: WindLabel,

    /// Wind label for the cruise band.
    pub wind_high: WindLabel,
}

impl Airport {
    /// Creates an airport with unknown wind labels.
    pub fn new(id: &str, location: Location, capacity: u32) -> Self {
        Airport {
            id: id.to_string(),
            location,
            capacity,
            wind_low: WindLabel::Unknown,
            wind_high: WindLabel::Unknown,
        }
    }

    /// Static wind label for an altitude band.
    pub fn wind(&self, band: AltitudeBand) -> WindLabel {
        match band {
            AltitudeBand::Low => self.wind_low,
            AltitudeBand::High => self.wind_high,
        }
    }
}

#[cfg(test)]
mod airport_tests {
    use super::*;

    #[test]
    fn test_wind_label_round_trip() {
        for label in [
            WindLabel::Favor,
            WindLabel::Against,
            WindLabel::Neutral,
            WindLabel::Unknown,
        ] {
            let parsed: WindLabel = label.to_string().parse().unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn test_wind_label_empty_is_unknown() {
        assert_eq!("".parse::<WindLabel>().unwrap(), WindLabel::Unknown);
        assert_eq!("  ".parse::<WindLabel>().unwrap(), WindLabel::Unknown);
    }

    #[test]
    fn test_wind_label_rejects_garbage() {
        assert!("sideways".parse::<WindLabel>().is_err());
    }

    #[test]
    fn test_wind_by_band() {
        let mut airport = Airport::new("MAD", Location::new(40.47, -3.56), 8);
        airport.wind_low = WindLabel::Against;
        airport.wind_high = WindLabel::Favor;
        assert_eq!(airport.wind(AltitudeBand::Low), WindLabel::Against);
        assert_eq!(airport.wind(AltitudeBand::High), WindLabel::Favor);
    }
}
