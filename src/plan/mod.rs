//! Daily flight plans: the canonical plan row type, plan validation and
//! the weighted plan generator.

pub mod generator;

pub use generator::{generate_daily_plan, PlanConfig};

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::network::{is_exterior, RouteGraph};

/// One scheduled flight. The single canonical row type used for plan
/// ingest, generation and engine spawning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    /// Flight identifier.
    pub id: String,
    /// Origin airport id.
    pub origin: String,
    /// Destination airport id, possibly the reserved exterior id.
    pub destination: String,
    /// Scheduled departure, minutes from the start of the run.
    pub departure_min: u32,
    /// Scheduled arrival, minutes from the start of the run.
    pub scheduled_arrival_min: u32,
    /// Planned route distance in km.
    pub distance_km: f64,
    /// Nominal duration in minutes at the reference cruise speed.
    pub duration_min: u32,
    /// True when the flight leaves the modelled network.
    pub exterior: bool,
    /// Relative weight of the route this flight was allocated to.
    pub route_weight: f64,
}

impl FlightPlan {
    /// Departure minute rendered as `HH:MM` within its day.
    pub fn departure_hhmm(&self) -> String {
        let minute_of_day = self.departure_min % 1440;
        let time = chrono::NaiveTime::from_num_seconds_from_midnight_opt(minute_of_day * 60, 0)
            .unwrap_or(chrono::NaiveTime::MIN);
        time.format("%H:%M").to_string()
    }
}

/// Error types for plan validation and generation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// A plan row references an airport id that is not in the network.
    UnknownAirport {
        /// Offending flight id.
        flight: String,
        /// The unresolved airport id.
        airport: String,
    },
    /// Origin and destination coincide and the destination is not
    /// exterior.
    SameEndpoints(String),
    /// Scheduled arrival is not after the scheduled departure.
    ArrivalBeforeDeparture(String),
    /// The generation hour window is empty.
    EmptyHourWindow,
    /// The graph has no edge with positive weight to allocate flights
    /// on.
    NoRoutes,
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            PlanError::UnknownAirport { flight, airport } => {
                write!(f, "flight {} references unknown airport {}", flight, airport)
            }
            PlanError::SameEndpoints(flight) => {
                write!(f, "flight {} has equal origin and destination", flight)
            }
            PlanError::ArrivalBeforeDeparture(flight) => {
                write!(f, "flight {} arrives before it departs", flight)
            }
            PlanError::EmptyHourWindow => write!(f, "end hour must be greater than start hour"),
            PlanError::NoRoutes => write!(f, "no routes with positive weight"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Validates a plan against the network.
///
/// Fails fast on the first invalid row: unknown airport ids, equal
/// endpoints with a non-exterior destination, or an arrival that is not
/// strictly after the departure.
pub fn validate_plan(rows: &[FlightPlan], network: &RouteGraph) -> Result<(), PlanError> {
    for row in rows {
        if network.airport(&row.origin).is_none() {
            return Err(PlanError::UnknownAirport {
                flight: row.id.clone(),
                airport: row.origin.clone(),
            });
        }
        if !is_exterior(&row.destination) && network.airport(&row.destination).is_none() {
            return Err(PlanError::UnknownAirport {
                flight: row.id.clone(),
                airport: row.destination.clone(),
            });
        }
        if row.origin == row.destination {
            return Err(PlanError::SameEndpoints(row.id.clone()));
        }
        if row.scheduled_arrival_min <= row.departure_min {
            return Err(PlanError::ArrivalBeforeDeparture(row.id.clone()));
        }
    }
    Ok(())
}
