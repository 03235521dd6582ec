//! Append-only output rows produced by the engine: per-airport
//! occupancy events, per-flight phase samples and the final per-flight
//! record.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::network::WindLabel;

/// What happened to an airport's occupancy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Occupancy seeded at engine start.
    Initial,
    /// A departing flight took a slot to taxi.
    TaxiBegin,
    /// A departing flight took off and released its slot.
    Takeoff,
    /// An arriving flight was granted a slot.
    Landing,
    /// An arrived flight released its slot.
    DepartDestination,
    /// A background arrival took a slot.
    ExternalArrival,
    /// A background arrival released its slot.
    ExternalDeparture,
    /// A background arrival found the airport full; occupancy unchanged.
    CapacityRefused,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            EventKind::Initial => write!(f, "initial"),
            EventKind::TaxiBegin => write!(f, "taxi_begin"),
            EventKind::Takeoff => write!(f, "takeoff"),
            EventKind::Landing => write!(f, "landing"),
            EventKind::DepartDestination => write!(f, "depart_destination"),
            EventKind::ExternalArrival => write!(f, "external_arrival"),
            EventKind::ExternalDeparture => write!(f, "external_departure"),
            EventKind::CapacityRefused => write!(f, "capacity_refused"),
        }
    }
}

/// One occupancy state change at one airport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    /// Virtual minute of the change.
    pub minute: f64,
    /// Airport id.
    pub airport: String,
    /// What changed.
    pub kind: EventKind,
    /// Occupancy after the change.
    pub occupancy: u32,
    /// Capacity of the airport.
    pub capacity: u32,
}

/// Flight phase names used in phase samples.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Gate to runway.
    Taxi,
    /// Initial climb segment.
    Takeoff,
    /// En-route segment.
    Cruise,
    /// Extra leg flown to a diversion destination.
    DiversionLeg,
    /// Descent towards the destination.
    Approach,
    /// Holding for a destination slot.
    HoldQueue,
    /// Final segment down to the runway.
    Landing,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Phase::Taxi => write!(f, "taxi"),
            Phase::Takeoff => write!(f, "takeoff"),
            Phase::Cruise => write!(f, "cruise"),
            Phase::DiversionLeg => write!(f, "diversion_leg"),
            Phase::Approach => write!(f, "approach"),
            Phase::HoldQueue => write!(f, "hold_queue"),
            Phase::Landing => write!(f, "landing"),
        }
    }
}

/// One executed flight phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSample {
    /// Flight id.
    pub flight: String,
    /// Phase name.
    pub phase: Phase,
    /// Origin airport id.
    pub origin: String,
    /// Destination as scheduled.
    pub scheduled_destination: String,
    /// Destination actually flown to at the time of the sample.
    pub final_destination: String,
    /// Phase start, virtual minutes.
    pub start_min: f64,
    /// Phase end, virtual minutes.
    pub end_min: f64,
    /// Ground distance covered in the phase, km.
    pub distance_km: f64,
    /// Effective speed, km/h.
    pub speed_kmh: f64,
    /// Wind label applied to the phase.
    pub wind: WindLabel,
    /// Fuel burned during the phase, liters.
    pub fuel_l: f64,
    /// Free-form annotation.
    pub note: String,
}

impl PhaseSample {
    /// Elapsed minutes of the phase.
    pub fn duration_min(&self) -> f64 {
        (self.end_min - self.start_min).max(0.0)
    }
}

/// Timing, speed and wind outcome of one phase, kept on the flight
/// until the final record is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Elapsed minutes.
    pub duration_min: f64,
    /// Ground distance, km.
    pub distance_km: f64,
    /// Effective speed, km/h.
    pub speed_kmh: f64,
    /// Wind label applied.
    pub wind: WindLabel,
    /// Fuel burned, liters.
    pub fuel_l: f64,
}

/// Final outcome of one completed flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Flight id.
    pub id: String,
    /// Origin airport id.
    pub origin: String,
    /// Destination as scheduled.
    pub scheduled_destination: String,
    /// Destination actually reached.
    pub final_destination: String,
    /// True iff the flight was diverted to another network airport.
    pub diverted: bool,
    /// True when the flight left the modelled network.
    pub exterior: bool,
    /// Scheduled departure, virtual minutes.
    pub scheduled_departure_min: f64,
    /// Actual arrival, virtual minutes.
    pub real_arrival_min: f64,
    /// Arrival delay against the nominal duration, clamped at zero.
    pub total_delay_min: f64,
    /// Extra minutes attributed to the diversion leg.
    pub diversion_delay_min: f64,
    /// Minutes spent queued for a destination slot.
    pub queue_wait_min: f64,
    /// Total block time from departure to arrival, minutes.
    pub total_time_min: f64,
    /// Fuel burned over all phases, liters.
    pub fuel_used_l: f64,
    /// Fuel left against the type's capacity, clamped at zero.
    pub fuel_remaining_l: f64,
    /// Aircraft type name.
    pub aircraft: String,
    /// Taxi phase outcome.
    pub taxi: PhaseOutcome,
    /// Takeoff phase outcome.
    pub takeoff: PhaseOutcome,
    /// Cruise phase outcome.
    pub cruise: PhaseOutcome,
    /// Approach phase outcome.
    pub approach: PhaseOutcome,
    /// Landing phase outcome.
    pub landing: PhaseOutcome,
    /// Distance of the plan row, km.
    pub planned_distance_km: f64,
    /// Distance of the route actually flown, km.
    pub route_distance_km: f64,
}
