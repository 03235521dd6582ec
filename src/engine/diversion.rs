//! Diversion planner.
//!
//! When the projected wait at a congested destination exceeds the
//! configured threshold, the planner looks for the alternative airport
//! closest to the original destination by graph distance, estimates the
//! time to reach it from the flight's origin and accepts the diversion
//! only if it beats waiting and stays within reach of the planned fuel
//! load.

use std::collections::HashMap;

use crate::engine::aircraft::MEDIUM_RANGE;
use crate::engine::resource::AirportResource;
use crate::network::RouteGraph;

/// Maximum detour as a multiple of the planned route distance.
const MAX_DETOUR_FACTOR: f64 = 1.3;

/// An accepted diversion proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Diversion {
    /// The alternative destination.
    pub destination: String,
    /// Estimated minutes of extra flying to reach it.
    pub extra_min: f64,
    /// Graph distance of the new route from the current origin, km.
    pub distance_km: f64,
}

/// Evaluate a diversion for a flight bound to `scheduled_destination`.
///
/// Candidates are airports with free capacity, excluding the original
/// destination and the origin, ranked by shortest-path distance from
/// the original destination. The best candidate is accepted only if the
/// estimated flying time beats `projected_wait_min` and the new route
/// is within [`MAX_DETOUR_FACTOR`] of the planned distance.
///
/// # Returns
/// The accepted [`Diversion`], or `None` when waiting is the better
/// option.
pub fn plan_diversion(
    network: &RouteGraph,
    resources: &HashMap<String, AirportResource>,
    scheduled_destination: &str,
    origin: &str,
    planned_distance_km: f64,
    projected_wait_min: f64,
) -> Option<Diversion> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in network.airport_ids() {
        if candidate == scheduled_destination || candidate == origin {
            continue;
        }
        let Some(resource) = resources.get(candidate) else {
            continue;
        };
        if resource.occupancy() >= resource.capacity() {
            continue;
        }
        let Ok(Some(distance)) = network.shortest_path_km(scheduled_destination, candidate) else {
            continue;
        };
        if best.map_or(true, |(_, shortest)| distance < shortest) {
            best = Some((candidate, distance));
        }
    }

    let (candidate, _) = best?;
    let Ok(Some(route_km)) = network.shortest_path_km(origin, candidate) else {
        return None;
    };
    if route_km > planned_distance_km * MAX_DETOUR_FACTOR {
        engine_debug!(
            "(plan_diversion) Candidate {} out of reach ({:.0} km).",
            candidate,
            route_km
        );
        return None;
    }
    let extra_min = route_km / MEDIUM_RANGE.cruise_speed_kmh * 60.0;
    if extra_min >= projected_wait_min {
        return None;
    }

    engine_info!(
        "(plan_diversion) Diverting {} -> {}: {:.1} min flying beats {:.1} min projected wait.",
        scheduled_destination,
        candidate,
        extra_min,
        projected_wait_min
    );
    Some(Diversion {
        destination: candidate.to_string(),
        extra_min,
        distance_km: route_km,
    })
}
