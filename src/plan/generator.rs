//! Generation of a daily flight plan from the weighted route graph.
//!
//! The daily flight total is allocated over routes by a multinomial draw
//! on the normalised edge weights. Departure minutes either spread
//! uniformly over the active window or cluster around the morning and
//! evening peaks. A traffic-weighted fraction of flights is rerouted to
//! the exterior.

use std::collections::HashMap;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::Normal;

use crate::network::{RouteGraph, EXTERIOR};
use crate::plan::{FlightPlan, PlanError};

/// Probability that a peak-hour departure is drawn from a peak window
/// instead of the uniform background.
const PEAK_SHARE: f64 = 0.7;
/// Peak window centres, hours of day.
const PEAK_HOURS: [u32; 2] = [8, 18];
/// Standard deviation of a peak window in minutes.
const PEAK_SIGMA_MIN: f64 = 60.0;

/// Parameters for creating one day's plan from annual flows.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Number of rows to generate.
    pub daily_flights: usize,
    /// Seed of the plan random stream.
    pub seed: u64,
    /// First hour of the active window (inclusive).
    pub start_hour: u32,
    /// Last hour of the active window (exclusive).
    pub end_hour: u32,
    /// Cluster departures around the morning/evening peaks.
    pub peak_hours: bool,
    /// Reference cruise speed used for nominal durations, km/h.
    pub cruise_speed_kmh: f64,
    /// Base probability of rerouting a flight to the exterior.
    pub exterior_probability: f64,
    /// Planned distance assigned to exterior flights, km.
    pub exterior_distance_km: f64,
    /// Multiplicative per-route weight overrides, keyed by unordered
    /// endpoint pair.
    pub route_weight_overrides: HashMap<(String, String), f64>,
}

impl PlanConfig {
    /// A plan configuration with the reference defaults.
    pub fn new(daily_flights: usize, seed: u64) -> Self {
        PlanConfig {
            daily_flights,
            seed,
            start_hour: 6,
            end_hour: 22,
            peak_hours: true,
            cruise_speed_kmh: 800.0,
            exterior_probability: 0.05,
            exterior_distance_km: 1800.0,
            route_weight_overrides: HashMap::new(),
        }
    }
}

/// Nominal flight duration in minutes for a distance at cruise speed.
///
/// Never below one minute so scheduled arrivals stay strictly after
/// departures.
pub fn nominal_duration_min(distance_km: f64, cruise_speed_kmh: f64) -> u32 {
    if cruise_speed_kmh <= 0.0 {
        return 1;
    }
    ((distance_km / cruise_speed_kmh * 60.0).ceil() as u32).max(1)
}

fn override_factor(config: &PlanConfig, a: &str, b: &str) -> f64 {
    let key = (a.to_string(), b.to_string());
    let rev = (b.to_string(), a.to_string());
    config
        .route_weight_overrides
        .get(&key)
        .or_else(|| config.route_weight_overrides.get(&rev))
        .copied()
        .unwrap_or(1.0)
}

fn sample_departure_min(
    rng: &mut StdRng,
    peaks: &[Normal<f64>],
    start_min: u32,
    end_min: u32,
    concentrate: bool,
) -> u32 {
    if concentrate && rng.gen::<f64>() < PEAK_SHARE {
        let window = peaks[rng.gen_range(0..peaks.len())];
        let minute = window.sample(rng).round() as i64;
        minute.clamp(start_min as i64, end_min as i64 - 1) as u32
    } else {
        rng.gen_range(start_min..end_min)
    }
}

/// Generates one day's flight plan from the weighted graph.
///
/// # Arguments
/// * `network` - The route graph with normalised edge weights.
/// * `config` - Generation parameters.
///
/// # Returns
/// Exactly `config.daily_flights` rows sorted by departure minute, or a
/// [`PlanError`] when the window is empty or no route carries weight.
pub fn generate_daily_plan(
    network: &RouteGraph,
    config: &PlanConfig,
) -> Result<Vec<FlightPlan>, PlanError> {
    if config.end_hour <= config.start_hour {
        return Err(PlanError::EmptyHourWindow);
    }
    let start_min = config.start_hour * 60;
    let end_min = config.end_hour * 60;

    // Routes eligible for allocation, with manual overrides applied.
    let mut routes: Vec<(String, String, f64, f64)> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    for (u, v, edge) in network.edges() {
        let w = edge.weight * override_factor(config, u, v);
        if w <= 0.0 {
            continue;
        }
        routes.push((u.to_string(), v.to_string(), edge.distance_km, edge.weight));
        weights.push(w);
    }
    if routes.is_empty() {
        return Err(PlanError::NoRoutes);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let Ok(allocation) = WeightedIndex::new(&weights) else {
        return Err(PlanError::NoRoutes);
    };

    // Multinomial allocation of the daily total over routes.
    let mut counts = vec![0usize; routes.len()];
    for _ in 0..config.daily_flights {
        counts[allocation.sample(&mut rng)] += 1;
    }

    let traffic = network.traffic_by_airport();
    let traffic_max = traffic.values().cloned().fold(0.0_f64, f64::max).max(1e-9);
    let peaks: Vec<Normal<f64>> = PEAK_HOURS
        .iter()
        .map(|hour| {
            Normal::new((hour * 60) as f64, PEAK_SIGMA_MIN).expect("peak sigma is positive")
        })
        .collect();

    let mut plan: Vec<FlightPlan> = Vec::with_capacity(config.daily_flights);
    let mut index = 0usize;
    for (route, count) in routes.iter().zip(counts.iter()) {
        let (u, v, route_distance_km, route_weight) = route;
        for _ in 0..*count {
            index += 1;
            let departure_min = sample_departure_min(
                &mut rng,
                &peaks,
                start_min,
                end_min,
                config.peak_hours,
            );
            let (origin, destination) = if rng.gen_bool(0.5) {
                (u.clone(), v.clone())
            } else {
                (v.clone(), u.clone())
            };

            // Exterior rerouting, weighted by the origin's traffic share.
            let p_exterior = (config.exterior_probability
                * (traffic.get(&origin).copied().unwrap_or(0.0) / traffic_max))
                .clamp(0.0, 1.0);
            let exterior = rng.gen_bool(p_exterior);
            let (destination, distance_km, route_weight) = if exterior {
                (EXTERIOR.to_string(), config.exterior_distance_km, 0.0)
            } else {
                (destination, *route_distance_km, *route_weight)
            };

            let duration_min = nominal_duration_min(distance_km, config.cruise_speed_kmh);
            plan.push(FlightPlan {
                id: format!("{}{}{:05}", origin, destination, index),
                origin,
                destination,
                departure_min,
                scheduled_arrival_min: departure_min + duration_min,
                distance_km,
                duration_min,
                exterior,
                route_weight,
            });
        }
    }

    plan.sort_by(|a, b| {
        a.departure_min
            .cmp(&b.departure_min)
            .then_with(|| a.id.cmp(&b.id))
    });
    plan_info!(
        "(generate_daily_plan) Generated {} flights over {} routes.",
        plan.len(),
        routes.len()
    );
    Ok(plan)
}
