//! Per-flight process.
//!
//! A flight is a suspendable state machine driven by the engine's event
//! loop: every wake-up advances it through zero-duration work until the
//! next suspension point (a timed wait, or parking in a resource FIFO).
//! The sequence matches the operational phases: wait for departure,
//! take an origin slot, taxi, clear the runway interlock, take off,
//! cruise, evaluate a diversion, approach, queue for a destination
//! slot, land and release.

use rand::prelude::*;

use crate::config::Config;
use crate::engine::aircraft::{
    cruise_class, sample_speed_kmh, select_type, AircraftType, SpeedClass,
};
use crate::engine::clock::ProcessId;
use crate::engine::diversion::plan_diversion;
use crate::engine::record::{EventKind, FlightRecord, Phase, PhaseOutcome, PhaseSample};
use crate::engine::resource::Grant;
use crate::engine::{derive_seed, EngineCtx, Step};
use crate::network::airport::AltitudeBand;
use crate::network::is_exterior;
use crate::network::WindLabel;
use crate::plan::FlightPlan;

/// Tolerance when checking the activation time against the scheduled
/// departure.
const ACTIVATION_EPSILON_MIN: f64 = 1e-9;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FlightState {
    Scheduled,
    AcquireOrigin,
    BeginTaxi,
    TaxiDone,
    RunwayOrigin,
    BeginTakeoff,
    TakeoffDone,
    CruiseDone,
    DiversionDone,
    BeginApproach,
    ApproachDone,
    RouteSeparation,
    AcquireDestination,
    DestinationGranted,
    RunwayDestination,
    LandingDone,
    Turnaround,
    Complete,
    Finished,
}

/// Distance split of the planned route over the airborne phases.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
struct Segments {
    takeoff_km: f64,
    cruise_km: f64,
    approach_km: f64,
    landing_km: f64,
}

/// Split a route distance into takeoff, cruise, approach and landing
/// segments. Short routes that cannot fit the three terminal segments
/// scale them down uniformly and fly no cruise segment.
fn split_distance(distance_km: f64, config: &Config) -> Segments {
    let mut takeoff = (distance_km * config.takeoff_distance_fraction).max(1.0);
    let mut approach = (distance_km * config.approach_distance_fraction).max(1.0);
    let mut landing =
        (distance_km * config.landing_distance_fraction).max(config.min_landing_distance_km);
    let rest = distance_km - (takeoff + approach + landing);
    let cruise = if rest < 0.0 {
        let base = takeoff + approach + landing;
        if base > 0.0 {
            let scale = distance_km / base;
            takeoff *= scale;
            approach *= scale;
            landing *= scale;
        }
        0.0
    } else {
        rest
    };
    Segments {
        takeoff_km: takeoff,
        cruise_km: cruise,
        approach_km: approach,
        landing_km: landing,
    }
}

/// Minutes needed to cover a distance at a speed.
fn phase_time_min(distance_km: f64, speed_kmh: f64) -> f64 {
    if speed_kmh <= 0.0 {
        return 0.0;
    }
    distance_km / speed_kmh * 60.0
}

/// Liters burned over a duration at an hourly consumption.
fn fuel_l(duration_min: f64, consumption_l_h: f64, fuel_factor: f64) -> f64 {
    duration_min / 60.0 * consumption_l_h * fuel_factor
}

/// One scheduled flight advancing through its phases.
#[derive(Debug)]
pub(crate) struct FlightProcess {
    id: ProcessId,
    plan: FlightPlan,
    state: FlightState,
    rng: StdRng,
    aircraft: &'static AircraftType,
    exterior: bool,
    final_destination: String,
    route_distance_km: f64,
    segments: Segments,
    fuel_used_l: f64,
    diverted: bool,
    diversion_delay_min: f64,
    queue_entered_min: f64,
    queue_wait_min: f64,
    phase_start_min: f64,
    current: PhaseOutcome,
    taxi: PhaseOutcome,
    takeoff: PhaseOutcome,
    cruise: PhaseOutcome,
    approach: PhaseOutcome,
    landing: PhaseOutcome,
}

impl FlightProcess {
    /// Build the process for one plan row.
    pub fn new(id: ProcessId, plan: FlightPlan, seed: u64, config: &Config) -> Self {
        let aircraft = select_type(plan.distance_km, config.aircraft_distance_threshold_km);
        let segments = split_distance(plan.distance_km, config);
        let exterior = plan.exterior || is_exterior(&plan.destination);
        let rng = StdRng::seed_from_u64(derive_seed(seed, &["flight", &plan.id]));
        FlightProcess {
            id,
            final_destination: plan.destination.clone(),
            route_distance_km: plan.distance_km,
            plan,
            state: FlightState::Scheduled,
            rng,
            aircraft,
            exterior,
            segments,
            fuel_used_l: 0.0,
            diverted: false,
            diversion_delay_min: 0.0,
            queue_entered_min: 0.0,
            queue_wait_min: 0.0,
            phase_start_min: 0.0,
            current: PhaseOutcome::default(),
            taxi: PhaseOutcome::default(),
            takeoff: PhaseOutcome::default(),
            cruise: PhaseOutcome::default(),
            approach: PhaseOutcome::default(),
            landing: PhaseOutcome::default(),
        }
    }

    fn log_phase(&self, ctx: &mut EngineCtx, phase: Phase, note: &str) {
        ctx.phases.push(PhaseSample {
            flight: self.plan.id.clone(),
            phase,
            origin: self.plan.origin.clone(),
            scheduled_destination: self.plan.destination.clone(),
            final_destination: self.final_destination.clone(),
            start_min: self.phase_start_min,
            end_min: ctx.now,
            distance_km: self.current.distance_km,
            speed_kmh: self.current.speed_kmh,
            wind: self.current.wind,
            fuel_l: self.current.fuel_l,
            note: note.to_string(),
        });
    }

    /// Prepare a timed phase: sample the speed, apply the wind factor,
    /// floor the duration and account the fuel.
    fn begin_phase(
        &mut self,
        ctx: &mut EngineCtx,
        class: SpeedClass,
        wind_airport: &str,
        band: AltitudeBand,
        distance_km: f64,
        floor_min: f64,
        consumption_l_h: f64,
    ) -> f64 {
        let (label, speed_factor, fuel_factor) = ctx.resolve_wind(wind_airport, band);
        let speed = sample_speed_kmh(class, self.aircraft, &mut self.rng) * speed_factor;
        let duration = phase_time_min(distance_km, speed).max(floor_min);
        let fuel = fuel_l(duration, consumption_l_h, fuel_factor);
        self.fuel_used_l += fuel;
        self.current = PhaseOutcome {
            duration_min: duration,
            distance_km,
            speed_kmh: speed,
            wind: label,
            fuel_l: fuel,
        };
        self.phase_start_min = ctx.now;
        duration
    }

    /// Advance until the next suspension point.
    pub fn resume(&mut self, ctx: &mut EngineCtx) -> Step {
        loop {
            match self.state {
                FlightState::Scheduled => {
                    let departure = self.plan.departure_min as f64;
                    if ctx.now > departure + ACTIVATION_EPSILON_MIN {
                        engine_error!(
                            "(resume) Flight {} activated at {:.1} after its departure {}; aborting.",
                            self.plan.id,
                            ctx.now,
                            self.plan.departure_min
                        );
                        self.state = FlightState::Finished;
                        return Step::Done;
                    }
                    self.state = FlightState::AcquireOrigin;
                    if ctx.now < departure {
                        return Step::Wait(departure - ctx.now);
                    }
                }
                FlightState::AcquireOrigin => {
                    self.state = FlightState::BeginTaxi;
                    match ctx.request_slot(&self.plan.origin, self.id, EventKind::TaxiBegin) {
                        Grant::Granted => {}
                        Grant::Queued => return Step::Blocked,
                    }
                }
                FlightState::BeginTaxi => {
                    // Taxi speed feels the ground wind; fuel burns a
                    // fraction of the climb consumption and is not wind
                    // sensitive.
                    let (label, speed_factor, _) =
                        ctx.resolve_wind(&self.plan.origin, AltitudeBand::Low);
                    let speed =
                        sample_speed_kmh(SpeedClass::Taxi, self.aircraft, &mut self.rng)
                            * speed_factor;
                    let duration = phase_time_min(ctx.config.taxi_distance_km, speed)
                        .max(ctx.config.min_taxi_min);
                    let consumption =
                        self.aircraft.climb_consumption_l_h * ctx.config.taxi_consumption_factor;
                    let fuel =
                        fuel_l(duration, consumption, ctx.config.wind_fuel_factor_neutral);
                    self.fuel_used_l += fuel;
                    self.current = PhaseOutcome {
                        duration_min: duration,
                        distance_km: ctx.config.taxi_distance_km,
                        speed_kmh: speed,
                        wind: label,
                        fuel_l: fuel,
                    };
                    self.phase_start_min = ctx.now;
                    self.state = FlightState::TaxiDone;
                    return Step::Wait(duration);
                }
                FlightState::TaxiDone => {
                    self.taxi = self.current;
                    self.log_phase(ctx, Phase::Taxi, "");
                    self.state = FlightState::RunwayOrigin;
                }
                FlightState::RunwayOrigin => match ctx.runway_ready(&self.plan.origin) {
                    Ok(()) => {
                        self.state = FlightState::BeginTakeoff;
                        if ctx.config.boarding_min > 0.0 {
                            return Step::Wait(ctx.config.boarding_min);
                        }
                    }
                    Err(wait) => return Step::Wait(wait),
                },
                FlightState::BeginTakeoff => {
                    ctx.release_slot(&self.plan.origin, EventKind::Takeoff);
                    let origin = self.plan.origin.clone();
                    let floor = ctx.config.min_takeoff_min;
                    let duration = self.begin_phase(
                        ctx,
                        SpeedClass::Takeoff,
                        &origin,
                        AltitudeBand::Low,
                        self.segments.takeoff_km,
                        floor,
                        self.aircraft.climb_consumption_l_h,
                    );
                    self.state = FlightState::TakeoffDone;
                    return Step::Wait(duration);
                }
                FlightState::TakeoffDone => {
                    self.takeoff = self.current;
                    self.log_phase(ctx, Phase::Takeoff, "");
                    let origin = self.plan.origin.clone();
                    let floor = ctx.config.min_cruise_min;
                    let duration = self.begin_phase(
                        ctx,
                        cruise_class(self.aircraft),
                        &origin,
                        AltitudeBand::High,
                        self.segments.cruise_km,
                        floor,
                        self.aircraft.cruise_consumption_l_h,
                    );
                    self.state = FlightState::CruiseDone;
                    return Step::Wait(duration);
                }
                FlightState::CruiseDone => {
                    self.cruise = self.current;
                    self.log_phase(ctx, Phase::Cruise, "");
                    self.state = FlightState::BeginApproach;
                    if !self.exterior {
                        let projected = ctx.estimated_destination_wait(&self.final_destination);
                        if projected > ctx.config.wait_threshold_min {
                            if let Some(step) = self.try_divert(ctx, projected) {
                                return step;
                            }
                        }
                    }
                }
                FlightState::DiversionDone => {
                    self.log_phase(ctx, Phase::DiversionLeg, "rerouted to alternative");
                    self.state = FlightState::BeginApproach;
                }
                FlightState::BeginApproach => {
                    let destination = self.final_destination.clone();
                    let floor = ctx.config.min_approach_min;
                    let duration = self.begin_phase(
                        ctx,
                        SpeedClass::Approach,
                        &destination,
                        AltitudeBand::Low,
                        self.segments.approach_km,
                        floor,
                        self.aircraft.descent_consumption_l_h,
                    );
                    self.state = FlightState::ApproachDone;
                    return Step::Wait(duration);
                }
                FlightState::ApproachDone => {
                    self.approach = self.current;
                    self.log_phase(ctx, Phase::Approach, "");
                    self.state = FlightState::RouteSeparation;
                }
                FlightState::RouteSeparation => {
                    match ctx.route_ready(&self.plan.origin.clone(), &self.final_destination.clone())
                    {
                        Ok(()) => {
                            if self.exterior {
                                self.state = FlightState::Complete;
                            } else {
                                self.queue_entered_min = ctx.now;
                                self.state = FlightState::AcquireDestination;
                            }
                        }
                        Err(wait) => return Step::Wait(wait),
                    }
                }
                FlightState::AcquireDestination => {
                    self.state = FlightState::DestinationGranted;
                    match ctx.request_slot(&self.final_destination, self.id, EventKind::Landing) {
                        Grant::Granted => {}
                        Grant::Queued => return Step::Blocked,
                    }
                }
                FlightState::DestinationGranted => {
                    self.queue_wait_min = ctx.now - self.queue_entered_min;
                    if self.queue_wait_min > 0.0 {
                        // Holding burns at cruise rate while circling.
                        let hold_fuel = fuel_l(
                            self.queue_wait_min,
                            self.aircraft.cruise_consumption_l_h,
                            ctx.config.wind_fuel_factor_neutral,
                        );
                        self.fuel_used_l += hold_fuel;
                        self.phase_start_min = self.queue_entered_min;
                        self.current = PhaseOutcome {
                            duration_min: self.queue_wait_min,
                            distance_km: 0.0,
                            speed_kmh: 0.0,
                            wind: WindLabel::Neutral,
                            fuel_l: hold_fuel,
                        };
                        self.log_phase(ctx, Phase::HoldQueue, "waiting for a destination slot");
                    }
                    self.state = FlightState::RunwayDestination;
                }
                FlightState::RunwayDestination => match ctx.runway_ready(&self.final_destination) {
                    Ok(()) => {
                        let destination = self.final_destination.clone();
                        let floor = ctx.config.min_landing_min;
                        let duration = self.begin_phase(
                            ctx,
                            SpeedClass::Landing,
                            &destination,
                            AltitudeBand::Low,
                            self.segments.landing_km,
                            floor,
                            self.aircraft.descent_consumption_l_h,
                        );
                        self.state = FlightState::LandingDone;
                        return Step::Wait(duration);
                    }
                    Err(wait) => return Step::Wait(wait),
                },
                FlightState::LandingDone => {
                    self.landing = self.current;
                    self.log_phase(ctx, Phase::Landing, "");
                    self.state = FlightState::Turnaround;
                    if ctx.config.turnaround_min > 0.0 {
                        return Step::Wait(ctx.config.turnaround_min);
                    }
                }
                FlightState::Turnaround => {
                    ctx.release_slot(&self.final_destination, EventKind::DepartDestination);
                    self.state = FlightState::Complete;
                }
                FlightState::Complete => {
                    self.finish(ctx);
                    self.state = FlightState::Finished;
                    return Step::Done;
                }
                FlightState::Finished => return Step::Done,
            }
        }
    }

    /// Evaluate and, if accepted, start a diversion leg.
    fn try_divert(&mut self, ctx: &mut EngineCtx, projected_wait_min: f64) -> Option<Step> {
        let diversion = plan_diversion(
            ctx.network,
            ctx.resources,
            &self.final_destination,
            &self.plan.origin,
            self.route_distance_km,
            projected_wait_min,
        )?;

        self.diverted = true;
        self.diversion_delay_min = diversion.extra_min;
        self.final_destination = diversion.destination;
        self.route_distance_km = diversion.distance_km;
        self.segments = split_distance(diversion.distance_km, ctx.config);

        // The detour is flown at the medium-range cruise speed the
        // planner assumed; the cruise already executed is not repeated.
        let leg_fuel = fuel_l(
            diversion.extra_min,
            self.aircraft.cruise_consumption_l_h,
            ctx.config.wind_fuel_factor_neutral,
        );
        self.fuel_used_l += leg_fuel;
        self.current = PhaseOutcome {
            duration_min: diversion.extra_min,
            distance_km: diversion.distance_km,
            speed_kmh: crate::engine::aircraft::MEDIUM_RANGE.cruise_speed_kmh,
            wind: WindLabel::Neutral,
            fuel_l: leg_fuel,
        };
        self.phase_start_min = ctx.now;
        self.state = FlightState::DiversionDone;
        Some(Step::Wait(diversion.extra_min))
    }

    fn finish(&mut self, ctx: &mut EngineCtx) {
        let departure = self.plan.departure_min as f64;
        let real_arrival = ctx.now;
        let total_time = (real_arrival - departure).max(0.0);
        let total_delay = (total_time - self.plan.duration_min as f64).max(0.0);

        engine_debug!(
            "(finish) Flight {} arrived at {} t={:.1} (delay {:.1} min, queue {:.1} min).",
            self.plan.id,
            self.final_destination,
            real_arrival,
            total_delay,
            self.queue_wait_min
        );

        ctx.records.push(FlightRecord {
            id: self.plan.id.clone(),
            origin: self.plan.origin.clone(),
            scheduled_destination: self.plan.destination.clone(),
            final_destination: self.final_destination.clone(),
            diverted: self.diverted,
            exterior: self.exterior,
            scheduled_departure_min: departure,
            real_arrival_min: real_arrival,
            total_delay_min: total_delay,
            diversion_delay_min: self.diversion_delay_min,
            queue_wait_min: self.queue_wait_min,
            total_time_min: total_time,
            fuel_used_l: self.fuel_used_l,
            fuel_remaining_l: (self.aircraft.fuel_capacity_l - self.fuel_used_l).max(0.0),
            aircraft: self.aircraft.name.to_string(),
            taxi: self.taxi,
            takeoff: self.takeoff,
            cruise: self.cruise,
            approach: self.approach,
            landing: self.landing,
            planned_distance_km: self.plan.distance_km,
            route_distance_km: self.route_distance_km,
        });
    }
}

#[cfg(test)]
mod flight_tests {
    use super::*;

    #[test]
    fn test_split_distance_regular_route() {
        let config = Config::new();
        let segments = split_distance(1000.0, &config);
        assert_eq!(segments.takeoff_km, 80.0);
        assert_eq!(segments.approach_km, 100.0);
        assert_eq!(segments.landing_km, 50.0);
        assert_eq!(segments.cruise_km, 770.0);
    }

    #[test]
    fn test_split_distance_short_route_scales_terminal_segments() {
        let config = Config::new();
        let segments = split_distance(5.0, &config);
        assert_eq!(segments.cruise_km, 0.0);
        let total = segments.takeoff_km + segments.approach_km + segments.landing_km;
        assert!((total - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_distance_floors() {
        let config = Config::new();
        let segments = split_distance(30.0, &config);
        // fractions would give 2.4 / 3.0 / 1.5; floors push them up
        assert!(segments.takeoff_km >= 1.0);
        assert!(segments.approach_km >= 1.0);
        assert!(segments.landing_km >= config.min_landing_distance_km);
    }

    #[test]
    fn test_phase_time() {
        assert_eq!(phase_time_min(100.0, 600.0), 10.0);
        assert_eq!(phase_time_min(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_fuel_accounting() {
        // one hour at 3000 l/h under neutral wind
        assert_eq!(fuel_l(60.0, 3000.0, 1.0), 3000.0);
        assert_eq!(fuel_l(30.0, 3000.0, 1.05), 1575.0);
    }
}
