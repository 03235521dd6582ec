//! Background occupancy noise at the busiest airports.
//!
//! Each top-traffic airport gets one independent process that sleeps a
//! random interval, admits a burst of external arrivals (refused when
//! the airport is full), keeps the admitted slots for a random stay and
//! releases them again. The process stops once the horizon is reached.

use rand::prelude::*;

use crate::config::Config;
use crate::engine::clock::ProcessId;
use crate::engine::{derive_seed, EngineCtx, Step};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum NoiseState {
    Sleeping,
    Pulse,
    Departure,
}

/// External-traffic generator bound to one airport.
#[derive(Debug)]
pub(crate) struct NoiseProcess {
    #[allow(dead_code)]
    id: ProcessId,
    airport: String,
    rng: StdRng,
    state: NoiseState,
    admitted: u32,
}

impl NoiseProcess {
    /// A noise process with its own random stream derived from the run
    /// seed and the airport id.
    pub fn new(id: ProcessId, airport: &str, seed: u64) -> Self {
        NoiseProcess {
            id,
            airport: airport.to_string(),
            rng: StdRng::seed_from_u64(derive_seed(seed, &["noise", airport])),
            state: NoiseState::Sleeping,
            admitted: 0,
        }
    }

    fn sample_range(&mut self, low: u32, high: u32) -> u32 {
        let high = high.max(low);
        self.rng.gen_range(low..=high)
    }

    /// Advance until the next suspension point.
    pub fn resume(&mut self, ctx: &mut EngineCtx) -> Step {
        loop {
            match self.state {
                NoiseState::Sleeping => {
                    let config: &Config = ctx.config;
                    let interval =
                        self.sample_range(config.noise_interval_min, config.noise_interval_max);
                    self.state = NoiseState::Pulse;
                    return Step::Wait(interval as f64);
                }
                NoiseState::Pulse => {
                    if ctx.now >= ctx.horizon_min {
                        return Step::Done;
                    }
                    let pulses =
                        self.sample_range(ctx.config.noise_pulses_min, ctx.config.noise_pulses_max);
                    self.admitted = 0;
                    for _ in 0..pulses {
                        if ctx.noise_arrival(&self.airport) {
                            self.admitted += 1;
                        }
                    }
                    let stay = self.sample_range(ctx.config.noise_stay_min, ctx.config.noise_stay_max);
                    self.state = NoiseState::Departure;
                    if stay > 0 {
                        return Step::Wait(stay as f64);
                    }
                }
                NoiseState::Departure => {
                    // Only the arrivals that were actually admitted leave
                    // again; refused pulses never held a slot.
                    for _ in 0..self.admitted {
                        ctx.noise_departure(&self.airport);
                    }
                    self.admitted = 0;
                    self.state = NoiseState::Sleeping;
                }
            }
        }
    }
}
