//! Wind oracle: resolves a wind label per (airport, altitude band).
//!
//! Airports that declare a non-neutral label keep it. Everything else
//! is resolved by a deterministic draw keyed on the root seed, the
//! airport id and the band, so neither query order nor repetition can
//! change a label within a run.

use std::collections::HashMap;

use rand::prelude::*;

use crate::config::Config;
use crate::engine::derive_seed;
use crate::network::airport::AltitudeBand;
use crate::network::{Airport, WindLabel};

/// Draw probabilities for unresolved labels: favor, against, neutral.
const DRAW_WEIGHTS: (f64, f64, f64) = (0.3, 0.3, 0.4);

/// Memoising wind resolver for one simulation run.
#[derive(Debug, Clone)]
pub struct WindOracle {
    seed: u64,
    speed_favor: f64,
    speed_against: f64,
    speed_neutral: f64,
    fuel_favor: f64,
    fuel_against: f64,
    fuel_neutral: f64,
    cache: HashMap<(String, AltitudeBand), WindLabel>,
}

impl WindOracle {
    /// An oracle bound to a seed and the configured wind factors.
    pub fn new(seed: u64, config: &Config) -> Self {
        WindOracle {
            seed,
            speed_favor: config.wind_speed_factor_favor,
            speed_against: config.wind_speed_factor_against,
            speed_neutral: config.wind_speed_factor_neutral,
            fuel_favor: config.wind_fuel_factor_favor,
            fuel_against: config.wind_fuel_factor_against,
            fuel_neutral: config.wind_fuel_factor_neutral,
            cache: HashMap::new(),
        }
    }

    /// Resolve the label for an airport and altitude band.
    ///
    /// Declared `Favor`/`Against` labels are authoritative; `Neutral`
    /// and `Unknown` are treated as unset and resolved by the seeded
    /// draw.
    pub fn label(&mut self, airport: &Airport, band: AltitudeBand) -> WindLabel {
        match airport.wind(band) {
            WindLabel::Favor => WindLabel::Favor,
            WindLabel::Against => WindLabel::Against,
            WindLabel::Neutral | WindLabel::Unknown => self.draw(&airport.id, band),
        }
    }

    fn draw(&mut self, airport_id: &str, band: AltitudeBand) -> WindLabel {
        let key = (airport_id.to_string(), band);
        if let Some(label) = self.cache.get(&key) {
            return *label;
        }

        let band_tag = match band {
            AltitudeBand::Low => "low",
            AltitudeBand::High => "high",
        };
        let mut rng = StdRng::seed_from_u64(derive_seed(self.seed, &["wind", airport_id, band_tag]));
        let roll: f64 = rng.gen();
        let (favor, against, _) = DRAW_WEIGHTS;
        let label = if roll < favor {
            WindLabel::Favor
        } else if roll < favor + against {
            WindLabel::Against
        } else {
            WindLabel::Neutral
        };

        engine_debug!(
            "(draw) Resolved wind at {} ({}) to {}.",
            airport_id,
            band_tag,
            label
        );
        self.cache.insert(key, label);
        label
    }

    /// Speed multiplier for a label.
    pub fn speed_factor(&self, label: WindLabel) -> f64 {
        match label {
            WindLabel::Favor => self.speed_favor,
            WindLabel::Against => self.speed_against,
            WindLabel::Neutral | WindLabel::Unknown => self.speed_neutral,
        }
    }

    /// Fuel multiplier for a label.
    pub fn fuel_factor(&self, label: WindLabel) -> f64 {
        match label {
            WindLabel::Favor => self.fuel_favor,
            WindLabel::Against => self.fuel_against,
            WindLabel::Neutral | WindLabel::Unknown => self.fuel_neutral,
        }
    }
}

#[cfg(test)]
mod wind_tests {
    use super::*;
    use crate::network::Location;

    fn airport(id: &str, low: WindLabel, high: WindLabel) -> Airport {
        let mut airport = Airport::new(id, Location::new(0.0, 0.0), 3);
        airport.wind_low = low;
        airport.wind_high = high;
        airport
    }

    #[test]
    fn test_declared_labels_are_authoritative() {
        let config = Config::new();
        let mut oracle = WindOracle::new(1, &config);
        let declared = airport("AAA", WindLabel::Against, WindLabel::Favor);

        assert_eq!(oracle.label(&declared, AltitudeBand::Low), WindLabel::Against);
        assert_eq!(oracle.label(&declared, AltitudeBand::High), WindLabel::Favor);
    }

    #[test]
    fn test_draw_is_memoised() {
        let config = Config::new();
        let mut oracle = WindOracle::new(7, &config);
        let unknown = airport("BBB", WindLabel::Unknown, WindLabel::Neutral);

        let first = oracle.label(&unknown, AltitudeBand::Low);
        for _ in 0..10 {
            assert_eq!(oracle.label(&unknown, AltitudeBand::Low), first);
        }
    }

    #[test]
    fn test_draw_is_query_order_independent() {
        let config = Config::new();
        let a = airport("AAA", WindLabel::Unknown, WindLabel::Unknown);
        let b = airport("BBB", WindLabel::Unknown, WindLabel::Unknown);

        let mut forward = WindOracle::new(11, &config);
        let fa = forward.label(&a, AltitudeBand::Low);
        let fb = forward.label(&b, AltitudeBand::High);

        let mut backward = WindOracle::new(11, &config);
        let bb = backward.label(&b, AltitudeBand::High);
        let ba = backward.label(&a, AltitudeBand::Low);

        assert_eq!(fa, ba);
        assert_eq!(fb, bb);
    }

    #[test]
    fn test_draws_cover_all_labels_over_seeds() {
        let config = Config::new();
        let unknown = airport("CCC", WindLabel::Unknown, WindLabel::Unknown);
        let mut seen = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut oracle = WindOracle::new(seed, &config);
            seen.insert(oracle.label(&unknown, AltitudeBand::Low));
        }
        assert!(seen.contains(&WindLabel::Favor));
        assert!(seen.contains(&WindLabel::Against));
        assert!(seen.contains(&WindLabel::Neutral));
    }

    #[test]
    fn test_factors_follow_config() {
        let config = Config::new();
        let oracle = WindOracle::new(1, &config);
        assert_eq!(oracle.speed_factor(WindLabel::Favor), 1.05);
        assert_eq!(oracle.speed_factor(WindLabel::Against), 0.9);
        assert_eq!(oracle.speed_factor(WindLabel::Neutral), 1.0);
        assert_eq!(oracle.fuel_factor(WindLabel::Favor), 0.95);
        assert_eq!(oracle.fuel_factor(WindLabel::Against), 1.05);
        assert_eq!(oracle.fuel_factor(WindLabel::Unknown), 1.0);
    }
}
