//! # Config
//!
//! Define and implement config options for the simulation engine

use anyhow::Result;
use config::{ConfigError, Environment};
use dotenv::dotenv;
use serde::Deserialize;

/// struct holding configuration options
///
/// Defaults reproduce the reference scenario; every field can be
/// overridden from the environment (or a `.env` file) through
/// [`Config::try_from_env`].
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// root seed for all random streams (plan, wind, noise, flights)
    pub seed: u64,

    /// granularity of internal timeouts in minutes, must be positive
    pub step_minutes: u32,

    /// projected destination wait (minutes) above which a diversion is evaluated
    pub wait_threshold_min: f64,

    /// minimum gap between runway events on one airport, and between
    /// consecutive uses of the same unordered route
    pub runway_separation_min: f64,

    /// route distance (km) separating short-range from medium-range aircraft
    pub aircraft_distance_threshold_km: f64,

    /// speed multiplier applied under favorable wind
    pub wind_speed_factor_favor: f64,
    /// speed multiplier applied under headwind
    pub wind_speed_factor_against: f64,
    /// speed multiplier applied under neutral wind
    pub wind_speed_factor_neutral: f64,

    /// fuel multiplier applied under favorable wind
    pub wind_fuel_factor_favor: f64,
    /// fuel multiplier applied under headwind
    pub wind_fuel_factor_against: f64,
    /// fuel multiplier applied under neutral wind
    pub wind_fuel_factor_neutral: f64,

    /// extra minutes spent at the gate before takeoff clearance
    pub boarding_min: f64,
    /// extra minutes the destination slot is held after landing
    pub turnaround_min: f64,

    /// lower bound of the random initial occupancy fraction per airport
    pub initial_occupancy_min_fraction: f64,
    /// upper bound of the random initial occupancy fraction per airport
    pub initial_occupancy_max_fraction: f64,

    /// number of top-traffic airports that receive background noise processes
    pub noise_top_n: u32,
    /// minimum arrivals per noise pulse
    pub noise_pulses_min: u32,
    /// maximum arrivals per noise pulse
    pub noise_pulses_max: u32,
    /// minimum minutes between noise pulses
    pub noise_interval_min: u32,
    /// maximum minutes between noise pulses
    pub noise_interval_max: u32,
    /// minimum minutes a noise arrival occupies a slot
    pub noise_stay_min: u32,
    /// maximum minutes a noise arrival occupies a slot
    pub noise_stay_max: u32,

    /// duration floor for the taxi phase (minutes)
    pub min_taxi_min: f64,
    /// duration floor for the takeoff phase (minutes)
    pub min_takeoff_min: f64,
    /// duration floor for the cruise phase (minutes)
    pub min_cruise_min: f64,
    /// duration floor for the approach phase (minutes)
    pub min_approach_min: f64,
    /// duration floor for the landing phase (minutes)
    pub min_landing_min: f64,

    /// fixed taxi distance per departure (km)
    pub taxi_distance_km: f64,
    /// fraction of the planned distance flown during takeoff
    pub takeoff_distance_fraction: f64,
    /// fraction of the planned distance flown during approach
    pub approach_distance_fraction: f64,
    /// fraction of the planned distance flown during landing
    pub landing_distance_fraction: f64,
    /// lower bound of the landing segment (km)
    pub min_landing_distance_km: f64,

    /// taxi fuel burn as a fraction of ascent consumption
    pub taxi_consumption_factor: f64,

    /// path to log configuration YAML file
    pub log_config: String,
}

impl Default for Config {
    fn default() -> Self {
        log::warn!("(default) Creating Config object with default values.");
        Self::new()
    }
}

impl Config {
    /// Default values for Config
    pub fn new() -> Self {
        Config {
            seed: 1234,
            step_minutes: 1,
            wait_threshold_min: 45.0,
            runway_separation_min: 3.0,
            aircraft_distance_threshold_km: 700.0,
            wind_speed_factor_favor: 1.05,
            wind_speed_factor_against: 0.9,
            wind_speed_factor_neutral: 1.0,
            wind_fuel_factor_favor: 0.95,
            wind_fuel_factor_against: 1.05,
            wind_fuel_factor_neutral: 1.0,
            boarding_min: 0.0,
            turnaround_min: 0.0,
            initial_occupancy_min_fraction: 0.05,
            initial_occupancy_max_fraction: 0.35,
            noise_top_n: 15,
            noise_pulses_min: 1,
            noise_pulses_max: 3,
            noise_interval_min: 90,
            noise_interval_max: 240,
            noise_stay_min: 15,
            noise_stay_max: 45,
            min_taxi_min: 3.0,
            min_takeoff_min: 2.0,
            min_cruise_min: 5.0,
            min_approach_min: 4.0,
            min_landing_min: 2.0,
            taxi_distance_km: 4.0,
            takeoff_distance_fraction: 0.08,
            approach_distance_fraction: 0.1,
            landing_distance_fraction: 0.05,
            min_landing_distance_km: 5.0,
            taxi_consumption_factor: 0.35,
            log_config: String::from("log4rs.yaml"),
        }
    }

    /// Create a new `Config` object using environment variables
    pub fn try_from_env() -> Result<Self, ConfigError> {
        // read .env file if present
        dotenv().ok();
        let default_config = Config::default();

        config::Config::builder()
            .set_default("seed", default_config.seed)?
            .set_default("step_minutes", default_config.step_minutes)?
            .set_default("wait_threshold_min", default_config.wait_threshold_min)?
            .set_default(
                "runway_separation_min",
                default_config.runway_separation_min,
            )?
            .set_default(
                "aircraft_distance_threshold_km",
                default_config.aircraft_distance_threshold_km,
            )?
            .set_default(
                "wind_speed_factor_favor",
                default_config.wind_speed_factor_favor,
            )?
            .set_default(
                "wind_speed_factor_against",
                default_config.wind_speed_factor_against,
            )?
            .set_default(
                "wind_speed_factor_neutral",
                default_config.wind_speed_factor_neutral,
            )?
            .set_default(
                "wind_fuel_factor_favor",
                default_config.wind_fuel_factor_favor,
            )?
            .set_default(
                "wind_fuel_factor_against",
                default_config.wind_fuel_factor_against,
            )?
            .set_default(
                "wind_fuel_factor_neutral",
                default_config.wind_fuel_factor_neutral,
            )?
            .set_default("boarding_min", default_config.boarding_min)?
            .set_default("turnaround_min", default_config.turnaround_min)?
            .set_default(
                "initial_occupancy_min_fraction",
                default_config.initial_occupancy_min_fraction,
            )?
            .set_default(
                "initial_occupancy_max_fraction",
                default_config.initial_occupancy_max_fraction,
            )?
            .set_default("noise_top_n", default_config.noise_top_n)?
            .set_default("noise_pulses_min", default_config.noise_pulses_min)?
            .set_default("noise_pulses_max", default_config.noise_pulses_max)?
            .set_default("noise_interval_min", default_config.noise_interval_min)?
            .set_default("noise_interval_max", default_config.noise_interval_max)?
            .set_default("noise_stay_min", default_config.noise_stay_min)?
            .set_default("noise_stay_max", default_config.noise_stay_max)?
            .set_default("min_taxi_min", default_config.min_taxi_min)?
            .set_default("min_takeoff_min", default_config.min_takeoff_min)?
            .set_default("min_cruise_min", default_config.min_cruise_min)?
            .set_default("min_approach_min", default_config.min_approach_min)?
            .set_default("min_landing_min", default_config.min_landing_min)?
            .set_default("taxi_distance_km", default_config.taxi_distance_km)?
            .set_default(
                "takeoff_distance_fraction",
                default_config.takeoff_distance_fraction,
            )?
            .set_default(
                "approach_distance_fraction",
                default_config.approach_distance_fraction,
            )?
            .set_default(
                "landing_distance_fraction",
                default_config.landing_distance_fraction,
            )?
            .set_default(
                "min_landing_distance_km",
                default_config.min_landing_distance_km,
            )?
            .set_default(
                "taxi_consumption_factor",
                default_config.taxi_consumption_factor,
            )?
            .set_default("log_config", default_config.log_config)?
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use crate::Config;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_default() {
        let config = Config::default();

        assert_eq!(config.seed, 1234);
        assert_eq!(config.step_minutes, 1);
        assert_eq!(config.wait_threshold_min, 45.0);
        assert_eq!(config.runway_separation_min, 3.0);
        assert_eq!(config.aircraft_distance_threshold_km, 700.0);
        assert_eq!(config.wind_speed_factor_favor, 1.05);
        assert_eq!(config.wind_speed_factor_against, 0.9);
        assert_eq!(config.wind_fuel_factor_favor, 0.95);
        assert_eq!(config.noise_top_n, 15);
        assert_eq!(config.noise_interval_min, 90);
        assert_eq!(config.noise_interval_max, 240);
        assert_eq!(config.min_taxi_min, 3.0);
        assert_eq!(config.taxi_distance_km, 4.0);
        assert_eq!(config.min_landing_distance_km, 5.0);
        assert_eq!(config.log_config, String::from("log4rs.yaml"));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("SEED", "99");
        std::env::set_var("WAIT_THRESHOLD_MIN", "10.5");
        std::env::set_var("RUNWAY_SEPARATION_MIN", "5");
        std::env::set_var("NOISE_TOP_N", "3");
        std::env::set_var("LOG_CONFIG", "config_file.yaml");

        let config = Config::try_from_env();
        assert!(config.is_ok());
        let config = config.unwrap();

        assert_eq!(config.seed, 99);
        assert_eq!(config.wait_threshold_min, 10.5);
        assert_eq!(config.runway_separation_min, 5.0);
        assert_eq!(config.noise_top_n, 3);
        assert_eq!(config.log_config, String::from("config_file.yaml"));

        std::env::remove_var("SEED");
        std::env::remove_var("WAIT_THRESHOLD_MIN");
        std::env::remove_var("RUNWAY_SEPARATION_MIN");
        std::env::remove_var("NOISE_TOP_N");
        std::env::remove_var("LOG_CONFIG");
    }
}
