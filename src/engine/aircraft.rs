//! Fixed aircraft parameter tables.
//!
//! Two range classes cover the modelled network: short-range airframes
//! for routes up to the configured distance threshold and medium-range
//! airframes beyond it. Reference speed bands per phase are shared by
//! both classes except for cruise.

use std::collections::HashMap;

use lazy_static::lazy_static;
use rand::prelude::*;

/// Speed and consumption parameters of one aircraft class.
#[derive(Debug, PartialEq)]
pub struct AircraftType {
    /// Class name as it appears in flight records.
    pub name: &'static str,
    /// Climb speed, km/h.
    pub climb_speed_kmh: f64,
    /// Cruise speed, km/h.
    pub cruise_speed_kmh: f64,
    /// Descent speed, km/h.
    pub descent_speed_kmh: f64,
    /// Bottom of the cruise band, feet.
    pub cruise_floor_ft: u32,
    /// Top of the cruise band, feet.
    pub cruise_ceiling_ft: u32,
    /// Fuel burn while climbing, l/h.
    pub climb_consumption_l_h: f64,
    /// Fuel burn in cruise, l/h.
    pub cruise_consumption_l_h: f64,
    /// Fuel burn while descending, l/h.
    pub descent_consumption_l_h: f64,
    /// Tank capacity, liters.
    pub fuel_capacity_l: f64,
}

/// Short-range class, used up to the distance threshold.
pub static SHORT_RANGE: AircraftType = AircraftType {
    name: "short_range",
    climb_speed_kmh: 500.0,
    cruise_speed_kmh: 820.0,
    descent_speed_kmh: 520.0,
    cruise_floor_ft: 28_000,
    cruise_ceiling_ft: 34_000,
    climb_consumption_l_h: 3800.0,
    cruise_consumption_l_h: 3000.0,
    descent_consumption_l_h: 2100.0,
    fuel_capacity_l: 20_000.0,
};

/// Medium-range class, used beyond the distance threshold.
pub static MEDIUM_RANGE: AircraftType = AircraftType {
    name: "medium_range",
    climb_speed_kmh: 560.0,
    cruise_speed_kmh: 900.0,
    descent_speed_kmh: 580.0,
    cruise_floor_ft: 33_000,
    cruise_ceiling_ft: 41_000,
    climb_consumption_l_h: 4400.0,
    cruise_consumption_l_h: 3600.0,
    descent_consumption_l_h: 2600.0,
    fuel_capacity_l: 32_000.0,
};

/// Speed band identifiers of the reference table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SpeedClass {
    /// Ground movement.
    Taxi,
    /// Initial climb.
    Takeoff,
    /// Cruise of the short-range class.
    CruiseShort,
    /// Cruise of the medium-range class.
    CruiseMedium,
    /// Descent towards the field.
    Approach,
    /// Final segment.
    Landing,
}

lazy_static! {
    /// Reference speed bands (km/h) per phase.
    pub static ref REFERENCE_SPEEDS_KMH: HashMap<SpeedClass, (f64, f64)> = HashMap::from([
        (SpeedClass::Taxi, (35.0, 60.0)),
        (SpeedClass::Takeoff, (250.0, 300.0)),
        (SpeedClass::CruiseShort, (820.0, 880.0)),
        (SpeedClass::CruiseMedium, (880.0, 940.0)),
        (SpeedClass::Approach, (380.0, 380.0)),
        (SpeedClass::Landing, (240.0, 250.0)),
    ]);
}

/// Pick the aircraft class for a route distance.
pub fn select_type(distance_km: f64, threshold_km: f64) -> &'static AircraftType {
    if distance_km <= threshold_km {
        &SHORT_RANGE
    } else {
        &MEDIUM_RANGE
    }
}

/// Cruise speed class of an aircraft type.
pub fn cruise_class(aircraft: &AircraftType) -> SpeedClass {
    if std::ptr::eq(aircraft, &SHORT_RANGE) {
        SpeedClass::CruiseShort
    } else {
        SpeedClass::CruiseMedium
    }
}

/// Sample a target speed uniformly within the reference band.
///
/// Falls back to the type's cruise speed for a class missing from the
/// table.
pub fn sample_speed_kmh(class: SpeedClass, aircraft: &AircraftType, rng: &mut StdRng) -> f64 {
    let (low, high) = REFERENCE_SPEEDS_KMH
        .get(&class)
        .copied()
        .unwrap_or((aircraft.cruise_speed_kmh, aircraft.cruise_speed_kmh));
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

#[cfg(test)]
mod aircraft_tests {
    use super::*;

    #[test]
    fn test_type_selection_by_distance() {
        assert_eq!(select_type(100.0, 700.0).name, "short_range");
        assert_eq!(select_type(700.0, 700.0).name, "short_range");
        assert_eq!(select_type(701.0, 700.0).name, "medium_range");
    }

    #[test]
    fn test_cruise_class_per_type() {
        assert_eq!(cruise_class(&SHORT_RANGE), SpeedClass::CruiseShort);
        assert_eq!(cruise_class(&MEDIUM_RANGE), SpeedClass::CruiseMedium);
    }

    #[test]
    fn test_sampled_speeds_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let v = sample_speed_kmh(SpeedClass::Taxi, &SHORT_RANGE, &mut rng);
            assert!((35.0..=60.0).contains(&v));
        }
        // degenerate band returns its single value
        let v = sample_speed_kmh(SpeedClass::Approach, &SHORT_RANGE, &mut rng);
        assert_eq!(v, 380.0);
    }
}
