//! Simulation driver.
//!
//! Runs the built-in demo network for a number of consecutive days and
//! prints per-day summary statistics. Engine tuning comes from the
//! environment (see [`Config`]); the command line only covers the run
//! shape.

use clap::Parser;

use airnet_sim::engine::run_consecutive_days;
use airnet_sim::network::{Airport, FlowRecord, Location, RouteGraph, WindLabel};
use airnet_sim::plan::PlanConfig;
use airnet_sim::Config;

/// Command line arguments of the simulation driver.
#[derive(Parser, Debug)]
#[command(name = "airnet-sim", about = "Air-traffic network simulator")]
struct Args {
    /// Number of consecutive days to simulate.
    #[arg(long, default_value_t = 1)]
    days: u32,

    /// Flights generated per day.
    #[arg(long, default_value_t = 300)]
    flights: usize,

    /// Override the configured root seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Re-derive airport capacities from relative traffic.
    #[arg(long, default_value_t = false)]
    derive_capacities: bool,
}

/// A small built-in network of Spanish airports with rough annual
/// passenger flows, enough to exercise every part of the engine.
fn demo_network() -> Result<RouteGraph, airnet_sim::network::NetworkError> {
    let mut bio = Airport::new("BIO", Location::new(43.301, -2.911), 4);
    bio.wind_low = WindLabel::Against;
    let airports = vec![
        Airport::new("MAD", Location::new(40.472, -3.561), 12),
        Airport::new("BCN", Location::new(41.297, 2.078), 10),
        Airport::new("PMI", Location::new(39.552, 2.739), 8),
        Airport::new("AGP", Location::new(36.675, -4.499), 6),
        Airport::new("SVQ", Location::new(37.418, -5.893), 5),
        Airport::new("VLC", Location::new(39.489, -0.482), 5),
        Airport::new("LPA", Location::new(27.932, -15.387), 6),
        bio,
    ];
    let flows = [
        ("MAD", "BCN", 2300.0),
        ("MAD", "PMI", 1900.0),
        ("BCN", "PMI", 1500.0),
        ("MAD", "AGP", 1300.0),
        ("MAD", "LPA", 1200.0),
        ("BCN", "AGP", 600.0),
        ("MAD", "SVQ", 600.0),
        ("MAD", "BIO", 500.0),
        ("BCN", "SVQ", 400.0),
        ("PMI", "VLC", 300.0),
        ("MAD", "VLC", 300.0),
        ("BCN", "BIO", 200.0),
    ]
    .iter()
    .map(|(origin, destination, pax)| FlowRecord {
        origin: origin.to_string(),
        destination: destination.to_string(),
        annual_passengers: *pax,
    })
    .collect::<Vec<_>>();
    RouteGraph::new(airports, &flows)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::try_from_env()?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    airnet_sim::init_logger(&config);

    let mut network = demo_network()?;
    if args.derive_capacities {
        network.derive_capacities(4, 12);
    }
    let plan_config = PlanConfig::new(args.flights, config.seed);

    let days = run_consecutive_days(&network, &config, &plan_config, args.days)?;
    for day in &days {
        let records = &day.output.records;
        let completed = records.len();
        let diverted = records.iter().filter(|r| r.diverted).count();
        let exterior = records.iter().filter(|r| r.exterior).count();
        let queued = records.iter().filter(|r| r.queue_wait_min > 0.0).count();
        let mean_delay = if completed > 0 {
            records.iter().map(|r| r.total_delay_min).sum::<f64>() / completed as f64
        } else {
            0.0
        };
        let fuel: f64 = records.iter().map(|r| r.fuel_used_l).sum();
        let first_departure = day
            .plan
            .first()
            .map(|row| row.departure_hhmm())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "day {}: {} scheduled (first departure {}), {} completed, {} diverted, \
             {} exterior, {} queued, mean delay {:.1} min, fuel {:.0} l",
            day.day,
            day.plan.len(),
            first_departure,
            completed,
            diverted,
            exterior,
            queued,
            mean_delay,
            fuel
        );
    }
    Ok(())
}
