//! Static description of the simulated airport network: airports with
//! capacity and wind labels, and the passenger-weighted route graph the
//! plan generator and the diversion planner operate on.

pub mod airport;
pub mod graph;
pub mod haversine;
pub mod location;

pub use airport::{Airport, WindLabel};
pub use graph::{FlowRecord, NetworkError, RouteGraph};
pub use location::Location;

/// Reserved destination identifier for flights leaving the modelled
/// network. It never owns a capacity resource.
pub const EXTERIOR: &str = "EXTERIOR";

/// Returns true if `id` is the reserved exterior identifier.
pub fn is_exterior(id: &str) -> bool {
    id.eq_ignore_ascii_case(EXTERIOR)
}
