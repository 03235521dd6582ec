//! The passenger-weighted route graph.
//!
//! The graph module builds an undirected graph from an airport table and
//! an annual passenger flow table. Edge weights are normalised passenger
//! shares; great-circle distances are attached per edge. Path finding is
//! provided to support the diversion planner.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::network::airport::Airport;
use crate::network::haversine;
use crate::network::is_exterior;

/// One directed passenger flow between two airports. Both directions of
/// a pair accumulate onto the same undirected edge.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    /// Origin airport id.
    pub origin: String,
    /// Destination airport id.
    pub destination: String,
    /// Annual passengers carried on this direction.
    pub annual_passengers: f64,
}

/// Error types for network construction and queries.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// An airport declared a capacity below 1.
    NonPositiveCapacity(String),
    /// The same airport id appeared twice in the table.
    DuplicateAirport(String),
    /// The reserved exterior id was used as an airport id.
    ReservedId(String),
    /// A graph query referenced an id that is not a node.
    UnknownAirport(String),
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NetworkError::NonPositiveCapacity(id) => {
                write!(f, "airport {} has non-positive capacity", id)
            }
            NetworkError::DuplicateAirport(id) => write!(f, "duplicate airport id {}", id),
            NetworkError::ReservedId(id) => write!(f, "airport id {} is reserved", id),
            NetworkError::UnknownAirport(id) => write!(f, "unknown airport id {}", id),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Edge payload: cumulative passengers, normalised weight and distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEdge {
    /// Cumulative annual passengers over both directions.
    pub annual_passengers: f64,
    /// Normalised weight; sums to 1 over all edges with positive weight.
    pub weight: f64,
    /// Great-circle distance between the endpoints in km.
    pub distance_km: f64,
}

/// A RouteGraph holds the airport table and an undirected petgraph with
/// one node per airport, plus a map from airport id to its node index.
#[derive(Debug, Clone)]
pub struct RouteGraph {
    graph: UnGraph<String, RouteEdge>,
    node_indices: HashMap<String, NodeIndex>,
    airports: HashMap<String, Airport>,
    ordered_ids: Vec<String>,
}

impl RouteGraph {
    /// Builds the route graph from an airport table and a flow table.
    ///
    /// Both directions of a pair accumulate onto one undirected edge.
    /// Flows referencing airports absent from the table are skipped with
    /// a warning. If no flow covers any edge the graph degenerates to
    /// the complete graph with uniform weights.
    ///
    /// # Arguments
    /// * `airports` - The airport table.
    /// * `flows` - Annual passenger flows; order is preserved in edge
    ///   iteration, so callers should pass a deterministic order.
    ///
    /// # Returns
    /// A RouteGraph, or a [`NetworkError`] if the airport table is
    /// invalid.
    pub fn new(airports: Vec<Airport>, flows: &[FlowRecord]) -> Result<Self, NetworkError> {
        net_info!("(new) Building route graph from {} airports.", airports.len());

        let mut graph = UnGraph::new_undirected();
        let mut node_indices = HashMap::new();
        let mut table = HashMap::new();
        let mut ordered_ids: Vec<String> = Vec::with_capacity(airports.len());

        let mut sorted = airports;
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        for airport in sorted {
            if airport.capacity < 1 {
                return Err(NetworkError::NonPositiveCapacity(airport.id));
            }
            if is_exterior(&airport.id) {
                return Err(NetworkError::ReservedId(airport.id));
            }
            if table.contains_key(&airport.id) {
                return Err(NetworkError::DuplicateAirport(airport.id));
            }
            let index = graph.add_node(airport.id.clone());
            node_indices.insert(airport.id.clone(), index);
            ordered_ids.push(airport.id.clone());
            table.insert(airport.id.clone(), airport);
        }

        let mut route_graph = RouteGraph {
            graph,
            node_indices,
            airports: table,
            ordered_ids,
        };
        route_graph.accumulate_flows(flows);
        route_graph.attach_distances();
        route_graph.normalize_weights();

        net_info!(
            "(new) Route graph ready: {} nodes, {} edges.",
            route_graph.node_count(),
            route_graph.edge_count()
        );
        Ok(route_graph)
    }

    fn accumulate_flows(&mut self, flows: &[FlowRecord]) {
        let mut total = 0.0;
        for flow in flows {
            if flow.annual_passengers <= 0.0 {
                continue;
            }
            if flow.origin == flow.destination {
                net_warn!("(accumulate_flows) Skipping self-flow at {}.", flow.origin);
                continue;
            }
            let (Some(&u), Some(&v)) = (
                self.node_indices.get(&flow.origin),
                self.node_indices.get(&flow.destination),
            ) else {
                net_warn!(
                    "(accumulate_flows) Skipping flow {} -> {}: unknown endpoint.",
                    flow.origin,
                    flow.destination
                );
                continue;
            };
            match self.graph.find_edge(u, v) {
                Some(edge) => {
                    self.graph[edge].annual_passengers += flow.annual_passengers;
                }
                None => {
                    self.graph.add_edge(
                        u,
                        v,
                        RouteEdge {
                            annual_passengers: flow.annual_passengers,
                            weight: 0.0,
                            distance_km: 0.0,
                        },
                    );
                }
            }
            total += flow.annual_passengers;
        }

        if total <= 0.0 {
            // Degenerate input: fall back to the complete graph with
            // uniform weights rather than failing.
            net_warn!("(accumulate_flows) No positive flows; using complete graph fallback.");
            self.graph.clear_edges();
            for (i, a) in self.ordered_ids.iter().enumerate() {
                for b in self.ordered_ids.iter().skip(i + 1) {
                    let u = self.node_indices[a];
                    let v = self.node_indices[b];
                    self.graph.add_edge(
                        u,
                        v,
                        RouteEdge {
                            annual_passengers: 1.0,
                            weight: 0.0,
                            distance_km: 0.0,
                        },
                    );
                }
            }
        }
    }

    fn attach_distances(&mut self) {
        let mut updates = Vec::new();
        for edge in self.graph.edge_references() {
            let from = &self.airports[&self.graph[edge.source()]];
            let to = &self.airports[&self.graph[edge.target()]];
            updates.push((
                edge.id(),
                haversine::distance(&from.location, &to.location),
            ));
        }
        for (edge, distance_km) in updates {
            self.graph[edge].distance_km = distance_km;
        }
    }

    fn normalize_weights(&mut self) {
        let total: f64 = self
            .graph
            .edge_references()
            .map(|e| e.weight().annual_passengers)
            .sum();
        if total <= 0.0 {
            return;
        }
        for edge in self.graph.edge_indices().collect::<Vec<_>>() {
            self.graph[edge].weight = self.graph[edge].annual_passengers / total;
        }
    }

    /// Get the airport table entry for an id.
    pub fn airport(&self, id: &str) -> Option<&Airport> {
        self.airports.get(id)
    }

    /// Airport ids in deterministic (sorted) order.
    pub fn airport_ids(&self) -> &[String] {
        &self.ordered_ids
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as (endpoint, endpoint, payload) in stable order.
    pub fn edges(&self) -> Vec<(&str, &str, &RouteEdge)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].as_str(),
                    self.graph[e.target()].as_str(),
                    e.weight(),
                )
            })
            .collect()
    }

    /// Direct edge payload between two airports, if connected.
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&RouteEdge> {
        let u = *self.node_indices.get(a)?;
        let v = *self.node_indices.get(b)?;
        let edge = self.graph.find_edge(u, v)?;
        Some(&self.graph[edge])
    }

    /// Find the length in km of the shortest path between two airports.
    ///
    /// # Returns
    /// The summed edge distance of the cheapest path, or `None` if the
    /// nodes are not connected.
    ///
    /// # Errors
    /// Returns a [`NetworkError::UnknownAirport`] if either endpoint is
    /// not a node of the graph.
    pub fn shortest_path_km(&self, from: &str, to: &str) -> Result<Option<f64>, NetworkError> {
        let Some(&from_index) = self.node_indices.get(from) else {
            return Err(NetworkError::UnknownAirport(from.to_string()));
        };
        let Some(&to_index) = self.node_indices.get(to) else {
            return Err(NetworkError::UnknownAirport(to.to_string()));
        };

        let result = astar(
            &self.graph,
            from_index,
            |finish| finish == to_index,
            |e| e.weight().distance_km,
            |_| 0.0,
        );
        Ok(result.map(|(cost, _)| cost))
    }

    /// Cumulative passenger traffic per airport, used to rank hubs.
    ///
    /// Falls back to node degree when every flow is zero so ranking
    /// still works on the uniform fallback graph.
    pub fn traffic_by_airport(&self) -> HashMap<String, f64> {
        let mut traffic: HashMap<String, f64> = self
            .ordered_ids
            .iter()
            .map(|id| (id.clone(), 0.0))
            .collect();
        for edge in self.graph.edge_references() {
            let pax = edge.weight().annual_passengers.max(0.0);
            *traffic.get_mut(&self.graph[edge.source()]).unwrap() += pax;
            *traffic.get_mut(&self.graph[edge.target()]).unwrap() += pax;
        }
        if traffic.values().all(|&v| v == 0.0) {
            for (id, value) in traffic.iter_mut() {
                *value = self
                    .graph
                    .edges(self.node_indices[id])
                    .count() as f64;
            }
        }
        traffic
    }

    /// Re-derive airport capacities from relative traffic.
    ///
    /// `cap = round(cap_min + pax/pax_max * (cap_max - cap_min))`,
    /// lower-bounded by 1.
    pub fn derive_capacities(&mut self, cap_min: u32, cap_max: u32) {
        let traffic = self.traffic_by_airport();
        let pax_max = traffic.values().cloned().fold(0.0_f64, f64::max).max(1e-9);
        for (id, airport) in self.airports.iter_mut() {
            let share = traffic.get(id).copied().unwrap_or(0.0) / pax_max;
            let cap = (cap_min as f64 + share * (cap_max.saturating_sub(cap_min)) as f64).round();
            airport.capacity = (cap as u32).max(1);
        }
    }
}

#[cfg(test)]
mod route_graph_tests {
    use super::*;
    use crate::network::location::Location;

    fn airport(id: &str, lat: f64, lon: f64, capacity: u32) -> Airport {
        Airport::new(id, Location::new(lat, lon), capacity)
    }

    fn flow(origin: &str, destination: &str, pax: f64) -> FlowRecord {
        FlowRecord {
            origin: origin.to_string(),
            destination: destination.to_string(),
            annual_passengers: pax,
        }
    }

    fn three_airports() -> Vec<Airport> {
        vec![
            airport("AAA", 0.0, 0.0, 5),
            airport("BBB", 0.0, 1.0, 5),
            airport("CCC", 1.0, 0.0, 5),
        ]
    }

    #[test]
    fn test_weights_sum_to_one() {
        let flows = vec![
            flow("AAA", "BBB", 100.0),
            flow("BBB", "AAA", 50.0),
            flow("AAA", "CCC", 50.0),
        ];
        let graph = RouteGraph::new(three_airports(), &flows).unwrap();

        assert_eq!(graph.edge_count(), 2);
        let total: f64 = graph.edges().iter().map(|(_, _, e)| e.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);

        // both directions accumulated on the same undirected edge
        let edge = graph.edge_between("AAA", "BBB").unwrap();
        assert_eq!(edge.annual_passengers, 150.0);
        assert!((edge.weight - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_complete_graph_fallback() {
        let graph = RouteGraph::new(three_airports(), &[]).unwrap();

        // 3 nodes -> 3 edges, uniform weights
        assert_eq!(graph.edge_count(), 3);
        for (_, _, edge) in graph.edges() {
            assert!((edge.weight - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_edge_distances() {
        let flows = vec![flow("AAA", "BBB", 10.0)];
        let graph = RouteGraph::new(three_airports(), &flows).unwrap();
        let edge = graph.edge_between("AAA", "BBB").unwrap();
        // one degree of longitude at the equator
        assert!((edge.distance_km - 111.2).abs() < 1.0);
    }

    #[test]
    fn test_shortest_path() {
        let flows = vec![flow("AAA", "BBB", 10.0), flow("BBB", "CCC", 10.0)];
        let graph = RouteGraph::new(three_airports(), &flows).unwrap();

        let direct = graph.shortest_path_km("AAA", "BBB").unwrap().unwrap();
        assert!((direct - 111.2).abs() < 1.0);

        // AAA -> CCC only via BBB
        let hop = graph.shortest_path_km("AAA", "CCC").unwrap().unwrap();
        assert!(hop > direct);

        let missing = graph.shortest_path_km("AAA", "ZZZ");
        assert!(matches!(missing, Err(NetworkError::UnknownAirport(_))));
    }

    #[test]
    fn test_disconnected_nodes_have_no_path() {
        let flows = vec![flow("AAA", "BBB", 10.0)];
        let graph = RouteGraph::new(three_airports(), &flows).unwrap();
        assert_eq!(graph.shortest_path_km("AAA", "CCC").unwrap(), None);
    }

    #[test]
    fn test_rejects_invalid_airports() {
        let zero_cap = vec![airport("AAA", 0.0, 0.0, 0)];
        assert!(matches!(
            RouteGraph::new(zero_cap, &[]),
            Err(NetworkError::NonPositiveCapacity(_))
        ));

        let reserved = vec![airport("EXTERIOR", 0.0, 0.0, 2)];
        assert!(matches!(
            RouteGraph::new(reserved, &[]),
            Err(NetworkError::ReservedId(_))
        ));

        let duplicated = vec![airport("AAA", 0.0, 0.0, 2), airport("AAA", 1.0, 1.0, 2)];
        assert!(matches!(
            RouteGraph::new(duplicated, &[]),
            Err(NetworkError::DuplicateAirport(_))
        ));
    }

    #[test]
    fn test_traffic_ranking_and_derived_capacities() {
        let flows = vec![
            flow("AAA", "BBB", 300.0),
            flow("AAA", "CCC", 100.0),
        ];
        let mut graph = RouteGraph::new(three_airports(), &flows).unwrap();

        let traffic = graph.traffic_by_airport();
        assert_eq!(traffic["AAA"], 400.0);
        assert_eq!(traffic["BBB"], 300.0);
        assert_eq!(traffic["CCC"], 100.0);

        graph.derive_capacities(1, 9);
        assert_eq!(graph.airport("AAA").unwrap().capacity, 9);
        assert_eq!(graph.airport("BBB").unwrap().capacity, 7);
        assert_eq!(graph.airport("CCC").unwrap().capacity, 3);
    }
}
