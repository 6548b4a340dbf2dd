//! Topology-aware routing: canonical routes and tours, and hop-by-hop relay
//! that records every rank a payload passes through.

mod relay;
mod route;

pub use relay::{Delivery, RoutePlan, RouteRequest, Traversal, participants, relay, route_transfer};
pub use route::{Route, compute_route, compute_tour};
