pub mod channel;
pub mod client;
pub mod cluster;
pub mod collective;
pub mod config;
pub mod error;
pub mod memory;
pub mod protocol;
pub mod router;
pub mod types;

pub use channel::{Channel, CountingChannel, LocalEndpoint, TcpEndpoint, Watchdog};
pub use client::{Communicator, DynChannel};
pub use cluster::{Topology, TopologyKind, parse_topology};
pub use collective::{
    BroadcastPlan, BroadcastRequest, GatherPlan, GatherRequest, Gathered, broadcast, k_way_merge,
    sorted_gather, tree_gather,
};
pub use config::{BroadcastStrategy, MeshConfig};
pub use error::{MeshError, Result};
pub use memory::Payload;
pub use router::{
    Delivery, Route, RoutePlan, RouteRequest, Traversal, compute_route, compute_tour,
    route_transfer,
};
pub use types::{DataType, Element, ProcessContext, Rank, Tag};
