mod topology;
mod tree;

pub use topology::{Topology, TopologyKind, parse_topology};
pub use tree::{TreeLinks, gather_order, tree_depth, tree_links};
