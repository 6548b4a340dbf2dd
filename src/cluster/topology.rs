use crate::error::{MeshError, Result};
use crate::types::Rank;

/// Shape of the logical interconnect used to address routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyKind {
    /// Ranks `0..N-1` form a chain; `i` talks to `i-1` and `i+1`.
    Line,
    /// A line whose ends (`N-1` and `0`) are joined.
    Ring,
    /// Rank 0 is a hub adjacent to every other rank; spokes never talk directly.
    Star,
    /// Ranks are `log2(N)`-bit addresses; neighbors differ in exactly one bit.
    Hypercube,
}

impl TopologyKind {
    pub const fn name(self) -> &'static str {
        match self {
            TopologyKind::Line => "line",
            TopologyKind::Ring => "ring",
            TopologyKind::Star => "star",
            TopologyKind::Hypercube => "hypercube",
        }
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of the interconnect: its shape and process count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topology {
    kind: TopologyKind,
    size: u32,
}

impl Topology {
    /// The hub of a star topology.
    pub const HUB: Rank = 0;

    pub fn new(kind: TopologyKind, size: u32) -> Result<Self> {
        let topology = Self { kind, size };
        topology.validate()?;
        Ok(topology)
    }

    pub fn line(size: u32) -> Result<Self> {
        Self::new(TopologyKind::Line, size)
    }

    pub fn ring(size: u32) -> Result<Self> {
        Self::new(TopologyKind::Ring, size)
    }

    pub fn star(size: u32) -> Result<Self> {
        Self::new(TopologyKind::Star, size)
    }

    pub fn hypercube(size: u32) -> Result<Self> {
        Self::new(TopologyKind::Hypercube, size)
    }

    /// Check the descriptor invariants: `size >= 1`, power-of-two hypercubes.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(MeshError::InvalidTopology {
                kind: self.kind,
                size: self.size,
                reason: "size must be at least 1",
            });
        }
        if self.kind == TopologyKind::Hypercube && !self.size.is_power_of_two() {
            return Err(MeshError::InvalidTopology {
                kind: self.kind,
                size: self.size,
                reason: "size must be a power of two",
            });
        }
        Ok(())
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of address bits of a hypercube, `None` for other shapes.
    pub fn dimension(&self) -> Option<u32> {
        (self.kind == TopologyKind::Hypercube).then(|| self.size.trailing_zeros())
    }

    pub fn contains(&self, rank: Rank) -> bool {
        rank < self.size
    }

    /// True if a single hop connects `u` and `v`.
    pub fn is_adjacent(&self, u: Rank, v: Rank) -> bool {
        if u == v || !self.contains(u) || !self.contains(v) {
            return false;
        }
        match self.kind {
            TopologyKind::Line => u.abs_diff(v) == 1,
            TopologyKind::Ring => {
                u.abs_diff(v) == 1 || (u.min(v) == 0 && u.max(v) == self.size - 1)
            }
            TopologyKind::Star => u == Self::HUB || v == Self::HUB,
            TopologyKind::Hypercube => (u ^ v).count_ones() == 1,
        }
    }

    /// Direct neighbors of `rank`, ascending.
    pub fn neighbors(&self, rank: Rank) -> Vec<Rank> {
        if !self.contains(rank) {
            return Vec::new();
        }
        let mut out: Vec<Rank> = match self.kind {
            TopologyKind::Hypercube => {
                let bits = self.size.trailing_zeros();
                (0..bits).map(|b| rank ^ (1 << b)).collect()
            }
            TopologyKind::Star if rank != Self::HUB => vec![Self::HUB],
            _ => (0..self.size)
                .filter(|&r| self.is_adjacent(rank, r))
                .collect(),
        };
        out.sort_unstable();
        out.dedup();
        out
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.size)
    }
}

/// Parse a topology from a string.
///
/// Formats: "line:8", "ring:8", "star:8", "hypercube:64".
pub fn parse_topology(s: &str) -> Option<Topology> {
    let s = s.trim().to_lowercase();
    let (kind, size) = s.split_once(':')?;
    let kind = match kind {
        "line" => TopologyKind::Line,
        "ring" | "circle" => TopologyKind::Ring,
        "star" => TopologyKind::Star,
        "hypercube" => TopologyKind::Hypercube,
        _ => return None,
    };
    let size = size.parse::<u32>().ok()?;
    Topology::new(kind, size).ok()
}
