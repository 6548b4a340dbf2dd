use crate::cluster::{Topology, TopologyKind};
use crate::error::{MeshError, Result};
use crate::types::Rank;

/// Ordered list of ranks a payload passes through, endpoints included.
///
/// Consecutive entries are adjacent in the topology the route was computed
/// for. A route of one entry means source and destination coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route(Vec<Rank>);

impl Route {
    pub(crate) fn from_ranks(ranks: Vec<Rank>) -> Self {
        debug_assert!(!ranks.is_empty(), "routes always hold the source");
        Self(ranks)
    }

    pub fn src(&self) -> Rank {
        self.0[0]
    }

    pub fn dst(&self) -> Rank {
        self.0[self.0.len() - 1]
    }

    /// Number of entries, endpoints included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a route holds at least its source.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of point-to-point transfers along the route.
    pub fn hops(&self) -> usize {
        self.0.len() - 1
    }

    pub fn as_slice(&self) -> &[Rank] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Rank> {
        self.0
    }

    /// The same path walked from `dst` back to `src`.
    pub fn reversed(&self) -> Route {
        let mut ranks = self.0.clone();
        ranks.reverse();
        Route(ranks)
    }

    /// Ranks strictly between the endpoints.
    pub fn intermediates(&self) -> &[Rank] {
        if self.0.len() <= 2 {
            &[]
        } else {
            &self.0[1..self.0.len() - 1]
        }
    }

    /// Positions at which `rank` appears, ascending. Tours revisit ranks.
    pub fn positions(&self, rank: Rank) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &r)| (r == rank).then_some(i))
            .collect()
    }

    /// True if every entry is in range and every hop joins adjacent ranks.
    ///
    /// A one-rank interconnect loops back to itself, so `[0, 0]` is a valid
    /// tour there.
    pub fn is_valid_for(&self, topology: &Topology) -> bool {
        self.0.iter().all(|&r| topology.contains(r))
            && self.0.windows(2).all(|w| {
                topology.is_adjacent(w[0], w[1]) || (topology.size() == 1 && w[0] == w[1])
            })
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|r| r.to_string()).collect();
        write!(f, "[{}]", parts.join(" -> "))
    }
}

fn check_endpoint(topology: &Topology, rank: Rank) -> Result<()> {
    if topology.contains(rank) {
        Ok(())
    } else {
        Err(MeshError::InvalidEndpoint {
            rank: rank as i64,
            world_size: topology.size(),
        })
    }
}

/// Compute the canonical route from `src` to `dst`.
///
/// - Line: the literal integer sequence between the endpoints.
/// - Ring: the shorter arc; on a tie, the arc that climbs upward from the
///   smaller endpoint, so both directions visit the same ranks.
/// - Star: through the hub unless one endpoint is the hub.
/// - Hypercube: bit-fixing over the `d`-bit address read left to right, so
///   the most significant differing bit is flipped first.
pub fn compute_route(topology: &Topology, src: Rank, dst: Rank) -> Result<Route> {
    topology.validate()?;
    check_endpoint(topology, src)?;
    check_endpoint(topology, dst)?;

    if src == dst {
        return Ok(Route(vec![src]));
    }

    let ranks = match topology.kind() {
        TopologyKind::Line => {
            if src < dst {
                (src..=dst).collect()
            } else {
                (dst..=src).rev().collect()
            }
        }
        TopologyKind::Ring => {
            // u64 so `x + n` cannot wrap for rings past u32::MAX / 2.
            let n = u64::from(topology.size());
            let (s, d) = (u64::from(src), u64::from(dst));
            let forward_dist = (d + n - s) % n;
            let backward_dist = (s + n - d) % n;
            let forward =
                forward_dist < backward_dist || (forward_dist == backward_dist && src < dst);
            let (steps, step) = if forward {
                (forward_dist, 1)
            } else {
                (backward_dist, n - 1)
            };
            let mut ranks = Vec::with_capacity(steps as usize + 1);
            let mut cur = s;
            ranks.push(src);
            for _ in 0..steps {
                cur = (cur + step) % n;
                ranks.push(cur as Rank);
            }
            ranks
        }
        TopologyKind::Star => {
            if src == Topology::HUB || dst == Topology::HUB {
                vec![src, dst]
            } else {
                vec![src, Topology::HUB, dst]
            }
        }
        TopologyKind::Hypercube => {
            let mut ranks = Vec::with_capacity((src ^ dst).count_ones() as usize + 1);
            let mut cur = src;
            ranks.push(cur);
            while cur != dst {
                let diff = cur ^ dst;
                cur ^= 1 << (u32::BITS - 1 - diff.leading_zeros());
                ranks.push(cur);
            }
            ranks
        }
    };

    Ok(Route(ranks))
}

/// Compute a closed walk from `start` that visits every rank and returns.
///
/// - Ring: `[s, s+1, …, s-1, s]`, exactly `N + 1` entries.
/// - Star: out and back through the hub to every other rank in ascending
///   order; from the hub this is `[0, 1, 0, 2, 0, …, 0, N-1, 0]`.
/// - Line: up to `N-1`, down to `0`, back up to `s`.
/// - Hypercube: the reflected Gray-code cycle shifted by `s`.
pub fn compute_tour(topology: &Topology, start: Rank) -> Result<Route> {
    topology.validate()?;
    check_endpoint(topology, start)?;
    let n = topology.size();

    let ranks = match topology.kind() {
        TopologyKind::Ring => {
            let (n, start) = (u64::from(n), u64::from(start));
            (0..=n).map(|i| ((start + i) % n) as Rank).collect()
        }
        _ if n == 1 => vec![start],
        TopologyKind::Star => {
            let mut ranks = vec![start];
            if start != Topology::HUB {
                ranks.push(Topology::HUB);
            }
            for spoke in (1..n).filter(|&r| r != start) {
                ranks.push(spoke);
                ranks.push(Topology::HUB);
            }
            if start != Topology::HUB {
                ranks.push(start);
            }
            ranks
        }
        TopologyKind::Line => {
            let mut ranks: Vec<Rank> = (start..n).collect();
            ranks.extend((0..n - 1).rev());
            ranks.extend(1..=start);
            ranks
        }
        TopologyKind::Hypercube => {
            let mut ranks: Vec<Rank> = (0..n).map(|i| start ^ (i ^ (i >> 1))).collect();
            ranks.push(start);
            ranks
        }
    };

    Ok(Route(ranks))
}
