use crate::channel::Channel;
use crate::cluster::Topology;
use crate::collective::helpers::{collective_recv, collective_send};
use crate::error::{MeshError, Result};
use crate::memory::Payload;
use crate::protocol::{ROUTE_TAG, decode_ranks, encode_ranks};
use crate::router::route::{Route, compute_route, compute_tour};
use crate::types::{Element, ProcessContext, Rank, Tag};

/// What a transfer should traverse. Ranks are raw caller input until
/// [`RouteRequest::validate`] checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Shortest canonical route from `src` to `dst`.
    PointToPoint { src: i64, dst: i64 },
    /// The topology's canonical tour starting (and ending) at `start`.
    Tour { start: i64 },
}

/// An unvalidated routed transfer.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub topology: Topology,
    pub traversal: Traversal,
    pub tag: Tag,
}

impl RouteRequest {
    pub fn point_to_point(topology: Topology, src: i64, dst: i64) -> Self {
        Self {
            topology,
            traversal: Traversal::PointToPoint { src, dst },
            tag: ROUTE_TAG,
        }
    }

    pub fn tour(topology: Topology, start: i64) -> Self {
        Self {
            topology,
            traversal: Traversal::Tour { start },
            tag: ROUTE_TAG,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Check the request against the calling process and compute its route.
    ///
    /// Purely local: every rank computes the same route without talking to
    /// anyone, and nothing is sent if this fails.
    pub fn validate(&self, ctx: ProcessContext) -> Result<RoutePlan> {
        self.topology.validate()?;
        if self.topology.size() != ctx.size() {
            return Err(MeshError::InvalidTopology {
                kind: self.topology.kind(),
                size: self.topology.size(),
                reason: "size differs from the process group",
            });
        }

        let route = match self.traversal {
            Traversal::PointToPoint { src, dst } => {
                compute_route(&self.topology, ctx.endpoint(src)?, ctx.endpoint(dst)?)?
            }
            Traversal::Tour { start } => compute_tour(&self.topology, ctx.endpoint(start)?)?,
        };

        Ok(RoutePlan {
            ctx,
            route,
            tag: self.tag,
        })
    }
}

/// A validated transfer: the route every rank agreed on locally.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    ctx: ProcessContext,
    route: Route,
    tag: Tag,
}

impl RoutePlan {
    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn context(&self) -> ProcessContext {
        self.ctx
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// True if the calling rank appears anywhere on the route.
    pub fn involves_me(&self) -> bool {
        self.route.as_slice().contains(&self.ctx.rank())
    }
}

/// What the final rank of a route ends up holding.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<T: Element> {
    pub payload: Payload<T>,
    /// Every rank that held the payload, in order, source and destination
    /// included.
    pub trail: Route,
}

/// Run a validated transfer. See [`relay`].
pub async fn route_transfer<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: &RoutePlan,
    payload: Option<Payload<T>>,
) -> Result<Option<Delivery<T>>> {
    relay(channel, plan.ctx, &plan.route, payload, plan.tag).await
}

/// Store-and-forward `payload` along `route`.
///
/// The route's first rank must supply the payload. Each time the calling
/// rank appears on the route it receives `(trail, payload)` from the
/// previous entry, appends itself to the trail and forwards both to the next
/// entry. The rank at the last position returns the payload and the full
/// trail; every other rank returns `None`. Ranks not on the route return
/// immediately without touching the channel.
pub async fn relay<T: Element, C: Channel + ?Sized>(
    channel: &C,
    ctx: ProcessContext,
    route: &Route,
    payload: Option<Payload<T>>,
    tag: Tag,
) -> Result<Option<Delivery<T>>> {
    let me = ctx.rank();
    let hops = route.as_slice();
    let positions = route.positions(me);
    if positions.is_empty() {
        return Ok(None);
    }
    if route.src() == me && payload.is_none() {
        return Err(MeshError::MissingPayload { rank: me });
    }

    tracing::debug!(rank = me, tag, route = %route, "relay start");

    let last = hops.len() - 1;
    let mut outgoing = payload;
    for pos in positions {
        let (mut trail, data) = if pos == 0 {
            let data = outgoing
                .take()
                .ok_or(MeshError::MissingPayload { rank: me })?;
            (Vec::with_capacity(hops.len()), data)
        } else {
            let prev = hops[pos - 1];
            let trail = decode_ranks(&collective_recv(channel, prev, tag, "relay").await?)?;
            let data = Payload::<T>::from_frame(&collective_recv(channel, prev, tag, "relay").await?)?;
            tracing::trace!(rank = me, peer = prev, pos, count = data.len(), "relay hop in");
            (trail, data)
        };
        trail.push(me);

        if pos == last {
            tracing::debug!(rank = me, tag, hops = trail.len() - 1, "relay delivered");
            return Ok(Some(Delivery {
                payload: data,
                trail: Route::from_ranks(trail),
            }));
        }

        let next = hops[pos + 1];
        collective_send(channel, next, tag, encode_ranks(&trail)?, "relay").await?;
        collective_send(channel, next, tag, data.to_frame()?, "relay").await?;
        tracing::trace!(rank = me, peer = next, pos, "relay hop out");
    }

    Ok(None)
}

/// Ranks on `route` in first-visit order, without repeats.
pub fn participants(route: &Route) -> Vec<Rank> {
    let mut seen = Vec::with_capacity(route.len());
    for &r in route.as_slice() {
        if !seen.contains(&r) {
            seen.push(r);
        }
    }
    seen
}
