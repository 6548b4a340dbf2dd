use crate::channel::Channel;
use crate::cluster::Topology;
use crate::collective::{
    BroadcastRequest, GatherRequest, Gathered, broadcast, sorted_gather, tree_gather,
};
use crate::config::MeshConfig;
use crate::error::Result;
use crate::memory::Payload;
use crate::protocol::{BROADCAST_TAG, GATHER_TAG, ROUTE_TAG};
use crate::router::{Delivery, RouteRequest, Traversal, route_transfer};
use crate::types::{Element, ProcessContext, Rank, Tag};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A type-erased channel, as handed out by the bootstrap helpers.
pub type DynChannel = Arc<dyn Channel>;

/// One rank's handle on a process group.
///
/// Bundles the channel, the rank's [`ProcessContext`] and tuning config, and
/// gives each collective call its own tag so consecutive calls never read each
/// other's frames. Every rank must issue the same sequence of calls.
///
/// # Example
///
/// ```no_run
/// use meshcoll::{Communicator, MeshConfig, Payload};
///
/// # async fn example() -> meshcoll::Result<()> {
/// let comms = Communicator::local_group(4, MeshConfig::default())?;
/// let handles: Vec<_> = comms
///     .into_iter()
///     .map(|c| {
///         tokio::spawn(async move {
///             let local = Payload::new(vec![c.rank() as u32]);
///             c.sorted_gather(0, local).await
///         })
///     })
///     .collect();
/// # Ok(())
/// # }
/// ```
pub struct Communicator<C: Channel> {
    channel: C,
    ctx: ProcessContext,
    config: MeshConfig,
    epoch: AtomicU64,
}

impl<C: Channel> Communicator<C> {
    pub fn new(channel: C, ctx: ProcessContext, config: MeshConfig) -> Self {
        Self {
            channel,
            ctx,
            config,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn rank(&self) -> Rank {
        self.ctx.rank()
    }

    pub fn world_size(&self) -> u32 {
        self.ctx.size()
    }

    pub fn context(&self) -> ProcessContext {
        self.ctx
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Tag for the next collective call: the operation's base tag in the low
    /// byte, the call counter above it.
    fn next_tag(&self, base: Tag) -> Tag {
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed);
        (epoch << 8) | base
    }

    /// Tree gather of `local` to `root`. `Some` at the root only.
    pub async fn gather<T: Element>(
        &self,
        root: i64,
        local: Payload<T>,
    ) -> Result<Option<Gathered<T>>> {
        let tag = self.next_tag(GATHER_TAG);
        let plan = GatherRequest::new(root, local.len())
            .with_tag(tag)
            .validate(self.ctx, local)?;
        tree_gather(&self.channel, plan).await
    }

    /// Sort locally, gather to `root` and merge there. `Some` at the root only.
    pub async fn sorted_gather<T: Element>(
        &self,
        root: i64,
        local: Payload<T>,
    ) -> Result<Option<Payload<T>>> {
        let tag = self.next_tag(GATHER_TAG);
        let plan = GatherRequest::new(root, local.len())
            .with_tag(tag)
            .validate(self.ctx, local)?;
        sorted_gather(&self.channel, plan).await
    }

    /// Broadcast the root's `buf` into every other rank's `buf`, using the
    /// strategy from this communicator's config.
    pub async fn broadcast<T: Element>(&self, root: i64, buf: &mut Payload<T>) -> Result<()> {
        let tag = self.next_tag(BROADCAST_TAG);
        let plan = BroadcastRequest::new(root, buf.len())
            .with_config(&self.config)
            .with_tag(tag)
            .validate(self.ctx, buf)?;
        broadcast(&self.channel, &plan, buf).await
    }

    /// Relay `payload` over `topology` along `traversal`. Only the first
    /// rank of the route needs a payload; `Some` at the last rank only.
    pub async fn route_transfer<T: Element>(
        &self,
        topology: Topology,
        traversal: Traversal,
        payload: Option<Payload<T>>,
    ) -> Result<Option<Delivery<T>>> {
        let tag = self.next_tag(ROUTE_TAG);
        let plan = RouteRequest {
            topology,
            traversal,
            tag,
        }
        .validate(self.ctx)?;
        route_transfer(&self.channel, &plan, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{CountingChannel, LocalEndpoint};
    use crate::error::MeshError;

    #[test]
    fn test_tags_advance_per_call() {
        let ep = LocalEndpoint::group(1).unwrap().remove(0);
        let ctx = ep.context();
        let comm = Communicator::new(ep, ctx, MeshConfig::default());
        assert_eq!(comm.next_tag(GATHER_TAG), GATHER_TAG);
        assert_eq!(comm.next_tag(GATHER_TAG), (1 << 8) | GATHER_TAG);
        assert_eq!(comm.next_tag(ROUTE_TAG), (2 << 8) | ROUTE_TAG);
    }

    #[tokio::test]
    async fn test_invalid_root_never_touches_channel() {
        let eps = LocalEndpoint::group(2).unwrap();
        let ctx = eps[0].context();
        let comm = Communicator::new(CountingChannel::new(&eps[0]), ctx, MeshConfig::default());

        let err = comm
            .gather(-1, Payload::new(vec![1.0f32]))
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidRoot { root: -1, .. }));

        let mut buf = Payload::new(vec![1u64, 2]);
        let err = comm.broadcast(2, &mut buf).await.unwrap_err();
        assert!(matches!(err, MeshError::InvalidRoot { root: 2, .. }));

        let err = comm
            .route_transfer(
                Topology::line(2).unwrap(),
                Traversal::PointToPoint { src: 0, dst: 5 },
                Some(Payload::new(vec![1u8])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidEndpoint { rank: 5, .. }));

        assert_eq!(comm.channel().total(), 0);
    }

    #[tokio::test]
    async fn test_single_rank_round_trip() {
        let comm = Communicator::local_group(1, MeshConfig::default())
            .unwrap()
            .remove(0);
        let g = comm.gather(0, Payload::new(vec![3i8, 1])).await.unwrap();
        assert_eq!(g.unwrap().payload.as_slice(), &[3, 1]);

        let sorted = comm
            .sorted_gather(0, Payload::new(vec![3i8, 1]))
            .await
            .unwrap();
        assert_eq!(sorted.unwrap().as_slice(), &[1, 3]);

        let d = comm
            .route_transfer(
                Topology::ring(1).unwrap(),
                Traversal::Tour { start: 0 },
                Some(Payload::new(vec![9u16])),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d.trail.as_slice(), &[0, 0]);
    }
}
