use crate::channel::Channel;
use crate::cluster::tree_links;
use crate::collective::helpers::{collective_recv, collective_send};
use crate::config::{BroadcastStrategy, MeshConfig};
use crate::error::{MeshError, Result};
use crate::memory::Payload;
use crate::protocol::{BROADCAST_TAG, decode_frame, frame_len};
use crate::types::{Element, ProcessContext, Rank, Tag};
use futures::future::try_join_all;

/// An unvalidated broadcast of `count` elements from `root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastRequest {
    pub root: i64,
    pub count: usize,
    pub strategy: BroadcastStrategy,
    /// World size at which `Auto` switches from flat to tree.
    pub tree_threshold: u32,
    pub tag: Tag,
}

impl BroadcastRequest {
    pub fn new(root: i64, count: usize) -> Self {
        let cfg = MeshConfig::default();
        Self {
            root,
            count,
            strategy: cfg.broadcast,
            tree_threshold: cfg.tree_broadcast_threshold,
            tag: BROADCAST_TAG,
        }
    }

    pub fn with_strategy(mut self, strategy: BroadcastStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_config(mut self, config: &MeshConfig) -> Self {
        self.strategy = config.broadcast;
        self.tree_threshold = config.tree_broadcast_threshold;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Check the request against this rank's buffer.
    ///
    /// The root's buffer is the source; everyone else's is the destination
    /// and must already be sized to `count`.
    pub fn validate<T: Element>(
        &self,
        ctx: ProcessContext,
        buf: &Payload<T>,
    ) -> Result<BroadcastPlan> {
        let root = ctx.root(self.root)?;
        if self.count == 0 || buf.is_empty() {
            return Err(MeshError::EmptyBuffer {
                operation: "broadcast",
            });
        }
        if buf.len() != self.count {
            return Err(MeshError::BufferSizeMismatch {
                expected: self.count,
                actual: buf.len(),
            });
        }
        if frame_len::<T>(self.count).is_none() {
            return Err(MeshError::CountOverflow {
                count: self.count,
                operation: "broadcast",
            });
        }

        Ok(BroadcastPlan {
            ctx,
            root,
            count: self.count,
            strategy: self.strategy.resolve(ctx.size(), self.tree_threshold),
            tag: self.tag,
        })
    }
}

/// A validated broadcast. `strategy` is never `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPlan {
    ctx: ProcessContext,
    root: Rank,
    count: usize,
    strategy: BroadcastStrategy,
    tag: Tag,
}

impl BroadcastPlan {
    pub fn root(&self) -> Rank {
        self.root
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn strategy(&self) -> BroadcastStrategy {
        self.strategy
    }

    pub fn is_root(&self) -> bool {
        self.ctx.rank() == self.root
    }
}

/// Broadcast the root's buffer into every other rank's `buf`.
///
/// The root only reads `buf`. A non-root rank waits for the frame that feeds
/// it, checks its length and overwrites `buf`; if anything fails its buffer
/// is left as it was.
pub async fn broadcast<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: &BroadcastPlan,
    buf: &mut Payload<T>,
) -> Result<()> {
    if buf.len() != plan.count {
        return Err(MeshError::BufferSizeMismatch {
            expected: plan.count,
            actual: buf.len(),
        });
    }
    let rank = plan.ctx.rank();
    tracing::debug!(
        rank,
        root = plan.root,
        count = plan.count,
        strategy = ?plan.strategy,
        "broadcast start"
    );

    if plan.ctx.size() <= 1 {
        return Ok(());
    }

    match plan.strategy {
        BroadcastStrategy::Flat | BroadcastStrategy::Auto => flat(channel, plan, buf).await?,
        BroadcastStrategy::Tree => tree(channel, plan, buf).await?,
        BroadcastStrategy::Chain => chain(channel, plan, buf).await?,
    }

    tracing::debug!(rank, root = plan.root, "broadcast complete");
    Ok(())
}

/// Root sends to every other rank in turn.
async fn flat<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: &BroadcastPlan,
    buf: &mut Payload<T>,
) -> Result<()> {
    if plan.is_root() {
        let frame = buf.to_frame()?;
        for r in (0..plan.ctx.size()).filter(|&r| r != plan.root) {
            collective_send(channel, r, plan.tag, frame.clone(), "broadcast").await?;
        }
        Ok(())
    } else {
        receive_into(channel, plan, plan.root, buf).await.map(drop)
    }
}

/// Receive from the tree parent, then forward to both children concurrently.
async fn tree<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: &BroadcastPlan,
    buf: &mut Payload<T>,
) -> Result<()> {
    let links = tree_links(plan.ctx.rank(), plan.root, plan.ctx.size());
    let frame = match links.parent {
        Some(parent) => receive_into(channel, plan, parent, buf).await?,
        None => buf.to_frame()?,
    };

    let sends = links.children().map(|child| {
        let frame = frame.clone();
        async move { collective_send(channel, child, plan.tag, frame, "broadcast").await }
    });
    try_join_all(sends).await?;
    Ok(())
}

/// Relay along `root -> root+1 -> ... -> root-1`.
async fn chain<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: &BroadcastPlan,
    buf: &mut Payload<T>,
) -> Result<()> {
    let n = plan.ctx.size();
    let rank = plan.ctx.rank();
    let pos = (rank + n - plan.root) % n;

    let frame = if pos == 0 {
        buf.to_frame()?
    } else {
        receive_into(channel, plan, (rank + n - 1) % n, buf).await?
    };
    if pos + 1 < n {
        collective_send(channel, (rank + 1) % n, plan.tag, frame, "broadcast").await?;
    }
    Ok(())
}

/// Receive one frame from `src`, check it and copy it into `buf`.
/// Returns the raw frame so it can be forwarded untouched.
async fn receive_into<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: &BroadcastPlan,
    src: Rank,
    buf: &mut Payload<T>,
) -> Result<Vec<u8>> {
    let frame = collective_recv(channel, src, plan.tag, "broadcast").await?;
    let elems: Vec<T> = decode_frame(&frame)?;
    if elems.len() != plan.count {
        return Err(MeshError::BufferSizeMismatch {
            expected: plan.count,
            actual: elems.len(),
        });
    }
    tracing::trace!(rank = plan.ctx.rank(), peer = src, count = elems.len(), "broadcast recv");
    buf.overwrite(elems);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{CountingChannel, LocalEndpoint};
    use futures::future::join_all;

    async fn broadcast_all(
        world: u32,
        root: u32,
        strategy: BroadcastStrategy,
    ) -> Vec<Payload<f64>> {
        let eps = LocalEndpoint::group(world).unwrap();
        let source = vec![1.5, -0.0, f64::MAX, 42.0];
        let futs = eps.iter().map(|ep| {
            let source = source.clone();
            async move {
                let mut buf = if ep.rank() == root {
                    Payload::new(source)
                } else {
                    Payload::filled(0.0, 4)
                };
                let plan = BroadcastRequest::new(root as i64, 4)
                    .with_strategy(strategy)
                    .validate(ep.context(), &buf)
                    .unwrap();
                broadcast(ep, &plan, &mut buf).await.unwrap();
                buf
            }
        });
        join_all(futs).await
    }

    #[tokio::test]
    async fn test_every_strategy_delivers_identical_copies() {
        for strategy in [
            BroadcastStrategy::Flat,
            BroadcastStrategy::Tree,
            BroadcastStrategy::Chain,
            BroadcastStrategy::Auto,
        ] {
            for (world, root) in [(1, 0), (2, 1), (5, 3), (8, 0)] {
                let bufs = broadcast_all(world, root, strategy).await;
                let expected: Vec<u64> = [1.5f64, -0.0, f64::MAX, 42.0]
                    .iter()
                    .map(|x| x.to_bits())
                    .collect();
                for buf in &bufs {
                    let bits: Vec<u64> = buf.as_slice().iter().map(|x| x.to_bits()).collect();
                    assert_eq!(bits, expected, "{strategy:?} world={world} root={root}");
                }
            }
        }
    }

    #[test]
    fn test_auto_resolves_by_world_size() {
        let buf = Payload::filled(0u8, 2);
        let small = ProcessContext::new(0, 3).unwrap();
        let large = ProcessContext::new(0, 16).unwrap();
        let req = BroadcastRequest::new(0, 2);
        assert_eq!(
            req.validate(small, &buf).unwrap().strategy(),
            BroadcastStrategy::Flat
        );
        assert_eq!(
            req.validate(large, &buf).unwrap().strategy(),
            BroadcastStrategy::Tree
        );
    }

    #[test]
    fn test_validation_rejects_bad_requests() {
        let ctx = ProcessContext::new(2, 4).unwrap();
        let buf = Payload::filled(0i16, 3);
        assert!(matches!(
            BroadcastRequest::new(-1, 3).validate(ctx, &buf),
            Err(MeshError::InvalidRoot { root: -1, .. })
        ));
        assert!(matches!(
            BroadcastRequest::new(0, 5).validate(ctx, &buf),
            Err(MeshError::BufferSizeMismatch {
                expected: 5,
                actual: 3
            })
        ));
        assert!(matches!(
            BroadcastRequest::new(0, 0).validate(ctx, &Payload::<i16>::default()),
            Err(MeshError::EmptyBuffer { .. })
        ));
    }

    #[tokio::test]
    async fn test_resized_buffer_rejected_without_io() {
        let eps = LocalEndpoint::group(4).unwrap();
        let plan = BroadcastRequest::new(0, 3)
            .validate(eps[2].context(), &Payload::filled(0i16, 3))
            .unwrap();

        let counted = CountingChannel::new(&eps[2]);
        let mut short = Payload::filled(0i16, 2);
        assert!(matches!(
            broadcast(&counted, &plan, &mut short).await,
            Err(MeshError::BufferSizeMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(counted.total(), 0);
    }

    #[tokio::test]
    async fn test_wrong_length_frame_leaves_buffer_untouched() {
        let eps = LocalEndpoint::group(2).unwrap();
        eps[0]
            .send(1, BROADCAST_TAG, Payload::new(vec![9u32; 5]).to_frame().unwrap())
            .await
            .unwrap();
        let mut buf = Payload::filled(1u32, 3);
        let plan = BroadcastRequest::new(0, 3)
            .with_strategy(BroadcastStrategy::Flat)
            .validate(eps[1].context(), &buf)
            .unwrap();
        let err = broadcast(&eps[1], &plan, &mut buf).await.unwrap_err();
        assert!(matches!(
            err,
            MeshError::BufferSizeMismatch {
                expected: 3,
                actual: 5
            }
        ));
        assert_eq!(buf.as_slice(), &[1, 1, 1]);
    }
}
