use crate::channel::Channel;
use crate::cluster::{gather_order, tree_links};
use crate::collective::helpers::{collective_recv, collective_send, recv_payload, send_payload};
use crate::collective::merge::{merge_runs, sort_local, split_runs_by_counts};
use crate::error::{MeshError, Result};
use crate::memory::Payload;
use crate::protocol::{GATHER_TAG, decode_frame, encode_frame, frame_len};
use crate::types::{Element, ProcessContext, Rank, Tag};

/// An unvalidated gather: this rank contributes `count` elements to `root`.
///
/// Ranks may contribute different counts; the root learns each one from the
/// subtree count frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherRequest {
    pub root: i64,
    pub count: usize,
    pub tag: Tag,
}

impl GatherRequest {
    pub fn new(root: i64, count: usize) -> Self {
        Self {
            root,
            count,
            tag: GATHER_TAG,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Check the request and take ownership of the local contribution.
    ///
    /// Rejects a root outside the group, an empty contribution, a declared
    /// count that disagrees with the buffer, and a contribution that would
    /// not fit in one frame. No channel I/O happens here.
    pub fn validate<T: Element>(
        &self,
        ctx: ProcessContext,
        local: Payload<T>,
    ) -> Result<GatherPlan<T>> {
        let root = ctx.root(self.root)?;
        if local.is_empty() {
            return Err(MeshError::EmptyBuffer {
                operation: "gather",
            });
        }
        if local.len() != self.count {
            return Err(MeshError::BufferSizeMismatch {
                expected: self.count,
                actual: local.len(),
            });
        }
        if frame_len::<T>(self.count).is_none() {
            return Err(MeshError::CountOverflow {
                count: self.count,
                operation: "gather",
            });
        }

        Ok(GatherPlan {
            ctx,
            root,
            tag: self.tag,
            local,
        })
    }
}

/// A validated gather holding this rank's contribution.
#[derive(Debug, Clone)]
pub struct GatherPlan<T: Element> {
    ctx: ProcessContext,
    root: Rank,
    tag: Tag,
    local: Payload<T>,
}

impl<T: Element> GatherPlan<T> {
    pub fn root(&self) -> Rank {
        self.root
    }

    pub fn count(&self) -> usize {
        self.local.len()
    }

    pub fn is_root(&self) -> bool {
        self.ctx.rank() == self.root
    }
}

/// The root's view of a finished gather.
#[derive(Debug, Clone, PartialEq)]
pub struct Gathered<T: Element> {
    pub payload: Payload<T>,
    /// Rank whose contribution fills each slot of `payload`, in order.
    pub contributors: Vec<Rank>,
    /// Element count of each slot, aligned with `contributors`.
    pub counts: Vec<usize>,
}

impl<T: Element> Gathered<T> {
    /// The slot contributed by `rank`, if it took part.
    pub fn slot_of(&self, rank: Rank) -> Option<&[T]> {
        let idx = self.contributors.iter().position(|&r| r == rank)?;
        let start: usize = self.counts.get(..idx)?.iter().sum();
        let len = *self.counts.get(idx)?;
        self.payload.as_slice().get(start..start + len)
    }

    /// Every slot in gathered order, paired with its contributor.
    pub fn slots(&self) -> impl Iterator<Item = (Rank, &[T])> + '_ {
        let elems = self.payload.as_slice();
        self.contributors
            .iter()
            .zip(&self.counts)
            .scan(0usize, move |start, (&rank, &len)| {
                let slot = elems.get(*start..*start + len)?;
                *start += len;
                Some((rank, slot))
            })
    }
}

/// Binary-tree gather to the plan's root.
///
/// Each rank receives the accumulated subtree of its left child, then its
/// right child, appends both after its own contribution and forwards the
/// result to its parent. A subtree travels as two frames on the gather tag:
/// the per-rank counts (`u64`, in gather order) then the elements. The root
/// returns the full buffer in [`gather_order`] (self first, then left
/// subtree, then right subtree); every other rank returns `None`.
/// `O(log N)` rounds.
pub async fn tree_gather<T: Element, C: Channel + ?Sized>(
    channel: &C,
    plan: GatherPlan<T>,
) -> Result<Option<Gathered<T>>> {
    let GatherPlan {
        ctx,
        root,
        tag,
        local,
    } = plan;
    let rank = ctx.rank();
    let size = ctx.size();
    let links = tree_links(rank, root, size);

    tracing::debug!(rank, root, count = local.len(), "gather start");

    let mut counts = vec![local.len() as u64];
    let mut acc = local;
    for child in links.children() {
        let sub_counts: Vec<u64> =
            decode_frame(&collective_recv(channel, child, tag, "gather").await?)?;
        let part: Payload<T> = recv_payload(channel, child, tag, "gather").await?;
        let declared = sub_counts
            .iter()
            .try_fold(0u64, |sum, &c| sum.checked_add(c))
            .and_then(|sum| usize::try_from(sum).ok())
            .ok_or_else(|| {
                MeshError::DecodeFailed(format!("rank {child} sent overflowing counts"))
            })?;
        if declared != part.len() {
            return Err(MeshError::BufferSizeMismatch {
                expected: declared,
                actual: part.len(),
            });
        }
        tracing::trace!(rank, peer = child, count = part.len(), "gather recv");
        counts.extend(sub_counts);
        acc.extend_from(part);
    }

    match links.parent {
        Some(parent) => {
            collective_send(channel, parent, tag, encode_frame(&counts)?, "gather").await?;
            send_payload(channel, parent, tag, &acc, "gather").await?;
            tracing::trace!(rank, peer = parent, count = acc.len(), "gather forward");
            Ok(None)
        }
        None => {
            let contributors = gather_order(root, size);
            if counts.len() != contributors.len() {
                return Err(MeshError::DecodeFailed(format!(
                    "gather counts cover {} ranks, expected {}",
                    counts.len(),
                    contributors.len()
                )));
            }
            let counts = counts
                .into_iter()
                .map(usize::try_from)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| MeshError::DecodeFailed(e.to_string()))?;
            tracing::debug!(rank, count = acc.len(), "gather complete");
            Ok(Some(Gathered {
                payload: acc,
                contributors,
                counts,
            }))
        }
    }
}

/// Sort each contribution locally, gather, and merge the runs at the root.
///
/// The root returns every gathered element in ascending
/// [`Element::total_cmp`] order; every other rank returns `None`. Runs are
/// split by the gathered per-rank counts, so contributions may differ in
/// length.
pub async fn sorted_gather<T: Element, C: Channel + ?Sized>(
    channel: &C,
    mut plan: GatherPlan<T>,
) -> Result<Option<Payload<T>>> {
    sort_local(plan.local.as_mut_slice());
    let Some(gathered) = tree_gather(channel, plan).await? else {
        return Ok(None);
    };
    let runs = split_runs_by_counts(gathered.payload.as_slice(), &gathered.counts)?;
    Ok(Some(Payload::new(merge_runs(&runs))))
}
