use crate::channel::Channel;
use crate::channel::mailbox::Mailbox;
use crate::error::{MeshError, Result};
use crate::types::{ProcessContext, Rank, Tag};
use futures::future::BoxFuture;
use std::sync::Arc;

/// One rank's end of an in-process channel group.
///
/// All endpoints of a group share the mailboxes, so a send is a queue push
/// into the destination's inbox. Used to run every rank of a collective as a
/// tokio task inside one process.
pub struct LocalEndpoint {
    ctx: ProcessContext,
    inboxes: Arc<Vec<Mailbox>>,
}

impl LocalEndpoint {
    /// Build a fully connected group of `world_size` endpoints, indexed by rank.
    pub fn group(world_size: u32) -> Result<Vec<LocalEndpoint>> {
        if world_size == 0 {
            return Err(MeshError::transport("channel group needs at least one rank"));
        }
        let inboxes: Arc<Vec<Mailbox>> =
            Arc::new((0..world_size).map(|_| Mailbox::new()).collect());
        (0..world_size)
            .map(|rank| {
                Ok(LocalEndpoint {
                    ctx: ProcessContext::new(rank, world_size)?,
                    inboxes: Arc::clone(&inboxes),
                })
            })
            .collect()
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

    fn inbox(&self, rank: Rank) -> Result<&Mailbox> {
        self.inboxes
            .get(rank as usize)
            .ok_or(MeshError::UnknownPeer { rank })
    }
}

impl Channel for LocalEndpoint {
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let inbox = self.inbox(dest)?;
            tracing::trace!(src = self.rank(), dest, tag, bytes = data.len(), "local send");
            inbox.deliver(self.rank(), tag, data).await;
            Ok(())
        })
    }

    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            if src >= self.world_size() {
                return Err(MeshError::UnknownPeer { rank: src });
            }
            let data = self.inbox(self.rank())?.take(src, tag).await?;
            tracing::trace!(dest = self.rank(), src, tag, bytes = data.len(), "local recv");
            Ok(data)
        })
    }
}
