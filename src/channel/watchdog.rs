use crate::channel::Channel;
use crate::error::{MeshError, Result};
use crate::types::{Rank, Tag};
use futures::future::BoxFuture;
use std::time::Duration;

/// Diagnostic hang detection for harnesses.
///
/// Collectives never time out on their own; a receive whose sender never
/// arrives waits forever. Wrapping the channel in a `Watchdog` turns a receive
/// that waits longer than `limit` into [`MeshError::Stalled`] so a test run
/// fails instead of hanging. Sends pass through untouched.
pub struct Watchdog<C> {
    inner: C,
    limit: Duration,
}

impl<C: Channel> Watchdog<C> {
    pub fn new(inner: C, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Channel> Channel for Watchdog<C> {
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        self.inner.send(dest, tag, data)
    }

    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            match tokio::time::timeout(self.limit, self.inner.recv(src, tag)).await {
                Ok(res) => res,
                Err(_) => {
                    let waited_ms = self.limit.as_millis() as u64;
                    tracing::warn!(peer = src, tag, waited_ms, "recv stalled");
                    Err(MeshError::Stalled {
                        peer: src,
                        tag,
                        waited_ms,
                    })
                }
            }
        })
    }
}
