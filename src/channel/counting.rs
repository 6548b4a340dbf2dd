use crate::channel::Channel;
use crate::error::Result;
use crate::types::{Rank, Tag};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Channel wrapper that counts calls made through it.
///
/// Mostly a test double: validation failures must leave both counters at zero.
pub struct CountingChannel<C> {
    inner: C,
    sends: AtomicUsize,
    recvs: AtomicUsize,
}

impl<C: Channel> CountingChannel<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            sends: AtomicUsize::new(0),
            recvs: AtomicUsize::new(0),
        }
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::Relaxed)
    }

    pub fn recvs(&self) -> usize {
        self.recvs.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.sends() + self.recvs()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Channel> Channel for CountingChannel<C> {
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        self.sends.fetch_add(1, Ordering::Relaxed);
        self.inner.send(dest, tag, data)
    }

    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.recvs.fetch_add(1, Ordering::Relaxed);
        self.inner.recv(src, tag)
    }
}
