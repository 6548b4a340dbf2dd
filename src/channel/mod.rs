//! Point-to-point channels the collectives are built on.
//!
//! A [`Channel`] moves opaque frames between ranks with FIFO order per
//! (source, destination, tag). `recv` waits for as long as it takes: a sender
//! that never shows up is a permanent hang, not an error. Wrap a channel in
//! [`Watchdog`] to turn such hangs into diagnostics.

mod counting;
mod local;
mod mailbox;
mod tcp;
mod watchdog;

pub use counting::CountingChannel;
pub use local::LocalEndpoint;
pub use tcp::TcpEndpoint;
pub use watchdog::Watchdog;

use crate::error::Result;
use crate::types::{Rank, Tag};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Blocking point-to-point transport between ranks of one group.
pub trait Channel: Send + Sync {
    /// Send a frame to `dest`. Ownership of `data` passes to the channel.
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>>;

    /// Receive the next frame sent by `src` with `tag`.
    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>>;
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        (**self).send(dest, tag, data)
    }

    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>> {
        (**self).recv(src, tag)
    }
}

impl<C: Channel + ?Sized> Channel for &C {
    fn send<'a>(&'a self, dest: Rank, tag: Tag, data: Vec<u8>) -> BoxFuture<'a, Result<()>> {
        (**self).send(dest, tag, data)
    }

    fn recv<'a>(&'a self, src: Rank, tag: Tag) -> BoxFuture<'a, Result<Vec<u8>>> {
        (**self).recv(src, tag)
    }
}
