use crate::error::{MeshError, Result};
use crate::types::{Rank, Tag};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Per-rank inbox: one FIFO queue per (source, tag).
///
/// Frames that arrive before anyone asks for them are queued; a receiver
/// that asks first waits on the same queue. Queues are created on first use
/// from either side and removed once drained with no receiver waiting, so
/// per-call tags do not accumulate. A receive for a sender that never sends
/// waits indefinitely unless the source is closed with [`Mailbox::close_source`].
#[derive(Default)]
pub(crate) struct Mailbox {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<(Rank, Tag), Slot>,
    closed: HashSet<Rank>,
}

struct Slot {
    /// `None` once the source is closed; buffered frames stay readable.
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl Slot {
    fn new(open: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: open.then_some(tx),
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

impl Inner {
    fn slot(&mut self, src: Rank, tag: Tag) -> &mut Slot {
        let open = !self.closed.contains(&src);
        self.slots
            .entry((src, tag))
            .or_insert_with(|| Slot::new(open))
    }
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame from `src`. Frames from a closed source are dropped.
    pub async fn deliver(&self, src: Rank, tag: Tag, data: Vec<u8>) {
        let mut inner = self.inner.lock().await;
        if inner.closed.contains(&src) {
            tracing::debug!(src, tag, "frame from closed source dropped");
            return;
        }
        // Send under the lock: `take` removes idle slots while holding it.
        if let Some(tx) = &inner.slot(src, tag).tx {
            let _ = tx.send(data);
        }
    }

    /// Take the next frame from `src`, waiting until one arrives.
    ///
    /// Fails with `PeerDisconnected` once `src` is closed and its queue is
    /// empty.
    pub async fn take(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        let rx = {
            let mut inner = self.inner.lock().await;
            Arc::clone(&inner.slot(src, tag).rx)
        };
        let frame = rx.lock().await.recv().await;

        let mut inner = self.inner.lock().await;
        if let Some(slot) = inner.slots.get(&(src, tag)) {
            // Only the map and this call hold the receiver: nobody else waits.
            let idle = Arc::ptr_eq(&slot.rx, &rx)
                && Arc::strong_count(&rx) == 2
                && rx.try_lock().is_ok_and(|q| q.is_empty());
            if idle {
                inner.slots.remove(&(src, tag));
            }
        }
        drop(inner);

        frame.ok_or(MeshError::PeerDisconnected { rank: src })
    }

    /// Mark `src` as gone: waiting and future receives from it drain what is
    /// queued, then fail with `PeerDisconnected`.
    pub async fn close_source(&self, src: Rank) {
        let mut inner = self.inner.lock().await;
        inner.closed.insert(src);
        for ((from, _), slot) in inner.slots.iter_mut() {
            if *from == src {
                slot.tx = None;
            }
        }
    }

    #[cfg(test)]
    pub async fn slot_count(&self) -> usize {
        self.inner.lock().await.slots.len()
    }
}
