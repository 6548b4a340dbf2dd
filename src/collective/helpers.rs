use crate::channel::Channel;
use crate::error::{MeshError, Result};
use crate::memory::Payload;
use crate::types::{Element, Rank, Tag};

/// Wrap a channel failure as `CollectiveFailed`, keeping the error kinds a
/// caller needs to match on intact.
fn wrap(err: MeshError, operation: &'static str, peer: Rank) -> MeshError {
    match err {
        e @ (MeshError::Stalled { .. }
        | MeshError::DecodeFailed(_)
        | MeshError::CollectiveFailed { .. }) => e,
        e => MeshError::CollectiveFailed {
            operation,
            rank: peer,
            reason: e.to_string(),
        },
    }
}

/// Send raw bytes to a peer, wrapping errors as `CollectiveFailed`.
///
/// There is no timeout: a collective either completes or waits on its peer.
pub(crate) async fn collective_send<C: Channel + ?Sized>(
    channel: &C,
    dest: Rank,
    tag: Tag,
    data: Vec<u8>,
    operation: &'static str,
) -> Result<()> {
    channel
        .send(dest, tag, data)
        .await
        .map_err(|e| wrap(e, operation, dest))
}

/// Receive raw bytes from a peer, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_recv<C: Channel + ?Sized>(
    channel: &C,
    src: Rank,
    tag: Tag,
    operation: &'static str,
) -> Result<Vec<u8>> {
    channel
        .recv(src, tag)
        .await
        .map_err(|e| wrap(e, operation, src))
}

/// Send a payload as one length-prefixed frame.
pub(crate) async fn send_payload<T: Element, C: Channel + ?Sized>(
    channel: &C,
    dest: Rank,
    tag: Tag,
    payload: &Payload<T>,
    operation: &'static str,
) -> Result<()> {
    let frame = payload.to_frame()?;
    collective_send(channel, dest, tag, frame, operation).await
}

/// Receive one frame and decode it as a payload.
pub(crate) async fn recv_payload<T: Element, C: Channel + ?Sized>(
    channel: &C,
    src: Rank,
    tag: Tag,
    operation: &'static str,
) -> Result<Payload<T>> {
    let frame = collective_recv(channel, src, tag, operation).await?;
    Payload::from_frame(&frame)
}
