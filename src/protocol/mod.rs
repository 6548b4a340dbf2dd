//! Wire framing shared by every collective and channel.
//!
//! A collective message is a *frame*: an element count followed by that many
//! little-endian elements, nothing else. Channels that cross a byte stream
//! additionally wrap each frame in a [`WireHeader`].

pub(crate) mod codec;
pub(crate) mod header;

pub use codec::{decode_frame, decode_ranks, encode_frame, encode_ranks, frame_len};
pub use header::{LEN_HEADER_SIZE, WIRE_HEADER_SIZE, WireHeader};

use crate::types::Tag;

/// Default tag for point-to-point relays.
pub const ROUTE_TAG: Tag = 0x10;
/// Default tag for tree gather.
pub const GATHER_TAG: Tag = 0x20;
/// Default tag for broadcast.
pub const BROADCAST_TAG: Tag = 0x30;
