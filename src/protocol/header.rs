use crate::types::{Rank, Tag};

/// Size of the element-count header that opens every frame.
pub const LEN_HEADER_SIZE: usize = 8;

/// Size of the stream header used by byte-stream channels.
pub const WIRE_HEADER_SIZE: usize = 20;

/// 20-byte header prepended to every frame on a byte stream.
///
/// ```text
/// [0..4]   src:  u32 LE
/// [4..12]  tag:  u64 LE
/// [12..20] len:  u64 LE (bytes of frame that follow)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub src: Rank,
    pub tag: Tag,
    pub len: u64,
}

impl WireHeader {
    pub fn encode(&self) -> [u8; WIRE_HEADER_SIZE] {
        let mut buf = [0u8; WIRE_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.src.to_le_bytes());
        buf[4..12].copy_from_slice(&self.tag.to_le_bytes());
        buf[12..20].copy_from_slice(&self.len.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; WIRE_HEADER_SIZE]) -> Self {
        let mut src = [0u8; 4];
        let mut tag = [0u8; 8];
        let mut len = [0u8; 8];
        src.copy_from_slice(&buf[0..4]);
        tag.copy_from_slice(&buf[4..12]);
        len.copy_from_slice(&buf[12..20]);
        Self {
            src: u32::from_le_bytes(src),
            tag: u64::from_le_bytes(tag),
            len: u64::from_le_bytes(len),
        }
    }
}
