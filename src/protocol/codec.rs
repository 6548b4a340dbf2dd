use crate::error::{MeshError, Result};
use crate::protocol::header::LEN_HEADER_SIZE;
use crate::types::{Element, Rank};

/// Total encoded size of a frame holding `count` elements of `T`.
pub fn frame_len<T: Element>(count: usize) -> Option<usize> {
    count.checked_mul(T::WIDTH)?.checked_add(LEN_HEADER_SIZE)
}

/// Encode elements into a frame: `[count: u64 LE][count × T LE]`.
pub fn encode_frame<T: Element>(elems: &[T]) -> Result<Vec<u8>> {
    let total = frame_len::<T>(elems.len()).ok_or(MeshError::CountOverflow {
        count: elems.len(),
        operation: "encode",
    })?;
    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&(elems.len() as u64).to_le_bytes());
    for &e in elems {
        e.write_le(&mut buf);
    }
    Ok(buf)
}

/// Decode a frame produced by [`encode_frame`].
///
/// The buffer must hold exactly one frame: a short body or trailing bytes
/// are both rejected.
pub fn decode_frame<T: Element>(buf: &[u8]) -> Result<Vec<T>> {
    if buf.len() < LEN_HEADER_SIZE {
        return Err(MeshError::DecodeFailed(format!(
            "frame too short: {} < {LEN_HEADER_SIZE}",
            buf.len()
        )));
    }
    let mut header = [0u8; LEN_HEADER_SIZE];
    header.copy_from_slice(&buf[..LEN_HEADER_SIZE]);
    let count = u64::from_le_bytes(header);

    let body_len = usize::try_from(count)
        .ok()
        .and_then(|c| c.checked_mul(T::WIDTH))
        .ok_or_else(|| MeshError::DecodeFailed(format!("element count {count} overflows")))?;

    let body = &buf[LEN_HEADER_SIZE..];
    if body.len() != body_len {
        return Err(MeshError::DecodeFailed(format!(
            "frame declares {count} {} elements ({body_len} bytes) but carries {} bytes",
            T::DTYPE,
            body.len()
        )));
    }

    Ok(body.chunks_exact(T::WIDTH).map(T::read_le).collect())
}

/// Encode a rank list (traversal trail) as a `u32` frame.
pub fn encode_ranks(ranks: &[Rank]) -> Result<Vec<u8>> {
    encode_frame::<u32>(ranks)
}

pub fn decode_ranks(buf: &[u8]) -> Result<Vec<Rank>> {
    decode_frame::<u32>(buf)
}
