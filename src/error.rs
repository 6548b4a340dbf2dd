use crate::cluster::TopologyKind;
use crate::types::{Rank, Tag};

pub type Result<T> = std::result::Result<T, MeshError>;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("invalid {kind} topology of size {size}: {reason}")]
    InvalidTopology {
        kind: TopologyKind,
        size: u32,
        reason: &'static str,
    },

    #[error("invalid endpoint {rank}: world size is {world_size}")]
    InvalidEndpoint { rank: i64, world_size: u32 },

    #[error("invalid root {root}: world size is {world_size}")]
    InvalidRoot { root: i64, world_size: u32 },

    #[error("{operation} requires a non-empty local buffer")]
    EmptyBuffer { operation: &'static str },

    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("element count {count} too large for {operation}")]
    CountOverflow {
        count: usize,
        operation: &'static str,
    },

    #[error("buffer of {len} elements does not split into runs of {run_len}")]
    RaggedRuns { len: usize, run_len: usize },

    #[error("rank {rank} starts the transfer but holds no payload")]
    MissingPayload { rank: Rank },

    #[error("frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("rank {rank} not reachable from this endpoint")]
    UnknownPeer { rank: Rank },

    #[error("recv from rank {peer} (tag {tag}) stalled for {waited_ms}ms")]
    Stalled { peer: Rank, tag: Tag, waited_ms: u64 },

    #[error("{operation} failed at rank {rank}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        rank: Rank,
        reason: String,
    },

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for errors raised by local validation, before any channel I/O.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTopology { .. }
                | Self::InvalidEndpoint { .. }
                | Self::InvalidRoot { .. }
                | Self::EmptyBuffer { .. }
                | Self::BufferSizeMismatch { .. }
                | Self::CountOverflow { .. }
                | Self::RaggedRuns { .. }
        )
    }
}
