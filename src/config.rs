//! Runtime-configurable tuning parameters for meshcoll.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `MESHCOLL_`) or by constructing a custom `MeshConfig`.

use std::time::Duration;

/// How a broadcast fans out from its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastStrategy {
    /// Root sends the full buffer to every other rank in turn.
    Flat,
    /// Binary tree over the implicit gather tree; `O(log N)` depth.
    Tree,
    /// Relay along the ring `root -> root+1 -> ... -> root-1`.
    Chain,
    /// Flat below `tree_broadcast_threshold` ranks, tree otherwise.
    #[default]
    Auto,
}

impl BroadcastStrategy {
    /// Parse `flat`, `tree`, `chain` or `auto` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "flat" | "direct" => Some(Self::Flat),
            "tree" | "binary" => Some(Self::Tree),
            "chain" | "ring" => Some(Self::Chain),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    /// Resolve `Auto` for a concrete world size.
    pub fn resolve(self, world_size: u32, tree_threshold: u32) -> Self {
        match self {
            Self::Auto if world_size < tree_threshold => Self::Flat,
            Self::Auto => Self::Tree,
            other => other,
        }
    }
}

/// Tuning parameters for collectives.
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Fan-out used by broadcast.
    pub broadcast: BroadcastStrategy,

    /// World size at which `Auto` broadcast switches from flat to tree.
    pub tree_broadcast_threshold: u32,

    /// When set, communicators built by this crate wrap their channel in a
    /// [`Watchdog`](crate::channel::Watchdog) with this limit. Diagnostic only;
    /// the collectives themselves never time out.
    pub hang_timeout: Option<Duration>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            broadcast: BroadcastStrategy::Auto,
            tree_broadcast_threshold: 4,
            hang_timeout: None,
        }
    }
}

impl MeshConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `MESHCOLL_BROADCAST` (`flat`, `tree`, `chain`, `auto`)
    /// - `MESHCOLL_TREE_BROADCAST_THRESHOLD`
    /// - `MESHCOLL_HANG_TIMEOUT_MS` (`0` disables)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("MESHCOLL_BROADCAST") {
            if let Some(s) = BroadcastStrategy::parse(&v) {
                cfg.broadcast = s;
            }
        }
        if let Some(v) = lookup("MESHCOLL_TREE_BROADCAST_THRESHOLD") {
            if let Ok(n) = v.parse::<u32>() {
                cfg.tree_broadcast_threshold = n;
            }
        }
        if let Some(v) = lookup("MESHCOLL_HANG_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.hang_timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
        }

        cfg
    }
}
