//! Tree collectives built only from point-to-point channel messages.

mod broadcast;
mod gather;
pub(crate) mod helpers;
mod merge;

pub use broadcast::{BroadcastPlan, BroadcastRequest, broadcast};
pub use gather::{GatherPlan, GatherRequest, Gathered, sorted_gather, tree_gather};
pub use merge::{
    MergeCursor, SortedRun, k_way_merge, merge_runs, merge_runs_heap, sort_local, split_runs,
    split_runs_by_counts,
};
