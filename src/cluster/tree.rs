//! Implicit binary tree over ranks `0..N-1`.
//!
//! Nothing is stored or transmitted: every rank derives its parent and
//! children from `(rank, root, size)` on each call. Ranks are remapped so the
//! root becomes tree index 0, then the usual heap layout applies
//! (`2t+1`, `2t+2`, `(t-1)/2`).

use crate::types::Rank;

/// A rank's position in the implicit tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLinks {
    pub parent: Option<Rank>,
    pub left: Option<Rank>,
    pub right: Option<Rank>,
}

impl TreeLinks {
    /// Children in receive order: left, then right.
    pub fn children(&self) -> impl Iterator<Item = Rank> {
        self.left.into_iter().chain(self.right)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Parent and children of `rank` in the tree rooted at `root` over `size` ranks.
///
/// Callers guarantee `rank < size` and `root < size`.
pub fn tree_links(rank: Rank, root: Rank, size: u32) -> TreeLinks {
    debug_assert!(rank < size && root < size);
    let n = size as u64;
    let root64 = root as u64;
    let t = (rank as u64 + n - root64) % n;
    let physical = |idx: u64| -> Rank { ((root64 + idx) % n) as Rank };

    let left = 2 * t + 1;
    let right = 2 * t + 2;

    TreeLinks {
        parent: (t != 0).then(|| physical((t - 1) / 2)),
        left: (left < n).then(|| physical(left)),
        right: (right < n).then(|| physical(right)),
    }
}

/// Order in which ranks' contributions appear in a self-first gather:
/// a pre-order walk (own, left subtree, right subtree) from the root.
pub fn gather_order(root: Rank, size: u32) -> Vec<Rank> {
    let mut order = Vec::with_capacity(size as usize);
    let mut stack = vec![root];
    while let Some(rank) = stack.pop() {
        order.push(rank);
        let links = tree_links(rank, root, size);
        // Right pushed first so the left subtree is walked first.
        stack.extend(links.right);
        stack.extend(links.left);
    }
    order
}

/// Number of levels below the root: `floor(log2(size))`, 0 for one rank.
pub fn tree_depth(size: u32) -> u32 {
    if size <= 1 {
        0
    } else {
        u32::BITS - 1 - size.leading_zeros()
    }
}
