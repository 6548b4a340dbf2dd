//! K-way merge of sorted runs.
//!
//! A gathered buffer is treated as contiguous ascending runs, either of one
//! fixed length or of the per-rank counts the gather reported. The merge repeatedly takes the strictly smallest head,
//! breaking ties by the lowest run index, so the output is stable with
//! respect to the order the runs were gathered in.

use crate::error::{MeshError, Result};
use crate::types::Element;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A borrowed run assumed to be ascending under [`Element::total_cmp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortedRun<'a, T: Element> {
    elems: &'a [T],
}

impl<'a, T: Element> SortedRun<'a, T> {
    pub fn new(elems: &'a [T]) -> Self {
        Self { elems }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.elems
    }

    pub fn is_sorted(&self) -> bool {
        self.elems
            .windows(2)
            .all(|w| w[0].total_cmp(&w[1]) != Ordering::Greater)
    }
}

/// Read position within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeCursor {
    pub run: usize,
    pub offset: usize,
}

impl MergeCursor {
    fn head<T: Element>(&self, runs: &[SortedRun<'_, T>]) -> Option<T> {
        runs[self.run].elems.get(self.offset).copied()
    }
}

/// Sort a local buffer ascending under [`Element::total_cmp`].
pub fn sort_local<T: Element>(elems: &mut [T]) {
    elems.sort_by(|a, b| a.total_cmp(b));
}

/// Split `buffer` into contiguous runs of `run_len` elements.
pub fn split_runs<T: Element>(buffer: &[T], run_len: usize) -> Result<Vec<SortedRun<'_, T>>> {
    if run_len == 0 {
        if buffer.is_empty() {
            return Ok(Vec::new());
        }
        return Err(MeshError::RaggedRuns {
            len: buffer.len(),
            run_len,
        });
    }
    if buffer.len() % run_len != 0 {
        return Err(MeshError::RaggedRuns {
            len: buffer.len(),
            run_len,
        });
    }
    Ok(buffer.chunks_exact(run_len).map(SortedRun::new).collect())
}

/// Split `buffer` into contiguous runs of the given lengths, in order.
///
/// The lengths must cover the buffer exactly.
pub fn split_runs_by_counts<'a, T: Element>(
    buffer: &'a [T],
    counts: &[usize],
) -> Result<Vec<SortedRun<'a, T>>> {
    let covered = counts
        .iter()
        .try_fold(0usize, |sum, &c| sum.checked_add(c));
    if covered != Some(buffer.len()) {
        return Err(MeshError::BufferSizeMismatch {
            expected: covered.unwrap_or(usize::MAX),
            actual: buffer.len(),
        });
    }

    let mut rest = buffer;
    let mut runs = Vec::with_capacity(counts.len());
    for &len in counts {
        let (run, tail) = rest.split_at(len);
        runs.push(SortedRun::new(run));
        rest = tail;
    }
    Ok(runs)
}

/// Selection merge: scan every live cursor, take the strictly smallest head.
///
/// `O(total * runs)`. Empty runs never hold a head and are skipped; a
/// single run is copied through.
pub fn merge_runs<T: Element>(runs: &[SortedRun<'_, T>]) -> Vec<T> {
    let total = runs.iter().map(SortedRun::len).sum();
    let mut out = Vec::with_capacity(total);
    let mut cursors: Vec<MergeCursor> = (0..runs.len())
        .map(|run| MergeCursor { run, offset: 0 })
        .collect();

    loop {
        let mut best: Option<(usize, T)> = None;
        for (i, cursor) in cursors.iter().enumerate() {
            let Some(head) = cursor.head(runs) else {
                continue;
            };
            match best {
                Some((_, b)) if head.total_cmp(&b) != Ordering::Less => {}
                _ => best = Some((i, head)),
            }
        }
        let Some((i, value)) = best else {
            break;
        };
        out.push(value);
        cursors[i].offset += 1;
    }

    out
}

struct HeapHead<T: Element> {
    value: T,
    cursor: MergeCursor,
}

impl<T: Element> PartialEq for HeapHead<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Element> Eq for HeapHead<T> {}

impl<T: Element> Ord for HeapHead<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest (value, run) pops first.
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| other.cursor.run.cmp(&self.cursor.run))
    }
}

impl<T: Element> PartialOrd for HeapHead<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Heap merge, `O(total * log runs)`. Same output as [`merge_runs`].
pub fn merge_runs_heap<T: Element>(runs: &[SortedRun<'_, T>]) -> Vec<T> {
    let total = runs.iter().map(SortedRun::len).sum();
    let mut out = Vec::with_capacity(total);
    let mut heap: BinaryHeap<HeapHead<T>> = runs
        .iter()
        .enumerate()
        .filter_map(|(run, r)| {
            r.elems.first().map(|&value| HeapHead {
                value,
                cursor: MergeCursor { run, offset: 0 },
            })
        })
        .collect();

    while let Some(HeapHead { value, mut cursor }) = heap.pop() {
        out.push(value);
        cursor.offset += 1;
        if let Some(next) = cursor.head(runs) {
            heap.push(HeapHead {
                value: next,
                cursor,
            });
        }
    }

    out
}

/// Merge a gathered buffer of equal-length sorted runs into one ascending
/// sequence.
pub fn k_way_merge<T: Element>(buffer: &[T], run_len: usize) -> Result<Vec<T>> {
    let runs = split_runs(buffer, run_len)?;
    Ok(merge_runs(&runs))
}
