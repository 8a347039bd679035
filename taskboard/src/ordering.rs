//! Ordering key allocation for board columns.
//!
//! Keys are real numbers; a task dropped between two neighbours gets a key
//! strictly between theirs so nothing else has to move. When floats run
//! out of room between two neighbours the column is rebalanced onto evenly
//! spaced integer keys instead of producing ties.

use taskboard_proto::task::{Task, TaskId};

/// Key given to the first task of an empty column.
pub const BASELINE: f64 = 1.0;

/// Distance between keys allocated past either end of a column.
pub const STEP: f64 = 1.0;

/// Why a key could not be allocated.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq)]
pub enum AllocError {
    /// The gap between the bounds cannot hold the requested keys.
    #[error("no room for {count} key(s) between {lower:?} and {upper:?}")]
    Exhausted {
        /// Lower bound, if any.
        lower: Option<f64>,
        /// Upper bound, if any.
        upper: Option<f64>,
        /// Number of keys requested.
        count: usize,
    },
    /// The lower bound is not below the upper bound.
    #[error("bounds out of order: {lower} >= {upper}")]
    Unordered {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },
}

/// Allocates one key strictly between `lower` and `upper`.
///
/// A missing bound means the key goes at that end of the column; with no
/// bounds at all the key is [`BASELINE`].
///
/// # Errors
///
/// Returns [`AllocError::Exhausted`] when no representable key lies strictly
/// between the bounds, or [`AllocError::Unordered`] when `lower >= upper`.
pub fn allocate_between(lower: Option<f64>, upper: Option<f64>) -> Result<f64, AllocError> {
    allocate_run(lower, upper, 1)?
        .pop()
        .ok_or(AllocError::Exhausted {
            lower,
            upper,
            count: 1,
        })
}

/// Allocates a key for a task inserted at `index` into a column whose
/// current keys are `keys` (in display order, without the inserted task).
///
/// An index past the end inserts at the tail.
///
/// # Errors
///
/// See [`allocate_between`].
pub fn allocate_at(keys: &[f64], index: usize) -> Result<f64, AllocError> {
    let index = index.min(keys.len());
    let lower = index.checked_sub(1).map(|i| keys[i]);
    let upper = keys.get(index).copied();
    allocate_between(lower, upper)
}

/// Allocates `count` strictly increasing keys inside one gap.
///
/// Keys are spread evenly inside a bounded gap and spaced by [`STEP`] past
/// an open end.
///
/// # Errors
///
/// Returns [`AllocError::Exhausted`] if the keys would not be strictly
/// increasing and finite inside the bounds, or [`AllocError::Unordered`]
/// when `lower >= upper`.
#[allow(clippy::cast_precision_loss)]
pub fn allocate_run(
    lower: Option<f64>,
    upper: Option<f64>,
    count: usize,
) -> Result<Vec<f64>, AllocError> {
    let exhausted = AllocError::Exhausted {
        lower,
        upper,
        count,
    };
    if lower.is_some_and(|k| !k.is_finite()) || upper.is_some_and(|k| !k.is_finite()) {
        return Err(exhausted);
    }

    let keys: Vec<f64> = match (lower, upper) {
        (Some(lower), Some(upper)) => {
            if lower >= upper {
                return Err(AllocError::Unordered { lower, upper });
            }
            let width = (upper - lower) / (count as f64 + 1.0);
            (1..=count).map(|i| lower + width * i as f64).collect()
        }
        (Some(lower), None) => (1..=count).map(|i| lower + STEP * i as f64).collect(),
        (None, Some(upper)) => (0..count)
            .map(|i| upper - STEP * (count - i) as f64)
            .collect(),
        (None, None) => (0..count).map(|i| BASELINE + STEP * i as f64).collect(),
    };

    let mut previous = lower;
    for &key in &keys {
        if !key.is_finite() || previous.is_some_and(|p| key <= p) {
            return Err(exhausted);
        }
        previous = Some(key);
    }
    if let (Some(last), Some(upper)) = (previous, upper)
        && last >= upper
    {
        return Err(exhausted);
    }
    Ok(keys)
}

/// Integer-spaced keys for a whole column of `count` tasks.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rebalance(count: usize) -> Vec<f64> {
    (0..count).map(|i| BASELINE + STEP * i as f64).collect()
}

/// Result of [`assign_column_keys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAssignment {
    /// Every key already matched the display order.
    Unchanged,
    /// Some keys were replaced; the rest were kept.
    Assigned {
        /// Number of tasks whose key changed.
        changed: usize,
    },
    /// A gap was exhausted and the whole column was renumbered.
    Rebalanced,
}

/// Rewrites the keys of one column so that sorting by `(order_in_list, id)`
/// reproduces the slice order, changing as few keys as possible.
///
/// Keys on the longest strictly increasing run are kept. The `floating`
/// task is never used as an anchor, but keeps its key if it still fits
/// between its kept neighbours. A trailing run of unkeyed tasks that is
/// already in id order stays unkeyed, the floating task included. If a gap cannot hold the keys it
/// needs, the column is rebalanced.
pub fn assign_column_keys(tasks: &mut [Task], floating: Option<TaskId>) -> KeyAssignment {
    let before: Vec<Option<f64>> = tasks.iter().map(|t| t.order_in_list).collect();
    let keyed_len = keyed_prefix_len(tasks);

    let candidates: Vec<(usize, f64)> = tasks[..keyed_len]
        .iter()
        .enumerate()
        .filter(|(_, t)| Some(t.id) != floating)
        .filter_map(|(i, t)| t.order_in_list.filter(|k| k.is_finite()).map(|k| (i, k)))
        .collect();
    let mut kept = vec![false; keyed_len];
    for i in longest_increasing(&candidates) {
        kept[i] = true;
    }
    if let Some(index) = floating.and_then(|id| tasks[..keyed_len].iter().position(|t| t.id == id))
    {
        let fits = floating_fits(&tasks[..keyed_len], &kept, index);
        kept[index] = fits;
    }

    if fill_gaps(&mut tasks[..keyed_len], &kept).is_err() {
        for (task, key) in tasks.iter_mut().zip(rebalance(before.len())) {
            task.order_in_list = Some(key);
        }
        tracing::debug!(tasks = before.len(), "column keys exhausted, rebalanced");
        return KeyAssignment::Rebalanced;
    }

    let changed = tasks
        .iter()
        .zip(&before)
        .filter(|(task, old)| task.order_in_list != **old)
        .count();
    if changed == 0 {
        KeyAssignment::Unchanged
    } else {
        KeyAssignment::Assigned { changed }
    }
}

/// Length of the column prefix that needs keys. The remainder is a run of
/// unkeyed tasks already in id order, which sorts correctly without keys.
fn keyed_prefix_len(tasks: &[Task]) -> usize {
    let mut len = tasks.len();
    while len > 0 {
        let task = &tasks[len - 1];
        let in_id_order = tasks.get(len).is_none_or(|next| task.id < next.id);
        if task.order_in_list.is_some() || !in_id_order {
            break;
        }
        len -= 1;
    }
    len
}

/// Whether the task at `index` can keep its current key given the kept
/// keys around it.
fn floating_fits(tasks: &[Task], kept: &[bool], index: usize) -> bool {
    let Some(key) = tasks[index].order_in_list.filter(|k| k.is_finite()) else {
        return false;
    };
    let lower = (0..index).rev().find(|&i| kept[i]).and_then(|i| tasks[i].order_in_list);
    let upper = (index + 1..tasks.len())
        .find(|&i| kept[i])
        .and_then(|i| tasks[i].order_in_list);
    lower.is_none_or(|l| l < key) && upper.is_none_or(|u| key < u)
}

/// Gives every task not marked `kept` a key between its kept neighbours.
fn fill_gaps(tasks: &mut [Task], kept: &[bool]) -> Result<(), AllocError> {
    let mut lower = None;
    let mut start = 0;
    while start < tasks.len() {
        if kept[start] {
            lower = tasks[start].order_in_list;
            start += 1;
            continue;
        }
        let end = (start..tasks.len()).find(|&i| kept[i]).unwrap_or(tasks.len());
        let upper = tasks.get(end).and_then(|t| t.order_in_list);
        let keys = allocate_run(lower, upper, end - start)?;
        for (task, key) in tasks[start..end].iter_mut().zip(keys) {
            task.order_in_list = Some(key);
        }
        lower = upper;
        start = end;
    }
    Ok(())
}

/// Indices (first tuple field) of a longest strictly increasing subsequence
/// of the keys, in O(n log n).
fn longest_increasing(keys: &[(usize, f64)]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; keys.len()];
    for (i, &(_, key)) in keys.iter().enumerate() {
        let slot = tails.partition_point(|&t| keys[t].1 < key);
        if slot > 0 {
            previous[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(keys[i].0);
        cursor = previous[i];
    }
    run.reverse();
    run
}
