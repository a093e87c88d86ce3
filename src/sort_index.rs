//! Fractional sort keys for lists, cards and checklist items.
//!
//! A new sibling gets a key strictly between its neighbours, so inserting or
//! moving one item never rewrites the others. Keys are `f64` midpoints. Each
//! insertion at the same gap halves it, and after enough halvings the midpoint
//! rounds onto a bound. Between `0.0` and `1.0` that happens after 53
//! insertions hugging the upper key. With keys near 1000 it happens after 43,
//! because precision is relative to magnitude. `between` reports that case as
//! [`SortIndexError::Exhausted`] instead of returning a colliding key. The
//! board then renumbers the siblings with [`spread`] and tries again. The same
//! happens at the ends of a list once a key reaches 2^53, where adding one
//! unit no longer moves it.

use crate::errors::SortIndexError;
use tracing::{debug, warn};

/// Gap used when appending, prepending and renumbering.
pub const STEP: f64 = 1.0;

/// Insertions at one point of a unit gap in `[0, 1]` before exhaustion.
pub const PRECISION_LIMIT: usize = 53;

/// Key for an item placed between `left` and `right`.
///
/// `None` on the left means the start of the list and `None` on the right
/// means the end.
pub fn between(left: Option<f64>, right: Option<f64>) -> Result<f64, SortIndexError> {
    for key in [left, right].into_iter().flatten() {
        if !key.is_finite() {
            return Err(SortIndexError::NotFinite(key));
        }
    }

    match (left, right) {
        (None, None) => Ok(0.0),
        (Some(left), None) => {
            let key = left + STEP;
            if key > left {
                Ok(key)
            } else {
                Err(SortIndexError::Exhausted {
                    left,
                    right: f64::INFINITY,
                })
            }
        }
        (None, Some(right)) => {
            let key = right - STEP;
            if key < right {
                Ok(key)
            } else {
                Err(SortIndexError::Exhausted {
                    left: f64::NEG_INFINITY,
                    right,
                })
            }
        }
        (Some(left), Some(right)) => {
            if left >= right {
                return Err(SortIndexError::Unordered { left, right });
            }
            let gap = right - left;
            // The gap overflows for keys of opposite sign near f64::MAX.
            let mid = if gap.is_finite() {
                left + gap / 2.0
            } else {
                left / 2.0 + right / 2.0
            };
            if left < mid && mid < right {
                Ok(mid)
            } else {
                Err(SortIndexError::Exhausted { left, right })
            }
        }
    }
}

/// Evenly spaced keys for `count` siblings, in order.
pub fn spread(count: usize) -> Vec<f64> {
    (0..count).map(|i| i as f64 * STEP).collect()
}

/// Key for inserting at `index` into siblings whose keys are `sorted`
/// (ascending). An `index` past the end appends.
pub fn at_index(sorted: &[f64], index: usize) -> Result<f64, SortIndexError> {
    let index = index.min(sorted.len());
    let left = index.checked_sub(1).map(|i| sorted[i]);
    let right = sorted.get(index).copied();
    between(left, right)
}

/// Anything ordered by a fractional key.
pub trait SortKey {
    fn sort_key(&self) -> f64;
    fn set_sort_key(&mut self, key: f64);
}

/// Renumbers `siblings` with [`spread`] when a key is non-finite or shared
/// with a neighbour. Leaves `siblings` sorted by key either way and returns
/// whether anything was rewritten.
pub fn repair<T: SortKey>(siblings: &mut [&mut T]) -> bool {
    siblings.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    let clean = siblings.iter().all(|s| s.sort_key().is_finite())
        && siblings
            .windows(2)
            .all(|w| w[0].sort_key() < w[1].sort_key());
    if clean {
        return false;
    }
    renumber(siblings);
    true
}

fn renumber<T: SortKey>(siblings: &mut [&mut T]) {
    let count = siblings.len();
    warn!(count, "renumbering siblings");
    for (sibling, key) in siblings.iter_mut().zip(spread(count)) {
        sibling.set_sort_key(key);
    }
}

/// Key for inserting a new item at `index` among `siblings`.
///
/// The siblings are sorted in place by key. When their keys have run out of
/// room at the insertion point, every sibling is renumbered with [`spread`]
/// and the key is taken from the fresh gaps.
pub fn allocate<T: SortKey>(
    siblings: &mut [&mut T],
    index: usize,
) -> Result<f64, SortIndexError> {
    repair(siblings);
    let keys: Vec<f64> = siblings.iter().map(|s| s.sort_key()).collect();
    match at_index(&keys, index) {
        Err(SortIndexError::Exhausted { left, right }) => {
            debug!(left, right, "sort keys exhausted");
        }
        other => return other,
    }
    renumber(siblings);
    at_index(&spread(siblings.len()), index)
}
