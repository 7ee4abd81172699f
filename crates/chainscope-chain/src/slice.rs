//! Slice semantics over the height range.
//!
//! Bounds behave like conventional sequence slicing: optional signed
//! endpoints, negative values wrapping once from the end, out-of-range
//! values clipping to the valid range, and a non-zero signed step. A
//! negative step walks the range in reverse. A zero step is rejected with
//! [`ChainError::InvalidSlice`].

use crate::error::{ChainError, ChainResult};

/// Lazily yields the heights selected by a slice, in traversal order.
#[derive(Clone, Debug)]
pub(crate) struct SliceIndices {
    next: i64,
    stop: i64,
    step: i64,
}

impl Iterator for SliceIndices {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let in_range = if self.step > 0 {
            self.next < self.stop
        } else {
            self.next > self.stop
        };
        if !in_range {
            return None;
        }
        let height = self.next as u64;
        self.next += self.step;
        Some(height)
    }
}

/// Clip one explicit endpoint into the valid range for the step direction.
fn adjust(value: i64, len: i64, step: i64) -> i64 {
    let mut value = value;
    if value < 0 {
        value += len;
        if value < 0 {
            value = if step < 0 { -1 } else { 0 };
        }
    } else if value >= len {
        value = if step < 0 { len - 1 } else { len };
    }
    value
}

/// Resolve slice endpoints against a sequence of `len` heights.
pub(crate) fn slice_indices(
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
    len: u64,
) -> ChainResult<SliceIndices> {
    if step == 0 {
        return Err(ChainError::InvalidSlice);
    }
    let len = len as i64;
    let next = match start {
        Some(value) => adjust(value, len, step),
        None if step > 0 => 0,
        None => len - 1,
    };
    let stop = match stop {
        Some(value) => adjust(value, len, step),
        None if step > 0 => len,
        // Default lower bound for reverse traversal: one before height 0.
        None => -1,
    };
    Ok(SliceIndices { next, stop, step })
}
