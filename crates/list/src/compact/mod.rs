//! Folding of bulk removals into notification-sized pieces.
//!
//! A bulk removal records every removed element by its index in the list as
//! it was *before* the removal. [`compact_removals`] groups those indices into
//! maximal contiguous runs and decides whether reporting them one run at a
//! time is worthwhile, or whether the removal is scattered enough that
//! observers should simply rebuild from a `Reset`.

use std::collections::BTreeMap;

/// Reset threshold used when no [`crate::ListConfig`] overrides it.
pub const DEFAULT_RESET_THRESHOLD: usize = 5;

/// One maximal run of adjacent removed indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedRange<T> {
	/// First removed index, in pre-removal coordinates.
	pub start: usize,
	/// Last removed index, inclusive.
	pub end: usize,
	/// Removed values in ascending index order.
	pub values: Vec<T>,
}

/// Outcome of [`compact_removals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compaction<T> {
	/// Nothing was removed; publish nothing.
	Empty,
	/// Too fragmented; publish a single reset.
	Reset,
	/// Publish one removal per range, in ascending order.
	Ranges(Vec<RemovedRange<T>>),
}

/// Groups removed indices into maximal runs of consecutive integers.
///
/// Ranges come back sorted, disjoint, and separated by at least one kept
/// index.
pub fn contiguous_ranges<T: Clone>(removed: &BTreeMap<usize, T>) -> Vec<RemovedRange<T>> {
	let mut ranges: Vec<RemovedRange<T>> = Vec::new();
	for (&index, value) in removed {
		match ranges.last_mut() {
			Some(range) if range.end + 1 == index => {
				range.end = index;
				range.values.push(value.clone());
			}
			_ => ranges.push(RemovedRange {
				start: index,
				end: index,
				values: vec![value.clone()],
			}),
		}
	}
	ranges
}

/// True when `removed` elements spread over `ranges` runs average fewer than
/// `threshold` elements per run.
///
/// Same outcome as comparing the truncated integer ratio `removed / ranges`
/// against `threshold`.
pub fn is_fragmented(removed: usize, ranges: usize, threshold: usize) -> bool {
	removed < threshold.saturating_mul(ranges)
}

/// Decides how a bulk removal from a list of `len_before` elements is reported.
pub fn compact_removals<T: Clone>(len_before: usize, removed: &BTreeMap<usize, T>, threshold: usize) -> Compaction<T> {
	let Some((&last, _)) = removed.last_key_value() else {
		return Compaction::Empty;
	};
	debug_assert!(last < len_before, "removed index {last} outside list of {len_before}");

	let ranges = contiguous_ranges(removed);
	if is_fragmented(removed.len(), ranges.len(), threshold) {
		tracing::debug!(
			len_before,
			removed = removed.len(),
			ranges = ranges.len(),
			threshold,
			"list.compact.reset"
		);
		return Compaction::Reset;
	}
	Compaction::Ranges(ranges)
}

#[cfg(test)]
mod tests;
