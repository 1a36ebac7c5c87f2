use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;

fn removed_at(indices: &[usize]) -> BTreeMap<usize, String> {
	indices.iter().map(|&i| (i, format!("v{i}"))).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|v| (*v).to_string()).collect()
}

#[test]
fn nothing_removed_is_empty() {
	let removed = BTreeMap::<usize, String>::new();
	assert_eq!(compact_removals(10, &removed, DEFAULT_RESET_THRESHOLD), Compaction::Empty);
	assert_eq!(compact_removals(0, &removed, 0), Compaction::Empty);
}

#[test]
fn scattered_removal_resets_under_default_threshold() {
	// Four elements over two runs average 2 per run, below 5.
	let removed = removed_at(&[2, 3, 4, 9]);
	assert_eq!(compact_removals(10, &removed, DEFAULT_RESET_THRESHOLD), Compaction::Reset);
}

#[test]
fn same_removal_reports_ranges_under_low_threshold() {
	let removed = removed_at(&[2, 3, 4, 9]);
	let expected = Compaction::Ranges(vec![
		RemovedRange {
			start: 2,
			end: 4,
			values: strings(&["v2", "v3", "v4"]),
		},
		RemovedRange {
			start: 9,
			end: 9,
			values: strings(&["v9"]),
		},
	]);
	assert_eq!(compact_removals(10, &removed, 2), expected);
	assert_eq!(compact_removals(10, &removed, 1), expected);
}

#[test]
fn ratio_equal_to_threshold_is_not_fragmented() {
	assert!(!is_fragmented(4, 2, 2));
	assert!(is_fragmented(4, 2, 3));
	// 9 / 2 truncates to 4, still below 5.
	assert!(is_fragmented(9, 2, 5));
	assert!(!is_fragmented(10, 2, 5));
}

#[test]
fn thresholds_zero_and_one_never_reset() {
	let removed = removed_at(&[0, 2, 4, 6, 8]);
	for threshold in [0, 1] {
		match compact_removals(10, &removed, threshold) {
			Compaction::Ranges(ranges) => assert_eq!(ranges.len(), 5),
			other => panic!("threshold {threshold} produced {other:?}"),
		}
	}
}

#[test]
fn removing_everything_is_one_range() {
	let removed = removed_at(&[0, 1, 2, 3, 4]);
	let Compaction::Ranges(ranges) = compact_removals(5, &removed, DEFAULT_RESET_THRESHOLD) else {
		panic!("expected ranges");
	};
	assert_eq!(ranges.len(), 1);
	assert_eq!((ranges[0].start, ranges[0].end, ranges[0].values.len()), (0, 4, 5));
}

#[test]
fn trailing_run_is_reported() {
	let ranges = contiguous_ranges(&removed_at(&[1, 5, 6, 7]));
	let bounds: Vec<_> = ranges.iter().map(|r| (r.start, r.end)).collect();
	assert_eq!(bounds, vec![(1, 1), (5, 7)]);
}

proptest! {
	#[test]
	fn ranges_partition_removed_indices(indices in proptest::collection::btree_set(0usize..200, 0..60)) {
		let removed: BTreeMap<usize, usize> = indices.iter().map(|&i| (i, i * 10)).collect();
		let ranges = contiguous_ranges(&removed);

		let flattened: Vec<usize> = ranges.iter().flat_map(|r| r.values.iter().copied()).collect();
		let expected: Vec<usize> = removed.values().copied().collect();
		prop_assert_eq!(flattened, expected);

		for range in &ranges {
			prop_assert!(range.start <= range.end);
			prop_assert_eq!(range.values.len(), range.end - range.start + 1);
		}
		for pair in ranges.windows(2) {
			// Adjacent runs would have been merged.
			prop_assert!(pair[0].end + 1 < pair[1].start);
		}
	}

	#[test]
	fn reset_decision_matches_integer_ratio(
		indices in proptest::collection::btree_set(0usize..100, 1..40),
		threshold in 0usize..8,
	) {
		let removed: BTreeMap<usize, ()> = indices.iter().map(|&i| (i, ())).collect();
		let ranges = contiguous_ranges(&removed).len();
		let expect_reset = removed.len() / ranges < threshold;
		let got_reset = matches!(compact_removals(100, &removed, threshold), Compaction::Reset);
		prop_assert_eq!(got_reset, expect_reset);
	}
}
