//! Chain segmentation: split the height range into contiguous chunks of
//! approximately equal transaction count, for parallel consumers.

use crate::error::{ChainError, ChainResult};

/// Partition `[0, N)` into exactly `parts` contiguous ranges whose
/// transaction counts are as close to `T / parts` as block boundaries
/// allow.
///
/// Greedy prefix-sum walk: segment `k`'s boundary is cut at the first
/// height where `running * parts >= k * total` (all integer arithmetic,
/// widened to u128 so the products cannot overflow). The last segment
/// absorbs any remainder; when `parts > N` the tail ranges come out
/// empty. Ranges are pairwise disjoint and cover `[0, N)` exactly.
pub fn segment_boundaries(tx_counts: &[u64], parts: i64) -> ChainResult<Vec<(u64, u64)>> {
    if parts <= 0 {
        return Err(ChainError::InvalidArgument(parts));
    }
    let parts = parts as usize;
    let n = tx_counts.len() as u64;
    let total: u128 = tx_counts.iter().map(|&c| c as u128).sum();

    let mut bounds = Vec::with_capacity(parts);
    let mut start = 0u64;
    let mut running = 0u128;
    for (height, &count) in tx_counts.iter().enumerate() {
        if bounds.len() == parts - 1 {
            break;
        }
        running += count as u128;
        let k = bounds.len() as u128 + 1;
        if running * parts as u128 >= k * total {
            bounds.push((start, height as u64 + 1));
            start = height as u64 + 1;
        }
    }
    bounds.push((start, n));
    while bounds.len() < parts {
        bounds.push((n, n));
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_sums(tx_counts: &[u64], bounds: &[(u64, u64)]) -> Vec<u128> {
        bounds
            .iter()
            .map(|&(a, b)| {
                tx_counts[a as usize..b as usize]
                    .iter()
                    .map(|&c| c as u128)
                    .sum()
            })
            .collect()
    }

    fn assert_partition(tx_counts: &[u64], bounds: &[(u64, u64)]) {
        let n = tx_counts.len() as u64;
        assert_eq!(bounds.first().map(|r| r.0), Some(0));
        assert_eq!(bounds.last().map(|r| r.1), Some(n));
        for window in bounds.windows(2) {
            assert_eq!(window[0].1, window[1].0, "ranges must be contiguous");
        }
        for &(a, b) in bounds {
            assert!(a <= b);
        }
        let total: u128 = tx_counts.iter().map(|&c| c as u128).sum();
        let covered: u128 = range_sums(tx_counts, bounds).iter().sum();
        assert_eq!(covered, total);
    }

    #[test]
    fn literal_three_block_fixture() {
        // Counts [2, 5, 3], two segments: the first prefix sum reaching
        // T/K = 5 is 7, so the cut lands after height 1.
        let bounds = segment_boundaries(&[2, 5, 3], 2).unwrap();
        assert_eq!(bounds, vec![(0, 2), (2, 3)]);
        assert_eq!(range_sums(&[2, 5, 3], &bounds), vec![7, 3]);
    }

    #[test]
    fn single_segment_is_whole_range() {
        let bounds = segment_boundaries(&[2, 5, 3], 1).unwrap();
        assert_eq!(bounds, vec![(0, 3)]);
    }

    #[test]
    fn one_segment_per_block() {
        let counts = [2u64, 5, 3];
        let bounds = segment_boundaries(&counts, 3).unwrap();
        assert_eq!(bounds.len(), 3);
        assert_partition(&counts, &bounds);
    }

    #[test]
    fn more_segments_than_blocks() {
        let counts = [2u64, 5, 3];
        let bounds = segment_boundaries(&counts, 8).unwrap();
        assert_eq!(bounds.len(), 8);
        assert_partition(&counts, &bounds);
        // The trailing ranges are empty but still cover nothing past N.
        assert!(bounds[7].0 == bounds[7].1);
    }

    #[test]
    fn non_positive_count_is_rejected() {
        assert!(matches!(
            segment_boundaries(&[1, 2], 0).unwrap_err(),
            ChainError::InvalidArgument(0)
        ));
        assert!(matches!(
            segment_boundaries(&[1, 2], -3).unwrap_err(),
            ChainError::InvalidArgument(-3)
        ));
    }

    #[test]
    fn empty_chain() {
        let bounds = segment_boundaries(&[], 4).unwrap();
        assert_eq!(bounds, vec![(0, 0); 4]);
    }

    #[test]
    fn zero_transactions_still_partitions() {
        let counts = [0u64, 0, 0, 0];
        let bounds = segment_boundaries(&counts, 3).unwrap();
        assert_eq!(bounds.len(), 3);
        assert_partition(&counts, &bounds);
    }

    #[test]
    fn one_giant_block_lands_in_first_segment() {
        let counts = [10u64, 0, 0];
        let bounds = segment_boundaries(&counts, 2).unwrap();
        assert_eq!(bounds, vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let counts = [u64::MAX / 2, u64::MAX / 2, 7];
        let bounds = segment_boundaries(&counts, 2).unwrap();
        assert_partition(&counts, &bounds);
    }

    proptest::proptest! {
        #[test]
        fn partition_invariants_hold(
            counts in proptest::collection::vec(0u64..10_000, 0..64),
            parts in 1i64..80,
        ) {
            let bounds = segment_boundaries(&counts, parts).unwrap();
            proptest::prop_assert_eq!(bounds.len(), parts as usize);
            let n = counts.len() as u64;
            proptest::prop_assert_eq!(bounds.first().unwrap().0, 0);
            proptest::prop_assert_eq!(bounds.last().unwrap().1, n);
            for window in bounds.windows(2) {
                proptest::prop_assert_eq!(window[0].1, window[1].0);
            }
            let total: u64 = counts.iter().sum();
            let covered: u64 = bounds
                .iter()
                .map(|&(a, b)| counts[a as usize..b as usize].iter().sum::<u64>())
                .sum();
            proptest::prop_assert_eq!(covered, total);
        }
    }
}
