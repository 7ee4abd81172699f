//! Blockchain facade for chainscope.
//!
//! This crate composes the mapped chain store with the transaction-hash
//! and address indices into the single read API the rest of the world
//! consumes:
//!
//! - [`Blockchain`] — sized, randomly indexable (negative heights wrap),
//!   sliceable, iterable collection of blocks
//! - hash and address resolution (`tx_with_hash`, `address_from_string`,
//!   `addresses_with_prefix`)
//! - [`segment`](Blockchain::segment) — partition the height range into
//!   chunks of approximately equal transaction count for parallel scans
//! - [`outputs_unspent`](Blockchain::outputs_unspent) — lazy scan over
//!   the unspent output set
//!
//! The dataset is immutable after open: no operation here locks, blocks,
//! or mutates, and the facade is `Send + Sync`.

pub mod blockchain;
pub mod error;
pub mod scan;
pub mod segment;
mod slice;
pub mod view;

pub use blockchain::Blockchain;
pub use error::{ChainError, ChainResult};
pub use scan::{Blocks, TypeAddresses, TypeTransactions, UnspentOutputs};
pub use segment::segment_boundaries;
pub use view::ChainRange;

// The entity and configuration types callers handle through this facade.
pub use chainscope_store::{
    Block, DataConfiguration, Input, Output, ScriptVariant, Transaction,
};
pub use chainscope_types::{Address, AddressType, BlockHeight, Hash256};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use chainscope_store::{ScriptSpec, StoreBuilder};

    fn h(n: u8) -> Hash256 {
        Hash256::new([n; 32])
    }

    /// Three blocks holding [2, 5, 3] transactions (T = 10), addresses of
    /// every type, and one spend: output (0, 0) consumed by tx 2.
    fn build_fixture(dir: &Path) {
        let mut b = StoreBuilder::new();

        b.begin_block(h(1), 1000);
        b.add_tx(h(101)).unwrap();
        b.add_output(50, ScriptSpec::PubkeyHash([0xAA; 20])).unwrap();
        b.add_tx(h(102)).unwrap();
        b.add_output(30, ScriptSpec::ScriptHash([0xBB; 20])).unwrap();
        b.add_output(20, ScriptSpec::OpReturn(b"burn".to_vec())).unwrap();

        b.begin_block(h(2), 2000);
        b.add_tx(h(103)).unwrap();
        b.add_input(0, 0).unwrap();
        b.add_output(49, ScriptSpec::WitnessPubkeyHash([0xCC; 20])).unwrap();
        for i in 0..4u8 {
            b.add_tx(h(110 + i)).unwrap();
            b.add_output(10 + i as u64, ScriptSpec::PubkeyHash([i; 20])).unwrap();
        }

        b.begin_block(h(3), 3000);
        b.add_tx(h(120)).unwrap();
        b.add_output(
            7,
            ScriptSpec::Multisig {
                required: 2,
                script_hash: [0xDD; 20],
                pubkeys: vec![vec![2u8; 33], vec![3u8; 33]],
            },
        )
        .unwrap();
        b.add_tx(h(121)).unwrap();
        b.add_output(8, ScriptSpec::WitnessScriptHash([0xEE; 32])).unwrap();
        b.add_tx(h(122)).unwrap();
        b.add_output(9, ScriptSpec::NonStandard(vec![0x51, 0x52])).unwrap();

        b.write(dir).unwrap();
    }

    fn open_fixture(dir: &Path) -> Blockchain {
        Blockchain::open(dir).unwrap()
    }

    #[test]
    fn open_missing_directory() {
        let err = Blockchain::open("/nonexistent/chainscope").unwrap_err();
        assert!(matches!(err, ChainError::DataUnavailable(_)));
    }

    #[test]
    fn config_accessor_reflects_open() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());
        assert_eq!(chain.config().data_directory, dir.path());
        assert!(!chain.config().error_on_reorg);
    }

    #[test]
    fn heights_are_dense() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        assert_eq!(chain.len(), 3);
        for height in 0..chain.len() {
            assert_eq!(chain.at(height as i64).unwrap().height(), height);
        }
    }

    #[test]
    fn negative_heights_wrap() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let n = chain.len() as i64;
        for i in 1..=n {
            assert_eq!(chain.at(-i).unwrap(), chain.at(n - i).unwrap());
        }
    }

    #[test]
    fn out_of_range_heights_fail() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let n = chain.len() as i64;
        assert!(matches!(
            chain.at(n).unwrap_err(),
            ChainError::IndexOutOfRange { index, .. } if index == n
        ));
        assert!(matches!(
            chain.at(-n - 1).unwrap_err(),
            ChainError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn full_slice_equals_iteration() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let sliced = chain.slice(Some(0), Some(chain.len() as i64), 1).unwrap();
        let iterated: Vec<Block<'_>> = chain.iter().collect();
        assert_eq!(sliced, iterated);

        let defaulted = chain.slice(None, None, 1).unwrap();
        assert_eq!(defaulted, iterated);
    }

    #[test]
    fn slice_strides_and_reverses() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let heights = |blocks: Vec<Block<'_>>| -> Vec<u64> {
            blocks.iter().map(|b| b.height()).collect()
        };

        assert_eq!(heights(chain.slice(Some(1), None, 1).unwrap()), vec![1, 2]);
        assert_eq!(heights(chain.slice(None, None, 2).unwrap()), vec![0, 2]);
        assert_eq!(heights(chain.slice(None, None, -1).unwrap()), vec![2, 1, 0]);
        assert_eq!(heights(chain.slice(Some(-1), Some(0), -1).unwrap()), vec![2, 1]);
        assert_eq!(heights(chain.slice(Some(10), Some(20), 1).unwrap()), Vec::<u64>::new());
    }

    #[test]
    fn slice_zero_step_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());
        assert!(matches!(
            chain.slice(None, None, 0).unwrap_err(),
            ChainError::InvalidSlice
        ));
    }

    #[test]
    fn iteration_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let first: Vec<u64> = chain.iter().map(|b| b.height()).collect();
        let second: Vec<u64> = (&chain).into_iter().map(|b| b.height()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn tx_indices_are_monotonic_with_height() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let mut previous_block_max: Option<u32> = None;
        for block in &chain {
            let indices: Vec<u32> = block.transactions().map(|tx| tx.index()).collect();
            if let (Some(max), Some(&min)) = (previous_block_max, indices.first()) {
                assert!(max < min);
            }
            previous_block_max = indices.last().copied();
        }
    }

    #[test]
    fn tx_with_index_bounds() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        assert_eq!(chain.tx_count(), 10);
        assert_eq!(chain.tx_with_index(9).unwrap().hash(), h(122));
        assert!(matches!(
            chain.tx_with_index(10).unwrap_err(),
            ChainError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn tx_with_hash_resolves() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let tx = chain.tx_with_hash(&h(103)).unwrap();
        assert_eq!(tx.hash(), h(103));
        assert_eq!(tx.index(), 2);
        assert_eq!(tx.block_height(), 1);
    }

    #[test]
    fn tx_with_unknown_hash_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let missing = h(0x7F);
        assert!(matches!(
            chain.tx_with_hash(&missing).unwrap_err(),
            ChainError::NotFound(hash) if hash == missing
        ));
    }

    #[test]
    fn address_count_per_type() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        assert_eq!(chain.address_count(AddressType::PubkeyHash), 5);
        assert_eq!(chain.address_count(AddressType::ScriptHash), 1);
        assert_eq!(chain.address_count(AddressType::Pubkey), 2);
        assert_eq!(chain.address_count(AddressType::Multisig), 1);
        assert_eq!(chain.address_count(AddressType::OpReturn), 1);
    }

    #[test]
    fn address_from_index_boundary() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let count = chain.address_count(AddressType::PubkeyHash) as u32;
        assert!(chain.address_from_index(count - 1, AddressType::PubkeyHash).is_ok());
        assert!(matches!(
            chain.address_from_index(count, AddressType::PubkeyHash).unwrap_err(),
            ChainError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn known_address_strings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        for ty in AddressType::ALL {
            for variant in chain.addresses(ty) {
                let variant = variant.unwrap();
                let Some(s) = variant.address_string() else {
                    continue;
                };
                let resolved = chain.address_from_string(&s).unwrap().unwrap();
                assert_eq!(resolved.address_string().unwrap(), s);
                assert_eq!(resolved.address_type(), ty);
            }
        }
    }

    #[test]
    fn unknown_but_well_formed_address_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let unknown = format!("pkh:{}", "99".repeat(20));
        assert!(chain.address_from_string(&unknown).unwrap().is_none());
    }

    #[test]
    fn malformed_address_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        for bad in ["", "pkh", "p2tr:abcd", "pkh:zzzz", "pkh:abcd"] {
            assert!(matches!(
                chain.address_from_string(bad).unwrap_err(),
                ChainError::MalformedAddress(_)
            ));
        }
    }

    #[test]
    fn prefix_search_is_lexicographic() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let matches = chain.addresses_with_prefix("pkh:").unwrap();
        assert_eq!(matches.len(), 5);
        let strings: Vec<String> = matches
            .iter()
            .map(|v| v.address_string().unwrap())
            .collect();
        let mut sorted = strings.clone();
        sorted.sort_unstable();
        assert_eq!(strings, sorted);
    }

    #[test]
    fn prefix_search_without_matches_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());
        assert!(chain.addresses_with_prefix("wsh:ff").unwrap().is_empty());
    }

    #[test]
    fn addresses_walk_every_dense_index() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        for ty in AddressType::ALL {
            let walked = chain.addresses(ty).count() as u64;
            assert_eq!(walked, chain.address_count(ty), "type {ty}");
        }
    }

    #[test]
    fn address_type_transactions_filters_by_output_type() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let indices: Vec<u32> = chain
            .address_type_transactions(AddressType::PubkeyHash)
            .map(|tx| tx.index())
            .collect();
        assert_eq!(indices, vec![0, 3, 4, 5, 6]);

        let none: Vec<u32> = chain
            .address_type_transactions(AddressType::WitnessScriptHash)
            .map(|tx| tx.index())
            .collect();
        assert_eq!(none, vec![8]);
    }

    #[test]
    fn unspent_scan_skips_spent_outputs() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let unspent: Vec<Output<'_>> = chain.outputs_unspent().collect();
        // 11 outputs total, one consumed by tx 2.
        assert_eq!(unspent.len(), 10);
        assert!(unspent.iter().all(|o| !o.is_spent()));
        assert!(unspent.iter().all(|o| o.index() != 0));

        // Abandoning early and restarting sees the same set.
        let mut partial = chain.outputs_unspent();
        partial.next();
        drop(partial);
        assert_eq!(chain.outputs_unspent().count(), 10);
    }

    #[test]
    fn segment_indexes_literal_fixture() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        assert_eq!(chain.segment_indexes(2).unwrap(), vec![(0, 2), (2, 3)]);
    }

    #[test]
    fn segment_indexes_partition_for_various_counts() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let n = chain.len();
        for parts in [1, 2, n as i64, n as i64 + 5] {
            let bounds = chain.segment_indexes(parts).unwrap();
            assert_eq!(bounds.len(), parts as usize);
            assert_eq!(bounds.first().unwrap().0, 0);
            assert_eq!(bounds.last().unwrap().1, n);
            for window in bounds.windows(2) {
                assert_eq!(window[0].1, window[1].0);
            }
            let covered: u64 = bounds
                .iter()
                .flat_map(|&(a, b)| (a..b).map(|height| {
                    chain.at(height as i64).unwrap().tx_count() as u64
                }))
                .sum();
            assert_eq!(covered, chain.tx_count());
        }
    }

    #[test]
    fn segment_views_share_the_store() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        let segments = chain.segment(2).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].bounds(), (0, 2));
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[0].tx_count(), 7);
        assert_eq!(segments[1].tx_count(), 3);

        let first = segments[0].at(0).unwrap();
        assert_eq!(first, chain.at(0).unwrap());
        assert!(segments[0].at(2).is_err());

        let heights: Vec<u64> = segments[1].iter().map(|b| b.height()).collect();
        assert_eq!(heights, vec![2]);
    }

    #[test]
    fn segment_rejects_non_positive_counts() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        assert!(matches!(
            chain.segment(0).unwrap_err(),
            ChainError::InvalidArgument(0)
        ));
        assert!(matches!(
            chain.segment_indexes(-1).unwrap_err(),
            ChainError::InvalidArgument(-1)
        ));
    }

    #[test]
    fn reorg_policy_flows_through_facade() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = StoreBuilder::new();
        b.begin_block(h(1), 1000);
        b.add_tx(h(101)).unwrap();
        b.add_output(1, ScriptSpec::PubkeyHash([1; 20])).unwrap();
        b.begin_block_with_prev(h(2), h(99), 2000);
        b.add_tx(h(102)).unwrap();
        b.add_output(1, ScriptSpec::PubkeyHash([2; 20])).unwrap();
        b.write(dir.path()).unwrap();

        let mut config = DataConfiguration::new(dir.path());
        config.error_on_reorg = true;
        assert!(matches!(
            Blockchain::with_config(config.clone()).unwrap_err(),
            ChainError::ReorgDetected { height: 1, .. }
        ));

        config.error_on_reorg = false;
        assert!(Blockchain::with_config(config).is_ok());
    }

    #[test]
    fn blocks_ignored_hides_transactions_from_hash_lookups() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());

        let mut config = DataConfiguration::new(dir.path());
        config.blocks_ignored = 1;
        let chain = Blockchain::with_config(config).unwrap();

        assert_eq!(chain.len(), 2);
        // A transaction in the hidden tail resolves in the hash index but
        // must surface as NotFound, not as a phantom entity.
        assert!(matches!(
            chain.tx_with_hash(&h(121)).unwrap_err(),
            ChainError::NotFound(_)
        ));
        assert!(chain.tx_with_hash(&h(103)).is_ok());
    }

    #[test]
    fn empty_chain_behaves() {
        let dir = tempfile::tempdir().unwrap();
        StoreBuilder::new().write(dir.path()).unwrap();
        let chain = open_fixture(dir.path());

        assert!(chain.is_empty());
        assert_eq!(chain.iter().count(), 0);
        assert!(chain.at(0).is_err());
        assert!(chain.at(-1).is_err());
        assert!(chain.slice(None, None, 1).unwrap().is_empty());
        assert_eq!(chain.segment_indexes(3).unwrap(), vec![(0, 0); 3]);
        assert_eq!(chain.outputs_unspent().count(), 0);
    }

    #[test]
    fn concurrent_readers_share_one_chain() {
        let dir = tempfile::tempdir().unwrap();
        build_fixture(dir.path());
        let chain = open_fixture(dir.path());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let total: u64 = chain.iter().map(|b| b.tx_count() as u64).sum();
                    assert_eq!(total, 10);
                    assert_eq!(chain.outputs_unspent().count(), 10);
                });
            }
        });
    }
}
