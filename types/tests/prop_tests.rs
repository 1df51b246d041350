use proptest::prelude::*;

use tint_types::{OutputKey, OutputType, RawOutput, RuleSet, RuleTable, TxId, WorkingOutput};

const ALL_TYPES: [OutputType; 10] = [
    OutputType::Undefined,
    OutputType::GenesisIssuance,
    OutputType::ValueTransfer,
    OutputType::BaseCurrencyChange,
    OutputType::OpaqueMetadata,
    OutputType::BondLock,
    OutputType::BondUnlock,
    OutputType::VoteReveal,
    OutputType::ProposalFee,
    OutputType::Invalid,
];

fn raw(value: u64) -> RawOutput {
    RawOutput {
        index: 0,
        value,
        tx_id: TxId::new([3; 32]),
        locking_script: None,
        address: None,
        metadata: None,
        block_height: 42,
    }
}

proptest! {
    /// TxId: Display then FromStr yields the same id.
    #[test]
    fn tx_id_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = TxId::new(bytes);
        let parsed: TxId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    /// OutputKey ordering agrees with (tx bytes, index) tuple ordering.
    #[test]
    fn output_key_order_matches_tuple(
        a in prop::array::uniform32(0u8..4),
        b in prop::array::uniform32(0u8..4),
        ia in 0u32..8,
        ib in 0u32..8,
    ) {
        let ka = OutputKey::new(TxId::new(a), ia);
        let kb = OutputKey::new(TxId::new(b), ib);
        prop_assert_eq!(ka.cmp(&kb), (a, ia).cmp(&(b, ib)));
    }

    /// Freezing succeeds exactly when the type is final and the lock
    /// threshold is present iff the output is a bond lock.
    #[test]
    fn freeze_enforces_lock_invariant(
        type_idx in 0usize..ALL_TYPES.len(),
        threshold in prop_oneof![Just(0u32), 1u32..1_000_000],
        value in 0u64..1_000_000,
    ) {
        let output_type = ALL_TYPES[type_idx];
        let mut w = WorkingOutput::from_raw(raw(value));
        w.set_output_type(output_type);
        w.set_lock_threshold(threshold);

        let expected = output_type.is_final()
            && ((output_type == OutputType::BondLock) == (threshold > 0));
        let result = w.freeze();
        prop_assert_eq!(result.is_ok(), expected);
        if let Ok(f) = result {
            prop_assert_eq!(f.output_type(), output_type);
            prop_assert_eq!(f.lock_threshold(), threshold);
            prop_assert_eq!(f.value(), value);
        }
    }

    /// The active rule set is the last one activated at or below the height.
    #[test]
    fn active_rule_set_is_latest_activated(
        gaps in prop::collection::vec(1u32..1000, 0..6),
        height in 0u32..10_000,
    ) {
        let mut sets = vec![RuleSet::genesis_rules()];
        let mut at = 0u32;
        for (i, gap) in gaps.iter().enumerate() {
            at += gap;
            sets.push(RuleSet {
                version: i as u16 + 2,
                activation_height: at,
                ..RuleSet::genesis_rules()
            });
        }
        let table = RuleTable::new(sets.clone()).unwrap();
        let expected = sets
            .iter()
            .filter(|s| s.activation_height <= height)
            .last()
            .unwrap();
        prop_assert_eq!(table.active_at(height).version, expected.version);
    }
}
