//! Conserved value held by a transaction's inputs.

use std::collections::BTreeSet;

use serde::Serialize;
use tint_store::OutputStore;
use tint_types::{BlockHeight, OutputKey};

use crate::lock::{spendability, Spendability};
use crate::LedgerError;

/// A spent bond that is still locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LockedInput {
    pub key: OutputKey,
    pub until: BlockHeight,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    /// Conserved value held by the spent finalized outputs.
    pub conserved_value: u64,
    /// Spent outputs the overlay knows about.
    pub overlay_inputs: usize,
    pub locked: Vec<LockedInput>,
}

impl ResolvedInputs {
    pub fn is_spendable(&self) -> bool {
        self.locked.is_empty()
    }
}

/// Resolve spent outputs against earlier ledger state at `height`.
///
/// Repeated keys count once. Keys the overlay never finalized carry no
/// conserved value.
pub fn resolve_inputs<S: OutputStore + ?Sized>(
    store: &S,
    spends: &[OutputKey],
    height: BlockHeight,
) -> Result<ResolvedInputs, LedgerError> {
    let mut resolved = ResolvedInputs::default();
    let unique: BTreeSet<&OutputKey> = spends.iter().collect();

    for key in unique {
        let Some(output) = store.get_output(key)? else {
            continue;
        };
        resolved.overlay_inputs += 1;
        let released = store.unlock_for(key)?.is_some();
        if let Spendability::Locked { until } = spendability(&output, released, height) {
            resolved.locked.push(LockedInput { key: *key, until });
        }
        resolved.conserved_value = resolved
            .conserved_value
            .checked_add(output.conserved_value())
            .ok_or_else(|| {
                LedgerError::Corruption(format!("conserved value overflow resolving {key}"))
            })?;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_store::TxCommit;
    use tint_store_memory::MemoryOutputStore;
    use tint_types::{FinalizedOutput, OutputType, RawOutput, TxId, WorkingOutput};

    fn finalized(tx: u8, index: u32, value: u64, output_type: OutputType, threshold: BlockHeight) -> FinalizedOutput {
        let mut w = WorkingOutput::from_raw(RawOutput {
            index,
            value,
            tx_id: TxId::new([tx; 32]),
            locking_script: None,
            address: None,
            metadata: None,
            block_height: 10,
        });
        w.set_output_type(output_type);
        w.set_lock_threshold(threshold);
        w.freeze().unwrap()
    }

    fn store_with(outputs: Vec<FinalizedOutput>) -> MemoryOutputStore {
        let store = MemoryOutputStore::new();
        store
            .commit_tx(&TxCommit {
                tx_id: outputs[0].tx_id(),
                height: 10,
                outputs,
                forfeited: 0,
                burnt: 0,
            })
            .unwrap();
        store
    }

    #[test]
    fn sums_conserved_value_once_per_key() {
        let store = store_with(vec![
            finalized(1, 0, 70, OutputType::ValueTransfer, 0),
            finalized(1, 1, 500, OutputType::BaseCurrencyChange, 0),
        ]);
        let a = OutputKey::new(TxId::new([1; 32]), 0);
        let b = OutputKey::new(TxId::new([1; 32]), 1);
        let unknown = OutputKey::new(TxId::new([2; 32]), 0);

        let resolved = resolve_inputs(&store, &[a, a, b, unknown], 20).unwrap();
        assert_eq!(resolved.conserved_value, 70);
        assert_eq!(resolved.overlay_inputs, 2);
        assert!(resolved.is_spendable());
    }

    #[test]
    fn reports_locked_bonds() {
        let store = store_with(vec![finalized(1, 0, 40, OutputType::BondLock, 50)]);
        let bond = OutputKey::new(TxId::new([1; 32]), 0);

        let early = resolve_inputs(&store, &[bond], 49).unwrap();
        assert_eq!(early.locked, vec![LockedInput { key: bond, until: 50 }]);
        assert_eq!(early.conserved_value, 40);

        let late = resolve_inputs(&store, &[bond], 50).unwrap();
        assert!(late.is_spendable());
    }
}
