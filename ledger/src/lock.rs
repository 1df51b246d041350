//! Spend-time bond enforcement.
//!
//! A bond's lock is re-checked every time something proposes to spend it,
//! because the chain height keeps moving. The check never mutates anything.

use serde::Serialize;
use tint_store::OutputStore;
use tint_types::{BlockHeight, FinalizedOutput, OutputKey, OutputType};

use crate::LedgerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Spendability {
    Spendable,
    Locked { until: BlockHeight },
    /// Not an overlay output; the base ledger alone decides.
    Unknown,
}

impl Spendability {
    pub fn is_spendable(&self) -> bool {
        !matches!(self, Self::Locked { .. })
    }
}

/// Pure lock predicate for a finalized output.
///
/// A bond is locked while `height < lock_threshold`, unless a finalized
/// unlock has released it.
pub fn spendability(output: &FinalizedOutput, released: bool, height: BlockHeight) -> Spendability {
    if output.output_type() == OutputType::BondLock
        && !released
        && height < output.lock_threshold()
    {
        Spendability::Locked {
            until: output.lock_threshold(),
        }
    } else {
        Spendability::Spendable
    }
}

/// Look up `key` and decide whether it may be spent at `height`.
pub fn check_spend<S: OutputStore + ?Sized>(
    store: &S,
    key: &OutputKey,
    height: BlockHeight,
) -> Result<Spendability, LedgerError> {
    let Some(output) = store.get_output(key)? else {
        return Ok(Spendability::Unknown);
    };
    let released = output.output_type() == OutputType::BondLock && store.unlock_for(key)?.is_some();
    Ok(spendability(&output, released, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_types::{RawOutput, TxId, WorkingOutput};

    fn output(output_type: OutputType, threshold: BlockHeight) -> FinalizedOutput {
        let mut w = WorkingOutput::from_raw(RawOutput {
            index: 0,
            value: 10,
            tx_id: TxId::new([1; 32]),
            locking_script: None,
            address: None,
            metadata: None,
            block_height: 50,
        });
        w.set_output_type(output_type);
        w.set_lock_threshold(threshold);
        w.freeze().unwrap()
    }

    #[test]
    fn bond_locked_below_threshold() {
        let bond = output(OutputType::BondLock, 100);
        assert_eq!(spendability(&bond, false, 0), Spendability::Locked { until: 100 });
        assert_eq!(spendability(&bond, false, 99), Spendability::Locked { until: 100 });
        assert_eq!(spendability(&bond, false, 100), Spendability::Spendable);
        assert_eq!(spendability(&bond, false, 1000), Spendability::Spendable);
    }

    #[test]
    fn released_bond_is_spendable_at_any_height() {
        let bond = output(OutputType::BondLock, 100);
        assert_eq!(spendability(&bond, true, 0), Spendability::Spendable);
    }

    #[test]
    fn other_types_are_never_locked() {
        let transfer = output(OutputType::ValueTransfer, 0);
        assert!(spendability(&transfer, false, 0).is_spendable());
    }

    #[test]
    fn unknown_key_is_unknown() {
        let store = tint_store_memory::MemoryOutputStore::new();
        let key = OutputKey::new(TxId::new([8; 32]), 0);
        assert_eq!(check_spend(&store, &key, 10).unwrap(), Spendability::Unknown);
        assert!(Spendability::Unknown.is_spendable());
    }
}
