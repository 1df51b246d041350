//! The commit gate.
//!
//! Promotes a classified transaction into ledger state all at once, or not at
//! all. This is the only code path that writes finalized outputs.

use std::fmt;

use serde::Serialize;
use tint_store::{OutputStore, StoreError, TxCommit};
use tint_types::{FinalizedOutput, OutputKey, OutputType, TxId};

use crate::classifier::{ClassifiedTx, Violation};
use crate::LedgerError;

/// Why a transaction contributed nothing to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Upstream script or signature validation failed.
    ScriptInvalid,
    NoOutputs,
    /// A payload broke a structural constraint, or an output did not belong
    /// to the transaction.
    Structural { index: u32, detail: String },
    /// Outputs claim more conserved value than the inputs hold.
    Conservation { claimed: u128, available: u64 },
    /// An output was left undefined.
    Unclassified { index: u32 },
    /// A bond unlock names something that is not a finalized bond lock.
    UnknownBond { index: u32, target: OutputKey },
    /// A bond unlock names a bond that was already released.
    BondAlreadyReleased { index: u32, target: OutputKey },
    /// The transaction spends a bond that is still locked.
    LockedInput { key: OutputKey, until: u32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScriptInvalid => write!(f, "script validation failed"),
            Self::NoOutputs => write!(f, "transaction has no outputs"),
            Self::Structural { index, detail } => write!(f, "output {index}: {detail}"),
            Self::Conservation { claimed, available } => {
                write!(f, "outputs claim {claimed} conserved value, inputs hold {available}")
            }
            Self::Unclassified { index } => write!(f, "output {index} left undefined"),
            Self::UnknownBond { index, target } => {
                write!(f, "output {index} unlocks {target}, which is not a bond")
            }
            Self::BondAlreadyReleased { index, target } => {
                write!(f, "output {index} unlocks {target}, which is already released")
            }
            Self::LockedInput { key, until } => write!(f, "input {key} is locked until {until}"),
        }
    }
}

/// What one committed transaction added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub tx_id: TxId,
    pub outputs: usize,
    pub issued: u64,
    pub forfeited: u64,
    pub burnt: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CommitOutcome {
    Accepted(CommitReceipt),
    Rejected(RejectReason),
    /// The transaction was finalized before; nothing changed.
    AlreadyFinalized,
}

/// Commit gate over a ledger store.
pub struct Finalizer<'a, S: OutputStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: OutputStore + ?Sized> Finalizer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Accept or reject a classified transaction.
    ///
    /// `script_valid` is the upstream script/signature verdict. Rejections
    /// are returned as [`CommitOutcome::Rejected`]; `Err` is reserved for
    /// fatal conditions.
    pub fn commit(&self, tx: ClassifiedTx, script_valid: bool) -> Result<CommitOutcome, LedgerError> {
        let tx_id = tx.context.tx_id;

        // Replays of a finalized transaction are no-ops, whatever their verdict.
        if !self.store.outputs_of_tx(&tx_id)?.is_empty() {
            tracing::debug!(%tx_id, "transaction already finalized");
            return Ok(CommitOutcome::AlreadyFinalized);
        }

        if let Some(reason) = self.rejection(&tx, script_valid)? {
            tracing::debug!(%tx_id, %reason, "transaction rejected");
            return Ok(CommitOutcome::Rejected(reason));
        }

        let receipt = CommitReceipt {
            tx_id,
            outputs: tx.outputs.len(),
            issued: tx.issued,
            forfeited: tx.forfeited,
            burnt: tx.burnt_fees,
        };
        let outputs = tx
            .outputs
            .into_iter()
            .map(|o| o.freeze())
            .collect::<Result<Vec<FinalizedOutput>, _>>()?;
        let commit = TxCommit {
            tx_id,
            height: tx.context.height,
            outputs,
            forfeited: tx.forfeited,
            burnt: tx.burnt_fees,
        };

        match self.store.commit_tx(&commit) {
            Ok(()) => {}
            Err(StoreError::Duplicate(key)) => {
                tracing::debug!(%tx_id, %key, "duplicate key on commit");
                return Ok(CommitOutcome::AlreadyFinalized);
            }
            Err(e) => return Err(e.into()),
        }

        if receipt.forfeited > 0 {
            tracing::debug!(%tx_id, forfeited = receipt.forfeited, "conserved value forfeited");
        }
        Ok(CommitOutcome::Accepted(receipt))
    }

    fn rejection(&self, tx: &ClassifiedTx, script_valid: bool) -> Result<Option<RejectReason>, LedgerError> {
        if !script_valid {
            return Ok(Some(RejectReason::ScriptInvalid));
        }
        if tx.outputs.is_empty() {
            return Ok(Some(RejectReason::NoOutputs));
        }

        for violation in &tx.violations {
            if let Violation::Structural { index, detail } | Violation::Inconsistent { index, detail } =
                violation
            {
                return Ok(Some(RejectReason::Structural {
                    index: *index,
                    detail: detail.clone(),
                }));
            }
        }
        if let Some(o) = tx.outputs.iter().find(|o| o.output_type() == OutputType::Invalid) {
            return Ok(Some(RejectReason::Structural {
                index: o.index(),
                detail: "output classified invalid".into(),
            }));
        }
        if let Some(o) = tx.outputs.iter().find(|o| o.output_type() == OutputType::Undefined) {
            return Ok(Some(RejectReason::Unclassified { index: o.index() }));
        }

        let available = tx.context.input_conserved_value;
        if tx.context.is_genesis {
            if let Some(o) = tx
                .outputs
                .iter()
                .find(|o| o.output_type() != OutputType::GenesisIssuance)
            {
                return Ok(Some(RejectReason::Structural {
                    index: o.index(),
                    detail: format!("genesis output typed {}", o.output_type()),
                }));
            }
        } else {
            let conservation_broken = tx
                .violations
                .iter()
                .any(|v| matches!(v, Violation::Conservation { .. }));
            let claimed = tx.claimed_conserved_value() + u128::from(tx.burnt_fees);
            if conservation_broken || claimed > u128::from(available) {
                return Ok(Some(RejectReason::Conservation { claimed, available }));
            }
        }

        for o in &tx.outputs {
            if o.output_type() != OutputType::BondUnlock {
                continue;
            }
            let Some(target) = o.bond_target() else {
                return Err(LedgerError::Corruption(format!(
                    "bond unlock {} has no target",
                    o.key()
                )));
            };
            let is_bond = self
                .store
                .get_output(&target)?
                .is_some_and(|b| b.output_type() == OutputType::BondLock);
            if !is_bond {
                return Ok(Some(RejectReason::UnknownBond {
                    index: o.index(),
                    target,
                }));
            }
            if self.store.unlock_for(&target)?.is_some() {
                return Ok(Some(RejectReason::BondAlreadyReleased {
                    index: o.index(),
                    target,
                }));
            }
        }

        Ok(None)
    }
}
