//! Block application and rollback.
//!
//! Transactions that only spend outputs from earlier blocks are resolved and
//! classified in parallel, each with its own working outputs and accumulator.
//! Commits then run strictly in block order. A transaction that spends an
//! output created earlier in the same block waits for that commit and is
//! prepared in sequence. So does one found spending a locked bond, since an
//! earlier transaction of the block may have released it.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tint_store::OutputStore;
use tint_types::{BlockHeight, ChainParams, OutputKey, RawOutput, TxId};

use crate::builder::build_working_outputs;
use crate::classifier::{classify, ClassifiedTx, TxContext};
use crate::finalizer::{CommitOutcome, Finalizer, RejectReason};
use crate::inputs::resolve_inputs;
use crate::LedgerError;

/// A base-chain transaction as handed over by the decoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTx {
    pub tx_id: TxId,
    pub outputs: Vec<RawOutput>,
    /// Outputs this transaction spends.
    #[serde(default)]
    pub spends: Vec<OutputKey>,
    /// Upstream script/signature verdict.
    #[serde(default = "default_script_valid")]
    pub script_valid: bool,
}

fn default_script_valid() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: BlockHeight,
    pub txs: Vec<BlockTx>,
}

/// What happened to one transaction of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub tx_id: TxId,
    pub outcome: CommitOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlockReceipt {
    pub height: BlockHeight,
    pub accepted: usize,
    pub rejected: usize,
    pub already_finalized: usize,
    pub outputs_committed: usize,
    pub issued: u64,
    pub forfeited: u64,
    pub burnt: u64,
    pub txs: Vec<TxOutcome>,
}

impl BlockReceipt {
    fn record(&mut self, tx_id: TxId, outcome: CommitOutcome) {
        match &outcome {
            CommitOutcome::Accepted(r) => {
                self.accepted += 1;
                self.outputs_committed += r.outputs;
                self.issued = self.issued.saturating_add(r.issued);
                self.forfeited = self.forfeited.saturating_add(r.forfeited);
                self.burnt = self.burnt.saturating_add(r.burnt);
            }
            CommitOutcome::Rejected(_) => self.rejected += 1,
            CommitOutcome::AlreadyFinalized => self.already_finalized += 1,
        }
        self.txs.push(TxOutcome { tx_id, outcome });
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RollbackReceipt {
    pub height: BlockHeight,
    pub txs_removed: usize,
    pub outputs_removed: usize,
}

/// A transaction ready for the commit gate.
enum Prepared {
    Classified(ClassifiedTx),
    Locked(RejectReason),
}

/// Applies whole blocks to a ledger store and undoes them.
pub struct BlockApplier {
    params: ChainParams,
}

impl BlockApplier {
    pub fn new(params: ChainParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Classify and commit every transaction of `block`.
    ///
    /// A rejected transaction never affects its siblings. On a fatal error
    /// everything committed at this height is rolled back before the error is
    /// returned, so the caller can re-apply the block from a clean state.
    pub fn apply<S: OutputStore + ?Sized>(&self, store: &S, block: &Block) -> Result<BlockReceipt, LedgerError> {
        match self.apply_inner(store, block) {
            Ok(receipt) => {
                tracing::info!(
                    height = block.height,
                    accepted = receipt.accepted,
                    rejected = receipt.rejected,
                    duplicate = receipt.already_finalized,
                    outputs = receipt.outputs_committed,
                    "block applied"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(height = block.height, error = %e, "fatal error applying block, rolling back");
                self.rollback(store, block.height)?;
                Err(e)
            }
        }
    }

    fn apply_inner<S: OutputStore + ?Sized>(&self, store: &S, block: &Block) -> Result<BlockReceipt, LedgerError> {
        let in_block: HashSet<TxId> = block.txs.iter().map(|tx| tx.tx_id).collect();
        let independent = |tx: &BlockTx| tx.spends.iter().all(|s| !in_block.contains(&s.tx_id));

        let mut prepared: Vec<Option<Result<Prepared, LedgerError>>> = block
            .txs
            .par_iter()
            .map(|tx| independent(tx).then(|| self.prepare(store, block.height, tx)))
            .collect();

        let finalizer = Finalizer::new(store);
        let mut receipt = BlockReceipt {
            height: block.height,
            ..BlockReceipt::default()
        };

        for (tx, early) in block.txs.iter().zip(prepared.iter_mut()) {
            let ready = match early.take() {
                Some(Ok(Prepared::Locked(_))) | None => self.prepare(store, block.height, tx)?,
                Some(result) => result?,
            };
            let outcome = match ready {
                Prepared::Locked(reason) => CommitOutcome::Rejected(reason),
                Prepared::Classified(classified) => finalizer.commit(classified, tx.script_valid)?,
            };
            receipt.record(tx.tx_id, outcome);
        }
        Ok(receipt)
    }

    fn prepare<S: OutputStore + ?Sized>(
        &self,
        store: &S,
        height: BlockHeight,
        tx: &BlockTx,
    ) -> Result<Prepared, LedgerError> {
        let inputs = resolve_inputs(store, &tx.spends, height)?;
        if let Some(locked) = inputs.locked.first() {
            return Ok(Prepared::Locked(RejectReason::LockedInput {
                key: locked.key,
                until: locked.until,
            }));
        }

        let context = TxContext {
            tx_id: tx.tx_id,
            height,
            input_conserved_value: inputs.conserved_value,
            is_genesis: self.params.is_genesis(&tx.tx_id, height),
        };
        let working = build_working_outputs(tx.outputs.iter().cloned());
        let rules = self.params.rules.active_at(height);
        Ok(Prepared::Classified(classify(context, working, rules)))
    }

    /// Remove every finalized output committed at `height`.
    pub fn rollback<S: OutputStore + ?Sized>(&self, store: &S, height: BlockHeight) -> Result<RollbackReceipt, LedgerError> {
        if let Some(tip) = store.tip_height()? {
            if height < tip {
                tracing::warn!(height, tip, "rolling back a block below the tip");
            }
        }
        let removed = store.remove_height(height)?;
        let receipt = RollbackReceipt {
            height,
            txs_removed: removed.len(),
            outputs_removed: removed.iter().map(|r| r.output_keys.len()).sum(),
        };
        tracing::info!(
            height,
            txs = receipt.txs_removed,
            outputs = receipt.outputs_removed,
            "block rolled back"
        );
        Ok(receipt)
    }
}
