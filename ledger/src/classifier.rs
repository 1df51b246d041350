//! Output classification.
//!
//! Classification is a single ordered fold over a transaction's outputs. The
//! accumulator carries the conserved value still unassigned, so the type of
//! output `n` depends on every output before it. Nothing here may depend on
//! wall-clock time or hash-map iteration order: every node must reach the
//! same result from the same bytes.

use serde::Serialize;
use tint_types::{BlockHeight, OutputType, RuleSet, TxId, WorkingOutput};

use crate::payload::{self, Payload, PayloadMatch};

/// Transaction-level facts supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub tx_id: TxId,
    /// Height of the block containing the transaction.
    pub height: BlockHeight,
    /// Conserved value held by the finalized outputs this transaction spends.
    pub input_conserved_value: u64,
    /// Whether this is the designated genesis transaction.
    pub is_genesis: bool,
}

/// A problem found while classifying. Any violation rejects the whole
/// transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Violation {
    /// A recognized payload broke a structural constraint.
    Structural { index: u32, detail: String },
    /// An output claimed more conserved value than was left.
    Conservation {
        index: u32,
        needed: u64,
        available: u64,
    },
    /// The raw output does not belong to the transaction being classified.
    Inconsistent { index: u32, detail: String },
}

/// Outcome of classifying one transaction. Working outputs are still
/// mutable here; only the finalizer turns them into ledger state.
#[derive(Clone, Debug)]
pub struct ClassifiedTx {
    pub context: TxContext,
    pub outputs: Vec<WorkingOutput>,
    /// Conserved value created (genesis only).
    pub issued: u64,
    /// Conserved value burnt by proposal fees.
    pub burnt_fees: u64,
    /// Conserved value left unassigned after the walk.
    pub forfeited: u64,
    pub violations: Vec<Violation>,
}

impl ClassifiedTx {
    /// Sum of conserved value attached to non-genesis outputs.
    pub fn claimed_conserved_value(&self) -> u128 {
        self.outputs
            .iter()
            .filter(|o| {
                matches!(
                    o.output_type(),
                    OutputType::ValueTransfer | OutputType::BondLock | OutputType::BondUnlock
                )
            })
            .map(|o| u128::from(o.value()))
            .sum()
    }

    pub fn has_invalid_output(&self) -> bool {
        self.outputs
            .iter()
            .any(|o| o.output_type() == OutputType::Invalid)
    }
}

/// Running state of the fold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub remaining: u64,
    pub issued: u64,
    pub burnt_fees: u64,
    pub violations: Vec<Violation>,
}

impl ClassifierState {
    fn start(context: &TxContext) -> Self {
        Self {
            // Genesis creates value rather than consuming it.
            remaining: if context.is_genesis {
                0
            } else {
                context.input_conserved_value
            },
            ..Self::default()
        }
    }

    /// Take `amount` of conserved value for output `index`.
    fn consume(&mut self, index: u32, amount: u64) -> bool {
        match self.remaining.checked_sub(amount) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => {
                self.violations.push(Violation::Conservation {
                    index,
                    needed: amount,
                    available: self.remaining,
                });
                false
            }
        }
    }

    fn structural(&mut self, output: &mut WorkingOutput, detail: String) {
        output.set_output_type(OutputType::Invalid);
        self.violations.push(Violation::Structural {
            index: output.index(),
            detail,
        });
    }
}

/// Classify every output of one transaction.
pub fn classify(context: TxContext, outputs: Vec<WorkingOutput>, rules: &RuleSet) -> ClassifiedTx {
    let count = outputs.len();
    let mut outputs = outputs;
    let state = outputs
        .iter_mut()
        .enumerate()
        .fold(ClassifierState::start(&context), |mut state, (position, output)| {
            classify_output(&mut state, output, position, count, &context, rules);
            state
        });

    if !state.violations.is_empty() {
        tracing::debug!(
            tx_id = %context.tx_id,
            violations = state.violations.len(),
            "transaction classification found violations"
        );
    }

    ClassifiedTx {
        outputs,
        issued: state.issued,
        burnt_fees: state.burnt_fees,
        forfeited: state.remaining,
        violations: state.violations,
        context,
    }
}

/// One step of the fold.
pub fn classify_output(
    state: &mut ClassifierState,
    output: &mut WorkingOutput,
    position: usize,
    count: usize,
    context: &TxContext,
    rules: &RuleSet,
) {
    let index = output.index();

    if output.raw().tx_id != context.tx_id || output.raw().block_height != context.height {
        output.set_output_type(OutputType::Invalid);
        state.violations.push(Violation::Inconsistent {
            index,
            detail: format!(
                "output of {} at height {} evaluated as {} at height {}",
                output.raw().tx_id,
                output.raw().block_height,
                context.tx_id,
                context.height
            ),
        });
        return;
    }

    if context.is_genesis {
        match state.issued.checked_add(output.value()) {
            Some(total) => {
                state.issued = total;
                output.set_output_type(OutputType::GenesisIssuance);
            }
            None => state.structural(output, format!("genesis issuance overflows at output {index}")),
        }
        return;
    }

    let matched = output
        .metadata()
        .map(|bytes| payload::decode(bytes, rules, position, count));
    match matched {
        Some(PayloadMatch::Recognized(p)) => {
            apply_payload(state, output, p, context);
            return;
        }
        Some(PayloadMatch::Malformed(e)) => {
            state.structural(output, e.to_string());
            return;
        }
        // Zero-value data carrier. A value-bearing output with a foreign
        // payload is still a transfer or change output.
        Some(PayloadMatch::Unrecognized) if output.value() == 0 => {
            output.set_output_type(OutputType::OpaqueMetadata);
            return;
        }
        Some(PayloadMatch::Unrecognized) | None => {}
    }

    let value = output.value();
    if state.remaining > 0 && state.remaining >= value {
        state.remaining -= value;
        output.set_output_type(OutputType::ValueTransfer);
    } else {
        output.set_output_type(OutputType::BaseCurrencyChange);
    }
}

fn apply_payload(
    state: &mut ClassifierState,
    output: &mut WorkingOutput,
    payload: Payload,
    context: &TxContext,
) {
    let index = output.index();
    match payload {
        Payload::BondLock { duration, .. } => {
            if output.value() == 0 {
                state.structural(output, "bond lock carries no value".into());
                return;
            }
            let Some(threshold) = context.height.checked_add(BlockHeight::from(duration)) else {
                state.structural(output, format!("bond threshold overflows at duration {duration}"));
                return;
            };
            output.set_output_type(OutputType::BondLock);
            output.set_lock_threshold(threshold);
            state.consume(index, output.value());
        }
        Payload::BondUnlock { target, .. } => {
            if target.tx_id == context.tx_id {
                state.structural(output, format!("unlock targets its own transaction output {target}"));
                return;
            }
            output.set_output_type(OutputType::BondUnlock);
            output.set_bond_target(target);
            state.consume(index, output.value());
        }
        Payload::VoteReveal { .. } => output.set_output_type(OutputType::VoteReveal),
        Payload::ProposalFee { fee, .. } => {
            output.set_output_type(OutputType::ProposalFee);
            if state.consume(index, fee) {
                state.burnt_fees = state.burnt_fees.saturating_add(fee);
            }
        }
    }
}
