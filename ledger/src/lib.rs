//! Overlay ledger core.
//!
//! Raw outputs become working outputs, a fold over each transaction assigns
//! every output a type while tracking the conserved value still unassigned,
//! and the finalizer promotes a transaction into ledger state all at once or
//! not at all. Bonds are checked again whenever something spends them, and
//! whole blocks can be applied and rolled back.

pub mod block;
pub mod builder;
pub mod classifier;
pub mod error;
pub mod finalizer;
pub mod inputs;
pub mod lock;
pub mod payload;
pub mod summary;

pub use block::{Block, BlockApplier, BlockReceipt, BlockTx, RollbackReceipt, TxOutcome};
pub use builder::build_working_outputs;
pub use classifier::{classify, classify_output, ClassifiedTx, ClassifierState, TxContext, Violation};
pub use error::LedgerError;
pub use finalizer::{CommitOutcome, CommitReceipt, Finalizer, RejectReason};
pub use inputs::{resolve_inputs, LockedInput, ResolvedInputs};
pub use lock::{check_spend, spendability, Spendability};
pub use payload::{decode as decode_payload, Payload, PayloadError, PayloadKind, PayloadMatch};
pub use summary::{ledger_digest, summarize, LedgerSummary};
