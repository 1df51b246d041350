use thiserror::Error;

/// Fatal ledger failures.
///
/// Bad transactions are never reported through this type; they come back as
/// [`CommitOutcome::Rejected`](crate::CommitOutcome::Rejected). Any
/// `LedgerError` means processing must halt for operator intervention.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger corruption: {0}")]
    Corruption(String),

    #[error("classified output refused to freeze: {0}")]
    Freeze(#[from] tint_types::FreezeError),

    #[error("storage error: {0}")]
    Storage(#[from] tint_store::StoreError),
}
