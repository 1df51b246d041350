use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] tint_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] tint_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("block file error: {0}")]
    BlockFile(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
