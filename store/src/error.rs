use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}
