//! Abstract storage traits for the tint overlay ledger.
//!
//! Every backend (in-memory arena, on-disk engines owned elsewhere) implements
//! these traits. The ledger crate depends only on the traits, and it is the
//! only writer: all mutation goes through the finalizer's commit and the
//! block rollback.

pub mod commit;
pub mod error;
pub mod output;

pub use commit::{CommitRecord, TxCommit};
pub use error::StoreError;
pub use output::OutputStore;
