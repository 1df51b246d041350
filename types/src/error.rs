//! Errors raised by the fundamental types.

use thiserror::Error;

use crate::output_type::OutputType;
use crate::tx_id::OutputKey;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid tx id: {0}")]
    InvalidTxId(String),

    #[error("invalid rule table: {0}")]
    InvalidRuleTable(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Raised when a working output cannot be frozen into ledger state.
#[derive(Debug, Error)]
pub enum FreezeError {
    #[error("output {0} is still undefined")]
    Undefined(OutputKey),

    #[error("output {key} has type {output_type} which cannot be finalized")]
    NotFinal { key: OutputKey, output_type: OutputType },

    #[error("output {key} has lock threshold {threshold} but type {output_type}")]
    StrayLock {
        key: OutputKey,
        output_type: OutputType,
        threshold: u32,
    },

    #[error("output {0} is a bond lock without a lock threshold")]
    MissingLock(OutputKey),
}
