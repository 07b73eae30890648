//! Typed failures raised through `anyhow` by the chain layer.
//!
//! Callers that need to branch on a revert recover it with
//! `err.downcast_ref::<TransactionReverted>()`.

use alloy::primitives::B256;

/// A transaction was mined but its receipt reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transaction reverted: {tx_hash}")]
pub struct TransactionReverted {
    pub tx_hash: B256,
}

/// The source comptroller returned a non-zero error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("comptroller error code {code}")]
pub struct ComptrollerError {
    pub code: u64,
}
