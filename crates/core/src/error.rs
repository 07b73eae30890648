//! Migration error taxonomy.
//!
//! Chain calls return `anyhow::Result`; these variants classify the failure by
//! what the caller should do next (retry the read, re-plan later, reset the
//! sequencer, or give up on this account).

use crate::sequencer::MigrationState;
use alloy::primitives::{B256, U256};
use migrator_chain::TransactionReverted;

pub type MigrationResult<T> = Result<T, MigrationError>;

/// Why a position cannot be migrated as it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionShortfall {
    #[error("no collateral supplied to the source market")]
    NoCollateral,
    #[error("no debt in the source market")]
    NoDebt,
    #[error("destination debt {debt} is below the minimum {minimum}")]
    BelowMinimumDebt { debt: U256, minimum: U256 },
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Transport-level read failure. Retryable.
    #[error("read failed: {context}")]
    ReadFailure {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("position not migratable: {0}")]
    InsufficientPosition(PositionShortfall),

    /// Removing the collateral would leave the account under water.
    #[error("insufficient liquidity: removal needs {required} USD, {available} available")]
    InsufficientLiquidity { required: U256, available: U256 },

    /// Sorted-list search failed. Pure read, retryable.
    #[error("insertion hint lookup failed")]
    HintLookupFailed(#[source] anyhow::Error),

    /// The atomic migration reverted; nothing changed on chain.
    #[error("migration reverted: {tx_hash}")]
    ExecutionReverted { tx_hash: B256 },

    /// An approval or source-market write was mined but reverted.
    #[error("{context} reverted: {tx_hash}")]
    StepReverted { context: String, tx_hash: B256 },

    #[error("submission failed: {context}")]
    SubmissionFailed {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid state transition {from:?} -> {to:?}")]
    InvalidState {
        from: MigrationState,
        to: MigrationState,
    },

    #[error("planning exceeded its deadline after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("insufficient funds: need {required}, wallet holds {available}")]
    InsufficientFunds { required: U256, available: U256 },

    /// Caller-supplied amounts that can never produce a valid write.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl MigrationError {
    pub fn read(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ReadFailure {
            context: context.into(),
            source,
        }
    }

    /// Classify an approval or source-write error: reverted receipts become
    /// [`MigrationError::StepReverted`] with the step kept, anything else
    /// [`MigrationError::SubmissionFailed`].
    pub fn submission(context: impl Into<String>, source: anyhow::Error) -> Self {
        let context = context.into();
        match source.downcast_ref::<TransactionReverted>() {
            Some(reverted) => Self::StepReverted {
                context,
                tx_hash: reverted.tx_hash,
            },
            None => Self::SubmissionFailed { context, source },
        }
    }

    /// Classify an error from the migration call itself. Only here does a
    /// revert mean the atomic migration rolled back.
    pub fn migration(source: anyhow::Error) -> Self {
        match source.downcast_ref::<TransactionReverted>() {
            Some(reverted) => Self::ExecutionReverted {
                tx_hash: reverted.tx_hash,
            },
            None => Self::SubmissionFailed {
                context: "migrate".to_string(),
                source,
            },
        }
    }

    /// Whether retrying the same step can succeed without changing the plan.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ReadFailure { .. } | Self::HintLookupFailed(_) | Self::DeadlineExceeded { .. }
        )
    }
}
