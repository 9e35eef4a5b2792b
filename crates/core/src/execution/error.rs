//! Execution error taxonomy.

use thiserror::Error;

use super::store::StoreError;

/// Errors raised while applying a plan to the ledger.
///
/// Exactly one class is replanable: a conditional update that affected zero
/// rows because the ledger moved since planning. Everything else either
/// requires a different request from the caller or indicates state the
/// system must not touch again automatically.
#[derive(Debug, Error)]
pub enum ExecutionError {
    // ========== Client Errors ==========
    /// A transaction with this id already exists.
    #[error("Transaction {0} already exists")]
    TransactionExists(String),

    // ========== Replanable Conflicts ==========
    /// A Value's funds or uses were insufficient at execution time.
    #[error("Value {value_id} no longer has sufficient funds or uses; replan against fresh state")]
    ReplanableConflict {
        /// The Value whose conditional update affected zero rows.
        value_id: String,
    },

    // ========== Fatal Inconsistencies ==========
    /// A conditional update touched more than one row (duplicate keys).
    #[error("Conditional update on value {value_id} affected {affected} rows")]
    MultiRowUpdate {
        /// The Value whose update misbehaved.
        value_id: String,
        /// The observed affected-row count.
        affected: u64,
    },

    /// A Value could not be re-read after a successful update.
    #[error("Value {value_id} could not be re-read after update")]
    RefetchFailed {
        /// The Value that vanished between update and re-read.
        value_id: String,
    },

    /// The predecessor transaction already has a successor.
    #[error("Transaction {transaction_id} is already chained to a successor")]
    ChainConflict {
        /// The predecessor whose `next_transaction_id` was already set.
        transaction_id: String,
    },

    // ========== Store Errors ==========
    /// The ledger store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExecutionError {
    /// Returns true if the caller should re-resolve steps and recompute a
    /// plan against fresh ledger state.
    #[must_use]
    pub fn replanable(&self) -> bool {
        matches!(self, Self::ReplanableConflict { .. })
    }

    /// Returns true for invariant violations that must never be retried:
    /// retrying could double-apply funds.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MultiRowUpdate { .. } | Self::RefetchFailed { .. } | Self::ChainConflict { .. }
        )
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TransactionExists(_) => "TRANSACTION_EXISTS",
            Self::ReplanableConflict { .. } => "REPLANABLE_CONFLICT",
            Self::MultiRowUpdate { .. } => "MULTI_ROW_UPDATE",
            Self::RefetchFailed { .. } => "REFETCH_FAILED",
            Self::ChainConflict { .. } => "CHAIN_CONFLICT",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::TransactionExists(_) | Self::ReplanableConflict { .. } => 409,
            Self::MultiRowUpdate { .. }
            | Self::RefetchFailed { .. }
            | Self::ChainConflict { .. }
            | Self::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_zero_row_conflicts_are_replanable() {
        assert!(
            ExecutionError::ReplanableConflict {
                value_id: "v-1".to_string()
            }
            .replanable()
        );
        assert!(!ExecutionError::TransactionExists("t-1".to_string()).replanable());
        assert!(
            !ExecutionError::ChainConflict {
                transaction_id: "t-1".to_string()
            }
            .replanable()
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(
            ExecutionError::MultiRowUpdate {
                value_id: "v-1".to_string(),
                affected: 2
            }
            .is_fatal()
        );
        assert!(
            ExecutionError::RefetchFailed {
                value_id: "v-1".to_string()
            }
            .is_fatal()
        );
        assert!(
            !ExecutionError::ReplanableConflict {
                value_id: "v-1".to_string()
            }
            .is_fatal()
        );
        assert!(!ExecutionError::TransactionExists("t-1".to_string()).is_fatal());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ExecutionError::TransactionExists("t-1".to_string()).http_status_code(),
            409
        );
        assert_eq!(
            ExecutionError::MultiRowUpdate {
                value_id: "v-1".to_string(),
                affected: 3
            }
            .http_status_code(),
            500
        );
    }
}
