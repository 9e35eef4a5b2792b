//! Checkout planning error types.

use thiserror::Error;

use crate::execution::store::StoreError;
use crate::rules::error::RuleSyntaxError;

/// Errors raised while resolving parties and planning a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    // ========== Party Resolution Errors ==========
    /// A payment-party descriptor resolved to zero or an unexpected number
    /// of ledger rows.
    #[error("Invalid payment party {party}: {reason}")]
    InvalidParty {
        /// The descriptor, with sensitive codes masked.
        party: String,
        /// Why resolution rejected it.
        reason: String,
    },

    // ========== Planning Errors ==========
    /// Candidate enumeration would exceed the free-order step limit.
    #[error("Too many free-order payment sources: {count} exceeds the limit of {limit}")]
    TooManySources {
        /// Free-order steps in one tax partition.
        count: usize,
        /// The configured limit.
        limit: usize,
    },

    /// A reachable redemption or balance rule does not compile.
    #[error(transparent)]
    RuleSyntax(#[from] RuleSyntaxError),

    /// The best plan still leaves part of the payable unpaid.
    #[error("Insufficient payment sources: {remainder} remains unpaid")]
    InsufficientFunds {
        /// Unpaid minor units in the best plan found.
        remainder: i64,
    },

    // ========== Store Errors ==========
    /// The ledger store failed during resolution.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Returns true if the caller should re-resolve steps and retry.
    ///
    /// Planning errors never are; the replanable class lives in execution,
    /// where the ledger can move underneath a computed plan.
    #[must_use]
    pub const fn replanable(&self) -> bool {
        false
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParty { .. } => "INVALID_PARTY",
            Self::TooManySources { .. } => "TOO_MANY_SOURCES",
            Self::RuleSyntax(_) => "RULE_SYNTAX_ERROR",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidParty { .. } | Self::TooManySources { .. } => 400,
            Self::RuleSyntax(_) => 422,
            Self::InsufficientFunds { .. } => 409,
            Self::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CheckoutError::InvalidParty {
                party: "v-1".to_string(),
                reason: "not found".to_string()
            }
            .error_code(),
            "INVALID_PARTY"
        );
        assert_eq!(
            CheckoutError::InsufficientFunds { remainder: 250 }.error_code(),
            "INSUFFICIENT_FUNDS"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CheckoutError::TooManySources { count: 9, limit: 7 }.http_status_code(),
            400
        );
        assert_eq!(
            CheckoutError::InsufficientFunds { remainder: 1 }.http_status_code(),
            409
        );
        assert_eq!(
            CheckoutError::RuleSyntax(RuleSyntaxError {
                message: "bad".to_string(),
                row: 1,
                column: 2
            })
            .http_status_code(),
            422
        );
    }

    #[test]
    fn test_display() {
        let err = CheckoutError::TooManySources { count: 9, limit: 7 };
        assert_eq!(
            err.to_string(),
            "Too many free-order payment sources: 9 exceeds the limit of 7"
        );
    }
}
