//! Ledger execution.
//!
//! Planning is pure computation; this module is where a winning plan meets
//! the mutable ledger. Concurrency correctness is pushed entirely onto the
//! storage layer: every balance mutation and chain-link mutation states its
//! precondition in a conditional update, and the executor classifies the
//! affected-row count as success, replanable conflict, or fatal
//! inconsistency.
//!
//! # Modules
//!
//! - `store` - The ledger store contract (queries, conditional updates, rows)
//! - `executor` - Plan execution with replan-on-conflict semantics
//! - `error` - Execution error taxonomy with the `replanable` classification

pub mod error;
pub mod executor;
pub mod store;

pub use error::ExecutionError;
pub use executor::{PersistedTransaction, TransactionExecutor};
pub use store::{LedgerStore, StoreError, TransactionRow, TransactionStepRow, ValueDraw};
