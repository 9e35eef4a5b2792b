//! In-memory ledger store for Splitrail.
//!
//! Implements [`splitrail_core::execution::LedgerStore`] with per-row entry
//! locking, so every conditional update checks its precondition and mutates
//! under the same lock and reports an honest affected-row count. Used by the
//! test suites and the demo binary; a relational implementation satisfies
//! the same contract in production.

pub mod memory;

pub use memory::InMemoryLedgerStore;
