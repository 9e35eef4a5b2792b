//! Core planning and execution engine for Splitrail.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, the checkout planner, and the ledger execution contract live here.
//!
//! # Modules
//!
//! - `values` - Redeemable balance holders and transactability checks
//! - `rules` - Injected rule-evaluator capability, context building, compiled-rule cache
//! - `checkout` - Step resolution, candidate enumeration, allocation, plan selection
//! - `execution` - Ledger store contract and optimistic-concurrency plan execution

pub mod checkout;
pub mod execution;
pub mod rules;
pub mod values;
