//! Common types used across the application.

pub mod money;

pub use money::{bankers_round, round_tax, to_minor_units};
