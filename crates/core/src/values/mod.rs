//! Redeemable balance holders.
//!
//! A [`Value`] is anything a checkout can draw funds from on the lightrail
//! rail: a gift card, an account credit, a promotion. This module defines
//! the type and the transactability checks applied during resolution and
//! allocation.

pub mod eligibility;
pub mod types;

pub use eligibility::{date_window_contains, is_redeemable, is_transactable};
pub use types::Value;
