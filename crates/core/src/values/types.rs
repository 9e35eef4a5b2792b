//! Value domain type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A redeemable balance holder on the lightrail rail.
///
/// Exactly one of `balance` or `balance_rule` is the authority for the funds
/// available: a numeric balance is drawn down directly, while a balance rule
/// computes the contribution per line item at allocation time (and `balance`
/// stays `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    /// Caller-assigned identifier.
    pub id: String,
    /// Currency this Value holds, compared for equality with the checkout's.
    pub currency: String,
    /// Funds available in minor units. `None` means rule-governed.
    pub balance: Option<i64>,
    /// Remaining redemptions. `None` means unlimited uses.
    pub uses_remaining: Option<i64>,
    /// Rule computing the contribution per line item, in place of `balance`.
    pub balance_rule: Option<String>,
    /// Boolean rule gating which line items this Value may apply to.
    pub redemption_rule: Option<String>,
    /// Whether the Value is active.
    pub active: bool,
    /// Whether the Value is frozen (temporarily unusable).
    pub frozen: bool,
    /// Whether the Value is canceled (permanently unusable).
    pub canceled: bool,
    /// Whether amounts drawn count as discount rather than payment.
    pub discount: bool,
    /// Whether this Value applies before tax is computed.
    pub pretax: bool,
    /// Start of the redemption window, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// End of the redemption window, if any.
    pub end_date: Option<DateTime<Utc>>,
    /// Redemption code, if the Value is addressable by code.
    pub code: Option<String>,
    /// Owning contact, if the Value is attached to one.
    pub contact_id: Option<String>,
    /// Caller-supplied metadata, visible to rule evaluation.
    pub metadata: Option<serde_json::Value>,
}

impl Value {
    /// Returns true if the funds available are computed by a balance rule.
    #[must_use]
    pub fn is_rule_governed(&self) -> bool {
        self.balance_rule.is_some()
    }

    /// Returns true if redemptions are counted against `uses_remaining`.
    #[must_use]
    pub fn tracks_uses(&self) -> bool {
        self.uses_remaining.is_some()
    }
}
