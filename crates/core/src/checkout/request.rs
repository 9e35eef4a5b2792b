//! Checkout request types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One purchasable line of a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Price per unit in minor currency units.
    pub unit_price: i64,
    /// Number of units (defaults to 1).
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Tax rate as a fraction (e.g. `0.08`); negative rates produce no tax.
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Free-form tags, visible to rule evaluation.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Caller-supplied metadata, visible to rule evaluation.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_quantity() -> i64 {
    1
}

/// How resolution treats parties that exist but cannot transact
/// (inactive, frozen, canceled, outside their date window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonTransactableHandling {
    /// Fail resolution with an `InvalidParty` error.
    Error,
    /// Silently drop the party from the step list.
    Exclude,
}

/// Policy flags for payment-party resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Treatment of non-transactable parties.
    pub non_transactable: NonTransactableHandling,
    /// Whether zero-balance Values may resolve.
    pub include_zero_balance: bool,
    /// Whether zero-uses Values may resolve.
    pub include_zero_uses: bool,
}

impl ResolveOptions {
    /// Checkout policy: drop anything that cannot contribute funds.
    #[must_use]
    pub fn for_checkout() -> Self {
        Self {
            non_transactable: NonTransactableHandling::Exclude,
            include_zero_balance: false,
            include_zero_uses: false,
        }
    }

    /// Strict policy for named sources/destinations: the party must exist,
    /// even when it currently holds nothing.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            non_transactable: NonTransactableHandling::Error,
            include_zero_balance: true,
            include_zero_uses: true,
        }
    }
}

/// A lightrail payment party, addressed one of three ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LightrailSource {
    /// Directly by Value id.
    ValueId {
        /// The Value's id.
        value_id: String,
    },
    /// By redemption code.
    Code {
        /// The full redemption code.
        code: String,
    },
    /// All redeemable Values attached to a contact.
    ContactId {
        /// The contact's id.
        contact_id: String,
    },
}

/// A card payment party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeSource {
    /// Tokenized payment source.
    #[serde(default)]
    pub source: Option<String>,
    /// Stored customer reference.
    #[serde(default)]
    pub customer: Option<String>,
    /// Cap on the charge in minor units. `None` means uncapped.
    #[serde(default)]
    pub max_amount: Option<i64>,
}

/// An internal-balance payment party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalSource {
    /// Caller-assigned balance identifier.
    pub internal_id: String,
    /// Funds available in minor units.
    pub balance: i64,
    /// Whether this balance applies before tax is computed.
    #[serde(default)]
    pub pretax: bool,
    /// Whether this balance draws before lightrail steps.
    #[serde(default)]
    pub before_lightrail: bool,
}

/// An abstract payment-party descriptor, one per rail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rail", rename_all = "lowercase")]
pub enum PaymentSource {
    /// Ledger-held Value(s).
    Lightrail(LightrailSource),
    /// External card charge.
    Stripe(StripeSource),
    /// Caller-managed internal balance.
    Internal(InternalSource),
}

/// A checkout to plan and settle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Caller-assigned transaction id.
    pub id: String,
    /// Settlement currency; payment parties must match it.
    pub currency: String,
    /// Lines being purchased.
    pub line_items: Vec<LineItem>,
    /// Payment parties to draw on.
    pub sources: Vec<PaymentSource>,
    /// Whether a plan that leaves part of the payable unpaid is acceptable.
    #[serde(default)]
    pub allow_remainder: bool,
    /// Caller-supplied metadata, visible to rule evaluation.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}
