//! Transaction plan domain types.
//!
//! A [`TransactionPlan`] is the outcome of allocating one candidate step
//! ordering against a checkout request: line items with their running
//! totals, the rail-typed steps that fund them, and the aggregate totals
//! the selector minimizes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::values::Value;

use super::request::LineItem;

/// Payment source category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rail {
    /// Ledger-held Value (gift card, credit, promotion).
    Lightrail,
    /// External card charge.
    Stripe,
    /// Caller-managed internal balance.
    Internal,
}

impl std::fmt::Display for Rail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lightrail => write!(f, "lightrail"),
            Self::Stripe => write!(f, "stripe"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Multi-rail checkout settlement.
    Checkout,
    /// Reversal of a previous transaction.
    Reverse,
    /// Capture of a pending transaction.
    Capture,
    /// Void of a pending transaction.
    Void,
}

/// A draw-down against a lightrail Value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightrailStep {
    /// The Value funds are drawn from.
    pub value: Value,
    /// Accumulated draw-down in minor units (always <= 0).
    pub amount: i64,
    /// Uses consumed by this step (`Some(-1)` once the step draws anything).
    pub uses: Option<i64>,
}

/// A charge against an external card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeStep {
    /// Idempotency key for the eventual charge request.
    pub idempotency_key: String,
    /// Tokenized payment source, if supplied.
    pub source: Option<String>,
    /// Stored customer reference, if supplied.
    pub customer: Option<String>,
    /// Cap on the charge in minor units. `None` means uncapped.
    pub max_amount: Option<i64>,
    /// Accumulated charge in minor units (always <= 0).
    pub amount: i64,
}

/// A draw-down against a caller-managed internal balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalStep {
    /// Caller-assigned balance identifier.
    pub internal_id: String,
    /// Funds available in minor units.
    pub balance: i64,
    /// Whether this balance applies before tax is computed.
    pub pretax: bool,
    /// Whether this step has a fixed position before lightrail draw-down.
    pub before_lightrail: bool,
    /// Accumulated draw-down in minor units (always <= 0).
    pub amount: i64,
}

/// One rail's planned contribution to a checkout.
///
/// Adding a rail means adding a variant here and satisfying the exhaustive
/// matches in allocation, ordering, and persistence projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rail", rename_all = "lowercase")]
pub enum PlanStep {
    /// Draw-down against a Value.
    Lightrail(LightrailStep),
    /// External card charge.
    Stripe(StripeStep),
    /// Internal balance draw-down.
    Internal(InternalStep),
}

impl PlanStep {
    /// The rail this step draws on.
    #[must_use]
    pub fn rail(&self) -> Rail {
        match self {
            Self::Lightrail(_) => Rail::Lightrail,
            Self::Stripe(_) => Rail::Stripe,
            Self::Internal(_) => Rail::Internal,
        }
    }

    /// The accumulated amount drawn so far (always <= 0).
    #[must_use]
    pub fn amount(&self) -> i64 {
        match self {
            Self::Lightrail(step) => step.amount,
            Self::Stripe(step) => step.amount,
            Self::Internal(step) => step.amount,
        }
    }

    /// Clears accumulated state so the step can be re-allocated.
    pub fn reset(&mut self) {
        match self {
            Self::Lightrail(step) => {
                step.amount = 0;
                step.uses = None;
            }
            Self::Stripe(step) => step.amount = 0,
            Self::Internal(step) => step.amount = 0,
        }
    }

    /// Whether the step participates in the pre-tax phase.
    #[must_use]
    pub fn is_pre_tax(&self) -> bool {
        match self {
            Self::Lightrail(step) => step.value.pretax,
            Self::Stripe(_) => false,
            Self::Internal(step) => step.pretax,
        }
    }

    /// Deterministic sort key: rail tag, then party identifier.
    ///
    /// Used to break ties between candidate plans with equal payable.
    #[must_use]
    pub fn sort_key(&self) -> (u8, String) {
        match self {
            Self::Lightrail(step) => (0, step.value.id.clone()),
            Self::Stripe(step) => (1, step.idempotency_key.clone()),
            Self::Internal(step) => (2, step.internal_id.clone()),
        }
    }
}

/// Running money breakdown of one line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotal {
    /// `unit_price * quantity` in minor units.
    pub subtotal: i64,
    /// Subtotal less pre-tax discounts; the base tax is computed on.
    pub taxable: i64,
    /// Tax in minor units, banker's-rounded.
    pub tax: i64,
    /// Discounts applied in minor units.
    pub discount: i64,
    /// Unpaid portion in minor units. Starts at `subtotal`, grows only by
    /// tax application, and otherwise only shrinks as steps draw it down.
    pub remainder: i64,
    /// `subtotal + tax - discount`, set when allocation completes.
    pub payable: i64,
}

/// A checkout line item together with its allocation breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedLineItem {
    /// The requested line item.
    #[serde(flatten)]
    pub item: LineItem,
    /// The running money breakdown.
    pub line_total: LineTotal,
}

/// Aggregate totals summed over line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTotals {
    /// Sum of line subtotals.
    pub sub_total: i64,
    /// Sum of line taxes.
    pub tax: i64,
    /// Sum of line discounts.
    pub discount: i64,
    /// `sub_total + tax - discount`.
    pub payable: i64,
    /// Sum of unpaid line remainders (zero when fully funded).
    pub remainder: i64,
}

impl PlanTotals {
    /// Sums totals over line items as they currently stand.
    #[must_use]
    pub fn summing(line_items: &[PlannedLineItem]) -> Self {
        let mut totals = Self::default();
        for planned in line_items {
            let line = &planned.line_total;
            totals.sub_total += line.subtotal;
            totals.tax += line.tax;
            totals.discount += line.discount;
            totals.payable += line.subtotal + line.tax - line.discount;
            totals.remainder += line.remainder;
        }
        totals
    }
}

/// A concrete settlement plan for one transaction.
///
/// Constructed fresh per candidate ordering, mutated in place during
/// allocation, and immutable once it wins selection and is handed to the
/// executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPlan {
    /// Caller-assigned transaction id.
    pub id: String,
    /// Transaction classification.
    pub transaction_type: TransactionType,
    /// Settlement currency.
    pub currency: String,
    /// Line items, sorted by subtotal descending.
    pub line_items: Vec<PlannedLineItem>,
    /// Funding steps in execution order; zero-amount steps are dropped.
    pub steps: Vec<PlanStep>,
    /// Aggregate totals.
    pub totals: PlanTotals,
    /// Predecessor in a reverse/capture/void chain, if any.
    pub previous_transaction_id: Option<String>,
    /// Caller-supplied metadata, visible to rule evaluation.
    pub metadata: Option<serde_json::Value>,
    /// When the plan was created.
    pub created_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_summing() {
        let items = vec![
            PlannedLineItem {
                item: LineItem {
                    unit_price: 500,
                    quantity: 2,
                    tax_rate: rust_decimal::Decimal::ZERO,
                    tags: vec![],
                    metadata: None,
                },
                line_total: LineTotal {
                    subtotal: 1000,
                    taxable: 900,
                    tax: 90,
                    discount: 100,
                    remainder: 0,
                    payable: 990,
                },
            },
            PlannedLineItem {
                item: LineItem {
                    unit_price: 250,
                    quantity: 1,
                    tax_rate: rust_decimal::Decimal::ZERO,
                    tags: vec![],
                    metadata: None,
                },
                line_total: LineTotal {
                    subtotal: 250,
                    taxable: 250,
                    tax: 0,
                    discount: 0,
                    remainder: 50,
                    payable: 250,
                },
            },
        ];

        let totals = PlanTotals::summing(&items);
        assert_eq!(totals.sub_total, 1250);
        assert_eq!(totals.tax, 90);
        assert_eq!(totals.discount, 100);
        assert_eq!(totals.payable, 1240);
        assert_eq!(totals.remainder, 50);
    }

    #[test]
    fn test_step_reset_clears_state() {
        let mut step = PlanStep::Stripe(StripeStep {
            idempotency_key: "chk-1-src-0".to_string(),
            source: Some("tok_visa".to_string()),
            customer: None,
            max_amount: Some(5000),
            amount: -1200,
        });
        step.reset();
        assert_eq!(step.amount(), 0);
    }

    #[test]
    fn test_rail_display() {
        assert_eq!(Rail::Lightrail.to_string(), "lightrail");
        assert_eq!(Rail::Stripe.to_string(), "stripe");
        assert_eq!(Rail::Internal.to_string(), "internal");
    }
}
