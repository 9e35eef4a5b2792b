//! Property-based tests for the allocation engine.
//!
//! - Remainders never go negative
//! - Money is conserved: subtotal + tax = remainder + total drawn
//! - Draws never exceed the funds a step actually has
//! - Re-allocation of the same candidate is idempotent

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::rules::cache::RuleCache;
use crate::rules::testing::StubCompiler;
use crate::values::Value;

use super::allocation::allocate;
use super::orderings::CandidateOrdering;
use super::plan::{LightrailStep, PlanStep, StripeStep};
use super::request::{CheckoutRequest, LineItem};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
}

fn no_rules() -> RuleCache {
    RuleCache::new(Arc::new(StubCompiler::new()))
}

/// Strategy for a line item with a plausible price, quantity, and tax rate.
fn line_item_strategy() -> impl Strategy<Value = LineItem> {
    (
        1i64..10_000,
        1i64..4,
        prop_oneof![Just(Decimal::ZERO), Just(dec!(0.05)), Just(dec!(0.08875))],
    )
        .prop_map(|(unit_price, quantity, tax_rate)| LineItem {
            unit_price,
            quantity,
            tax_rate,
            tags: vec![],
            metadata: None,
        })
}

/// Strategy for lightrail steps: (balance, discount, pretax) triples.
fn steps_strategy() -> impl Strategy<Value = Vec<PlanStep>> {
    prop::collection::vec((0i64..5_000, any::<bool>(), any::<bool>()), 0..4).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (balance, discount, pretax))| {
                PlanStep::Lightrail(LightrailStep {
                    value: Value {
                        id: format!("v-{index}"),
                        currency: "USD".to_string(),
                        balance: Some(balance),
                        uses_remaining: None,
                        balance_rule: None,
                        redemption_rule: None,
                        active: true,
                        frozen: false,
                        canceled: false,
                        discount,
                        pretax,
                        start_date: None,
                        end_date: None,
                        code: None,
                        contact_id: None,
                        metadata: None,
                    },
                    amount: 0,
                    uses: None,
                })
            })
            .collect()
    })
}

fn build_candidate(steps: Vec<PlanStep>, with_stripe: bool) -> CandidateOrdering {
    let (pre_tax, mut post_tax): (Vec<PlanStep>, Vec<PlanStep>) =
        steps.into_iter().partition(|step| step.is_pre_tax());
    if with_stripe {
        post_tax.push(PlanStep::Stripe(StripeStep {
            idempotency_key: "chk-prop-src-9".to_string(),
            source: Some("tok_visa".to_string()),
            customer: None,
            max_amount: Some(3_000),
            amount: 0,
        }));
    }
    CandidateOrdering { pre_tax, post_tax }
}

fn build_request(line_items: Vec<LineItem>) -> CheckoutRequest {
    CheckoutRequest {
        id: "chk-prop".to_string(),
        currency: "USD".to_string(),
        line_items,
        sources: vec![],
        allow_remainder: true,
        metadata: None,
    }
}

proptest! {
    /// For all inputs, no line item's remainder goes negative, and
    /// subtotal + tax equals remainder plus everything drawn.
    #[test]
    fn test_money_is_conserved(
        items in prop::collection::vec(line_item_strategy(), 1..4),
        steps in steps_strategy(),
        with_stripe in any::<bool>(),
    ) {
        let request = build_request(items);
        let mut candidate = build_candidate(steps, with_stripe);
        let plan = allocate(&request, &mut candidate, &no_rules(), now());

        for planned in &plan.line_items {
            prop_assert!(planned.line_total.remainder >= 0);
        }

        let drawn: i64 = plan.steps.iter().map(|step| -step.amount()).sum();
        prop_assert_eq!(
            plan.totals.sub_total + plan.totals.tax,
            plan.totals.remainder + drawn
        );
    }

    /// A step never draws more than the funds it actually has.
    #[test]
    fn test_draws_never_exceed_funds(
        items in prop::collection::vec(line_item_strategy(), 1..4),
        steps in steps_strategy(),
        with_stripe in any::<bool>(),
    ) {
        let request = build_request(items);
        let mut candidate = build_candidate(steps, with_stripe);
        let plan = allocate(&request, &mut candidate, &no_rules(), now());

        for step in &plan.steps {
            match step {
                PlanStep::Lightrail(lightrail) => {
                    let balance = lightrail.value.balance.unwrap_or(0);
                    prop_assert!(-lightrail.amount <= balance);
                }
                PlanStep::Stripe(stripe) => {
                    if let Some(max) = stripe.max_amount {
                        prop_assert!(-stripe.amount <= max);
                    }
                }
                PlanStep::Internal(internal) => {
                    prop_assert!(-internal.amount <= internal.balance);
                }
            }
        }
    }

    /// Re-running allocation over the same candidate yields the same plan.
    #[test]
    fn test_reallocation_is_idempotent(
        items in prop::collection::vec(line_item_strategy(), 1..4),
        steps in steps_strategy(),
        with_stripe in any::<bool>(),
    ) {
        let request = build_request(items);
        let mut candidate = build_candidate(steps, with_stripe);
        let rules = no_rules();

        let first = allocate(&request, &mut candidate, &rules, now());
        let second = allocate(&request, &mut candidate, &rules, now());
        prop_assert_eq!(first, second);
    }
}
