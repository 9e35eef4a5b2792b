//! The allocation engine.
//!
//! Walks one candidate ordering over the checkout's line items and produces
//! a concrete [`TransactionPlan`]: pre-tax steps draw first, tax is applied
//! to what they left taxable, post-tax steps draw the rest. All step state
//! is reset up front so a candidate can be evaluated any number of times.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use splitrail_shared::types::money::{round_tax, to_minor_units};

use crate::rules::cache::RuleCache;
use crate::rules::context::{RuleContext, ValueRuleContext};
use crate::values::eligibility::is_redeemable;

use super::orderings::CandidateOrdering;
use super::plan::{
    InternalStep, LightrailStep, LineTotal, PlanStep, PlanTotals, PlannedLineItem, StripeStep,
    TransactionPlan, TransactionType,
};
use super::request::{CheckoutRequest, LineItem};

/// Allocates the checkout across one candidate step ordering.
///
/// Deterministic for a given input: line items are visited in descending
/// subtotal order and steps in the candidate's order, so re-running the
/// same candidate yields an identical plan.
#[must_use]
pub fn allocate(
    request: &CheckoutRequest,
    candidate: &mut CandidateOrdering,
    rules: &RuleCache,
    now: DateTime<Utc>,
) -> TransactionPlan {
    // A step list may be evaluated across many candidates; shed any state.
    for step in candidate.pre_tax.iter_mut().chain(candidate.post_tax.iter_mut()) {
        step.reset();
    }

    let mut line_items = build_line_items(&request.line_items);
    let metadata = request.metadata.as_ref();

    process_steps(&mut line_items, &mut candidate.pre_tax, rules, metadata, now);
    apply_tax(&mut line_items);
    process_steps(&mut line_items, &mut candidate.post_tax, rules, metadata, now);

    for planned in &mut line_items {
        let line = &mut planned.line_total;
        line.payable = line.subtotal + line.tax - line.discount;
    }
    let totals = PlanTotals::summing(&line_items);

    // Steps that contributed nothing do not appear in the persisted plan.
    let steps: Vec<PlanStep> = candidate
        .pre_tax
        .iter()
        .chain(candidate.post_tax.iter())
        .filter(|step| step.amount() != 0)
        .cloned()
        .collect();

    TransactionPlan {
        id: request.id.clone(),
        transaction_type: TransactionType::Checkout,
        currency: request.currency.clone(),
        line_items,
        steps,
        totals,
        previous_transaction_id: None,
        metadata: request.metadata.clone(),
        created_date: now,
    }
}

/// Builds the plan's line items, largest subtotal first.
fn build_line_items(items: &[LineItem]) -> Vec<PlannedLineItem> {
    let mut line_items: Vec<PlannedLineItem> = items
        .iter()
        .map(|item| {
            let subtotal = item.unit_price * item.quantity;
            PlannedLineItem {
                item: item.clone(),
                line_total: LineTotal {
                    subtotal,
                    remainder: subtotal,
                    ..LineTotal::default()
                },
            }
        })
        .collect();

    // Stable sort: equal subtotals keep request order.
    line_items.sort_by(|a, b| b.line_total.subtotal.cmp(&a.line_total.subtotal));
    line_items
}

/// Taxes each line on what pre-tax steps left taxable.
fn apply_tax(line_items: &mut [PlannedLineItem]) {
    for planned in line_items {
        let line = &mut planned.line_total;
        line.taxable = line.subtotal - line.discount;
        line.tax = round_tax(planned.item.tax_rate, line.taxable);
        line.remainder += line.tax;
    }
}

/// Runs one phase's steps, in order, dispatching on rail.
fn process_steps(
    line_items: &mut [PlannedLineItem],
    steps: &mut [PlanStep],
    rules: &RuleCache,
    metadata: Option<&serde_json::Value>,
    now: DateTime<Utc>,
) {
    for step in steps {
        match step {
            PlanStep::Lightrail(lightrail) => {
                apply_lightrail_step(line_items, lightrail, rules, metadata, now);
            }
            PlanStep::Stripe(stripe) => apply_stripe_step(line_items, stripe),
            PlanStep::Internal(internal) => apply_internal_step(line_items, internal),
        }
    }
}

/// Draws a Value down across the line items.
fn apply_lightrail_step(
    line_items: &mut [PlannedLineItem],
    step: &mut LightrailStep,
    rules: &RuleCache,
    metadata: Option<&serde_json::Value>,
    now: DateTime<Utc>,
) {
    if !is_redeemable(&step.value, now) {
        return;
    }

    for index in 0..line_items.len() {
        let remainder = line_items[index].line_total.remainder;
        if remainder <= 0 {
            continue;
        }

        if let Some(source) = &step.value.redemption_rule {
            let applies = {
                let context = RuleContext::for_line_item(
                    &*line_items,
                    index,
                    metadata,
                    ValueRuleContext {
                        balance_change: step.amount,
                        metadata: step.value.metadata.as_ref(),
                    },
                );
                rules.get(source).evaluate_to_boolean(&context)
            };
            if !applies {
                continue; // rule says not this item; keep walking
            }
        }

        let amount = if let Some(source) = &step.value.balance_rule {
            let evaluated = {
                let context = RuleContext::for_line_item(
                    &*line_items,
                    index,
                    metadata,
                    ValueRuleContext {
                        balance_change: step.amount,
                        metadata: step.value.metadata.as_ref(),
                    },
                );
                rules.get(source).evaluate_to_number(&context)
            };
            // Non-numeric and negative results are a zero draw.
            let units = evaluated
                .filter(|value| *value > Decimal::ZERO)
                .map(to_minor_units)
                .unwrap_or(0);
            units.min(remainder)
        } else {
            let available = step.value.balance.unwrap_or(0) + step.amount;
            remainder.min(available)
        };
        if amount <= 0 {
            continue;
        }

        step.amount -= amount;
        let line = &mut line_items[index].line_total;
        line.remainder -= amount;
        if step.value.discount {
            line.discount += amount;
        }
        // One use per step, no matter how many line items it touches.
        if step.value.tracks_uses() && step.uses.is_none() {
            step.uses = Some(-1);
        }
    }
}

/// Accumulates a card charge up to `max_amount` across the line items.
fn apply_stripe_step(line_items: &mut [PlannedLineItem], step: &mut StripeStep) {
    for planned in line_items.iter_mut() {
        let line = &mut planned.line_total;
        if line.remainder <= 0 {
            continue;
        }
        let available = match step.max_amount {
            Some(max) => max + step.amount,
            None => line.remainder,
        };
        let amount = line.remainder.min(available);
        if amount <= 0 {
            break; // cap reached
        }
        step.amount -= amount;
        line.remainder -= amount;
    }
}

/// Draws an internal balance down across the line items.
fn apply_internal_step(line_items: &mut [PlannedLineItem], step: &mut InternalStep) {
    for planned in line_items.iter_mut() {
        let line = &mut planned.line_total;
        if line.remainder <= 0 {
            continue;
        }
        let available = step.balance + step.amount;
        let amount = line.remainder.min(available);
        if amount <= 0 {
            break; // balance exhausted
        }
        step.amount -= amount;
        line.remainder -= amount;
    }
}
