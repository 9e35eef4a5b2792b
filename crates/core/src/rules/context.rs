//! The read-only view handed to rule evaluation.

use crate::checkout::plan::{PlanTotals, PlannedLineItem};

/// Per-step view of the Value under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ValueRuleContext<'a> {
    /// Amount the step has drawn so far in this candidate (always <= 0).
    pub balance_change: i64,
    /// The Value's metadata.
    pub metadata: Option<&'a serde_json::Value>,
}

/// Context object passed to the external rule evaluator.
///
/// Created fresh for every (step, line item) evaluation and never persisted.
/// Totals are an interim snapshot summed from the line items as they stand
/// at evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Interim plan totals at the moment of evaluation.
    pub totals: PlanTotals,
    /// All line items of the plan, in allocation order.
    pub line_items: &'a [PlannedLineItem],
    /// The line item currently being evaluated.
    pub current_line_item: &'a PlannedLineItem,
    /// Plan-level metadata.
    pub metadata: Option<&'a serde_json::Value>,
    /// Per-step value context.
    pub value: ValueRuleContext<'a>,
}

impl<'a> RuleContext<'a> {
    /// Builds the context for evaluating a rule against one line item.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; the allocation engine only passes
    /// indices it is iterating.
    #[must_use]
    pub fn for_line_item(
        line_items: &'a [PlannedLineItem],
        index: usize,
        metadata: Option<&'a serde_json::Value>,
        value: ValueRuleContext<'a>,
    ) -> Self {
        Self {
            totals: PlanTotals::summing(line_items),
            line_items,
            current_line_item: &line_items[index],
            metadata,
            value,
        }
    }
}
