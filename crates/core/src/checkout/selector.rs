//! Plan selection over candidate orderings.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use splitrail_shared::config::PlannerConfig;

use crate::rules::cache::RuleCache;

use super::allocation::allocate;
use super::error::CheckoutError;
use super::orderings::{CandidateOrdering, candidate_orderings};
use super::plan::{PlanStep, TransactionPlan};
use super::request::CheckoutRequest;

/// Ranking key for a candidate plan: payable first, then a deterministic
/// tie-break on step count and per-step sort keys, so the winner never
/// depends on enumeration order.
type PlanRank = (i64, usize, Vec<(u8, String)>);

fn rank(plan: &TransactionPlan) -> PlanRank {
    (
        plan.totals.payable,
        plan.steps.len(),
        plan.steps.iter().map(PlanStep::sort_key).collect(),
    )
}

/// Selects the cheapest settlement plan for a checkout.
pub struct Planner<'a> {
    rules: &'a RuleCache,
    config: PlannerConfig,
}

impl<'a> Planner<'a> {
    /// Creates a planner with default configuration.
    #[must_use]
    pub fn new(rules: &'a RuleCache) -> Self {
        Self::with_config(rules, PlannerConfig::default())
    }

    /// Creates a planner with explicit configuration.
    #[must_use]
    pub fn with_config(rules: &'a RuleCache, config: PlannerConfig) -> Self {
        Self { rules, config }
    }

    /// Allocates every candidate ordering and keeps the plan with the
    /// lowest payable.
    ///
    /// With no steps supplied this degenerates to a single zero-step plan
    /// reflecting an unfunded checkout.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::RuleSyntax`] when a reachable rule does not
    ///   compile (checked before any allocation).
    /// - [`CheckoutError::TooManySources`] when enumeration would exceed
    ///   the configured free-order step limit.
    /// - [`CheckoutError::InsufficientFunds`] when the best plan leaves a
    ///   remainder and the request does not allow one.
    pub fn select_best_plan(
        &self,
        request: &CheckoutRequest,
        steps: &[PlanStep],
        now: DateTime<Utc>,
    ) -> Result<TransactionPlan, CheckoutError> {
        self.validate_rules(steps)?;

        let mut candidates = candidate_orderings(steps, self.config.max_free_order_steps)?;
        debug!(
            transaction_id = %request.id,
            candidates = candidates.len(),
            "enumerating candidate orderings"
        );

        let mut best: Option<(PlanRank, TransactionPlan)> = None;
        for candidate in &mut candidates {
            let plan = allocate(request, candidate, self.rules, now);
            let plan_rank = rank(&plan);
            let is_better = match &best {
                Some((best_rank, _)) => plan_rank < *best_rank,
                None => true,
            };
            if is_better {
                best = Some((plan_rank, plan));
            }
        }

        let plan = match best {
            Some((_, plan)) => plan,
            // candidate_orderings always yields at least one ordering; this
            // arm also covers a caller passing no steps explicitly.
            None => allocate(request, &mut CandidateOrdering::default(), self.rules, now),
        };

        if plan.totals.remainder > 0 && !request.allow_remainder {
            return Err(CheckoutError::InsufficientFunds {
                remainder: plan.totals.remainder,
            });
        }

        info!(
            transaction_id = %request.id,
            payable = plan.totals.payable,
            remainder = plan.totals.remainder,
            steps = plan.steps.len(),
            "selected settlement plan"
        );
        Ok(plan)
    }

    /// Surfaces rule compile errors before allocation begins.
    fn validate_rules(&self, steps: &[PlanStep]) -> Result<(), CheckoutError> {
        for step in steps {
            if let PlanStep::Lightrail(lightrail) = step {
                let sources = [
                    lightrail.value.redemption_rule.as_deref(),
                    lightrail.value.balance_rule.as_deref(),
                ];
                for source in sources.into_iter().flatten() {
                    self.rules.validate(source)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::plan::LightrailStep;
    use crate::rules::testing::StubCompiler;
    use crate::values::Value;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn no_rules() -> RuleCache {
        RuleCache::new(Arc::new(StubCompiler::new()))
    }

    fn value(id: &str, balance: i64) -> Value {
        Value {
            id: id.to_string(),
            currency: "USD".to_string(),
            balance: Some(balance),
            uses_remaining: None,
            balance_rule: None,
            redemption_rule: None,
            active: true,
            frozen: false,
            canceled: false,
            discount: false,
            pretax: false,
            start_date: None,
            end_date: None,
            code: None,
            contact_id: None,
            metadata: None,
        }
    }

    fn lightrail(value: Value) -> PlanStep {
        PlanStep::Lightrail(LightrailStep {
            value,
            amount: 0,
            uses: None,
        })
    }

    fn request(items: Vec<(i64, i64)>, allow_remainder: bool) -> CheckoutRequest {
        CheckoutRequest {
            id: "chk-1".to_string(),
            currency: "USD".to_string(),
            line_items: items
                .into_iter()
                .map(|(unit_price, quantity)| crate::checkout::request::LineItem {
                    unit_price,
                    quantity,
                    tax_rate: Decimal::ZERO,
                    tags: vec![],
                    metadata: None,
                })
                .collect(),
            sources: vec![],
            allow_remainder,
            metadata: None,
        }
    }

    #[test]
    fn test_discount_first_ordering_wins() {
        let mut promo = value("promo", 500);
        promo.discount = true;
        let steps = [lightrail(promo), lightrail(value("gift", 1000))];

        // Discount-first: promo covers 500 as discount, gift pays the rest
        // -> payable 500. Gift-first: gift covers all 1000 -> payable 1000.
        let request = request(vec![(1000, 1)], false);
        let plan = Planner::new(&no_rules())
            .select_best_plan(&request, &steps, now())
            .unwrap();

        assert_eq!(plan.totals.payable, 500);
        assert_eq!(plan.totals.discount, 500);
        assert_eq!(plan.totals.remainder, 0);
        let PlanStep::Lightrail(first) = &plan.steps[0] else {
            panic!("expected lightrail step");
        };
        assert_eq!(first.value.id, "promo");
    }

    #[test]
    fn test_no_steps_yields_unfunded_plan() {
        let request = request(vec![(750, 1)], true);
        let plan = Planner::new(&no_rules())
            .select_best_plan(&request, &[], now())
            .unwrap();

        assert!(plan.steps.is_empty());
        assert_eq!(plan.totals.remainder, 750);
        assert_eq!(plan.totals.payable, 750);
    }

    #[test]
    fn test_unpaid_remainder_rejected_unless_allowed() {
        let request = request(vec![(750, 1)], false);
        let err = Planner::new(&no_rules())
            .select_best_plan(&request, &[lightrail(value("gift", 100))], now())
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientFunds { remainder: 650 }
        ));
    }

    #[test]
    fn test_equal_payable_breaks_ties_lexicographically() {
        // Either value alone covers the item; both orderings cost the same.
        let steps = [lightrail(value("b", 1000)), lightrail(value("a", 1000))];
        let request = request(vec![(600, 1)], false);
        let plan = Planner::new(&no_rules())
            .select_best_plan(&request, &steps, now())
            .unwrap();

        assert_eq!(plan.steps.len(), 1);
        let PlanStep::Lightrail(step) = &plan.steps[0] else {
            panic!("expected lightrail step");
        };
        assert_eq!(step.value.id, "a");
    }

    #[test]
    fn test_rule_syntax_surfaces_before_allocation() {
        let rules = RuleCache::new(Arc::new(StubCompiler::new().with_error(
            "1 +",
            "unexpected end of rule",
            1,
            4,
        )));
        let mut gated = value("gated", 500);
        gated.redemption_rule = Some("1 +".to_string());

        let request = request(vec![(400, 1)], true);
        let err = Planner::new(&rules)
            .select_best_plan(&request, &[lightrail(gated)], now())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::RuleSyntax(_)));
    }

    #[test]
    fn test_free_order_limit_comes_from_config() {
        let config = PlannerConfig {
            max_free_order_steps: 1,
        };
        let steps = [lightrail(value("a", 100)), lightrail(value("b", 100))];
        let request = request(vec![(400, 1)], true);
        let rules = no_rules();

        let err = Planner::with_config(&rules, config)
            .select_best_plan(&request, &steps, now())
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::TooManySources { count: 2, limit: 1 }
        ));
    }
}
