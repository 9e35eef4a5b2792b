//! Integration tests for plan execution against the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use splitrail_core::checkout::{
    CheckoutRequest, LightrailSource, LineItem, PaymentSource, Planner, PlanTotals,
    ResolveOptions, StripeSource, TransactionPlan, TransactionType, resolve_checkout_steps,
};
use splitrail_core::execution::{ExecutionError, LedgerStore, TransactionExecutor};
use splitrail_core::rules::{CompiledRule, RuleCache, RuleCompiler, RuleContext};
use splitrail_core::values::Value;
use splitrail_store::InMemoryLedgerStore;

/// No rule ever reaches evaluation in these tests.
struct NoRules;

struct NeverApplies;

impl CompiledRule for NeverApplies {
    fn compile_error(&self) -> Option<&splitrail_core::rules::RuleSyntaxError> {
        None
    }

    fn evaluate_to_number(&self, _context: &RuleContext<'_>) -> Option<rust_decimal::Decimal> {
        None
    }

    fn evaluate_to_boolean(&self, _context: &RuleContext<'_>) -> bool {
        false
    }
}

impl RuleCompiler for NoRules {
    fn compile(&self, _source: &str) -> Arc<dyn CompiledRule> {
        Arc::new(NeverApplies)
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
}

fn usd_value(id: &str, balance: i64) -> Value {
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

fn checkout_request(id: &str, sources: Vec<PaymentSource>) -> CheckoutRequest {
    CheckoutRequest {
        id: id.to_string(),
        currency: "USD".to_string(),
        line_items: vec![
            LineItem {
                unit_price: 400,
                quantity: 1,
                tax_rate: dec!(0.08),
                tags: vec![],
                metadata: None,
            },
            LineItem {
                unit_price: 300,
                quantity: 1,
                tax_rate: dec!(0),
                tags: vec![],
                metadata: None,
            },
        ],
        sources,
        allow_remainder: false,
        metadata: None,
    }
}

fn by_value_id(value_id: &str) -> PaymentSource {
    PaymentSource::Lightrail(LightrailSource::ValueId {
        value_id: value_id.to_string(),
    })
}

fn uncapped_stripe() -> PaymentSource {
    PaymentSource::Stripe(StripeSource {
        source: Some("tok_visa".to_string()),
        customer: None,
        max_amount: None,
    })
}

/// Resolves and plans a checkout the way a caller would.
async fn plan_checkout(store: &InMemoryLedgerStore, request: &CheckoutRequest) -> TransactionPlan {
    let steps = resolve_checkout_steps(store, request, ResolveOptions::for_checkout(), now())
        .await
        .expect("resolution should succeed");
    let rules = RuleCache::new(Arc::new(NoRules));
    Planner::new(&rules)
        .select_best_plan(request, &steps, now())
        .expect("planning should succeed")
}

/// A steps-free plan continuing a chain, as a capture/void caller builds.
fn chain_plan(id: &str, previous: &str) -> TransactionPlan {
    TransactionPlan {
        id: id.to_string(),
        transaction_type: TransactionType::Capture,
        currency: "USD".to_string(),
        line_items: vec![],
        steps: vec![],
        totals: PlanTotals::default(),
        previous_transaction_id: Some(previous.to_string()),
        metadata: None,
        created_date: now(),
    }
}

#[tokio::test]
async fn test_checkout_plans_and_executes_end_to_end() {
    let store = InMemoryLedgerStore::new();
    store.seed_value(usd_value("gift", 500));

    let request = checkout_request("chk-1", vec![by_value_id("gift"), uncapped_stripe()]);
    let plan = plan_checkout(&store, &request).await;

    // 400 + 8% tax + 300 = 732 payable; the gift covers 500 of it.
    assert_eq!(plan.totals.payable, 732);
    assert_eq!(plan.totals.remainder, 0);
    assert_eq!(plan.steps.len(), 2);

    let executor = TransactionExecutor::new(&store);
    let persisted = executor.execute(&plan).await.unwrap();

    assert_eq!(persisted.transaction.id, "chk-1");
    assert_eq!(persisted.steps.len(), 2);

    let gift = store.get_value("gift").await.unwrap().unwrap();
    assert_eq!(gift.balance, Some(0));

    let lightrail_row = &persisted.steps[0];
    assert_eq!(lightrail_row.value_id.as_deref(), Some("gift"));
    assert_eq!(lightrail_row.amount, -500);
    assert_eq!(lightrail_row.balance_before, Some(500));
    assert_eq!(lightrail_row.balance_after, Some(0));

    let stripe_row = &persisted.steps[1];
    assert_eq!(stripe_row.idempotency_key.as_deref(), Some("chk-1-src-1"));
    assert_eq!(stripe_row.amount, -232);

    assert!(store.get_transaction("chk-1").await.unwrap().is_some());
    assert_eq!(store.steps_for("chk-1").len(), 2);
}

#[tokio::test]
async fn test_duplicate_transaction_id_is_a_client_conflict() {
    let store = InMemoryLedgerStore::new();
    store.seed_value(usd_value("gift", 2000));

    let request = checkout_request("chk-1", vec![by_value_id("gift")]);
    let plan = plan_checkout(&store, &request).await;

    let executor = TransactionExecutor::new(&store);
    executor.execute(&plan).await.unwrap();
    let balance_after_first = store.get_value("gift").await.unwrap().unwrap().balance;

    let err = executor.execute(&plan).await.unwrap_err();
    assert!(matches!(err, ExecutionError::TransactionExists(_)));
    assert!(!err.replanable());

    // The duplicate failed before touching any funds.
    let gift = store.get_value("gift").await.unwrap().unwrap();
    assert_eq!(gift.balance, balance_after_first);
}

#[tokio::test]
async fn test_stale_balance_replans_with_zero_rows_mutated() {
    let store = InMemoryLedgerStore::new();
    store.seed_value(usd_value("v-a", 500));
    store.seed_value(usd_value("v-b", 500));

    let mut request = checkout_request("chk-1", vec![by_value_id("v-a"), by_value_id("v-b")]);
    request.line_items[0].tax_rate = dec!(0);
    request.line_items[0].unit_price = 500;
    let plan = plan_checkout(&store, &request).await;
    // v-a covers 500, v-b the remaining 300.
    assert_eq!(plan.steps.len(), 2);

    // The ledger moves between planning and execution.
    store.seed_value(usd_value("v-b", 100));

    let executor = TransactionExecutor::new(&store);
    let err = executor.execute(&plan).await.unwrap_err();

    let ExecutionError::ReplanableConflict { value_id } = &err else {
        panic!("expected ReplanableConflict, got {err:?}");
    };
    assert_eq!(value_id, "v-b");
    assert!(err.replanable());
    assert!(!err.is_fatal());

    // Compensation left zero rows mutated: v-a's draw was undone and the
    // transaction and step rows are gone.
    assert_eq!(
        store.get_value("v-a").await.unwrap().unwrap().balance,
        Some(500)
    );
    assert_eq!(
        store.get_value("v-b").await.unwrap().unwrap().balance,
        Some(100)
    );
    assert!(store.get_transaction("chk-1").await.unwrap().is_none());
    assert!(store.steps_for("chk-1").is_empty());
}

#[tokio::test]
async fn test_uses_are_consumed_and_audited() {
    let store = InMemoryLedgerStore::new();
    let mut limited = usd_value("limited", 1000);
    limited.uses_remaining = Some(2);
    store.seed_value(limited);

    let request = checkout_request("chk-1", vec![by_value_id("limited")]);
    let plan = plan_checkout(&store, &request).await;
    let persisted = TransactionExecutor::new(&store)
        .execute(&plan)
        .await
        .unwrap();

    let row = &persisted.steps[0];
    assert_eq!(row.uses_remaining_before, Some(2));
    assert_eq!(row.uses_remaining_after, Some(1));

    let refetched = store.get_value("limited").await.unwrap().unwrap();
    assert_eq!(refetched.uses_remaining, Some(1));
    assert_eq!(refetched.balance, Some(1000 - 732));
}

#[tokio::test]
async fn test_chain_linking_sets_single_successor() {
    let store = InMemoryLedgerStore::new();
    store.seed_value(usd_value("gift", 2000));

    let request = checkout_request("chk-root", vec![by_value_id("gift")]);
    let plan = plan_checkout(&store, &request).await;
    let executor = TransactionExecutor::new(&store);
    executor.execute(&plan).await.unwrap();

    executor
        .execute(&chain_plan("chk-capture", "chk-root"))
        .await
        .unwrap();

    let root = store.get_transaction("chk-root").await.unwrap().unwrap();
    assert_eq!(root.next_transaction_id.as_deref(), Some("chk-capture"));

    // A second successor loses the chain race; that is fatal, not retried.
    let err = executor
        .execute(&chain_plan("chk-void", "chk-root"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::ChainConflict { .. }));
    assert!(err.is_fatal());
    assert!(!err.replanable());

    let root = store.get_transaction("chk-root").await.unwrap().unwrap();
    assert_eq!(root.next_transaction_id.as_deref(), Some("chk-capture"));
}
