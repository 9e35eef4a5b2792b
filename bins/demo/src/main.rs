//! End-to-end checkout demo for Splitrail.
//!
//! Seeds an in-memory ledger with a gift card and a taxed-items-only
//! promotion, then resolves, plans, and executes a checkout against it.
//!
//! Usage: cargo run --bin demo

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use splitrail_core::checkout::{
    CheckoutRequest, LightrailSource, LineItem, PaymentSource, Planner, ResolveOptions,
    StripeSource, resolve_checkout_steps,
};
use splitrail_core::execution::{LedgerStore, TransactionExecutor};
use splitrail_core::rules::{CompiledRule, RuleCache, RuleCompiler, RuleContext, RuleSyntaxError};
use splitrail_core::values::Value;
use splitrail_shared::AppConfig;
use splitrail_store::InMemoryLedgerStore;

/// The one rule the demo's compiler understands.
const TAXED_ITEMS_ONLY: &str = "currentLineItem.taxRate > 0";

/// Stand-in for the production rule engine with a fixed vocabulary.
struct DemoCompiler;

struct TaxedItemsOnly;

impl CompiledRule for TaxedItemsOnly {
    fn compile_error(&self) -> Option<&RuleSyntaxError> {
        None
    }

    fn evaluate_to_number(&self, _context: &RuleContext<'_>) -> Option<Decimal> {
        None
    }

    fn evaluate_to_boolean(&self, context: &RuleContext<'_>) -> bool {
        context.current_line_item.item.tax_rate > Decimal::ZERO
    }
}

struct UnknownRule(RuleSyntaxError);

impl CompiledRule for UnknownRule {
    fn compile_error(&self) -> Option<&RuleSyntaxError> {
        Some(&self.0)
    }

    fn evaluate_to_number(&self, _context: &RuleContext<'_>) -> Option<Decimal> {
        None
    }

    fn evaluate_to_boolean(&self, _context: &RuleContext<'_>) -> bool {
        false
    }
}

impl RuleCompiler for DemoCompiler {
    fn compile(&self, source: &str) -> Arc<dyn CompiledRule> {
        if source == TAXED_ITEMS_ONLY {
            Arc::new(TaxedItemsOnly)
        } else {
            Arc::new(UnknownRule(RuleSyntaxError {
                message: format!("unknown rule: {source}"),
                row: 1,
                column: 1,
            }))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitrail=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    let store = InMemoryLedgerStore::new();
    seed_values(&store);
    info!("Seeded in-memory ledger");

    let request = demo_checkout();
    let now = Utc::now();

    let steps =
        resolve_checkout_steps(&store, &request, ResolveOptions::for_checkout(), now).await?;
    info!(steps = steps.len(), "Resolved payment parties");

    let rules = RuleCache::new(Arc::new(DemoCompiler));
    let planner = Planner::with_config(&rules, config.planner);
    let plan = planner.select_best_plan(&request, &steps, now)?;
    info!(
        payable = plan.totals.payable,
        discount = plan.totals.discount,
        tax = plan.totals.tax,
        "Selected settlement plan"
    );

    let persisted = TransactionExecutor::new(&store).execute(&plan).await?;
    info!(
        transaction_id = %persisted.transaction.id,
        steps = persisted.steps.len(),
        "Checkout settled"
    );

    let gift_card = store.get_value("gift-card").await?.expect("seeded value");
    info!(balance = ?gift_card.balance, "Gift card after settlement");

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Seeds a gift card and a promotion that discounts taxed items.
fn seed_values(store: &InMemoryLedgerStore) {
    store.seed_value(Value {
        id: "gift-card".to_string(),
        currency: "USD".to_string(),
        balance: Some(5_000),
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
    });

    store.seed_value(Value {
        id: "summer-promo".to_string(),
        currency: "USD".to_string(),
        balance: Some(1_000),
        uses_remaining: Some(1),
        balance_rule: None,
        redemption_rule: Some(TAXED_ITEMS_ONLY.to_string()),
        active: true,
        frozen: false,
        canceled: false,
        discount: true,
        pretax: true,
        start_date: None,
        end_date: None,
        code: None,
        contact_id: None,
        metadata: None,
    });
}

/// A two-line checkout funded by the promo, the gift card, and a card.
fn demo_checkout() -> CheckoutRequest {
    CheckoutRequest {
        id: format!("chk-{}", Uuid::new_v4()),
        currency: "USD".to_string(),
        line_items: vec![
            LineItem {
                unit_price: 2_499,
                quantity: 1,
                tax_rate: Decimal::new(8, 2), // 8%
                tags: vec!["hardware".to_string()],
                metadata: None,
            },
            LineItem {
                unit_price: 1_500,
                quantity: 2,
                tax_rate: Decimal::ZERO,
                tags: vec!["subscription".to_string()],
                metadata: None,
            },
        ],
        sources: vec![
            PaymentSource::Lightrail(LightrailSource::ValueId {
                value_id: "summer-promo".to_string(),
            }),
            PaymentSource::Lightrail(LightrailSource::ValueId {
                value_id: "gift-card".to_string(),
            }),
            PaymentSource::Stripe(StripeSource {
                source: Some("tok_visa".to_string()),
                customer: None,
                max_amount: None,
            }),
        ],
        allow_remainder: false,
        metadata: None,
    }
}
