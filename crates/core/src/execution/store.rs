//! The ledger store contract.
//!
//! The storage engine itself is an external collaborator; this module pins
//! down the query shapes and their consistency contracts. Conditional
//! updates carry their precondition and report how many rows they touched,
//! which is the only concurrency primitive the executor relies on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::checkout::plan::{
    InternalStep, LightrailStep, PlanTotals, PlannedLineItem, Rail, StripeStep, TransactionPlan,
    TransactionType,
};
use crate::values::Value;

/// Errors surfaced by ledger store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("Ledger store failure: {0}")]
    Backend(String),
}

/// Persisted transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Caller-assigned transaction id (primary key).
    pub id: String,
    /// Transaction classification.
    pub transaction_type: TransactionType,
    /// Settlement currency.
    pub currency: String,
    /// Line items as allocated.
    pub line_items: Vec<PlannedLineItem>,
    /// Aggregate totals as allocated.
    pub totals: PlanTotals,
    /// Predecessor in a reverse/capture/void chain.
    pub previous_transaction_id: Option<String>,
    /// Successor in a chain; set at most once by a conditional update.
    pub next_transaction_id: Option<String>,
    /// Caller-supplied metadata.
    pub metadata: Option<serde_json::Value>,
    /// When the plan was created.
    pub created_date: DateTime<Utc>,
}

impl TransactionRow {
    /// Projects a winning plan into its persisted form.
    #[must_use]
    pub fn from_plan(plan: &TransactionPlan) -> Self {
        Self {
            id: plan.id.clone(),
            transaction_type: plan.transaction_type,
            currency: plan.currency.clone(),
            line_items: plan.line_items.clone(),
            totals: plan.totals,
            previous_transaction_id: plan.previous_transaction_id.clone(),
            next_transaction_id: None,
            metadata: plan.metadata.clone(),
            created_date: plan.created_date,
        }
    }
}

/// Per-step audit row, one per executed plan step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStepRow {
    /// Generated row id.
    pub id: Uuid,
    /// Owning transaction.
    pub transaction_id: String,
    /// The rail this step drew on.
    pub rail: Rail,
    /// Drawn-down Value (lightrail steps).
    pub value_id: Option<String>,
    /// Amount applied in minor units (<= 0 for draw-downs).
    pub amount: i64,
    /// Value balance before the draw, when the Value tracks a balance.
    pub balance_before: Option<i64>,
    /// Value balance after the draw, when the Value tracks a balance.
    pub balance_after: Option<i64>,
    /// Uses remaining before the draw, when the Value tracks uses.
    pub uses_remaining_before: Option<i64>,
    /// Uses remaining after the draw, when the Value tracks uses.
    pub uses_remaining_after: Option<i64>,
    /// Internal balance identifier (internal steps).
    pub internal_id: Option<String>,
    /// Charge idempotency key (stripe steps).
    pub idempotency_key: Option<String>,
}

impl TransactionStepRow {
    /// Audit row for a lightrail draw, with before/after snapshots.
    #[must_use]
    pub fn lightrail(
        transaction_id: &str,
        step: &LightrailStep,
        balance_before: Option<i64>,
        balance_after: Option<i64>,
        uses_remaining_before: Option<i64>,
        uses_remaining_after: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id: transaction_id.to_string(),
            rail: Rail::Lightrail,
            value_id: Some(step.value.id.clone()),
            amount: step.amount,
            balance_before,
            balance_after,
            uses_remaining_before,
            uses_remaining_after,
            internal_id: None,
            idempotency_key: None,
        }
    }

    /// Audit row for a card charge.
    #[must_use]
    pub fn stripe(transaction_id: &str, step: &StripeStep) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id: transaction_id.to_string(),
            rail: Rail::Stripe,
            value_id: None,
            amount: step.amount,
            balance_before: None,
            balance_after: None,
            uses_remaining_before: None,
            uses_remaining_after: None,
            internal_id: None,
            idempotency_key: Some(step.idempotency_key.clone()),
        }
    }

    /// Audit row for an internal balance draw.
    #[must_use]
    pub fn internal(transaction_id: &str, step: &InternalStep) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id: transaction_id.to_string(),
            rail: Rail::Internal,
            value_id: None,
            amount: step.amount,
            balance_before: Some(step.balance),
            balance_after: Some(step.balance + step.amount),
            uses_remaining_before: None,
            uses_remaining_after: None,
            internal_id: Some(step.internal_id.clone()),
            idempotency_key: None,
        }
    }
}

/// A conditional draw against a Value row.
///
/// `amount` is <= 0. The update must only apply when its preconditions
/// hold: `balance >= -amount` when `require_balance`, and
/// `uses_remaining > 0` when `consume_use` (which also decrements
/// `uses_remaining` by one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDraw {
    /// The Value row to mutate.
    pub value_id: String,
    /// Balance increment in minor units (<= 0 for draw-downs).
    pub amount: i64,
    /// Guard the draw on sufficient balance (Values without a balance rule).
    pub require_balance: bool,
    /// Guard on and consume one use.
    pub consume_use: bool,
}

impl ValueDraw {
    /// Builds the conditional draw for an allocated lightrail step.
    #[must_use]
    pub fn from_step(step: &LightrailStep) -> Self {
        Self {
            value_id: step.value.id.clone(),
            amount: step.amount,
            require_balance: step.value.balance_rule.is_none(),
            consume_use: step.uses.is_some(),
        }
    }
}

/// The ledger store consumed by resolution and execution.
///
/// All mutating operations return the affected-row count; the executor
/// interprets `0` as a lost precondition and `> 1` as a broken invariant.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetches a Value by id.
    async fn get_value(&self, value_id: &str) -> Result<Option<Value>, StoreError>;

    /// Fetches a Value by its redemption code.
    async fn get_value_by_code(&self, code: &str) -> Result<Option<Value>, StoreError>;

    /// Lists a contact's Values in the given currency.
    async fn list_contact_values(
        &self,
        contact_id: &str,
        currency: &str,
    ) -> Result<Vec<Value>, StoreError>;

    /// Inserts a transaction row iff the id is unused.
    ///
    /// Returns the affected-row count: `0` means a row with this id already
    /// exists.
    async fn insert_transaction(&self, row: TransactionRow) -> Result<u64, StoreError>;

    /// Removes a transaction row (compensation path). Returns affected rows.
    async fn delete_transaction(&self, transaction_id: &str) -> Result<u64, StoreError>;

    /// Conditionally applies a draw to a Value row (see [`ValueDraw`]).
    ///
    /// Returns the affected-row count: `0` means the precondition no longer
    /// holds (insufficient funds/uses, or the row vanished).
    async fn apply_value_draw(&self, draw: &ValueDraw) -> Result<u64, StoreError>;

    /// Reverses a previously applied draw (compensation path).
    async fn undo_value_draw(&self, draw: &ValueDraw) -> Result<u64, StoreError>;

    /// Inserts a step audit row.
    async fn insert_step(&self, row: TransactionStepRow) -> Result<(), StoreError>;

    /// Removes a transaction's audit rows (compensation path). Returns
    /// affected rows.
    async fn delete_steps(&self, transaction_id: &str) -> Result<u64, StoreError>;

    /// Sets `next_transaction_id` on a transaction iff it is currently
    /// unset.
    ///
    /// Returns the affected-row count: `0` means the predecessor is missing
    /// or already chained to a successor.
    async fn link_next_transaction(
        &self,
        transaction_id: &str,
        next_transaction_id: &str,
    ) -> Result<u64, StoreError>;

    /// Fetches a transaction row by id.
    async fn get_transaction(&self, transaction_id: &str)
    -> Result<Option<TransactionRow>, StoreError>;
}
