//! Applies a winning plan to the ledger.

use tracing::{error, info, warn};

use crate::checkout::plan::{LightrailStep, PlanStep, TransactionPlan};

use super::error::ExecutionError;
use super::store::{LedgerStore, TransactionRow, TransactionStepRow, ValueDraw};

/// A transaction as durably applied to the ledger.
#[derive(Debug, Clone)]
pub struct PersistedTransaction {
    /// The transaction row.
    pub transaction: TransactionRow,
    /// The per-step audit rows, in execution order.
    pub steps: Vec<TransactionStepRow>,
}

/// Executes plans against a ledger store with replan-on-conflict semantics.
pub struct TransactionExecutor<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> TransactionExecutor<'a, S> {
    /// Creates an executor over the given store.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Applies the plan's steps to the ledger in plan order.
    ///
    /// Lightrail draws go through conditional updates; losing a precondition
    /// surfaces as a replanable conflict after every already-applied draw
    /// and row has been compensated away, so a conflicting execution leaves
    /// zero ledger rows mutated. Fatal inconsistencies are surfaced as-is:
    /// the state is already suspect and unwinding it could double-apply
    /// funds.
    ///
    /// # Errors
    ///
    /// See [`ExecutionError`] for the full taxonomy and its `replanable`
    /// classification.
    pub async fn execute(
        &self,
        plan: &TransactionPlan,
    ) -> Result<PersistedTransaction, ExecutionError> {
        let transaction = TransactionRow::from_plan(plan);
        if self.store.insert_transaction(transaction.clone()).await? == 0 {
            return Err(ExecutionError::TransactionExists(plan.id.clone()));
        }

        let mut applied: Vec<ValueDraw> = Vec::new();
        let mut step_rows = Vec::with_capacity(plan.steps.len());

        for step in &plan.steps {
            let step_row = match step {
                PlanStep::Lightrail(lightrail) => {
                    match self.apply_lightrail(&plan.id, lightrail, &mut applied).await {
                        Ok(row) => row,
                        Err(err) if err.replanable() => {
                            warn!(
                                transaction_id = %plan.id,
                                value_id = %lightrail.value.id,
                                "ledger moved since planning; unwinding"
                            );
                            self.compensate(&plan.id, &applied).await;
                            return Err(err);
                        }
                        Err(err) => return Err(err),
                    }
                }
                PlanStep::Stripe(stripe) => TransactionStepRow::stripe(&plan.id, stripe),
                PlanStep::Internal(internal) => TransactionStepRow::internal(&plan.id, internal),
            };
            self.store.insert_step(step_row.clone()).await?;
            step_rows.push(step_row);
        }

        if let Some(previous) = &plan.previous_transaction_id
            && self.store.link_next_transaction(previous, &plan.id).await? != 1
        {
            return Err(ExecutionError::ChainConflict {
                transaction_id: previous.clone(),
            });
        }

        info!(
            transaction_id = %plan.id,
            steps = step_rows.len(),
            payable = plan.totals.payable,
            "transaction applied to ledger"
        );

        Ok(PersistedTransaction {
            transaction,
            steps: step_rows,
        })
    }

    /// Conditionally draws a lightrail step down and builds its audit row.
    async fn apply_lightrail(
        &self,
        transaction_id: &str,
        step: &LightrailStep,
        applied: &mut Vec<ValueDraw>,
    ) -> Result<TransactionStepRow, ExecutionError> {
        let draw = ValueDraw::from_step(step);

        let affected = self.store.apply_value_draw(&draw).await?;
        if affected == 0 {
            return Err(ExecutionError::ReplanableConflict {
                value_id: draw.value_id,
            });
        }
        if affected > 1 {
            return Err(ExecutionError::MultiRowUpdate {
                value_id: draw.value_id,
                affected,
            });
        }
        applied.push(draw);

        let refetched = self.store.get_value(&step.value.id).await?.ok_or_else(|| {
            ExecutionError::RefetchFailed {
                value_id: step.value.id.clone(),
            }
        })?;

        let balance_after = refetched.balance;
        let balance_before = balance_after.map(|balance| balance - step.amount);
        let uses_after = refetched.uses_remaining;
        let uses_before = uses_after.map(|uses| {
            if step.uses.is_some() {
                uses + 1
            } else {
                uses
            }
        });

        Ok(TransactionStepRow::lightrail(
            transaction_id,
            step,
            balance_before,
            balance_after,
            uses_before,
            uses_after,
        ))
    }

    /// Best-effort unwind of a partially applied plan.
    async fn compensate(&self, transaction_id: &str, applied: &[ValueDraw]) {
        for draw in applied {
            if let Err(err) = self.store.undo_value_draw(draw).await {
                error!(
                    transaction_id,
                    value_id = %draw.value_id,
                    %err,
                    "failed to undo value draw during compensation"
                );
            }
        }
        if let Err(err) = self.store.delete_steps(transaction_id).await {
            error!(transaction_id, %err, "failed to delete step rows during compensation");
        }
        if let Err(err) = self.store.delete_transaction(transaction_id).await {
            error!(transaction_id, %err, "failed to delete transaction row during compensation");
        }
    }
}
