//! DashMap-backed ledger store.

use async_trait::async_trait;
use dashmap::DashMap;

use splitrail_core::execution::store::{
    LedgerStore, StoreError, TransactionRow, TransactionStepRow, ValueDraw,
};
use splitrail_core::values::Value;

/// In-memory ledger store.
///
/// Each map entry locks independently, so a conditional update's check and
/// mutation happen atomically for its row, the same guarantee a relational
/// store provides through a filtered `UPDATE`. There are no multi-row
/// transactions; the executor's compensation path covers that gap.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    values: DashMap<String, Value>,
    transactions: DashMap<String, TransactionRow>,
    steps: DashMap<String, Vec<TransactionStepRow>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a Value row.
    pub fn seed_value(&self, value: Value) {
        self.values.insert(value.id.clone(), value);
    }

    /// Returns a transaction's audit rows, in insertion order.
    #[must_use]
    pub fn steps_for(&self, transaction_id: &str) -> Vec<TransactionStepRow> {
        self.steps
            .get(transaction_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_value(&self, value_id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(value_id).map(|row| row.clone()))
    }

    async fn get_value_by_code(&self, code: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .values
            .iter()
            .find(|row| row.code.as_deref() == Some(code))
            .map(|row| row.clone()))
    }

    async fn list_contact_values(
        &self,
        contact_id: &str,
        currency: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let mut values: Vec<Value> = self
            .values
            .iter()
            .filter(|row| {
                row.contact_id.as_deref() == Some(contact_id) && row.currency == currency
            })
            .map(|row| row.clone())
            .collect();
        // Iteration order is not defined for a hash map; return a stable one.
        values.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(values)
    }

    async fn insert_transaction(&self, row: TransactionRow) -> Result<u64, StoreError> {
        match self.transactions.entry(row.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(0),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(row);
                Ok(1)
            }
        }
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<u64, StoreError> {
        Ok(u64::from(self.transactions.remove(transaction_id).is_some()))
    }

    async fn apply_value_draw(&self, draw: &ValueDraw) -> Result<u64, StoreError> {
        let Some(mut value) = self.values.get_mut(&draw.value_id) else {
            return Ok(0);
        };

        if draw.require_balance {
            match value.balance {
                Some(balance) if balance >= -draw.amount => {}
                _ => return Ok(0),
            }
        }
        if draw.consume_use {
            match value.uses_remaining {
                Some(uses) if uses > 0 => {}
                _ => return Ok(0),
            }
        }

        if let Some(balance) = value.balance {
            value.balance = Some(balance + draw.amount);
        }
        if draw.consume_use
            && let Some(uses) = value.uses_remaining
        {
            value.uses_remaining = Some(uses - 1);
        }
        Ok(1)
    }

    async fn undo_value_draw(&self, draw: &ValueDraw) -> Result<u64, StoreError> {
        let Some(mut value) = self.values.get_mut(&draw.value_id) else {
            return Ok(0);
        };

        if let Some(balance) = value.balance {
            value.balance = Some(balance - draw.amount);
        }
        if draw.consume_use
            && let Some(uses) = value.uses_remaining
        {
            value.uses_remaining = Some(uses + 1);
        }
        Ok(1)
    }

    async fn insert_step(&self, row: TransactionStepRow) -> Result<(), StoreError> {
        self.steps
            .entry(row.transaction_id.clone())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn delete_steps(&self, transaction_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .steps
            .remove(transaction_id)
            .map_or(0, |(_, rows)| rows.len() as u64))
    }

    async fn link_next_transaction(
        &self,
        transaction_id: &str,
        next_transaction_id: &str,
    ) -> Result<u64, StoreError> {
        match self.transactions.get_mut(transaction_id) {
            Some(mut row) if row.next_transaction_id.is_none() => {
                row.next_transaction_id = Some(next_transaction_id.to_string());
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionRow>, StoreError> {
        Ok(self.transactions.get(transaction_id).map(|row| row.clone()))
    }
}
