//! # Inventory Ledger
//!
//! An append-only audit trail of quantity-affecting events. Transactions
//! are never mutated or deleted once written. The ledger is never the
//! source of truth for current stock: summaries are folded from the trail
//! on demand, while stock-level checks read live row quantities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::model::quantity_column;
use crate::store::Storage;

/// What kind of quantity event a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Add,
    Remove,
    Update,
    Adjust,
}

/// One immutable ledger entry.
///
/// The table name is denormalized so the audit trail stays meaningful after
/// the table itself is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub table_id: Uuid,
    pub table_name: String,
    pub item_id: Uuid,
    pub kind: TransactionKind,
    /// Signed quantity change; omitted when the action has no quantity effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Folded view of the transactions for one item or one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub transaction_count: usize,
    pub additions: usize,
    pub removals: usize,
    /// Net of all recorded deltas.
    pub net_delta: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// An item at or below the stock threshold, read from live row state.
#[derive(Debug, Clone, Serialize)]
pub struct StockAlert {
    pub table_id: Uuid,
    pub table_name: String,
    pub row_id: Uuid,
    pub quantity: i64,
}

/// Append-only ledger over the storage collaborator.
pub struct Ledger {
    storage: Arc<dyn Storage>,
}

impl Ledger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Appends one transaction. Pure append; nothing is read back or
    /// updated in place.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        table_id: Uuid,
        table_name: &str,
        item_id: Uuid,
        kind: TransactionKind,
        delta: Option<i64>,
        previous: Option<Value>,
        new: Option<Value>,
        actor: &str,
    ) -> EngineResult<()> {
        let tx = InventoryTransaction {
            id: Uuid::new_v4(),
            table_id,
            table_name: table_name.to_string(),
            item_id,
            kind,
            delta,
            previous,
            new,
            actor: actor.to_string(),
            at: Utc::now(),
        };
        self.storage
            .append_transaction(tx)
            .map_err(EngineError::internal)
    }

    /// Folds the trail for a single item.
    pub fn summary_for_item(&self, table_id: Uuid, item_id: Uuid) -> EngineResult<LedgerSummary> {
        let txs = self
            .storage
            .transactions(Some(table_id), Some(item_id))
            .map_err(EngineError::internal)?;
        Ok(fold(&txs))
    }

    /// Folds the trail for a whole table.
    pub fn summary_for_table(&self, table_id: Uuid) -> EngineResult<LedgerSummary> {
        let txs = self
            .storage
            .transactions(Some(table_id), None)
            .map_err(EngineError::internal)?;
        Ok(fold(&txs))
    }

    /// Items whose *current* quantity is at or below the threshold.
    ///
    /// This reads live rows, not the ledger: the trail is history, the row
    /// is present stock.
    pub fn check_stock_levels(
        &self,
        threshold: i64,
        table_id: Option<Uuid>,
    ) -> EngineResult<Vec<StockAlert>> {
        let tables = match table_id {
            Some(id) => vec![self
                .storage
                .get_table(id)
                .map_err(EngineError::internal)?
                .ok_or_else(|| EngineError::not_found(format!("table {}", id)))?],
            None => self.storage.list_tables().map_err(EngineError::internal)?,
        };

        let mut alerts = Vec::new();
        for table in tables {
            let columns = self
                .storage
                .columns_for_table(table.id)
                .map_err(EngineError::internal)?;
            let quantity = match quantity_column(&columns) {
                Some(col) => col.name.clone(),
                None => continue,
            };
            let rows = self
                .storage
                .list_rows(table.id)
                .map_err(EngineError::internal)?;
            for row in rows {
                let current = row.get(&quantity).and_then(Value::as_i64).unwrap_or(0);
                if current <= threshold {
                    alerts.push(StockAlert {
                        table_id: table.id,
                        table_name: table.name.clone(),
                        row_id: row.id,
                        quantity: current,
                    });
                }
            }
        }
        Ok(alerts)
    }
}

fn fold(txs: &[InventoryTransaction]) -> LedgerSummary {
    LedgerSummary {
        transaction_count: txs.len(),
        additions: txs.iter().filter(|t| t.kind == TransactionKind::Add).count(),
        removals: txs
            .iter()
            .filter(|t| t.kind == TransactionKind::Remove)
            .count(),
        net_delta: txs
            .iter()
            .filter_map(|t| t.delta)
            .fold(0i64, i64::saturating_add),
        last_activity: txs.iter().map(|t| t.at).max(),
    }
}
