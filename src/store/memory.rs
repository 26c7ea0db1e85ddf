//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use uuid::Uuid;

use super::Storage;
use crate::inventory::InventoryTransaction;
use crate::model::{Column, Row, Table};

/// Reference `Storage` implementation backed by `RwLock`'d maps.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<Uuid, Table>>,
    columns: RwLock<HashMap<Uuid, Column>>,
    rows: RwLock<HashMap<Uuid, Row>>,
    transactions: RwLock<Vec<InventoryTransaction>>,
    /// Simulated cross-subsystem references (e.g. access lists) keyed by
    /// table id, so tests can exercise best-effort cleanup.
    references: RwLock<HashMap<Uuid, usize>>,
}

const POISONED: &str = "storage lock poisoned";

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers simulated external references to a table, for cleanup tests.
    pub fn seed_references(&self, table_id: Uuid, count: usize) {
        if let Ok(mut refs) = self.references.write() {
            refs.insert(table_id, count);
        }
    }
}

impl Storage for MemoryStorage {
    fn insert_table(&self, table: Table) -> Result<(), String> {
        let mut tables = self.tables.write().map_err(|_| POISONED)?;
        tables.insert(table.id, table);
        Ok(())
    }

    fn get_table(&self, id: Uuid) -> Result<Option<Table>, String> {
        Ok(self.tables.read().map_err(|_| POISONED)?.get(&id).cloned())
    }

    fn update_table(&self, table: Table) -> Result<(), String> {
        let mut tables = self.tables.write().map_err(|_| POISONED)?;
        if !tables.contains_key(&table.id) {
            return Err(format!("table {} does not exist", table.id));
        }
        tables.insert(table.id, table);
        Ok(())
    }

    fn delete_table(&self, id: Uuid) -> Result<bool, String> {
        let existed = self
            .tables
            .write()
            .map_err(|_| POISONED)?
            .remove(&id)
            .is_some();
        if existed {
            self.columns
                .write()
                .map_err(|_| POISONED)?
                .retain(|_, c| c.table_id != id);
            self.rows
                .write()
                .map_err(|_| POISONED)?
                .retain(|_, r| r.table_id != id);
        }
        Ok(existed)
    }

    fn list_tables(&self) -> Result<Vec<Table>, String> {
        Ok(self
            .tables
            .read()
            .map_err(|_| POISONED)?
            .values()
            .cloned()
            .collect())
    }

    fn insert_column(&self, column: Column) -> Result<(), String> {
        let mut columns = self.columns.write().map_err(|_| POISONED)?;
        columns.insert(column.id, column);
        Ok(())
    }

    fn columns_for_table(&self, table_id: Uuid) -> Result<Vec<Column>, String> {
        let columns = self.columns.read().map_err(|_| POISONED)?;
        let mut out: Vec<Column> = columns
            .values()
            .filter(|c| c.table_id == table_id)
            .cloned()
            .collect();
        out.sort_by_key(|c| c.position);
        Ok(out)
    }

    fn update_column(&self, column: Column) -> Result<(), String> {
        let mut columns = self.columns.write().map_err(|_| POISONED)?;
        if !columns.contains_key(&column.id) {
            return Err(format!("column {} does not exist", column.id));
        }
        columns.insert(column.id, column);
        Ok(())
    }

    fn delete_column(&self, id: Uuid) -> Result<bool, String> {
        Ok(self
            .columns
            .write()
            .map_err(|_| POISONED)?
            .remove(&id)
            .is_some())
    }

    fn insert_row(&self, row: Row) -> Result<(), String> {
        let mut rows = self.rows.write().map_err(|_| POISONED)?;
        rows.insert(row.id, row);
        Ok(())
    }

    fn get_row(&self, id: Uuid) -> Result<Option<Row>, String> {
        Ok(self.rows.read().map_err(|_| POISONED)?.get(&id).cloned())
    }

    fn update_row(&self, row: Row) -> Result<(), String> {
        let mut rows = self.rows.write().map_err(|_| POISONED)?;
        if !rows.contains_key(&row.id) {
            return Err(format!("row {} does not exist", row.id));
        }
        rows.insert(row.id, row);
        Ok(())
    }

    fn delete_row(&self, id: Uuid) -> Result<bool, String> {
        Ok(self
            .rows
            .write()
            .map_err(|_| POISONED)?
            .remove(&id)
            .is_some())
    }

    fn list_rows(&self, table_id: Uuid) -> Result<Vec<Row>, String> {
        let rows = self.rows.read().map_err(|_| POISONED)?;
        let mut out: Vec<Row> = rows
            .values()
            .filter(|r| r.table_id == table_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }

    fn find_rows_with_value(
        &self,
        table_id: Uuid,
        column: &str,
        value: &Value,
        exclude_row: Option<Uuid>,
    ) -> Result<Vec<Row>, String> {
        let rows = self.rows.read().map_err(|_| POISONED)?;
        Ok(rows
            .values()
            .filter(|r| r.table_id == table_id)
            .filter(|r| Some(r.id) != exclude_row)
            .filter(|r| r.get(column) == Some(value))
            .cloned()
            .collect())
    }

    fn append_transaction(&self, tx: InventoryTransaction) -> Result<(), String> {
        self.transactions.write().map_err(|_| POISONED)?.push(tx);
        Ok(())
    }

    fn transactions(
        &self,
        table_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<InventoryTransaction>, String> {
        let txs = self.transactions.read().map_err(|_| POISONED)?;
        Ok(txs
            .iter()
            .filter(|t| table_id.map_or(true, |id| t.table_id == id))
            .filter(|t| item_id.map_or(true, |id| t.item_id == id))
            .cloned()
            .collect())
    }

    fn scrub_table_references(&self, table_id: Uuid) -> Result<usize, String> {
        let mut refs = self.references.write().map_err(|_| POISONED)?;
        Ok(refs.remove(&table_id).unwrap_or(0))
    }
}
