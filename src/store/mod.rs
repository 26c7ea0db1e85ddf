//! # Storage & Authorization Collaborators
//!
//! The engine consumes persistence and authorization through narrow traits,
//! the same way a transport layer would hand them in. Errors cross the
//! boundary as plain strings and are wrapped into `EngineError::Internal`
//! by callers.
//!
//! `MemoryStorage` is the reference backend. Its duplicate-value existence
//! query is check-then-act like the rest of the engine; a backend with real
//! unique constraints is the extension point for stronger guarantees.

mod memory;

pub use memory::MemoryStorage;

use serde_json::Value;
use uuid::Uuid;

use crate::inventory::InventoryTransaction;
use crate::model::{Column, Row, Table, Visibility};

/// Table / column / row persistence with point queries and a
/// duplicate-value existence query.
pub trait Storage: Send + Sync {
    fn insert_table(&self, table: Table) -> Result<(), String>;
    fn get_table(&self, id: Uuid) -> Result<Option<Table>, String>;
    fn update_table(&self, table: Table) -> Result<(), String>;
    /// Deletes a table, cascading to its columns and rows.
    fn delete_table(&self, id: Uuid) -> Result<bool, String>;
    fn list_tables(&self) -> Result<Vec<Table>, String>;

    fn insert_column(&self, column: Column) -> Result<(), String>;
    /// Columns of a table, ordered by position.
    fn columns_for_table(&self, table_id: Uuid) -> Result<Vec<Column>, String>;
    fn update_column(&self, column: Column) -> Result<(), String>;
    fn delete_column(&self, id: Uuid) -> Result<bool, String>;

    fn insert_row(&self, row: Row) -> Result<(), String>;
    fn get_row(&self, id: Uuid) -> Result<Option<Row>, String>;
    fn update_row(&self, row: Row) -> Result<(), String>;
    fn delete_row(&self, id: Uuid) -> Result<bool, String>;
    fn list_rows(&self, table_id: Uuid) -> Result<Vec<Row>, String>;

    /// Rows of a table holding `value` in `column`, excluding one row.
    fn find_rows_with_value(
        &self,
        table_id: Uuid,
        column: &str,
        value: &Value,
        exclude_row: Option<Uuid>,
    ) -> Result<Vec<Row>, String>;

    fn append_transaction(&self, tx: InventoryTransaction) -> Result<(), String>;
    /// Transactions scoped by table and/or item; `None` means unscoped.
    fn transactions(
        &self,
        table_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<InventoryTransaction>, String>;

    /// Best-effort removal of references to a deleted table held by other
    /// subsystems (access lists, saved views). Returns how many references
    /// were scrubbed; failure here must not abort the deletion itself.
    fn scrub_table_references(&self, table_id: Uuid) -> Result<usize, String>;
}

/// Authorization collaborator.
pub trait AccessControl: Send + Sync {
    fn has_read_access(&self, table: &Table, actor: &str) -> bool;
    fn has_write_access(&self, table: &Table, actor: &str) -> bool;
}

/// Ownership-based access: the owner reads and writes; everyone else reads
/// public and shared tables only.
pub struct OwnerAccess;

impl AccessControl for OwnerAccess {
    fn has_read_access(&self, table: &Table, actor: &str) -> bool {
        table.owner == actor || matches!(table.visibility, Visibility::Public | Visibility::Shared)
    }

    fn has_write_access(&self, table: &Table, actor: &str) -> bool {
        table.owner == actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Purpose;

    #[test]
    fn test_owner_access_rules() {
        let mut table = Table::new("goods", Purpose::Default, "alice");
        let access = OwnerAccess;

        assert!(access.has_read_access(&table, "alice"));
        assert!(access.has_write_access(&table, "alice"));
        assert!(!access.has_read_access(&table, "bob"));

        table.visibility = Visibility::Public;
        assert!(access.has_read_access(&table, "bob"));
        assert!(!access.has_write_access(&table, "bob"));
    }
}
