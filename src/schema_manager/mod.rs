//! # Table Schema Manager
//!
//! Owns table and column lifecycle: create/delete tables, add, rename,
//! retype, reposition, and delete columns.
//!
//! Protected columns are a naming convention tied to table purpose: while a
//! table is `sale`, its price- and quantity-role columns cannot be deleted
//! or renamed; `rent` protects the price/fee/used/available roles. Changing
//! the purpose lifts the protections.
//!
//! Column positions are dense and zero-based. Deletes and swaps may leave
//! gaps; `recount_positions` repairs them explicitly rather than rewriting
//! every column on every mutation.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult, FieldError};
use crate::model::{internal_name, is_protected, Column, Purpose, Table, TypeId};
use crate::observability::Logger;
use crate::registry::CapabilityRegistry;
use crate::store::Storage;

/// Outcome of a table deletion, including best-effort cleanup warnings.
#[derive(Debug, Clone, Serialize)]
pub struct TableDeletion {
    pub table_id: Uuid,
    pub scrubbed_references: usize,
    /// Compensating steps that failed without aborting the deletion.
    pub warnings: Vec<String>,
}

/// Schema lifecycle operations over the storage collaborator.
pub struct SchemaManager {
    storage: Arc<dyn Storage>,
}

impl SchemaManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn table(&self, table_id: Uuid) -> EngineResult<Table> {
        self.storage
            .get_table(table_id)
            .map_err(EngineError::internal)?
            .ok_or_else(|| EngineError::not_found(format!("table {}", table_id)))
    }

    fn columns(&self, table_id: Uuid) -> EngineResult<Vec<Column>> {
        self.storage
            .columns_for_table(table_id)
            .map_err(EngineError::internal)
    }

    /// Creates an empty table.
    pub fn create_table(
        &self,
        name: &str,
        purpose: Purpose,
        owner: &str,
    ) -> EngineResult<Table> {
        let table = Table::new(name, purpose, owner);
        self.storage
            .insert_table(table.clone())
            .map_err(EngineError::internal)?;
        Ok(table)
    }

    /// Creates a table from a registered generator template, materializing
    /// its default column set. Sample rows are the caller's concern; feed
    /// the template's generated rows through the mutation pipeline's import.
    pub fn create_table_from_template(
        &self,
        template_id: &str,
        owner: &str,
        registry: &CapabilityRegistry,
    ) -> EngineResult<(Table, Vec<Column>)> {
        let template = registry.table_template(template_id)?.clone();
        let table = self.create_table(template.name, template.purpose, owner)?;

        let mut columns = Vec::with_capacity(template.columns.len());
        for spec in &template.columns {
            let column = self.add_column(
                table.id,
                spec.display_name,
                TypeId::builtin(spec.type_tag),
                spec.required,
                !spec.unique,
                None,
                registry,
            )?;
            columns.push(column);
        }
        Ok((table, columns))
    }

    /// Deletes a table, cascading to columns and rows, then scrubs
    /// references held by other subsystems. The scrub is compensating: its
    /// failure is surfaced as a warning, never an abort.
    pub fn delete_table(&self, table_id: Uuid) -> EngineResult<TableDeletion> {
        let existed = self
            .storage
            .delete_table(table_id)
            .map_err(EngineError::internal)?;
        if !existed {
            return Err(EngineError::not_found(format!("table {}", table_id)));
        }

        let mut warnings = Vec::new();
        let scrubbed = match self.storage.scrub_table_references(table_id) {
            Ok(n) => n,
            Err(reason) => {
                Logger::degraded(
                    "table_reference_scrub_failed",
                    &[("table", &table_id.to_string()), ("reason", &reason)],
                );
                warnings.push(format!("reference cleanup failed: {}", reason));
                0
            }
        };

        Ok(TableDeletion {
            table_id,
            scrubbed_references: scrubbed,
            warnings,
        })
    }

    /// Changes a table's purpose, which also changes which columns are
    /// protected from then on.
    pub fn set_purpose(&self, table_id: Uuid, purpose: Purpose) -> EngineResult<Table> {
        let mut table = self.table(table_id)?;
        table.purpose = purpose;
        table.updated_at = chrono::Utc::now();
        self.storage
            .update_table(table.clone())
            .map_err(EngineError::internal)?;
        Ok(table)
    }

    /// Adds a column. The display name is converted to the internal
    /// camelCase form; the type must resolve in the given registry.
    #[allow(clippy::too_many_arguments)]
    pub fn add_column(
        &self,
        table_id: Uuid,
        display_name: &str,
        type_id: TypeId,
        required: bool,
        allow_duplicates: bool,
        default_value: Option<serde_json::Value>,
        registry: &CapabilityRegistry,
    ) -> EngineResult<Column> {
        self.table(table_id)?;
        registry.resolve(&type_id)?;

        let name = internal_name(display_name)
            .map_err(|reason| EngineError::validation(FieldError::new("name", Some(display_name.to_string()), reason)))?;

        let existing = self.columns(table_id)?;
        if existing.iter().any(|c| c.name == name) {
            return Err(EngineError::conflict(format!(
                "column '{}' already exists",
                name
            )));
        }

        let position = existing.iter().map(|c| c.position + 1).max().unwrap_or(0);
        let mut column = Column::new(table_id, name, type_id, position);
        column.required = required;
        column.allow_duplicates = allow_duplicates;
        column.default_value = default_value;

        self.storage
            .insert_column(column.clone())
            .map_err(EngineError::internal)?;
        Ok(column)
    }

    /// Renames a column, enforcing naming rules and protection.
    pub fn rename_column(
        &self,
        table_id: Uuid,
        column_id: Uuid,
        new_display_name: &str,
    ) -> EngineResult<Column> {
        let table = self.table(table_id)?;
        let columns = self.columns(table_id)?;
        let mut column = find_column(&columns, column_id)?;

        if is_protected(&column.name, table.purpose) {
            return Err(EngineError::validation(FieldError::new(
                column.name.clone(),
                None,
                format!(
                    "column '{}' is protected while the table purpose is {:?}",
                    column.display_name(),
                    table.purpose
                ),
            )));
        }

        let name = internal_name(new_display_name).map_err(|reason| {
            EngineError::validation(FieldError::new(
                "name",
                Some(new_display_name.to_string()),
                reason,
            ))
        })?;
        if columns.iter().any(|c| c.id != column_id && c.name == name) {
            return Err(EngineError::conflict(format!(
                "column '{}' already exists",
                name
            )));
        }

        column.name = name;
        self.storage
            .update_column(column.clone())
            .map_err(EngineError::internal)?;
        Ok(column)
    }

    /// Changes a column's type; the new type must resolve.
    pub fn retype_column(
        &self,
        table_id: Uuid,
        column_id: Uuid,
        type_id: TypeId,
        registry: &CapabilityRegistry,
    ) -> EngineResult<Column> {
        self.table(table_id)?;
        registry.resolve(&type_id)?;
        let columns = self.columns(table_id)?;
        let mut column = find_column(&columns, column_id)?;
        column.type_id = type_id;
        self.storage
            .update_column(column.clone())
            .map_err(EngineError::internal)?;
        Ok(column)
    }

    /// Deletes columns, rejecting the whole batch if any are protected.
    ///
    /// The error lists every blocked column, not just the first.
    pub fn delete_columns(&self, table_id: Uuid, column_ids: &[Uuid]) -> EngineResult<()> {
        let table = self.table(table_id)?;
        let columns = self.columns(table_id)?;

        let mut targets = Vec::with_capacity(column_ids.len());
        for id in column_ids {
            targets.push(find_column(&columns, *id)?);
        }

        let blocked: Vec<FieldError> = targets
            .iter()
            .filter(|c| is_protected(&c.name, table.purpose))
            .map(|c| {
                FieldError::new(
                    c.name.clone(),
                    None,
                    format!(
                        "column '{}' is protected while the table purpose is {:?}",
                        c.display_name(),
                        table.purpose
                    ),
                )
            })
            .collect();
        if !blocked.is_empty() {
            return Err(EngineError::Validation(blocked));
        }

        for target in targets {
            self.storage
                .delete_column(target.id)
                .map_err(EngineError::internal)?;
        }
        Ok(())
    }

    /// Deletes a single column.
    pub fn delete_column(&self, table_id: Uuid, column_id: Uuid) -> EngineResult<()> {
        self.delete_columns(table_id, &[column_id])
    }

    /// Renumbers all columns 0..n-1 in their existing relative order.
    /// Idempotent; safe to call any number of times.
    pub fn recount_positions(&self, table_id: Uuid) -> EngineResult<Vec<Column>> {
        self.table(table_id)?;
        let columns = self.columns(table_id)?; // already position-ordered
        let mut out = Vec::with_capacity(columns.len());
        for (i, mut column) in columns.into_iter().enumerate() {
            let target = i as u32;
            if column.position != target {
                column.position = target;
                self.storage
                    .update_column(column.clone())
                    .map_err(EngineError::internal)?;
            }
            out.push(column);
        }
        Ok(out)
    }

    /// Exchanges two columns' positions. Rejects a column swapped with
    /// itself. The exchange is two writes; if the second fails, the first
    /// is restored so a failed swap never leaves one column moved.
    pub fn swap_positions(&self, table_id: Uuid, a: Uuid, b: Uuid) -> EngineResult<()> {
        if a == b {
            return Err(EngineError::validation(FieldError::new(
                "position",
                None,
                "cannot swap a column with itself",
            )));
        }
        self.table(table_id)?;
        let columns = self.columns(table_id)?;
        let mut first = find_column(&columns, a)?;
        let mut second = find_column(&columns, b)?;

        let first_original = first.position;
        std::mem::swap(&mut first.position, &mut second.position);
        self.storage
            .update_column(first.clone())
            .map_err(EngineError::internal)?;
        if let Err(reason) = self.storage.update_column(second) {
            first.position = first_original;
            if let Err(rollback) = self.storage.update_column(first) {
                Logger::degraded(
                    "position_swap_rollback_failed",
                    &[
                        ("column", &a.to_string()),
                        ("reason", &rollback),
                        ("table", &table_id.to_string()),
                    ],
                );
            }
            return Err(EngineError::internal(reason));
        }
        Ok(())
    }
}

fn find_column(columns: &[Column], id: Uuid) -> EngineResult<Column> {
    columns
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| EngineError::not_found(format!("column {}", id)))
}
