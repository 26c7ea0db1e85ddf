//! # Row Mutation Pipeline
//!
//! The single code path every row write flows through: create, update,
//! delete, mass actions, and bulk import.
//!
//! Per write: resolve access → coerce every column, aggregating per-field
//! errors (no partial application) → enforce requiredness → enforce
//! duplicate constraints → apply to storage → if the table sells, derive
//! the quantity delta and append a ledger transaction.
//!
//! The ledger append happens only after the storage write succeeded, and a
//! failed append does not roll the write back; it is logged as a degraded
//! condition.

mod import;
mod mass;

pub use import::{ImportBatch, ImportReport, RowFailure};
pub use mass::{MassAction, MassOutcome, MassTarget};

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::coercion::coerce;
use crate::errors::{EngineError, EngineResult, FieldError};
use crate::filter::FilterSet;
use crate::inventory::{Ledger, TransactionKind};
use crate::model::{quantity_column, Column, Purpose, Row, Table};
use crate::observability::Logger;
use crate::registry::CapabilityRegistry;
use crate::store::{AccessControl, Storage};

/// The mutation pipeline. One instance serves all tables; the capability
/// registry is passed per call so each request sees one consistent module
/// snapshot.
pub struct RowPipeline {
    storage: Arc<dyn Storage>,
    access: Arc<dyn AccessControl>,
    ledger: Ledger,
}

impl RowPipeline {
    pub fn new(storage: Arc<dyn Storage>, access: Arc<dyn AccessControl>) -> Self {
        let ledger = Ledger::new(storage.clone());
        Self {
            storage,
            access,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
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

    fn check_write(&self, table: &Table, actor: &str) -> EngineResult<()> {
        if self.access.has_write_access(table, actor) {
            Ok(())
        } else {
            Err(EngineError::AccessDenied)
        }
    }

    fn check_read(&self, table: &Table, actor: &str) -> EngineResult<()> {
        if self.access.has_read_access(table, actor) {
            Ok(())
        } else {
            Err(EngineError::AccessDenied)
        }
    }

    // ------------------------------------------------------------------
    // reads

    pub async fn get_row(&self, table_id: Uuid, row_id: Uuid, actor: &str) -> EngineResult<Row> {
        let table = self.table(table_id)?;
        self.check_read(&table, actor)?;
        self.storage
            .get_row(row_id)
            .map_err(EngineError::internal)?
            .filter(|r| r.table_id == table_id)
            .ok_or_else(|| EngineError::not_found(format!("row {}", row_id)))
    }

    pub async fn list_rows(
        &self,
        table_id: Uuid,
        filters: &FilterSet,
        actor: &str,
    ) -> EngineResult<Vec<Row>> {
        let table = self.table(table_id)?;
        self.check_read(&table, actor)?;
        let rows = self
            .storage
            .list_rows(table_id)
            .map_err(EngineError::internal)?;
        Ok(rows
            .into_iter()
            .filter(|r| filters.matches(&r.fields))
            .collect())
    }

    // ------------------------------------------------------------------
    // writes

    /// Creates a row from raw input keyed by internal column name.
    pub async fn create_row(
        &self,
        table_id: Uuid,
        input: &Map<String, Value>,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<Row> {
        let table = self.table(table_id)?;
        self.check_write(&table, actor)?;
        self.create_checked(&table, input, registry, actor)
    }

    /// Create path with access already resolved; shared with mass actions
    /// and import.
    fn create_checked(
        &self,
        table: &Table,
        input: &Map<String, Value>,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<Row> {
        let columns = self.columns(table.id)?;
        let fields = self.prepare_fields(&columns, input, None, registry)?;
        self.enforce_duplicates(table.id, &columns, &fields, None)?;

        let row = Row::new(table.id, fields);
        self.storage
            .insert_row(row.clone())
            .map_err(EngineError::internal)?;

        if table.purpose == Purpose::Sale {
            let qty = quantity_of(&columns, &row.fields);
            self.record_ledger(
                table,
                row.id,
                TransactionKind::Add,
                qty,
                None,
                qty.map(Value::from),
                actor,
            );
        }
        Ok(row)
    }

    /// Updates a row. Columns absent from the input keep their current
    /// value; present-but-blank input clears to null (subject to
    /// requiredness).
    pub async fn update_row(
        &self,
        table_id: Uuid,
        row_id: Uuid,
        input: &Map<String, Value>,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<Row> {
        let table = self.table(table_id)?;
        self.check_write(&table, actor)?;
        self.update_checked(&table, row_id, input, registry, actor)
    }

    fn update_checked(
        &self,
        table: &Table,
        row_id: Uuid,
        input: &Map<String, Value>,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<Row> {
        let columns = self.columns(table.id)?;
        let mut row = self
            .storage
            .get_row(row_id)
            .map_err(EngineError::internal)?
            .filter(|r| r.table_id == table.id)
            .ok_or_else(|| EngineError::not_found(format!("row {}", row_id)))?;

        let previous_qty = quantity_of(&columns, &row.fields);
        let fields = self.prepare_fields(&columns, input, Some(&row), registry)?;
        self.enforce_duplicates(table.id, &columns, &fields, Some(row_id))?;

        row.fields = fields;
        row.updated_at = chrono::Utc::now();
        self.storage
            .update_row(row.clone())
            .map_err(EngineError::internal)?;

        if table.purpose == Purpose::Sale {
            let new_qty = quantity_of(&columns, &row.fields);
            let delta = match (previous_qty, new_qty) {
                (Some(prev), Some(new)) if new != prev => Some(new.saturating_sub(prev)),
                // Clearing the quantity is a decrement of the full amount.
                (Some(prev), None) => Some(prev.saturating_neg()),
                (None, Some(new)) => Some(new),
                _ => None,
            };
            self.record_ledger(
                table,
                row.id,
                TransactionKind::Update,
                delta,
                previous_qty.map(Value::from),
                new_qty.map(Value::from),
                actor,
            );
        }
        Ok(row)
    }

    /// Quantity update on behalf of an authorized purchase. The purchase
    /// flow replaces the caller write-access check with the
    /// public-sale-table rule, so this enters after access resolution.
    pub(crate) fn update_for_sale(
        &self,
        table: &Table,
        row_id: Uuid,
        input: &Map<String, Value>,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<Row> {
        self.update_checked(table, row_id, input, registry, actor)
    }

    pub async fn delete_row(&self, table_id: Uuid, row_id: Uuid, actor: &str) -> EngineResult<()> {
        let table = self.table(table_id)?;
        self.check_write(&table, actor)?;
        self.delete_checked(&table, row_id, actor)
    }

    fn delete_checked(&self, table: &Table, row_id: Uuid, actor: &str) -> EngineResult<()> {
        let columns = self.columns(table.id)?;
        let row = self
            .storage
            .get_row(row_id)
            .map_err(EngineError::internal)?
            .filter(|r| r.table_id == table.id)
            .ok_or_else(|| EngineError::not_found(format!("row {}", row_id)))?;

        self.storage
            .delete_row(row_id)
            .map_err(EngineError::internal)?;

        if table.purpose == Purpose::Sale {
            let qty = quantity_of(&columns, &row.fields);
            self.record_ledger(
                table,
                row_id,
                TransactionKind::Remove,
                qty.map(|q| q.saturating_neg()),
                qty.map(Value::from),
                None,
                actor,
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // shared validation

    /// Coerces every column's input and enforces requiredness, aggregating
    /// all failures; nothing is applied when any field fails.
    fn prepare_fields(
        &self,
        columns: &[Column],
        input: &Map<String, Value>,
        existing: Option<&Row>,
        registry: &CapabilityRegistry,
    ) -> EngineResult<Map<String, Value>> {
        let mut fields = Map::new();
        let mut errors: Vec<FieldError> = Vec::new();

        for column in columns {
            let coerced = match input.get(&column.name) {
                Some(raw) => {
                    // A type that no longer resolves (a deactivated module's
                    // tag) rejects the write outright, before any value
                    // validation.
                    registry.resolve(&column.type_id)?;
                    match coerce(raw, &column.type_id, registry) {
                        Ok(v) => v,
                        Err(reason) => {
                            errors.push(FieldError::new(
                                column.name.clone(),
                                raw.as_str().map(str::to_string),
                                reason,
                            ));
                            continue;
                        }
                    }
                }
                // Absent input: keep the current value on update, fall back
                // to the column default on create.
                None => match existing.and_then(|r| r.get(&column.name)) {
                    Some(current) => current.clone(),
                    None => column.default_value.clone().unwrap_or(Value::Null),
                },
            };

            if column.required && coerced.is_null() {
                errors.push(FieldError::missing(column.name.clone()));
                continue;
            }
            fields.insert(column.name.clone(), coerced);
        }

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(EngineError::Validation(errors))
        }
    }

    /// Checks every no-duplicates column against existing rows. Best-effort
    /// under concurrency; the storage backend's own constraints are the
    /// backstop.
    fn enforce_duplicates(
        &self,
        table_id: Uuid,
        columns: &[Column],
        fields: &Map<String, Value>,
        exclude_row: Option<Uuid>,
    ) -> EngineResult<()> {
        let mut offenders: Vec<String> = Vec::new();
        for column in columns.iter().filter(|c| !c.allow_duplicates) {
            let value = match fields.get(&column.name) {
                Some(v) if !v.is_null() => v,
                _ => continue,
            };
            let hits = self
                .storage
                .find_rows_with_value(table_id, &column.name, value, exclude_row)
                .map_err(EngineError::internal)?;
            if !hits.is_empty() {
                offenders.push(format!("column '{}' already holds {}", column.name, value));
            }
        }
        if offenders.is_empty() {
            Ok(())
        } else {
            Err(EngineError::conflict(offenders.join("; ")))
        }
    }

    /// Appends a sale-table ledger entry after a durable write. Failure is
    /// logged, never propagated.
    #[allow(clippy::too_many_arguments)]
    fn record_ledger(
        &self,
        table: &Table,
        row_id: Uuid,
        kind: TransactionKind,
        delta: Option<i64>,
        previous: Option<Value>,
        new: Option<Value>,
        actor: &str,
    ) {
        if let Err(err) = self.ledger.record(
            table.id,
            &table.name,
            row_id,
            kind,
            delta,
            previous,
            new,
            actor,
        ) {
            Logger::degraded(
                "ledger_append_failed",
                &[
                    ("table", &table.id.to_string()),
                    ("row", &row_id.to_string()),
                    ("reason", &err.to_string()),
                ],
            );
        }
    }
}

/// The row's current quantity, when the table has a quantity-role column.
fn quantity_of(columns: &[Column], fields: &Map<String, Value>) -> Option<i64> {
    let column = quantity_column(columns)?;
    fields.get(&column.name).and_then(Value::as_i64)
}
