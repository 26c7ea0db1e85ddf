//! Bulk import entry point.
//!
//! The import parser collaborator hands over `(headers, rows, has_headers)`;
//! file-format decoding happened upstream. Every cell runs through the same
//! coercion, requiredness, and duplicate checks as a single create, and
//! rows succeed or fail independently.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::RowPipeline;
use crate::errors::{EngineError, EngineResult};
use crate::model::internal_name;
use crate::registry::CapabilityRegistry;

/// Parsed import data from the import-parsing collaborator.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub has_headers: bool,
}

/// One rejected import row.
#[derive(Debug)]
pub struct RowFailure {
    /// Zero-based index into the batch's rows.
    pub index: usize,
    pub error: EngineError,
}

/// Outcome of a bulk import: committed rows plus per-row failures.
#[derive(Debug)]
pub struct ImportReport {
    pub created: Vec<Uuid>,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.created.len()
    }
}

impl RowPipeline {
    /// Imports a parsed batch into a table.
    ///
    /// With headers, cells map to columns by name (display or internal
    /// form); without, they map positionally onto the table's column order.
    /// Headers naming no column are ignored rather than rejected.
    pub async fn import_rows(
        &self,
        table_id: Uuid,
        batch: &ImportBatch,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<ImportReport> {
        let table = self.table(table_id)?;
        self.check_write(&table, actor)?;
        let columns = self.columns(table_id)?;

        // Map each cell position to an internal column name.
        let column_for_cell: Vec<Option<String>> = if batch.has_headers {
            batch
                .headers
                .iter()
                .map(|header| {
                    let wanted = internal_name(header).unwrap_or_else(|_| header.clone());
                    columns
                        .iter()
                        .find(|c| c.name == wanted || c.name == *header)
                        .map(|c| c.name.clone())
                })
                .collect()
        } else {
            let mut by_position = columns.clone();
            by_position.sort_by_key(|c| c.position);
            by_position.into_iter().map(|c| Some(c.name)).collect()
        };

        let mut report = ImportReport {
            created: Vec::new(),
            failures: Vec::new(),
        };

        for (index, cells) in batch.rows.iter().enumerate() {
            let mut input = Map::new();
            for (cell, name) in cells.iter().zip(&column_for_cell) {
                if let Some(name) = name {
                    input.insert(name.clone(), cell.clone());
                }
            }

            match self.create_checked(&table, &input, registry, actor) {
                Ok(row) => report.created.push(row.id),
                Err(error) => report.failures.push(RowFailure { index, error }),
            }
        }
        Ok(report)
    }
}
