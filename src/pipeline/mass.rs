//! Mass actions: bulk delete and bulk field-set over a target row set.
//!
//! Targets come either from an explicit id list or from "select all", which
//! resolves ids on the server from the active filter set. A client id list
//! is never trusted for select-all, so pagination boundaries cannot be
//! enumerated past.
//!
//! Execution is item-by-item without a global transaction: a failure
//! partway through leaves earlier items committed, and the outcome of every
//! item is reported individually.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::RowPipeline;
use crate::errors::{EngineError, EngineResult};
use crate::filter::FilterSet;
use crate::registry::CapabilityRegistry;

/// What to do to each targeted row.
#[derive(Debug, Clone)]
pub enum MassAction {
    Delete,
    SetField { field: String, value: Value },
}

/// Which rows to act on.
#[derive(Debug, Clone)]
pub enum MassTarget {
    /// Explicit row ids submitted by the caller.
    Ids(Vec<Uuid>),
    /// Every row matching the currently active filters, resolved
    /// server-side.
    SelectAll(FilterSet),
}

/// Per-item outcome of a mass action.
#[derive(Debug)]
pub struct MassOutcome {
    pub row_id: Uuid,
    pub result: EngineResult<()>,
}

impl MassOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

impl RowPipeline {
    /// Applies an action to every targeted row, returning one outcome per
    /// row. The overall call fails only when the table is missing or the
    /// caller has no write access.
    pub async fn mass_action(
        &self,
        table_id: Uuid,
        action: MassAction,
        target: MassTarget,
        registry: &CapabilityRegistry,
        actor: &str,
    ) -> EngineResult<Vec<MassOutcome>> {
        let table = self.table(table_id)?;
        self.check_write(&table, actor)?;

        let row_ids = match target {
            MassTarget::Ids(ids) => ids,
            MassTarget::SelectAll(filters) => self
                .storage
                .list_rows(table_id)
                .map_err(EngineError::internal)?
                .into_iter()
                .filter(|r| filters.matches(&r.fields))
                .map(|r| r.id)
                .collect(),
        };

        let mut outcomes = Vec::with_capacity(row_ids.len());
        for row_id in row_ids {
            let result = match &action {
                MassAction::Delete => self.delete_checked(&table, row_id, actor),
                MassAction::SetField { field, value } => {
                    let mut input = Map::new();
                    input.insert(field.clone(), value.clone());
                    self.update_checked(&table, row_id, &input, registry, actor)
                        .map(|_| ())
                }
            };
            outcomes.push(MassOutcome { row_id, result });
        }
        Ok(outcomes)
    }
}
