//! # Purchase Flow
//!
//! The transactional decrement-on-sale operation: load the item, check the
//! table is publicly purchasable, check price and stock, record the sale
//! with the sales collaborator, then decrement the row's quantity through
//! the mutation pipeline (which appends the ledger transaction).
//!
//! Known weak point, kept deliberately: if the quantity update fails after
//! the sale record was created, the sale is still reported successful and
//! the inconsistency only logged.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult, FieldError};
use crate::model::{price_column, quantity_column, Purpose, Visibility};
use crate::observability::Logger;
use crate::pipeline::RowPipeline;
use crate::registry::CapabilityRegistry;
use crate::store::Storage;

/// A completed sale.
#[derive(Debug, Clone, Serialize)]
pub struct Sale {
    pub id: Uuid,
    pub table_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
    pub customer: String,
    pub at: DateTime<Utc>,
}

/// Sales record collaborator.
pub trait SalesLog: Send + Sync {
    fn record_sale(&self, sale: &Sale) -> Result<(), String>;
}

/// In-memory sales log.
#[derive(Default)]
pub struct MemorySalesLog {
    sales: RwLock<Vec<Sale>>,
}

impl MemorySalesLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sales(&self) -> Vec<Sale> {
        self.sales.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SalesLog for MemorySalesLog {
    fn record_sale(&self, sale: &Sale) -> Result<(), String> {
        self.sales
            .write()
            .map_err(|_| "sales lock poisoned".to_string())?
            .push(sale.clone());
        Ok(())
    }
}

/// Purchase operations composed over the pipeline and sales collaborator.
pub struct PurchaseFlow {
    storage: Arc<dyn Storage>,
    pipeline: Arc<RowPipeline>,
    sales: Arc<dyn SalesLog>,
}

impl PurchaseFlow {
    pub fn new(
        storage: Arc<dyn Storage>,
        pipeline: Arc<RowPipeline>,
        sales: Arc<dyn SalesLog>,
    ) -> Self {
        Self {
            storage,
            pipeline,
            sales,
        }
    }

    /// Purchases `quantity` units of an item from a public sale table.
    pub async fn purchase(
        &self,
        table_id: Uuid,
        item_id: Uuid,
        quantity: i64,
        customer: &str,
        registry: &CapabilityRegistry,
    ) -> EngineResult<Sale> {
        if quantity <= 0 {
            return Err(EngineError::validation(FieldError::new(
                "quantity",
                Some(quantity.to_string()),
                "purchase quantity must be positive",
            )));
        }

        let table = self
            .storage
            .get_table(table_id)
            .map_err(EngineError::internal)?
            .ok_or_else(|| EngineError::not_found(format!("table {}", table_id)))?;
        if table.purpose != Purpose::Sale || table.visibility != Visibility::Public {
            return Err(EngineError::validation(FieldError::new(
                "table",
                Some(table.name.clone()),
                "table is not publicly purchasable",
            )));
        }

        let columns = self
            .storage
            .columns_for_table(table_id)
            .map_err(EngineError::internal)?;
        let row = self
            .storage
            .get_row(item_id)
            .map_err(EngineError::internal)?
            .filter(|r| r.table_id == table_id)
            .ok_or_else(|| EngineError::not_found(format!("item {}", item_id)))?;

        let unit_price = price_column(&columns)
            .and_then(|c| row.get(&c.name))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        if unit_price <= 0.0 {
            return Err(EngineError::validation(FieldError::new(
                "price",
                Some(unit_price.to_string()),
                "item is not for sale",
            )));
        }

        let quantity_field = quantity_column(&columns)
            .map(|c| c.name.clone())
            .ok_or_else(|| EngineError::not_found("quantity column".to_string()))?;
        let available = row.get(&quantity_field).and_then(Value::as_i64).unwrap_or(0);
        if available < quantity {
            return Err(EngineError::validation(FieldError::new(
                quantity_field.clone(),
                Some(quantity.to_string()),
                format!(
                    "insufficient quantity: available {}, requested {}",
                    available, quantity
                ),
            )));
        }

        let sale = Sale {
            id: Uuid::new_v4(),
            table_id,
            item_id,
            quantity,
            unit_price,
            total: unit_price * quantity as f64,
            customer: customer.to_string(),
            at: Utc::now(),
        };
        self.sales
            .record_sale(&sale)
            .map_err(EngineError::internal)?;

        // Decrement through the pipeline so the ledger entry is appended by
        // the same path as every other quantity change.
        let mut input = Map::new();
        input.insert(quantity_field, Value::from(available - quantity));
        if let Err(err) = self
            .pipeline
            .update_for_sale(&table, item_id, &input, registry, customer)
        {
            // The sale already happened; report success and log the drift.
            Logger::degraded(
                "purchase_stock_update_failed",
                &[
                    ("item", &item_id.to_string()),
                    ("sale", &sale.id.to_string()),
                    ("table", &table_id.to_string()),
                    ("reason", &err.to_string()),
                ],
            );
        }

        Ok(sale)
    }
}
