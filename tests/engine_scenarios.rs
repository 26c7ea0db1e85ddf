//! End-to-end scenarios across the schema manager, mutation pipeline,
//! capability registry, inventory ledger, and purchase flow.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use tabulon::errors::EngineError;
use tabulon::filter::{FilterExpr, FilterOperator, FilterSet};
use tabulon::model::{Purpose, TypeId, Visibility};
use tabulon::pipeline::{ImportBatch, MassAction, MassTarget, RowPipeline};
use tabulon::purchase::{MemorySalesLog, PurchaseFlow};
use tabulon::registry::{
    CapabilityRegistry, GenerateContext, ModuleCapabilities, ModuleLifecycle, ModuleSnapshot,
    TypeHandler,
};
use tabulon::schema_manager::SchemaManager;
use tabulon::store::{MemoryStorage, OwnerAccess, Storage};

struct Engine {
    storage: Arc<MemoryStorage>,
    manager: SchemaManager,
    pipeline: Arc<RowPipeline>,
    registry: CapabilityRegistry,
}

fn engine() -> Engine {
    let storage = Arc::new(MemoryStorage::new());
    Engine {
        manager: SchemaManager::new(storage.clone()),
        pipeline: Arc::new(RowPipeline::new(storage.clone(), Arc::new(OwnerAccess))),
        registry: CapabilityRegistry::builtins_only(),
        storage,
    }
}

fn input(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn purchase_scenario_decrements_and_audits() {
    let eng = engine();
    let (mut table, _columns) = eng
        .manager
        .create_table_from_template("storeGoods", "alice", &eng.registry)
        .unwrap();
    table.visibility = Visibility::Public;
    eng.storage.update_table(table.clone()).unwrap();

    let item = eng
        .pipeline
        .create_row(
            table.id,
            &input(&[
                ("name", json!("widget")),
                ("price", json!(5)),
                ("quantity", json!(10)),
            ]),
            &eng.registry,
            "alice",
        )
        .await
        .unwrap();

    let sales = Arc::new(MemorySalesLog::new());
    let flow = PurchaseFlow::new(eng.storage.clone(), eng.pipeline.clone(), sales.clone());

    let sale = flow
        .purchase(table.id, item.id, 3, "bob", &eng.registry)
        .await
        .unwrap();
    assert_eq!(sale.quantity, 3);
    assert_eq!(sale.total, 15.0);

    let row = eng.storage.get_row(item.id).unwrap().unwrap();
    assert_eq!(row.get("quantity"), Some(&json!(7)));

    // Exactly one purchase transaction with delta -3 (plus the create's +10).
    let txs = eng.storage.transactions(Some(table.id), Some(item.id)).unwrap();
    let deltas: Vec<i64> = txs.iter().filter_map(|t| t.delta).collect();
    assert_eq!(deltas, vec![10, -3]);

    // Overselling names both values and appends nothing.
    let err = flow
        .purchase(table.id, item.id, 8, "bob", &eng.registry)
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("insufficient quantity: available 7, requested 8"));
    let txs_after = eng.storage.transactions(Some(table.id), Some(item.id)).unwrap();
    assert_eq!(txs_after.len(), txs.len());
    assert_eq!(sales.sales().len(), 1);
}

#[tokio::test]
async fn select_all_mass_delete_respects_active_filters() {
    let eng = engine();
    let table = eng
        .manager
        .create_table("stock", Purpose::Default, "alice")
        .unwrap();
    eng.manager
        .add_column(table.id, "Name", TypeId::builtin("text"), true, true, None, &eng.registry)
        .unwrap();
    eng.manager
        .add_column(table.id, "Count", TypeId::builtin("integer"), false, true, None, &eng.registry)
        .unwrap();

    for i in 0..50 {
        eng.pipeline
            .create_row(
                table.id,
                &input(&[("name", json!(format!("item-{}", i))), ("count", json!(i))]),
                &eng.registry,
                "alice",
            )
            .await
            .unwrap();
    }

    // Narrow to the 10 rows with count >= 40.
    let filters = FilterSet::new().and(FilterExpr::new("count", FilterOperator::Gte, json!(40)));
    let outcomes = eng
        .pipeline
        .mass_action(
            table.id,
            MassAction::Delete,
            MassTarget::SelectAll(filters),
            &eng.registry,
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| o.succeeded()));

    let remaining = eng.storage.list_rows(table.id).unwrap();
    assert_eq!(remaining.len(), 40);
    assert!(remaining
        .iter()
        .all(|r| r.get("count").and_then(Value::as_i64).unwrap() < 40));
}

struct StaticLifecycle {
    active: Vec<String>,
}

impl ModuleLifecycle for StaticLifecycle {
    fn list_active_modules(&self) -> Vec<String> {
        self.active.clone()
    }

    fn module_capabilities(&self, module_id: &str) -> Option<ModuleCapabilities> {
        if module_id != "barcodes" {
            return None;
        }
        struct EanHandler;
        impl TypeHandler for EanHandler {
            fn validate(&self, raw: &str) -> Result<(), String> {
                if raw.len() == 13 && raw.chars().all(|c| c.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not an EAN-13 barcode", raw))
                }
            }
            fn format(&self, value: &Value) -> String {
                value.as_str().unwrap_or_default().to_string()
            }
            fn generate(&self, ctx: &mut GenerateContext) -> Value {
                Value::String(format!("{:013}", ctx.row_index))
            }
        }

        let mut column_types: HashMap<String, Arc<dyn TypeHandler>> = HashMap::new();
        column_types.insert("ean".to_string(), Arc::new(EanHandler));
        Some(ModuleCapabilities {
            column_types,
            table_generators: HashMap::new(),
        })
    }
}

#[tokio::test]
async fn module_deactivation_blocks_new_writes_but_not_reads() {
    let eng = engine();

    // While the module is active, its type resolves and writes succeed.
    let active = ModuleSnapshot::capture(&StaticLifecycle {
        active: vec!["barcodes".to_string()],
    });
    let registry = CapabilityRegistry::with_modules(&active);

    let table = eng
        .manager
        .create_table("products", Purpose::Default, "alice")
        .unwrap();
    eng.manager
        .add_column(
            table.id,
            "Barcode",
            TypeId::module("barcodes", "ean"),
            false,
            true,
            None,
            &registry,
        )
        .unwrap();

    let row = eng
        .pipeline
        .create_row(
            table.id,
            &input(&[("barcode", json!("4006381333931"))]),
            &registry,
            "alice",
        )
        .await
        .unwrap();

    // Deactivate: a new registry built from an empty snapshot.
    let inactive = ModuleSnapshot::capture(&StaticLifecycle { active: vec![] });
    let registry = CapabilityRegistry::with_modules(&inactive);

    // The stored row stays readable.
    let read = eng
        .pipeline
        .get_row(table.id, row.id, "alice")
        .await
        .unwrap();
    assert_eq!(read.get("barcode"), Some(&json!("4006381333931")));

    // New writes against the unresolvable type fail at type resolution,
    // before storage.
    let err = eng
        .pipeline
        .create_row(
            table.id,
            &input(&[("barcode", json!("4006381333932"))]),
            &registry,
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(err.to_string().contains("column type 'barcodes:ean'"));
    assert_eq!(eng.storage.list_rows(table.id).unwrap().len(), 1);
}

#[tokio::test]
async fn protected_columns_follow_table_purpose() {
    let eng = engine();
    let (table, columns) = eng
        .manager
        .create_table_from_template("storeGoods", "alice", &eng.registry)
        .unwrap();
    let price = columns.iter().find(|c| c.name == "price").unwrap().id;
    let quantity = columns.iter().find(|c| c.name == "quantity").unwrap().id;

    let err = eng
        .manager
        .delete_columns(table.id, &[price, quantity])
        .unwrap_err();
    let blocked: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(blocked, vec!["price", "quantity"]);

    eng.manager.set_purpose(table.id, Purpose::Default).unwrap();
    eng.manager
        .delete_columns(table.id, &[price, quantity])
        .unwrap();
    eng.manager.recount_positions(table.id).unwrap();

    let remaining = eng.storage.columns_for_table(table.id).unwrap();
    let positions: Vec<u32> = remaining.iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn generated_tables_import_through_the_pipeline() {
    let eng = engine();
    let (table, columns) = eng
        .manager
        .create_table_from_template("contacts", "alice", &eng.registry)
        .unwrap();

    let template = eng.registry.table_template("contacts").unwrap();
    let sample = template
        .generate_rows(&eng.registry, template.default_row_count, 11)
        .unwrap();

    let headers: Vec<String> = template
        .columns
        .iter()
        .map(|c| c.display_name.to_string())
        .collect();
    let rows: Vec<Vec<Value>> = sample
        .iter()
        .map(|fields| headers.iter().map(|h| fields[h].clone()).collect())
        .collect();

    let report = eng
        .pipeline
        .import_rows(
            table.id,
            &ImportBatch {
                headers,
                rows,
                has_headers: true,
            },
            &eng.registry,
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(report.imported(), template.default_row_count);
    assert!(report.failures.is_empty());

    let stored = eng.storage.list_rows(table.id).unwrap();
    assert_eq!(stored.len(), template.default_row_count);
    for row in &stored {
        for column in &columns {
            assert!(row.fields.contains_key(&column.name));
        }
    }
}

#[tokio::test]
async fn duplicate_constraint_survives_repeated_creates() {
    let eng = engine();
    let table = eng
        .manager
        .create_table("members", Purpose::Default, "alice")
        .unwrap();
    eng.manager
        .add_column(table.id, "Email", TypeId::builtin("email"), true, false, None, &eng.registry)
        .unwrap();

    let fields = input(&[("email", json!("a@b.co"))]);
    eng.pipeline
        .create_row(table.id, &fields, &eng.registry, "alice")
        .await
        .unwrap();

    for _ in 0..3 {
        let err = eng
            .pipeline
            .create_row(table.id, &fields, &eng.registry, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }
    assert_eq!(eng.storage.list_rows(table.id).unwrap().len(), 1);
}
