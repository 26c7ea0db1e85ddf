//! Table generator templates.
//!
//! A table generator pairs a default column set with a target purpose and a
//! default sample-row count. Built-in templates cover the common store
//! shapes; modules contribute more under `module:name`.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::handlers::GenerateContext;
use super::CapabilityRegistry;
use crate::errors::EngineResult;
use crate::model::{Purpose, TypeId};

/// One column in a template; names are display form and converted by the
/// schema manager when the table is materialized.
#[derive(Debug, Clone)]
pub struct TemplateColumn {
    pub display_name: &'static str,
    pub type_tag: &'static str,
    pub required: bool,
    pub unique: bool,
}

impl TemplateColumn {
    const fn new(display_name: &'static str, type_tag: &'static str) -> Self {
        Self {
            display_name,
            type_tag,
            required: false,
            unique: false,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A registered table generator.
#[derive(Debug, Clone)]
pub struct TableTemplate {
    pub name: &'static str,
    pub purpose: Purpose,
    pub columns: Vec<TemplateColumn>,
    pub default_row_count: usize,
}

impl TableTemplate {
    /// Generates `count` sample rows using each column's type handler.
    ///
    /// Field keys are the display names; the schema manager maps them to
    /// internal names when the generated table is created.
    pub fn generate_rows(
        &self,
        registry: &CapabilityRegistry,
        count: usize,
        seed: u64,
    ) -> EngineResult<Vec<Map<String, Value>>> {
        let mut rows = Vec::with_capacity(count);
        for row_index in 0..count {
            let mut fields = Map::new();
            for column in &self.columns {
                let handler = registry.resolve(&TypeId::builtin(column.type_tag))?;
                let mut ctx = GenerateContext::new(row_index, column.display_name, seed);
                fields.insert(
                    column.display_name.to_string(),
                    handler.generate(&mut ctx),
                );
            }
            rows.push(fields);
        }
        Ok(rows)
    }
}

/// Built-in table generator templates.
pub(crate) fn builtin_templates() -> HashMap<String, TableTemplate> {
    let mut templates = HashMap::new();

    templates.insert(
        "storeGoods".to_string(),
        TableTemplate {
            name: "Store Goods",
            purpose: Purpose::Sale,
            columns: vec![
                TemplateColumn::new("Name", "text").required(),
                TemplateColumn::new("Sku", "text").unique(),
                TemplateColumn::new("Price", "currency").required(),
                TemplateColumn::new("Quantity", "integer").required(),
                TemplateColumn::new("Origin", "country"),
            ],
            default_row_count: 10,
        },
    );

    templates.insert(
        "rentals".to_string(),
        TableTemplate {
            name: "Rentals",
            purpose: Purpose::Rent,
            columns: vec![
                TemplateColumn::new("Name", "text").required(),
                TemplateColumn::new("Fee", "currency").required(),
                TemplateColumn::new("Used", "integer"),
                TemplateColumn::new("Available", "integer").required(),
            ],
            default_row_count: 5,
        },
    );

    templates.insert(
        "contacts".to_string(),
        TableTemplate {
            name: "Contacts",
            purpose: Purpose::Default,
            columns: vec![
                TemplateColumn::new("Name", "text").required(),
                TemplateColumn::new("Email", "email").unique(),
                TemplateColumn::new("Phone", "phone"),
                TemplateColumn::new("Country", "country"),
            ],
            default_row_count: 5,
        },
    );

    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_resolvable() {
        let registry = CapabilityRegistry::builtins_only();
        for id in ["storeGoods", "rentals", "contacts"] {
            assert!(registry.table_template(id).is_ok(), "template '{}'", id);
        }
        assert!(registry.table_template("dungeonLoot").is_err());
    }

    #[test]
    fn test_generate_rows_covers_every_column() {
        let registry = CapabilityRegistry::builtins_only();
        let template = registry.table_template("storeGoods").unwrap();
        let rows = template
            .generate_rows(&registry, template.default_row_count, 7)
            .unwrap();
        assert_eq!(rows.len(), 10);
        for row in &rows {
            for column in &template.columns {
                assert!(row.contains_key(column.display_name));
            }
        }
    }

    #[test]
    fn test_generate_rows_deterministic_for_seed() {
        let registry = CapabilityRegistry::builtins_only();
        let template = registry.table_template("contacts").unwrap();
        let a = template.generate_rows(&registry, 3, 42).unwrap();
        let b = template.generate_rows(&registry, 3, 42).unwrap();
        assert_eq!(a, b);
    }
}
