//! Table, column, and row definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Who can see and query a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
    Shared,
}

/// What a table is for. Purpose determines which column roles are protected
/// and whether row writes feed the inventory ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Default,
    Sale,
    Rent,
}

/// A column type identifier: a built-in tag, or a module-supplied tag
/// namespaced as `module:tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn builtin(tag: &str) -> Self {
        Self(tag.to_string())
    }

    pub fn module(module_id: &str, tag: &str) -> Self {
        Self(format!("{}:{}", module_id, tag))
    }

    /// The owning module id, if this is a namespaced module type.
    pub fn module_id(&self) -> Option<&str> {
        self.0.split_once(':').map(|(m, _)| m)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A user-defined table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: Visibility,
    pub purpose: Purpose,
    /// Owning actor identifier
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table {
    pub fn new(name: impl Into<String>, purpose: Purpose, owner: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            visibility: Visibility::Private,
            purpose,
            owner: owner.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A column definition. `name` is the internal camelCase identifier; the
/// display form is always derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub table_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: TypeId,
    #[serde(default)]
    pub required: bool,
    /// Duplicates are allowed unless explicitly forbidden.
    #[serde(default = "default_true")]
    pub allow_duplicates: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Dense, zero-based, unique per table. Kept contiguous by an explicit
    /// recount, not on every write.
    pub position: u32,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(table_id: Uuid, name: impl Into<String>, type_id: TypeId, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            table_id,
            name: name.into(),
            type_id,
            required: false,
            allow_duplicates: true,
            default_value: None,
            position,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.allow_duplicates = false;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// The derived display name, e.g. `unitPrice` → `Unit Price`.
    pub fn display_name(&self) -> String {
        super::naming::display_name(&self.name)
    }
}

/// A row: an opaque field map typed only against the table's columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub id: Uuid,
    pub table_id: Uuid,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Row {
    pub fn new(table_id: Uuid, fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            table_id,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_id_namespacing() {
        let builtin = TypeId::builtin("currency");
        assert_eq!(builtin.module_id(), None);
        assert_eq!(builtin.as_str(), "currency");

        let modded = TypeId::module("barcodes", "ean13");
        assert_eq!(modded.module_id(), Some("barcodes"));
        assert_eq!(modded.as_str(), "barcodes:ean13");
    }

    #[test]
    fn test_column_defaults_allow_duplicates() {
        let table = Table::new("goods", Purpose::Sale, "alice");
        let col = Column::new(table.id, "price", TypeId::builtin("currency"), 0);
        assert!(col.allow_duplicates);
        assert!(!col.required);
    }

    #[test]
    fn test_column_allow_duplicates_default_when_absent_in_json() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "table_id": Uuid::new_v4(),
            "name": "sku",
            "type": "text",
            "position": 0
        });
        let col: Column = serde_json::from_value(raw).unwrap();
        assert!(col.allow_duplicates);
    }

    #[test]
    fn test_display_name_derived() {
        let table = Table::new("goods", Purpose::Default, "alice");
        let col = Column::new(table.id, "unitPrice", TypeId::builtin("currency"), 0);
        assert_eq!(col.display_name(), "Unit Price");
    }
}
