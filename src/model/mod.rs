//! Core data model: tables, columns, rows.
//!
//! Rows are structurally untyped `serde_json` maps; they are typed only by
//! reference to the owning table's `Column` records at the mutation
//! boundary. The storage layer never interprets field values.

mod naming;
mod roles;
mod types;

pub use naming::{display_name, internal_name};
pub use roles::{is_protected, price_column, quantity_column, role_of, ColumnRole};
pub use types::{Column, Purpose, Row, Table, TypeId, Visibility};
