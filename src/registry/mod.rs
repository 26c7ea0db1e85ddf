//! # Capability Registry
//!
//! Maps a column type identifier to its behavior: `validate`, `format`,
//! `generate`. Built-in types are registered at construction; module types
//! are contributed by a `ModuleSnapshot` captured per request, so the
//! registry never consults ambient global state.
//!
//! Resolution is a pure lookup. An unknown type identifier is a recoverable
//! `NotFound` the caller must handle — a write against it is rejected, not
//! crashed. Deactivating a module makes its types unresolvable for new
//! validation only; existing rows keep their values.

mod countries;
mod generators;
mod handlers;
mod modules;

use std::collections::HashMap;
use std::sync::Arc;

pub use countries::{country_name, Country};
pub use generators::{TableTemplate, TemplateColumn};
pub use handlers::{builtin_handlers, GenerateContext, TypeHandler, BUILTIN_TAGS, FALSY, TRUTHY};
pub use modules::{ModuleCapabilities, ModuleLifecycle, ModuleSnapshot};

#[cfg(test)]
pub(crate) use modules::test_support;

use crate::errors::{EngineError, EngineResult};
use crate::model::TypeId;

/// The per-request capability registry.
pub struct CapabilityRegistry {
    handlers: HashMap<TypeId, Arc<dyn TypeHandler>>,
    table_generators: HashMap<String, TableTemplate>,
}

impl CapabilityRegistry {
    /// Builds a registry holding the built-in types plus everything the
    /// given snapshot's active modules contribute.
    pub fn with_modules(snapshot: &ModuleSnapshot) -> Self {
        let mut handlers = builtin_handlers();
        let mut table_generators = generators::builtin_templates();

        for (module_id, caps) in snapshot.iter() {
            for (tag, handler) in &caps.column_types {
                handlers.insert(TypeId::module(module_id, tag), Arc::clone(handler));
            }
            for (name, template) in &caps.table_generators {
                table_generators.insert(format!("{}:{}", module_id, name), template.clone());
            }
        }

        Self {
            handlers,
            table_generators,
        }
    }

    /// Built-ins only; equivalent to a snapshot with no active modules.
    pub fn builtins_only() -> Self {
        Self::with_modules(&ModuleSnapshot::empty())
    }

    /// Resolves a type identifier to its handler.
    pub fn resolve(&self, type_id: &TypeId) -> EngineResult<&dyn TypeHandler> {
        self.handlers
            .get(type_id)
            .map(|h| h.as_ref())
            .ok_or_else(|| EngineError::not_found(format!("column type '{}'", type_id)))
    }

    /// Whether the identifier resolves at all.
    pub fn is_resolvable(&self, type_id: &TypeId) -> bool {
        self.handlers.contains_key(type_id)
    }

    /// Resolves a table-generator identifier to its schema template.
    pub fn table_template(&self, id: &str) -> EngineResult<&TableTemplate> {
        self.table_generators
            .get(id)
            .ok_or_else(|| EngineError::not_found(format!("table generator '{}'", id)))
    }

    /// All resolvable table-generator identifiers.
    pub fn table_generator_ids(&self) -> Vec<&str> {
        self.table_generators.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_always_resolvable() {
        let registry = CapabilityRegistry::builtins_only();
        for tag in BUILTIN_TAGS {
            assert!(
                registry.is_resolvable(&TypeId::builtin(tag)),
                "builtin '{}' must resolve",
                tag
            );
        }
    }

    #[test]
    fn test_unknown_type_is_recoverable_not_found() {
        let registry = CapabilityRegistry::builtins_only();
        let err = registry.resolve(&TypeId::builtin("hologram")).unwrap_err();
        assert_eq!(err.status().code(), 404);
    }

    #[test]
    fn test_module_types_namespaced_and_gated_on_snapshot() {
        let snapshot = test_support::snapshot_with_barcode_module();
        let registry = CapabilityRegistry::with_modules(&snapshot);
        assert!(registry.is_resolvable(&TypeId::module("barcodes", "ean")));

        // A registry built without the module cannot see its types.
        let bare = CapabilityRegistry::builtins_only();
        assert!(!bare.is_resolvable(&TypeId::module("barcodes", "ean")));
    }
}
