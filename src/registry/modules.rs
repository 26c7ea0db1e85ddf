//! Module capabilities and the per-request active-module snapshot.
//!
//! The registry never reads a shared "currently active modules" set.
//! Callers capture a `ModuleSnapshot` from the `ModuleLifecycle`
//! collaborator at the start of a request and pass it in explicitly, so
//! every operation sees one consistent view of module state.

use std::collections::HashMap;
use std::sync::Arc;

use super::generators::TableTemplate;
use super::handlers::TypeHandler;

/// What an installed module contributes while active.
#[derive(Clone, Default)]
pub struct ModuleCapabilities {
    /// Column type tag → handler; exposed to the registry as `module:tag`.
    pub column_types: HashMap<String, Arc<dyn TypeHandler>>,
    /// Table generator name → template; exposed as `module:name`.
    pub table_generators: HashMap<String, TableTemplate>,
}

/// Module lifecycle collaborator, consumed at snapshot time.
pub trait ModuleLifecycle: Send + Sync {
    /// Identifiers of modules currently in the active state.
    fn list_active_modules(&self) -> Vec<String>;

    /// Capabilities of a module, active or not.
    fn module_capabilities(&self, module_id: &str) -> Option<ModuleCapabilities>;
}

/// A consistent view of active modules, captured once per request.
#[derive(Clone, Default)]
pub struct ModuleSnapshot {
    active: HashMap<String, ModuleCapabilities>,
}

impl ModuleSnapshot {
    /// Snapshot with no active modules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Captures the current active set from the lifecycle collaborator.
    pub fn capture(lifecycle: &dyn ModuleLifecycle) -> Self {
        let mut active = HashMap::new();
        for module_id in lifecycle.list_active_modules() {
            if let Some(caps) = lifecycle.module_capabilities(&module_id) {
                active.insert(module_id, caps);
            }
        }
        Self { active }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModuleCapabilities)> {
        self.active.iter()
    }

    pub fn is_active(&self, module_id: &str) -> bool {
        self.active.contains_key(module_id)
    }
}
