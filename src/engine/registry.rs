use std::collections::HashMap;

use crate::targets::TargetAdapter;

/// Owned map of target kind to adapter, looked up ASCII case-insensitively.
///
/// Explicitly constructed and passed into the engine; there is no ambient
/// registry, so tests instantiate isolated instances.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn TargetAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own target kind. A later registration
    /// for the same kind replaces the earlier one.
    pub fn register(&mut self, adapter: Box<dyn TargetAdapter>) {
        let kind = fold(adapter.target_kind());
        if self.adapters.insert(kind, adapter).is_some() {
            log::warn!("replaced previously registered adapter");
        }
    }

    pub fn resolve(&self, target_kind: &str) -> Option<&dyn TargetAdapter> {
        if target_kind.trim().is_empty() {
            return None;
        }
        self.adapters.get(&fold(target_kind)).map(|a| a.as_ref())
    }

    pub fn resolve_mut(&mut self, target_kind: &str) -> Option<&mut Box<dyn TargetAdapter>> {
        if target_kind.trim().is_empty() {
            return None;
        }
        self.adapters.get_mut(&fold(target_kind))
    }

    /// Registered kinds, folded to lower case.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

fn fold(kind: &str) -> String {
    kind.trim().to_ascii_lowercase()
}
