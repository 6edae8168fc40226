use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::dsl::{apply_operations, PatchOperation};
use crate::engine::discovery::short_display;
use crate::targets::{EditQueue, TargetAdapter};
use crate::tokens::{expand_tokens, ConfigSource};
use crate::tree::Element;

/// Owned id-to-definition map: the live record set one adapter materializes
/// into. Ids fold ASCII case-insensitively.
#[derive(Debug, Default)]
pub struct DefinitionStore {
    by_id: HashMap<String, Element>,
}

/// A store shared between the host and the adapter that mutates it. The
/// engine is single-threaded per apply pass, so single-thread sharing is
/// all this needs.
pub type SharedStore = Rc<RefCell<DefinitionStore>>;

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Insert or overwrite. Returns the previous definition when `id` was
    /// already present.
    pub fn insert(&mut self, id: &str, definition: Element) -> Option<Element> {
        self.by_id.insert(fold(id), definition)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.by_id.get(&fold(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.by_id.get_mut(&fold(id))
    }

    /// Returns whether anything was removed; removing an absent id is fine.
    pub fn remove(&mut self, id: &str) -> bool {
        self.by_id.remove(&fold(id)).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(&fold(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// (folded id, definition) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.by_id.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn fold(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Adapter that materializes add/replace/edit/remove into a shared
/// [`DefinitionStore`].
///
/// Edits addressing a record that is not materialized yet are queued and
/// drained when a later add supplies the record, preserving per-id order.
pub struct StoreAdapter {
    kind: String,
    category: String,
    store: SharedStore,
    pending: EditQueue,
    config: Option<Box<dyn ConfigSource>>,
}

impl StoreAdapter {
    pub fn new(kind: impl Into<String>, category: impl Into<String>, store: SharedStore) -> Self {
        Self {
            kind: kind.into(),
            category: category.into(),
            store,
            pending: EditQueue::new(),
            config: None,
        }
    }

    /// Enable `${cfg:...}` token expansion over incoming payloads.
    pub fn with_config(mut self, config: Box<dyn ConfigSource>) -> Self {
        self.config = Some(config);
        self
    }

    /// Load a host-provided base definition, keyed by its `Id` attribute.
    /// Returns false (and logs) when the payload has none.
    pub fn seed(&mut self, definition: Element) -> bool {
        match definition.id().map(str::to_string) {
            Some(id) => {
                self.store.borrow_mut().insert(&id, definition);
                true
            }
            None => {
                log::warn!("seed definition <{}> has no Id; skipping", definition.name);
                false
            }
        }
    }

    /// Ids with queued edits that never saw a matching record.
    pub fn pending_edits(&self) -> usize {
        self.pending.len()
    }
}

impl TargetAdapter for StoreAdapter {
    fn target_kind(&self) -> &str {
        &self.kind
    }

    fn data_category(&self) -> &str {
        &self.category
    }

    fn apply_add(&mut self, definition: &Element, source: &Path, replace: bool) {
        let mut definition = definition.clone();
        if let Some(config) = &self.config {
            expand_tokens(&mut definition, config.as_ref());
        }

        let Some(id) = definition.id().map(str::to_string) else {
            log::warn!(
                "{}: definition <{}> has no Id; skipping",
                short_display(source),
                definition.name
            );
            return;
        };

        let mut store = self.store.borrow_mut();
        if store.contains(&id) && !replace {
            log::warn!(
                "{}: id '{id}' already exists; use action='replace' to override",
                short_display(source)
            );
            return;
        }

        let replaced = store.insert(&id, definition).is_some();
        log::info!(
            "{} definition '{id}'",
            if replaced { "replaced" } else { "added" }
        );

        // edits that arrived before the record drain exactly once, in order
        if let Some(ops) = self.pending.take(&id) {
            if let Some(definition) = store.get_mut(&id) {
                let applied = apply_operations(definition, &ops);
                log::info!("drained {applied} pending edit(s) for '{id}'");
            }
        }
    }

    fn apply_edit(&mut self, id: &str, operations: &[PatchOperation], source: &Path) {
        if operations.is_empty() {
            log::warn!(
                "{}: no operations provided for '{id}'",
                short_display(source)
            );
            return;
        }

        let mut store = self.store.borrow_mut();
        match store.get_mut(id) {
            Some(definition) => {
                let applied = apply_operations(definition, operations);
                log::info!(
                    "applied {applied}/{} edit(s) to '{id}'",
                    operations.len()
                );
            }
            None => {
                self.pending.enqueue(id, operations);
                log::info!(
                    "queued {} edit(s) for '{id}' from {} (record not materialized yet)",
                    operations.len(),
                    short_display(source)
                );
            }
        }
    }

    fn apply_remove(&mut self, id: &str, source: &Path) {
        if self.store.borrow_mut().remove(id) {
            log::info!("removed definition '{id}'");
        } else {
            log::info!(
                "{}: remove '{id}': not found (no-op)",
                short_display(source)
            );
        }
        // a re-add after a remove must not resurrect older edits
        self.pending.discard(id);
    }
}
