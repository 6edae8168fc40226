//! Target adapters: the collaborators that materialize patch verbs against
//! one kind of live record.

mod fields;
mod queue;
mod store;

pub use fields::{FieldError, FieldSetter, FieldTable};
pub use queue::EditQueue;
pub use store::{DefinitionStore, SharedStore, StoreAdapter};

use std::path::Path;

use crate::dsl::PatchOperation;
use crate::tree::Element;

/// One target kind's bridge from generic patch documents to live records.
///
/// Adapters are defensive: they log and absorb their own failures rather
/// than letting them cross the dispatch boundary, and the engine relies on
/// that when it counts a dispatch as processed.
pub trait TargetAdapter {
    /// Logical identifier requests are matched against, e.g. `GlyphDefinition`.
    fn target_kind(&self) -> &str;

    /// On-disk category folder scanned for this kind, e.g. `Glyphs`.
    fn data_category(&self) -> &str;

    /// Materialize a new record, or overwrite an existing one when
    /// `replace` is set. The adapter extracts the id from the payload.
    fn apply_add(&mut self, definition: &Element, source: &Path, replace: bool);

    /// Mutate an existing record. Adapters may defer the mutation (e.g.
    /// queue it for a later construction point) as long as per-id ordering
    /// is preserved.
    fn apply_edit(&mut self, id: &str, operations: &[PatchOperation], source: &Path);

    /// Delete a record by id. Removing a nonexistent id is a no-op, never
    /// an error.
    fn apply_remove(&mut self, id: &str, source: &Path);
}
