//! DefPatch: declarative patching of definition data by content packs
//!
//! Content packs layer `*.patch.xml` documents on top of a host
//! application's tree-shaped definition records, adding, replacing, editing,
//! or removing records without touching the host's own data files.
//!
//! # Architecture
//!
//! Patch files are discovered under `<pack>/DefPatch/<category>/`, ordered by
//! the numeric prefix of their file names, parsed into [`PatchDocument`]s,
//! and dispatched by the [`PatchEngine`] to whatever [`TargetAdapter`] is
//! registered for the requested target kind. Edit documents carry
//! [`PatchOperation`] lists whose selectors a deliberately small path
//! language resolves against the definition tree.
//!
//! # Failure policy
//!
//! One bad file never aborts a pass. Structural errors surface as
//! [`DocumentError`] from [`PatchDocument::load`]; the engine logs them and
//! moves on. A selector matching zero nodes is a defined no-op, unknown
//! actions and directives are warnings, and adapters absorb their own
//! failures.
//!
//! # Example
//!
//! ```no_run
//! use defpatch::{AdapterRegistry, DefinitionStore, PatchEngine, StoreAdapter};
//! use std::path::PathBuf;
//! use std::rc::Rc;
//!
//! let store = DefinitionStore::shared();
//! let mut registry = AdapterRegistry::new();
//! registry.register(Box::new(StoreAdapter::new(
//!     "GlyphDefinition",
//!     "Glyphs",
//!     Rc::clone(&store),
//! )));
//!
//! let mut engine = PatchEngine::new(registry, vec![PathBuf::from("mods/alpha")]);
//! let dispatched = engine.apply("GlyphDefinition");
//! println!("{dispatched} patch file(s) applied, {} definition(s)", store.borrow().len());
//! ```

pub mod dsl;
pub mod engine;
pub mod targets;
pub mod tokens;
pub mod tree;
pub mod xml;

// Re-exports
pub use dsl::{
    apply_operations, select_attributes, select_elements, DocumentError, OpKind, OperationError,
    PatchDocument, PatchOperation, DEFINITION_WRAPPER_NAME, PATCH_ROOT_NAME,
};
pub use engine::{AdapterRegistry, PatchEngine, PACK_DATA_DIR, PATCH_FILE_SUFFIX};
pub use targets::{
    DefinitionStore, EditQueue, FieldError, FieldSetter, FieldTable, SharedStore, StoreAdapter,
    TargetAdapter,
};
pub use tokens::{expand_tokens, ConfigSource, StaticConfig};
pub use tree::{Element, Location};
pub use xml::{parse_document, write_document, write_document_pretty, XmlError};
