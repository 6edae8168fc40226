//! The patch engine: discovers candidate files for a target kind, parses
//! each into a document, and dispatches it to the registered adapter.
//!
//! Every per-file failure is isolated. A malformed or adapter-rejected file
//! is logged and skipped; it never prevents the remaining files of the pass
//! from being processed.

pub mod discovery;
mod registry;

pub use discovery::{PACK_DATA_DIR, PATCH_FILE_SUFFIX};
pub use registry::AdapterRegistry;

use std::path::PathBuf;

use crate::dsl::PatchDocument;
use crate::engine::discovery::short_display;

/// Synchronous, single-threaded patch driver. Discovery, parsing, sorting,
/// and dispatch happen sequentially per [`PatchEngine::apply`] call; the
/// engine performs no cross-call locking.
pub struct PatchEngine {
    registry: AdapterRegistry,
    pack_roots: Vec<PathBuf>,
}

impl PatchEngine {
    pub fn new(registry: AdapterRegistry, pack_roots: Vec<PathBuf>) -> Self {
        Self {
            registry,
            pack_roots,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.registry
    }

    pub fn pack_roots(&self) -> &[PathBuf] {
        &self.pack_roots
    }

    /// Apply all patches addressing `target_kind`. Returns the number of
    /// documents dispatched to the adapter; parse failures, target
    /// mismatches, and skipped documents do not count.
    pub fn apply(&mut self, target_kind: &str) -> usize {
        let Some(adapter) = self.registry.resolve_mut(target_kind) else {
            log::warn!("no adapter registered for target '{target_kind}'; skipping");
            return 0;
        };

        let category = adapter.data_category().trim().to_string();
        if category.is_empty() {
            log::warn!("adapter for '{target_kind}' did not provide a data category; skipping");
            return 0;
        }

        let files = discovery::patch_files(&self.pack_roots, &category);
        if files.is_empty() {
            log::info!(
                "no patch files found for target '{target_kind}' under {PACK_DATA_DIR}/{category}"
            );
            return 0;
        }

        let mut applied = 0;
        for path in &files {
            let doc = match PatchDocument::load(path) {
                Ok(doc) => doc,
                Err(err) => {
                    log::error!("failed to load patch file {}: {err}", short_display(path));
                    continue;
                }
            };

            if !is_for_target(&doc, target_kind) {
                log::debug!(
                    "skipping {}: target '{}' does not match '{target_kind}'",
                    short_display(path),
                    doc.target().unwrap_or_default()
                );
                continue;
            }

            let action = doc.action().to_ascii_lowercase();
            match action.as_str() {
                "add" | "replace" => match doc.definition() {
                    Some(definition) => {
                        adapter.apply_add(definition, path, action == "replace");
                        applied += 1;
                        log::info!("[apply] {action} <- {}", short_display(path));
                    }
                    None => log::warn!(
                        "{}: missing <Definition> for '{action}'; skipping",
                        short_display(path)
                    ),
                },
                "edit" => match doc.id() {
                    Some(id) => {
                        adapter.apply_edit(id, doc.operations(), path);
                        applied += 1;
                        log::info!("[apply] edit(id='{id}') <- {}", short_display(path));
                    }
                    None => log::warn!(
                        "{}: 'edit' requires an 'id' attribute; skipping",
                        short_display(path)
                    ),
                },
                "remove" => match doc.id() {
                    Some(id) => {
                        adapter.apply_remove(id, path);
                        applied += 1;
                        log::info!("[apply] remove(id='{id}') <- {}", short_display(path));
                    }
                    None => log::warn!(
                        "{}: 'remove' requires an 'id' attribute; skipping",
                        short_display(path)
                    ),
                },
                _ => log::warn!(
                    "{}: unknown action '{}'; expected add|replace|edit|remove",
                    short_display(path),
                    doc.action()
                ),
            }
        }

        applied
    }
}

/// The three-way applicability rule: an absent target accepts (category
/// discovery already scoped the file), a matching one accepts, a declared
/// but different one skips.
fn is_for_target(doc: &PatchDocument, target_kind: &str) -> bool {
    match doc.target() {
        None => true,
        Some(declared) => declared.eq_ignore_ascii_case(target_kind),
    }
}
