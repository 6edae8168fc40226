use std::fs;
use std::path::{Path, PathBuf};

use crate::dsl::errors::{locus, short_name, DocumentError};
use crate::dsl::operation::PatchOperation;
use crate::tree::Element;
use crate::xml;

/// Root element name every patch file must use.
pub const PATCH_ROOT_NAME: &str = "Patch";

/// Wrapper element holding the full payload tree for add/replace documents.
pub const DEFINITION_WRAPPER_NAME: &str = "Definition";

/// In-memory representation of a single `*.patch.xml` file.
///
/// Immutable after construction; the engine consumes a document exactly once
/// during dispatch and discards it.
#[derive(Debug, Clone)]
pub struct PatchDocument {
    source_path: PathBuf,
    target: Option<String>,
    action: String,
    id: Option<String>,
    definition: Option<Element>,
    operations: Vec<PatchOperation>,
}

impl PatchDocument {
    /// Read and parse one patch file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            file: short_name(path),
            source,
        })?;
        Self::parse(&input, path)
    }

    /// Parse patch file contents. `source_path` is provenance for
    /// diagnostics only; nothing is read from disk.
    pub fn parse(input: &str, source_path: &Path) -> Result<Self, DocumentError> {
        let root = xml::parse_document(input).map_err(|source| DocumentError::Xml {
            file: short_name(source_path),
            source,
        })?;

        if !root.has_name(PATCH_ROOT_NAME) {
            return Err(DocumentError::UnexpectedRoot {
                file: short_name(source_path),
                found: root.name.clone(),
            });
        }

        let target = root.attr("target").and_then(non_blank);
        let action = root.attr("action").unwrap_or_default().trim().to_string();
        let mut id = root.attr("id").and_then(non_blank);

        // Payload block for add/replace: first child element inside the
        // wrapper, deep-copied so later mutation of the parsed source tree
        // cannot retroactively change the stored document.
        let mut definition = None;
        if let Some(wrapper) = root.child(DEFINITION_WRAPPER_NAME) {
            if let Some(payload) = wrapper.children.first() {
                let payload = payload.clone();
                if id.is_none() {
                    id = payload.id().map(str::to_string);
                }
                definition = Some(payload);
            }
        }

        // Directive children become operations in encounter order; order
        // matters, operations are applied exactly as written.
        let mut operations = Vec::new();
        for child in &root.children {
            if child.has_name(DEFINITION_WRAPPER_NAME) {
                continue;
            }

            if child.has_name("Set") {
                let select = require_select(child, "Set", source_path)?;
                let op = PatchOperation::set(select, child.attr("value")).map_err(|_| {
                    DocumentError::MissingSelect {
                        directive: "Set".to_string(),
                        locus: locus(source_path, child.location),
                    }
                })?;
                operations.push(op);
            } else if child.has_name("AddNode") {
                let select = require_select(child, "AddNode", source_path)?;
                if child.children.len() != 1 {
                    return Err(DocumentError::AddNodePayload {
                        locus: locus(source_path, child.location),
                    });
                }
                let op =
                    PatchOperation::add_node(select, &child.children[0]).map_err(|_| {
                        DocumentError::MissingSelect {
                            directive: "AddNode".to_string(),
                            locus: locus(source_path, child.location),
                        }
                    })?;
                operations.push(op);
            } else if child.has_name("RemoveNode") {
                let select = require_select(child, "RemoveNode", source_path)?;
                let op = PatchOperation::remove_node(select).map_err(|_| {
                    DocumentError::MissingSelect {
                        directive: "RemoveNode".to_string(),
                        locus: locus(source_path, child.location),
                    }
                })?;
                operations.push(op);
            } else {
                // unknown directives are ignored for forward compatibility
                log::debug!(
                    "{}: ignoring unknown patch directive <{}>",
                    short_name(source_path),
                    child.name
                );
            }
        }

        Ok(Self {
            source_path: source_path.to_path_buf(),
            target,
            action,
            id,
            definition,
            operations,
        })
    }

    /// Original file path, for logging.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Declared target kind. `None` when the attribute is absent or blank,
    /// in which case category-based discovery alone scopes the document.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Raw trimmed action string; dispatch interprets it case-insensitively.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Logical id of the addressed definition. Required for edit/remove;
    /// inferred from the payload's `Id` attribute for add/replace when not
    /// given on the root.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Full payload tree for add/replace documents.
    pub fn definition(&self) -> Option<&Element> {
        self.definition.as_ref()
    }

    /// Edit operations in document order.
    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }
}

fn require_select<'a>(
    child: &'a Element,
    directive: &str,
    source_path: &Path,
) -> Result<&'a str, DocumentError> {
    match child.attr("select") {
        Some(select) if !select.trim().is_empty() => Ok(select),
        _ => Err(DocumentError::MissingSelect {
            directive: directive.to_string(),
            locus: locus(source_path, child.location),
        }),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::operation::OpKind;

    fn parse(input: &str) -> Result<PatchDocument, DocumentError> {
        PatchDocument::parse(input, Path::new("packs/demo/010_test.patch.xml"))
    }

    #[test]
    fn reads_root_attributes_trimmed() {
        let doc = parse(r#"<Patch target="Glyph" action=" edit " id="x"/>"#).unwrap();
        assert_eq!(doc.target(), Some("Glyph"));
        assert_eq!(doc.action(), "edit");
        assert_eq!(doc.id(), Some("x"));
    }

    #[test]
    fn blank_target_reads_as_absent() {
        let doc = parse(r#"<Patch target="  " action="edit" id="x"/>"#).unwrap();
        assert_eq!(doc.target(), None);
    }

    #[test]
    fn root_name_is_case_insensitive() {
        assert!(parse(r#"<patch action="add"/>"#).is_ok());
    }

    #[test]
    fn wrong_root_is_rejected_with_file_name() {
        let err = parse("<NotAPatch/>").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("010_test.patch.xml"), "{msg}");
        assert!(msg.contains("NotAPatch"), "{msg}");
    }

    #[test]
    fn id_is_inferred_from_the_payload() {
        let doc = parse(
            r#"<Patch action="add">
                 <Definition><Foo Id="x" v="1"/></Definition>
               </Patch>"#,
        )
        .unwrap();
        assert_eq!(doc.id(), Some("x"));
        assert_eq!(doc.definition().unwrap().attr("v"), Some("1"));
    }

    #[test]
    fn explicit_id_wins_over_payload_id() {
        let doc = parse(
            r#"<Patch action="replace" id="explicit">
                 <Definition><Foo Id="payload"/></Definition>
               </Patch>"#,
        )
        .unwrap();
        assert_eq!(doc.id(), Some("explicit"));
    }

    #[test]
    fn operations_keep_document_order() {
        let doc = parse(
            r#"<Patch action="edit" id="x">
                 <Set select="A/@v" value="1"/>
                 <RemoveNode select="B"/>
                 <AddNode select="C"><D/></AddNode>
               </Patch>"#,
        )
        .unwrap();
        let kinds: Vec<_> = doc.operations().iter().map(|op| op.kind()).collect();
        assert_eq!(kinds, [OpKind::Set, OpKind::RemoveNode, OpKind::AddNode]);
    }

    #[test]
    fn set_without_select_fails_with_locus() {
        let err = parse(
            "<Patch action=\"edit\" id=\"x\">\n  <Set value=\"1\"/>\n</Patch>",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Set"), "{msg}");
        assert!(msg.contains("010_test.patch.xml"), "{msg}");
        assert!(msg.contains("line 2"), "{msg}");
    }

    #[test]
    fn add_node_requires_exactly_one_payload_child() {
        let none = parse(
            r#"<Patch action="edit" id="x"><AddNode select="A"/></Patch>"#,
        );
        assert!(matches!(none, Err(DocumentError::AddNodePayload { .. })));

        let two = parse(
            r#"<Patch action="edit" id="x"><AddNode select="A"><B/><C/></AddNode></Patch>"#,
        );
        assert!(matches!(two, Err(DocumentError::AddNodePayload { .. })));
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let doc = parse(
            r#"<Patch action="edit" id="x">
                 <FancyFutureDirective select="A"/>
                 <Set select="B" value="2"/>
               </Patch>"#,
        )
        .unwrap();
        assert_eq!(doc.operations().len(), 1);
    }

    #[test]
    fn payload_is_detached_from_the_source_document() {
        let doc = parse(
            r#"<Patch action="add"><Definition><Foo Id="x"><Bar/></Foo></Definition></Patch>"#,
        )
        .unwrap();
        // the stored payload is a copy rooted at <Foo>, not a view into the file tree
        let payload = doc.definition().unwrap();
        assert_eq!(payload.name, "Foo");
        assert_eq!(payload.children.len(), 1);
    }
}
