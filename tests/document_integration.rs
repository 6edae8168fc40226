//! Integration tests for patch-document loading from disk: payload copying,
//! id inference, operation order, and error messages that name the file.

use std::fs;
use std::path::PathBuf;

use defpatch::{DocumentError, OpKind, PatchDocument};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn loads_a_well_formed_add_document() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "010_add.patch.xml",
        r#"<Patch action="add"><Definition><Foo Id="x" v="1"/></Definition></Patch>"#,
    );

    let doc = PatchDocument::load(&path).unwrap();
    assert_eq!(doc.action(), "add");
    assert_eq!(doc.id(), Some("x"));
    assert_eq!(doc.target(), None);

    let payload = doc.definition().unwrap();
    assert_eq!(payload.name, "Foo");
    assert_eq!(payload.attr("Id"), Some("x"));
    assert_eq!(payload.attr("v"), Some("1"));
    assert!(doc.operations().is_empty());
}

#[test]
fn the_stored_payload_outlives_the_source_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "010_add.patch.xml",
        r#"<Patch action="add"><Definition><Foo Id="x" v="1"/></Definition></Patch>"#,
    );

    let doc = PatchDocument::load(&path).unwrap();
    // the document holds its own copy; rewriting the file changes nothing
    fs::write(&path, r#"<Patch action="add"><Definition><Foo Id="x" v="2"/></Definition></Patch>"#)
        .unwrap();
    assert_eq!(doc.definition().unwrap().attr("v"), Some("1"));
}

#[test]
fn set_without_select_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "020_broken.patch.xml",
        r#"<Patch action="edit" id="x"><Set value="1"/></Patch>"#,
    );

    let err = PatchDocument::load(&path).unwrap_err();
    assert!(matches!(err, DocumentError::MissingSelect { .. }));
    let msg = err.to_string();
    assert!(msg.contains("020_broken.patch.xml"), "{msg}");
}

#[test]
fn unreadable_files_report_io_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.patch.xml");
    let err = PatchDocument::load(&path).unwrap_err();
    assert!(matches!(err, DocumentError::Io { .. }));
}

#[test]
fn garbage_content_reports_a_parse_error_with_the_file_name() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "030_garbage.patch.xml", "not xml at all <<<");
    let err = PatchDocument::load(&path).unwrap_err();
    assert!(matches!(err, DocumentError::Xml { .. }));
    assert!(err.to_string().contains("030_garbage.patch.xml"));
}

#[test]
fn wrong_root_element_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "040_root.patch.xml", "<Patches/>");
    let err = PatchDocument::load(&path).unwrap_err();
    assert!(matches!(err, DocumentError::UnexpectedRoot { .. }));
}

#[test]
fn directives_become_operations_in_document_order() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "050_edit.patch.xml",
        r#"<Patch target="GlyphDefinition" action="edit" id="warding">
             <Set select="Costs/Cost[@Kind='Mana']/@Amount" value="12"/>
             <AddNode select="Tags"><Tag Name="Defensive"/></AddNode>
             <RemoveNode select="Tags/Tag[@Name='Cursed']"/>
             <SomeFutureDirective whatever="true"/>
           </Patch>"#,
    );

    let doc = PatchDocument::load(&path).unwrap();
    assert_eq!(doc.target(), Some("GlyphDefinition"));

    let ops = doc.operations();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].kind(), OpKind::Set);
    assert_eq!(ops[0].select(), "Costs/Cost[@Kind='Mana']/@Amount");
    assert_eq!(ops[0].value(), "12");
    assert_eq!(ops[1].kind(), OpKind::AddNode);
    assert_eq!(ops[1].node().unwrap().attr("Name"), Some("Defensive"));
    assert_eq!(ops[2].kind(), OpKind::RemoveNode);
}

#[test]
fn directive_names_are_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "060_case.patch.xml",
        r#"<Patch action="edit" id="x">
             <set select="A" value="1"/>
             <ADDNODE select="B"><C/></ADDNODE>
             <removenode select="D"/>
           </Patch>"#,
    );

    let doc = PatchDocument::load(&path).unwrap();
    assert_eq!(doc.operations().len(), 3);
}

#[test]
fn definition_wrapper_is_skipped_by_the_directive_scan() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "070_mixed.patch.xml",
        r#"<Patch action="add">
             <Definition><Foo Id="x"/></Definition>
             <Set select="A" value="1"/>
           </Patch>"#,
    );

    let doc = PatchDocument::load(&path).unwrap();
    assert!(doc.definition().is_some());
    assert_eq!(doc.operations().len(), 1);
}
