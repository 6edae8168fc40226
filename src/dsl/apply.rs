//! Applies an operation list to an in-memory definition tree.
//!
//! Selectors resolve to child-index paths first, then mutation walks the
//! paths; resolving and mutating in one traversal would alias the tree.

use crate::dsl::operation::{OpKind, PatchOperation};
use crate::dsl::selector;
use crate::tree::Element;

/// Apply `operations` to `root` in order. A selector matching zero nodes is
/// a silent no-op for that operation. Returns the number of operations that
/// matched at least one node.
pub fn apply_operations(root: &mut Element, operations: &[PatchOperation]) -> usize {
    let mut applied = 0;
    for op in operations {
        let hits = apply_one(root, op);
        if hits > 0 {
            applied += 1;
        } else {
            log::debug!(
                "selector '{}' matched nothing; {:?} is a no-op",
                op.select(),
                op.kind()
            );
        }
    }
    applied
}

fn apply_one(root: &mut Element, op: &PatchOperation) -> usize {
    match op.kind() {
        OpKind::Set => {
            if selector::is_attribute_selector(op.select()) {
                let targets = selector::resolve_attribute_paths(root, op.select());
                let hits = targets.len();
                for (path, attr) in targets {
                    selector::node_at_mut(root, &path).set_attr(&attr, op.value());
                }
                hits
            } else {
                let paths = selector::resolve_element_paths(root, op.select());
                for path in &paths {
                    selector::node_at_mut(root, path).set_text(op.value());
                }
                paths.len()
            }
        }
        OpKind::AddNode => {
            let paths = selector::resolve_element_paths(root, op.select());
            if let Some(node) = op.node() {
                for path in &paths {
                    selector::node_at_mut(root, path).children.push(node.clone());
                }
            }
            paths.len()
        }
        OpKind::RemoveNode => {
            let paths = selector::resolve_element_paths(root, op.select());
            // reverse document order keeps sibling indices valid; all matches
            // sit at the same depth, so none is an ancestor of another
            for path in paths.iter().rev() {
                if let Some((&child, parent)) = path.split_last() {
                    selector::node_at_mut(root, parent).children.remove(child);
                }
            }
            paths.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn glyph() -> Element {
        parse_document(
            r#"<Glyph Id="warding">
                 <Costs>
                   <Cost Kind="Mana" Amount="10"/>
                   <Cost Kind="Gold" Amount="5"/>
                 </Costs>
                 <Tags>
                   <Tag Name="Cursed"/>
                 </Tags>
                 <Description>old</Description>
               </Glyph>"#,
        )
        .unwrap()
    }

    fn op_set(select: &str, value: &str) -> PatchOperation {
        PatchOperation::set(select, Some(value)).unwrap()
    }

    #[test]
    fn set_upserts_attributes_on_every_match() {
        let mut root = glyph();
        let n = apply_operations(&mut root, &[op_set("Costs/Cost/@Amount", "0")]);
        assert_eq!(n, 1);
        for cost in &root.children[0].children {
            assert_eq!(cost.attr("Amount"), Some("0"));
        }
    }

    #[test]
    fn set_creates_a_missing_attribute() {
        let mut root = glyph();
        apply_operations(&mut root, &[op_set("Tags/Tag/@Weight", "2")]);
        assert_eq!(root.children[1].children[0].attr("Weight"), Some("2"));
    }

    #[test]
    fn set_replaces_element_text() {
        let mut root = glyph();
        apply_operations(&mut root, &[op_set("Description", "new")]);
        assert_eq!(root.children[2].text.as_deref(), Some("new"));
    }

    #[test]
    fn add_node_appends_under_each_match() {
        let mut root = glyph();
        let mut tag = Element::new("Tag");
        tag.set_attr("Name", "Defensive");
        let op = PatchOperation::add_node("Tags", &tag).unwrap();
        assert_eq!(apply_operations(&mut root, &[op]), 1);
        let tags = &root.children[1].children;
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].attr("Name"), Some("Defensive"));
    }

    #[test]
    fn remove_node_detaches_matches() {
        let mut root = glyph();
        let op = PatchOperation::remove_node("Costs/Cost[@Kind='Gold']").unwrap();
        assert_eq!(apply_operations(&mut root, &[op]), 1);
        let costs = &root.children[0].children;
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].attr("Kind"), Some("Mana"));
    }

    #[test]
    fn remove_node_handles_multiple_siblings() {
        let mut root = glyph();
        let op = PatchOperation::remove_node("Costs/*").unwrap();
        apply_operations(&mut root, &[op]);
        assert!(root.children[0].children.is_empty());
    }

    #[test]
    fn zero_matches_is_a_no_op_not_an_error() {
        let mut root = glyph();
        let before = root.clone();
        let n = apply_operations(
            &mut root,
            &[
                op_set("Missing/Path/@x", "1"),
                PatchOperation::remove_node("Nothing").unwrap(),
            ],
        );
        assert_eq!(n, 0);
        assert_eq!(root, before);
    }

    #[test]
    fn operations_apply_in_written_order() {
        let mut root = glyph();
        // the second operation depends on the node added by the first
        let mut wrapper = Element::new("Notes");
        let ops = vec![
            PatchOperation::add_node("Tags", &wrapper.clone()).unwrap(),
            op_set("Tags/Notes", "added then edited"),
        ];
        wrapper.set_text("ignored");
        assert_eq!(apply_operations(&mut root, &ops), 2);
        let notes = &root.children[1].children[1];
        assert_eq!(notes.text.as_deref(), Some("added then edited"));
    }
}
