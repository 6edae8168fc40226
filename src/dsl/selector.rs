//! Restricted path resolution for definition trees.
//!
//! Supported grammar: a `/`-separated sequence of segments, each a literal
//! element name, the wildcard `*`, or a name with one equality predicate
//! (`Name[@Attr='Value']`); the final segment may instead be `@AttrName`,
//! switching the result to (element, attribute-name) pairs. Each segment
//! matches direct children only. Element names compare ASCII
//! case-insensitively, predicate values ordinally. An empty or malformed
//! selector resolves to nothing rather than erroring: callers treat zero
//! matches as a no-op.

use std::sync::OnceLock;

use regex::Regex;

use crate::tree::Element;

#[derive(Debug)]
enum SegmentName {
    Any,
    Named(String),
}

#[derive(Debug)]
struct Segment {
    name: SegmentName,
    predicate: Option<(String, String)>,
}

impl Segment {
    fn matches(&self, el: &Element) -> bool {
        let name_ok = match &self.name {
            SegmentName::Any => true,
            SegmentName::Named(n) => el.name.eq_ignore_ascii_case(n),
        };
        if !name_ok {
            return false;
        }
        match &self.predicate {
            // predicate values compare ordinally (case-sensitive)
            Some((attr, value)) => el.attr(attr) == Some(value.as_str()),
            None => true,
        }
    }
}

#[derive(Debug)]
struct Selector {
    segments: Vec<Segment>,
    attribute: Option<String>,
}

fn predicate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([^\[]+)\[@(\w+)\s*=\s*'([^']*)'\]$").expect("predicate pattern is valid")
    })
}

fn parse(path: &str) -> Option<Selector> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    let raw_segments: Vec<&str> = trimmed
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if raw_segments.is_empty() {
        return None;
    }

    let last = raw_segments.len() - 1;
    let mut segments = Vec::with_capacity(raw_segments.len());
    let mut attribute = None;

    for (i, raw) in raw_segments.iter().enumerate() {
        if let Some(name) = raw.strip_prefix('@') {
            // only the final segment may address an attribute
            if i != last || name.is_empty() {
                return None;
            }
            attribute = Some(name.to_string());
            break;
        }

        let segment = match predicate_re().captures(raw) {
            Some(c) => Segment {
                name: segment_name(&c[1]),
                predicate: Some((c[2].to_string(), c[3].to_string())),
            },
            None => Segment {
                name: segment_name(raw),
                predicate: None,
            },
        };
        segments.push(segment);
    }

    Some(Selector {
        segments,
        attribute,
    })
}

fn segment_name(raw: &str) -> SegmentName {
    if raw == "*" {
        SegmentName::Any
    } else {
        SegmentName::Named(raw.to_string())
    }
}

/// Walk matching child-index paths, one per matched element, in document
/// order. An empty segment list never reaches here: `parse` rejects it.
fn resolve(root: &Element, segments: &[Segment]) -> Vec<Vec<usize>> {
    let mut current: Vec<Vec<usize>> = vec![Vec::new()];
    for segment in segments {
        let mut next = Vec::new();
        for path in &current {
            let parent = node_at(root, path);
            for (i, child) in parent.children.iter().enumerate() {
                if segment.matches(child) {
                    let mut extended = path.clone();
                    extended.push(i);
                    next.push(extended);
                }
            }
        }
        if next.is_empty() {
            return Vec::new();
        }
        current = next;
    }
    current
}

pub(crate) fn node_at<'a>(root: &'a Element, path: &[usize]) -> &'a Element {
    path.iter().fold(root, |el, &i| &el.children[i])
}

pub(crate) fn node_at_mut<'a>(root: &'a mut Element, path: &[usize]) -> &'a mut Element {
    path.iter().fold(root, |el, &i| &mut el.children[i])
}

/// True when the selector's final segment addresses an attribute.
pub(crate) fn is_attribute_selector(select: &str) -> bool {
    parse(select).is_some_and(|s| s.attribute.is_some())
}

/// Child-index paths for an element-mode selector; empty for attribute-mode
/// or malformed selectors.
pub(crate) fn resolve_element_paths(root: &Element, select: &str) -> Vec<Vec<usize>> {
    match parse(select) {
        Some(Selector {
            segments,
            attribute: None,
        }) => resolve(root, &segments),
        _ => Vec::new(),
    }
}

/// (child-index path, attribute name) pairs for an attribute-mode selector;
/// empty otherwise. The attribute path must have at least one parent segment.
pub(crate) fn resolve_attribute_paths(root: &Element, select: &str) -> Vec<(Vec<usize>, String)> {
    match parse(select) {
        Some(Selector {
            segments,
            attribute: Some(attr),
        }) if !segments.is_empty() => resolve(root, &segments)
            .into_iter()
            .map(|path| (path, attr.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Ordered descendant elements matched by `path`, taken segment by segment
/// from direct children. Attribute-terminal selectors yield nothing here; use
/// [`select_attributes`] for those.
pub fn select_elements<'a>(root: &'a Element, path: &str) -> Vec<&'a Element> {
    resolve_element_paths(root, path)
        .iter()
        .map(|p| node_at(root, p))
        .collect()
}

/// Ordered (element, attribute-name) pairs for a selector ending in
/// `@AttrName`. The attribute need not exist on the matched elements; pairs
/// name the attribute each caller will read or write.
pub fn select_attributes<'a>(root: &'a Element, select: &str) -> Vec<(&'a Element, String)> {
    resolve_attribute_paths(root, select)
        .into_iter()
        .map(|(p, attr)| (node_at(root, &p), attr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn tree() -> Element {
        parse_document(
            r#"<Root>
                 <A>
                   <B Key="X"><C/><D/></B>
                   <B Key="Y"><E/></B>
                 </A>
               </Root>"#,
        )
        .unwrap()
    }

    #[test]
    fn predicate_and_wildcard_select_in_document_order() {
        let root = tree();
        let matched = select_elements(&root, "A/B[@Key='X']/*");
        let names: Vec<_> = matched.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["C", "D"]);
    }

    #[test]
    fn element_names_match_case_insensitively() {
        let root = tree();
        assert_eq!(select_elements(&root, "a/b[@Key='Y']/e").len(), 1);
    }

    #[test]
    fn predicate_values_match_case_sensitively() {
        let root = tree();
        assert!(select_elements(&root, "A/B[@Key='x']").is_empty());
    }

    #[test]
    fn predicate_attribute_names_match_exactly() {
        let root = tree();
        assert!(select_elements(&root, "A/B[@key='X']").is_empty());
    }

    #[test]
    fn attribute_terminal_selector_yields_pairs() {
        let root = parse_document(r#"<Root><A Name="n1"/></Root>"#).unwrap();
        let pairs = select_attributes(&root, "A/@Name");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.name, "A");
        assert_eq!(pairs[0].1, "Name");
    }

    #[test]
    fn attribute_selector_with_no_matching_parent_is_empty() {
        let root = parse_document("<Root><B/></Root>").unwrap();
        assert!(select_attributes(&root, "A/@Name").is_empty());
    }

    #[test]
    fn attribute_pairs_do_not_require_the_attribute_to_exist() {
        let root = parse_document("<Root><A/></Root>").unwrap();
        let pairs = select_attributes(&root, "A/@Name");
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn empty_and_malformed_selectors_resolve_to_nothing() {
        let root = tree();
        assert!(select_elements(&root, "").is_empty());
        assert!(select_elements(&root, "   ").is_empty());
        assert!(select_elements(&root, "/").is_empty());
        // non-terminal attribute segment
        assert!(select_elements(&root, "@Key/B").is_empty());
        assert!(select_attributes(&root, "A/@Key/B").is_empty());
    }

    #[test]
    fn attribute_terminal_selector_yields_no_elements() {
        let root = tree();
        assert!(select_elements(&root, "A/B/@Key").is_empty());
    }

    #[test]
    fn bare_attribute_selector_has_no_parent_and_is_empty() {
        let root = tree();
        assert!(select_attributes(&root, "@Key").is_empty());
    }

    #[test]
    fn segments_match_direct_children_only() {
        let root = tree();
        // C is a grandchild of A, not a child
        assert!(select_elements(&root, "A/C").is_empty());
    }

    #[test]
    fn wildcard_with_predicate_filters_any_name() {
        let root = tree();
        let matched = select_elements(&root, "A/*[@Key='Y']");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].attr("Key"), Some("Y"));
    }
}
