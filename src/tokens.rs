//! Config token expansion for payload trees.
//!
//! Authors can write `${cfg:namespace/key}` as the whole value of any
//! attribute in an add/replace payload; the adapter expands it against a
//! pluggable configuration source before materializing the record. An
//! unresolved token becomes the empty string, with a warning, so a missing
//! config entry degrades the one value instead of failing the file.

use std::collections::HashMap;

use crate::tree::Element;

const TOKEN_PREFIX: &str = "${cfg:";
const TOKEN_SUFFIX: char = '}';

/// Supplies values for `${cfg:namespace/key}` tokens.
pub trait ConfigSource {
    fn get(&self, namespace: &str, key: &str) -> Option<String>;
}

/// Fixed in-memory configuration, mainly for hosts that load settings up
/// front and for tests.
#[derive(Debug, Default)]
pub struct StaticConfig {
    values: HashMap<(String, String), String>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.set(namespace, key, value);
        self
    }

    pub fn set(&mut self, namespace: &str, key: &str, value: &str) {
        self.values
            .insert((namespace.to_string(), key.to_string()), value.to_string());
    }
}

impl ConfigSource for StaticConfig {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.values
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }
}

/// Expand every whole-value attribute token in the subtree rooted at `root`.
pub fn expand_tokens(root: &mut Element, config: &dyn ConfigSource) {
    for (_, value) in &mut root.attributes {
        if let Some(expanded) = expand(value.trim(), config) {
            *value = expanded;
        }
    }
    for child in &mut root.children {
        expand_tokens(child, config);
    }
}

fn expand(raw: &str, config: &dyn ConfigSource) -> Option<String> {
    let body = raw.strip_prefix(TOKEN_PREFIX)?.strip_suffix(TOKEN_SUFFIX)?;
    let (namespace, key) = body.split_once('/').unwrap_or((body, ""));
    match config.get(namespace, key) {
        Some(value) => Some(value),
        None => {
            log::warn!("unresolved config token '{raw}'; substituting empty string");
            Some(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn expands_whole_value_tokens_anywhere_in_the_subtree() {
        let mut root = parse_document(
            r#"<Glyph Id="x" Cost="${cfg:demo/SlotsCost}">
                 <Upgrade Cost="${cfg:demo/UpgradeCost}"/>
               </Glyph>"#,
        )
        .unwrap();
        let config = StaticConfig::new()
            .with("demo", "SlotsCost", "4")
            .with("demo", "UpgradeCost", "9");

        expand_tokens(&mut root, &config);
        assert_eq!(root.attr("Cost"), Some("4"));
        assert_eq!(root.children[0].attr("Cost"), Some("9"));
    }

    #[test]
    fn unresolved_tokens_become_empty() {
        let mut root = parse_document(r#"<Glyph Cost="${cfg:demo/Missing}"/>"#).unwrap();
        expand_tokens(&mut root, &StaticConfig::new());
        assert_eq!(root.attr("Cost"), Some(""));
    }

    #[test]
    fn partial_and_non_token_values_are_untouched() {
        let mut root = parse_document(
            r#"<Glyph A="plain" B="prefix ${cfg:demo/K}" C="${cfg:demo/K} suffix"/>"#,
        )
        .unwrap();
        let config = StaticConfig::new().with("demo", "K", "v");

        expand_tokens(&mut root, &config);
        assert_eq!(root.attr("A"), Some("plain"));
        // only whole-value tokens expand
        assert_eq!(root.attr("B"), Some("prefix ${cfg:demo/K}"));
        assert_eq!(root.attr("C"), Some("${cfg:demo/K} suffix"));
    }

    #[test]
    fn namespace_only_tokens_look_up_an_empty_key() {
        let mut root = parse_document(r#"<Glyph Cost="${cfg:demo}"/>"#).unwrap();
        let config = StaticConfig::new().with("demo", "", "7");
        expand_tokens(&mut root, &config);
        assert_eq!(root.attr("Cost"), Some("7"));
    }
}
