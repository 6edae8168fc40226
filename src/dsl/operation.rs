use thiserror::Error;

use crate::tree::Element;

/// Discriminant of a patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Set,
    AddNode,
    RemoveNode,
}

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("operation requires a non-blank 'select'")]
    BlankSelect,
}

/// A single edit primitive: set a value, add a child node, or remove a node,
/// each addressed by a selector.
///
/// Operations are immutable once constructed. The payload element of
/// [`PatchOperation::add_node`] is deep-copied at construction, so later
/// mutation of the source tree cannot affect a queued operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    kind: OpKind,
    select: String,
    value: String,
    node: Option<Element>,
}

impl PatchOperation {
    /// Assign `value` to whatever `select` addresses: an attribute when the
    /// selector is attribute-terminal, the element text otherwise. A missing
    /// value defaults to the empty string.
    pub fn set(select: &str, value: Option<&str>) -> Result<Self, OperationError> {
        Ok(Self {
            kind: OpKind::Set,
            select: checked_select(select)?,
            value: value.unwrap_or_default().to_string(),
            node: None,
        })
    }

    /// Append a deep copy of `node` under every element `select` matches.
    pub fn add_node(select: &str, node: &Element) -> Result<Self, OperationError> {
        Ok(Self {
            kind: OpKind::AddNode,
            select: checked_select(select)?,
            value: String::new(),
            node: Some(node.clone()),
        })
    }

    /// Detach every element `select` matches from its parent.
    pub fn remove_node(select: &str) -> Result<Self, OperationError> {
        Ok(Self {
            kind: OpKind::RemoveNode,
            select: checked_select(select)?,
            value: String::new(),
            node: None,
        })
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn select(&self) -> &str {
        &self.select
    }

    /// Value for `Set`; empty for the other kinds.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Payload for `AddNode`; `None` for the other kinds.
    pub fn node(&self) -> Option<&Element> {
        self.node.as_ref()
    }
}

fn checked_select(select: &str) -> Result<String, OperationError> {
    if select.trim().is_empty() {
        return Err(OperationError::BlankSelect);
    }
    Ok(select.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_defaults_missing_value_to_empty() {
        let op = PatchOperation::set("A/B", None).unwrap();
        assert_eq!(op.kind(), OpKind::Set);
        assert_eq!(op.value(), "");
        assert!(op.node().is_none());
    }

    #[test]
    fn blank_select_is_rejected() {
        assert!(PatchOperation::set("  ", Some("v")).is_err());
        assert!(PatchOperation::remove_node("").is_err());
    }

    #[test]
    fn add_node_copies_the_payload() {
        let mut payload = Element::new("Tag");
        payload.set_attr("Name", "a");
        let op = PatchOperation::add_node("Tags", &payload).unwrap();

        payload.set_attr("Name", "changed");
        assert_eq!(op.node().unwrap().attr("Name"), Some("a"));
    }
}
