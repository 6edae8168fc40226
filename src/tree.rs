use std::fmt;

/// One node of a definition tree: a named element with ordered string-valued
/// attributes, ordered element children, and optional text content.
///
/// This is the in-memory shape of the host's data format. `Clone` is a deep
/// copy, which is what patch documents rely on when they take defensive
/// copies of payload trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local element name. Matching rules decide case sensitivity; see the
    /// selector engine.
    pub name: String,
    /// Attributes in document order. Names are unique in well-formed input.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Trimmed text content, `None` when blank.
    pub text: Option<String>,
    /// Source position captured at parse time, for diagnostics only.
    pub location: Option<Location>,
}

/// Line/column position in a source file (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            location: None,
        }
    }

    /// ASCII case-insensitive name check, matching the selector engine's
    /// element-name rules.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Attribute lookup. Attribute names compare exactly (ordinal).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite an attribute, preserving document order for
    /// attributes that already exist.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// The logical id of a definition payload: its non-blank `Id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attr("Id").map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.text = if value.is_empty() { None } else { Some(value) };
    }

    /// First child element with the given name (ASCII case-insensitive).
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.has_name(name))
    }
}
