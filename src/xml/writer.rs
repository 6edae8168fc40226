use std::borrow::Cow;

use crate::tree::Element;

/// Serialize a tree back to compact XML.
pub fn write_document(root: &Element) -> String {
    let mut out = String::new();
    write_element(root, None, &mut out);
    out
}

/// Serialize a tree to indented XML, two spaces per level.
pub fn write_document_pretty(root: &Element) -> String {
    let mut out = String::new();
    write_element(root, Some(0), &mut out);
    out
}

fn write_element(el: &Element, indent: Option<usize>, out: &mut String) {
    if let Some(n) = indent {
        out.extend(std::iter::repeat(' ').take(n));
    }

    out.push('<');
    out.push_str(&el.name);
    for (k, v) in &el.attributes {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape_attr(v));
        out.push('"');
    }

    if el.children.is_empty() && el.text.is_none() {
        out.push_str("/>");
        if indent.is_some() {
            out.push('\n');
        }
        return;
    }

    out.push('>');
    if let Some(text) = &el.text {
        out.push_str(&escape_text(text));
    }

    if !el.children.is_empty() {
        if indent.is_some() {
            out.push('\n');
        }
        for child in &el.children {
            write_element(child, indent.map(|n| n + 2), out);
        }
        if let Some(n) = indent {
            out.extend(std::iter::repeat(' ').take(n));
        }
    }

    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
    if indent.is_some() {
        out.push('\n');
    }
}

fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'&' | b'<' | b'>')) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'&' | b'<' | b'>' | b'"')) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
