use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::{Element, Location};

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("syntax error at {location}: {message}")]
    Syntax { location: Location, message: String },

    #[error("unexpected closing tag at {location}")]
    UnexpectedClose { location: Location },

    #[error("unclosed element <{name}>")]
    Unclosed { name: String },

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("document has no root element")]
    NoRoot,

    #[error("invalid UTF-8 in {what} at {location}: {message}")]
    Encoding {
        what: &'static str,
        location: Location,
        message: String,
    },
}

/// Byte offset to line/column mapping, precomputed once per document so every
/// element can carry its source position without rescanning the input.
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(input: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in input.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    fn locate(&self, offset: usize) -> Location {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        Location {
            line,
            col: offset - self.line_starts[line - 1] + 1,
        }
    }
}

/// Parse a whole XML document into an [`Element`] tree.
///
/// Comments, processing instructions, and the XML declaration are dropped.
/// Text content is trimmed and attached to the enclosing element.
pub fn parse_document(input: &str) -> Result<Element, XmlError> {
    let index = LineIndex::new(input);
    let mut reader = Reader::from_str(input);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let location = index.locate(offset);
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from_start(e, location)?);
            }
            Ok(Event::End(_)) => {
                let completed = match stack.pop() {
                    Some(el) => el,
                    None => return Err(XmlError::UnexpectedClose { location }),
                };
                attach(completed, &mut stack, &mut root)?;
            }
            Ok(Event::Empty(ref e)) => {
                let el = element_from_start(e, location)?;
                attach(el, &mut stack, &mut root)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| XmlError::Syntax {
                    location,
                    message: err.to_string(),
                })?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        match &mut parent.text {
                            Some(existing) => existing.push_str(trimmed),
                            None => parent.text = Some(trimmed.to_string()),
                        }
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                let text = std::str::from_utf8(e.as_ref()).map_err(|err| XmlError::Encoding {
                    what: "CDATA section",
                    location,
                    message: err.to_string(),
                })?;
                if let Some(parent) = stack.last_mut() {
                    match &mut parent.text {
                        Some(existing) => existing.push_str(text),
                        None => parent.text = Some(text.to_string()),
                    }
                }
            }
            Ok(Event::Eof) => {
                if let Some(unclosed) = stack.first() {
                    return Err(XmlError::Unclosed {
                        name: unclosed.name.clone(),
                    });
                }
                break;
            }
            // declarations, comments, PIs
            Ok(_) => {}
            Err(e) => {
                let location = index.locate(reader.error_position() as usize);
                return Err(XmlError::Syntax {
                    location,
                    message: e.to_string(),
                });
            }
        }
    }

    root.ok_or(XmlError::NoRoot)
}

fn element_from_start(e: &BytesStart, location: Location) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| XmlError::Encoding {
            what: "element name",
            location,
            message: err.to_string(),
        })?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XmlError::Syntax {
            location,
            message: err.to_string(),
        })?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| XmlError::Encoding {
                what: "attribute name",
                location,
                message: err.to_string(),
            })?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Syntax {
                location,
                message: err.to_string(),
            })?
            .to_string();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: None,
        location: Some(location),
    })
}

fn attach(
    el: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::MultipleRoots);
    }
    *root = Some(el);
    Ok(())
}
