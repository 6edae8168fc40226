use std::path::Path;

use thiserror::Error;

use crate::tree::Location;
use crate::xml::XmlError;

/// Structural failures while loading one patch file.
///
/// Every variant names the originating file, and directive-level variants add
/// a line/column locus when the parser captured one, so authors can find the
/// offending element without opening the engine log.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: not well-formed XML: {source}")]
    Xml {
        file: String,
        #[source]
        source: XmlError,
    },

    #[error("{file}: root element must be <Patch>, found <{found}>")]
    UnexpectedRoot { file: String, found: String },

    #[error("<{directive}> requires a 'select' attribute ({locus})")]
    MissingSelect { directive: String, locus: String },

    #[error("<AddNode> must contain exactly one child element payload ({locus})")]
    AddNodePayload { locus: String },
}

/// Short file name for error messages, e.g. `010_base.patch.xml`.
pub(crate) fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `file.patch.xml @ line 3, col 5` when the position is known, bare file
/// name otherwise.
pub(crate) fn locus(path: &Path, location: Option<Location>) -> String {
    match location {
        Some(loc) => format!("{} @ {}", short_name(path), loc),
        None => short_name(path),
    }
}
