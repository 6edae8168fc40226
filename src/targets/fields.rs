//! Named-field assignment for typed records.
//!
//! Some targets materialize into plain structs rather than trees. For those,
//! a per-record-type table maps field names to setter functions built at
//! compile time, so patch values still reach typed fields without any
//! runtime introspection.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::dsl::{OpKind, PatchOperation};
use crate::engine::discovery::short_display;

/// Parses the raw patch value and assigns it to one field of the record.
pub type FieldSetter<T> = fn(&mut T, &str) -> Result<(), FieldError>;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("unknown field '{name}'")]
    Unknown { name: String },

    #[error("invalid value '{value}' for field '{field}': {message}")]
    Invalid {
        field: String,
        value: String,
        message: String,
    },
}

impl FieldError {
    /// Convenience for setters converting with `str::parse` and friends.
    pub fn invalid(field: &str, value: &str, message: impl fmt::Display) -> Self {
        Self::Invalid {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        }
    }
}

/// Field-name to setter table for one record type. Names fold ASCII
/// case-insensitively, matching the rest of the DSL's name rules.
pub struct FieldTable<T> {
    setters: HashMap<String, FieldSetter<T>>,
}

impl<T> FieldTable<T> {
    pub fn new() -> Self {
        Self {
            setters: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, setter: FieldSetter<T>) -> Self {
        self.setters.insert(name.to_ascii_lowercase(), setter);
        self
    }

    pub fn set(&self, record: &mut T, field: &str, raw: &str) -> Result<(), FieldError> {
        match self.setters.get(&field.to_ascii_lowercase()) {
            Some(setter) => setter(record, raw),
            None => Err(FieldError::Unknown {
                name: field.to_string(),
            }),
        }
    }

    /// Route `Set` operations with a bare root-attribute selector (`@Field`)
    /// through the table. Anything else - other kinds, path selectors,
    /// unknown fields, conversion failures - is logged and skipped, never
    /// fatal. Returns the number of fields assigned.
    pub fn apply_sets(&self, record: &mut T, operations: &[PatchOperation], source: &Path) -> usize {
        let mut applied = 0;
        for op in operations {
            if op.kind() != OpKind::Set {
                log::warn!(
                    "{}: unsupported op {:?} for a typed record (only Set is handled); skipping",
                    short_display(source),
                    op.kind()
                );
                continue;
            }

            let select = op.select().trim();
            let field = match select.strip_prefix('@') {
                Some(name) if !name.is_empty() && !name.contains('/') => name,
                _ => {
                    log::warn!(
                        "{}: select not supported for a typed record (expected '@Field'): {select}; skipping",
                        short_display(source)
                    );
                    continue;
                }
            };

            match self.set(record, field, op.value()) {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("{}: {err}; skipping", short_display(source)),
            }
        }
        applied
    }
}

impl<T> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
