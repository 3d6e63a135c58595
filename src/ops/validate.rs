use std::collections::HashSet;

use crate::model::column::{Column, ColumnKind};
use crate::ops::error::StoreError;

/// Why a value was rejected by its column kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidateError {
    #[error("entry cannot be empty")]
    EmptyInput,
    #[error("\"{value}\" is not a valid {kind} value (unexpected '{found}')")]
    InvalidFormat {
        value: String,
        kind: ColumnKind,
        found: char,
    },
}

fn accepts(kind: ColumnKind, c: char) -> bool {
    match kind {
        ColumnKind::Integer => c.is_ascii_digit() || matches!(c, '.' | ' ' | '-'),
        ColumnKind::Duration => c.is_ascii_digit() || c == ':',
        ColumnKind::Label => c.is_alphanumeric() || matches!(c, ' ' | '_' | '@' | '.'),
        ColumnKind::Text => true,
    }
}

/// Check `input` against a declared kind. Empty input fails for every
/// kind. There is no auto-correction: the caller re-prompts or aborts.
pub fn validate(input: &str, kind: ColumnKind) -> Result<(), ValidateError> {
    if input.is_empty() {
        return Err(ValidateError::EmptyInput);
    }
    match input.chars().find(|&c| !accepts(kind, c)) {
        Some(found) => Err(ValidateError::InvalidFormat {
            value: input.to_string(),
            kind,
            found,
        }),
        None => Ok(()),
    }
}

pub fn is_valid(input: &str, kind: ColumnKind) -> bool {
    validate(input, kind).is_ok()
}

/// Parse header input for a task's first month.
///
/// Input is a comma-separated list of `name[:kind]` specs, e.g.
/// `"pages:int, hours:time, note"`. Names are trimmed and lower-cased; the
/// kind defaults to `text`. Digits anywhere in the input are rejected.
pub fn parse_header(input: &str) -> Result<Vec<Column>, StoreError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(StoreError::EmptyInput("header".to_string()));
    }
    if input.chars().any(|c| c.is_ascii_digit()) {
        return Err(StoreError::InvalidFormat(
            "the header cannot contain digits".to_string(),
        ));
    }

    let mut columns = Vec::new();
    let mut seen = HashSet::new();
    for spec in input.split(',') {
        let (name, kind) = match spec.rsplit_once(':') {
            Some((name, tag)) => {
                let kind = ColumnKind::parse_tag(tag).ok_or_else(|| {
                    StoreError::InvalidFormat(format!(
                        "unknown column kind \"{}\" (use int, time, label or text)",
                        tag.trim()
                    ))
                })?;
                (name, kind)
            }
            None => (spec, ColumnKind::Text),
        };

        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(StoreError::InvalidFormat(format!(
                "empty column name in \"{}\"",
                input
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(StoreError::AlreadyExists(format!("column \"{}\"", name)));
        }
        columns.push(Column::new(name, kind));
    }
    Ok(columns)
}
