//! Filtering and scrubbing helpers for flat, dictionary-shaped records.
//!
//! Records are JSON objects (`serde_json::Map`). Both helpers are pure: they never
//! mutate the input record and fail fast with a typed [`FilterError`].

use std::borrow::Cow;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// A flat record keyed by field name.
pub type Record = Map<String, Value>;

/// Runtime kind of a record value, used for type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Classify a JSON value. Integral numbers are `Int`, everything else numeric is `Float`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(number) if number.is_i64() || number.is_u64() => Self::Int,
            Value::Number(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`not_in`] and [`scrub`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The requested field does not exist in the record.
    #[error("{key} is not a correct field")]
    MissingField { key: String },
    /// A candidate value does not have the kind of the field (or of its elements).
    #[error("values[{index}] has type {found}, while {key} expects type {expected}")]
    TypeMismatch {
        key: String,
        index: usize,
        found: ValueKind,
        expected: ValueKind,
    },
    /// Scrubbing was requested on a field that is not a sequence.
    #[error("can only scrub values from arrays, but {key} has type {found}")]
    NotASequence { key: String, found: ValueKind },
}

/// Returns `true` when `record[key]` is not one of `values`.
///
/// Every entry of `values` must have the same [`ValueKind`] as `record[key]`.
pub fn not_in(record: &Record, key: &str, values: &[Value]) -> Result<bool, FilterError> {
    let field = lookup(record, key)?;
    check_kinds(key, values, ValueKind::of(field))?;
    Ok(!values.contains(field))
}

/// Removes every occurrence of `values` from the array stored at `record[key]`.
///
/// When `values` or the field is empty nothing can change and the input is returned
/// borrowed, without copying. Otherwise a shallow copy of the record is returned with
/// the field replaced; kept elements retain their order and multiplicity.
pub fn scrub<'a>(
    record: &'a Record,
    key: &str,
    values: &[Value],
) -> Result<Cow<'a, Record>, FilterError> {
    let field = lookup(record, key)?;
    let Value::Array(items) = field else {
        return Err(FilterError::NotASequence {
            key: key.to_string(),
            found: ValueKind::of(field),
        });
    };
    let Some(first) = items.first() else {
        return Ok(Cow::Borrowed(record));
    };
    if values.is_empty() {
        return Ok(Cow::Borrowed(record));
    }
    check_kinds(key, values, ValueKind::of(first))?;

    let kept = items
        .iter()
        .filter(|item| !values.contains(*item))
        .cloned()
        .collect();
    let mut scrubbed = record.clone();
    scrubbed.insert(key.to_string(), Value::Array(kept));
    Ok(Cow::Owned(scrubbed))
}

fn lookup<'a>(record: &'a Record, key: &str) -> Result<&'a Value, FilterError> {
    record.get(key).ok_or_else(|| FilterError::MissingField {
        key: key.to_string(),
    })
}

fn check_kinds(key: &str, values: &[Value], expected: ValueKind) -> Result<(), FilterError> {
    for (index, value) in values.iter().enumerate() {
        let found = ValueKind::of(value);
        if found != expected {
            return Err(FilterError::TypeMismatch {
                key: key.to_string(),
                index,
                found,
                expected,
            });
        }
    }
    Ok(())
}
