//  VALUE.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 13:19:55
//  Last edited:
//    02 Jun 2025, 11:34:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`Value`]s that answers take, and the [`ValueKind`]s
//!   that raw input is coerced into.
//

use std::fmt::{Display, Formatter, Result as FResult};

use enum_debug::EnumDebug;


/***** ERRORS *****/
/// Raised when raw input cannot be coerced into a field's datatype.
#[derive(Debug, thiserror::Error)]
#[error("Cannot interpret {raw:?} as {kind}")]
pub struct CoerceError {
    /// The raw input that did not parse.
    pub raw:  String,
    /// The kind we tried to coerce it into.
    pub kind: ValueKind,
}





/***** LIBRARY *****/
/// The datatype a field requires its answer to have.
///
/// A field without a ValueKind performs no coercion at all; the raw input is taken verbatim.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, PartialEq)]
pub enum ValueKind {
    /// Free text.
    Text,
    /// A whole number.
    Int,
    /// A (possibly fractional) number.
    Real,
}
impl ValueKind {
    /// Coerces raw input into a [`Value`] of this kind.
    ///
    /// # Arguments
    /// - `raw`: The raw (already scrubbed) input to coerce.
    ///
    /// # Returns
    /// The coerced [`Value`].
    ///
    /// # Errors
    /// This function errors if the input does not parse as this kind.
    pub fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        match self {
            Self::Text => Ok(Value::Text(raw.into())),
            Self::Int => match raw.parse::<i64>() {
                Ok(value) => Ok(Value::Int(value)),
                Err(_) => Err(CoerceError { raw: raw.into(), kind: *self }),
            },
            Self::Real => match raw.parse::<f64>() {
                Ok(value) => Ok(Value::Real(value)),
                Err(_) => Err(CoerceError { raw: raw.into(), kind: *self }),
            },
        }
    }

    /// Checks whether a [`Value`] already has this kind.
    ///
    /// Note that an [`Int`](Value::Int) is acceptable where a [`Real`](ValueKind::Real) is
    /// required, but not the other way around.
    ///
    /// # Arguments
    /// - `value`: The value to check.
    ///
    /// # Returns
    /// True if a field of this kind can store the value as-is.
    #[inline]
    pub fn admits(&self, value: &Value) -> bool {
        matches!((self, value), (Self::Text, Value::Text(_)) | (Self::Int, Value::Int(_)) | (Self::Real, Value::Real(_)) | (Self::Real, Value::Int(_)))
    }
}
impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Text => write!(f, "text"),
            Self::Int => write!(f, "a whole number"),
            Self::Real => write!(f, "a number"),
        }
    }
}



/// A single answer (or preset) in the dialog.
#[derive(Clone, Debug, EnumDebug, PartialEq)]
pub enum Value {
    /// Free text.
    Text(String),
    /// A whole number.
    Int(i64),
    /// A fractional number.
    Real(f64),
    /// A list of names; only ever attached to silent fields (e.g., group memberships).
    List(Vec<String>),
}
impl Value {
    /// Provides read-only access to the text in this Value, if it is [text](Value::Text).
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    /// Returns this Value as a number, if it is [numeric](Value::Int).
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Provides read-only access to the names in this Value, if it is a [list](Value::List).
    #[inline]
    pub fn as_list(&self) -> Option<&[String]> {
        if let Self::List(names) = self {
            Some(names)
        } else {
            None
        }
    }
}
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::List(names) => write!(f, "{}", names.join(", ")),
        }
    }
}
impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self { Self::Text(value.into()) }
}
impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self { Self::Text(value) }
}
impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self { Self::Int(value) }
}
impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self { Self::Real(value) }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_coerce() {
        assert_eq!(ValueKind::Text.coerce("hello").unwrap(), Value::Text("hello".into()));
        assert_eq!(ValueKind::Int.coerce("20").unwrap(), Value::Int(20));
        assert_eq!(ValueKind::Real.coerce("1.5").unwrap(), Value::Real(1.5));
        assert_eq!(ValueKind::Real.coerce("1").unwrap(), Value::Real(1.0));

        assert!(ValueKind::Int.coerce("twenty").is_err());
        assert!(ValueKind::Int.coerce("1.5").is_err());
        assert!(ValueKind::Real.coerce("").is_err());
    }

    #[test]
    fn test_admits() {
        assert!(ValueKind::Real.admits(&Value::Int(1)));
        assert!(!ValueKind::Int.admits(&Value::Real(1.0)));
        assert!(!ValueKind::Text.admits(&Value::Int(1)));
    }
}
