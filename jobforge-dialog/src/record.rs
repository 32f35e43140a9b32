//  RECORD.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 13:44:31
//  Last edited:
//    02 Jun 2025, 11:41:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`AnswerRecord`], the incrementally-built mapping of
//!   field name to validated answer. Constraints and defaults of later
//!   fields read earlier answers through it; it is always passed
//!   explicitly, never captured.
//

use indexmap::IndexMap;

use crate::value::Value;


/***** ERRORS *****/
/// Defines errors that relate to reading & writing the [`AnswerRecord`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lookup named a field that is not in the record. Usually a typo in the dialog
    /// definition, or a reference to a field that is evaluated later.
    #[error("Unknown field '{name}'")]
    UnknownField { name: String },
    /// An attempt was made to answer the same field twice.
    #[error("Field '{name}' has already been answered")]
    AlreadyAnswered { name: String },
}





/***** LIBRARY *****/
/// The accumulated, validated results of one dialog pass.
///
/// Entries appear in the order they were filled in; once stored, an answer is immutable for the
/// remainder of the run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerRecord {
    /// The answers themselves, keyed by (dotted) field path.
    answers: IndexMap<String, Value>,
}
impl AnswerRecord {
    /// Constructor for an empty AnswerRecord.
    #[inline]
    pub fn new() -> Self { Self { answers: IndexMap::new() } }

    /// Stores a field's answer.
    ///
    /// # Arguments
    /// - `name`: The (dotted) path of the field answered.
    /// - `value`: The validated, reformatted [`Value`] to store.
    ///
    /// # Errors
    /// This function errors if the field already has an answer; answers are write-once.
    pub fn store(&mut self, name: impl Into<String>, value: Value) -> Result<(), Error> {
        let name: String = name.into();
        if self.answers.contains_key(&name) {
            return Err(Error::AlreadyAnswered { name });
        }
        self.answers.insert(name, value);
        Ok(())
    }

    /// Looks up a field's answer.
    ///
    /// # Arguments
    /// - `name`: The (dotted) path of the field to read.
    ///
    /// # Returns
    /// The answer if the field has one, or [`None`] otherwise.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> { self.answers.get(name) }

    /// Looks up a field's answer, failing loudly when it is absent.
    ///
    /// # Arguments
    /// - `name`: The (dotted) path of the field to read.
    ///
    /// # Returns
    /// The answer.
    ///
    /// # Errors
    /// This function errors if the field has no answer (misspelled, or not yet evaluated).
    #[inline]
    pub fn expect(&self, name: &str) -> Result<&Value, Error> {
        match self.answers.get(name) {
            Some(value) => Ok(value),
            None => Err(Error::UnknownField { name: name.into() }),
        }
    }

    /// Returns the answers, in the order they were filled in.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> { self.answers.iter().map(|(name, value)| (name.as_str(), value)) }

    /// Returns the number of answers stored so far.
    #[inline]
    pub fn len(&self) -> usize { self.answers.len() }

    /// Checks whether no answers are stored yet.
    #[inline]
    pub fn is_empty(&self) -> bool { self.answers.is_empty() }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_store_once() {
        let mut record = AnswerRecord::new();
        record.store("jobname", Value::Text("myjob".into())).unwrap();
        assert_eq!(record.expect("jobname").unwrap(), &Value::Text("myjob".into()));
        assert!(matches!(record.store("jobname", Value::Text("other".into())), Err(Error::AlreadyAnswered { .. })));
    }

    #[test]
    fn test_unknown_field_is_loud() {
        let record = AnswerRecord::new();
        assert!(record.get("mem").is_none());
        assert!(matches!(record.expect("mem"), Err(Error::UnknownField { .. })));
    }
}
