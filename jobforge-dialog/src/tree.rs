//  TREE.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 15:37:46
//  Last edited:
//    02 Jun 2025, 14:40:28
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`DialogTree`], the full questionnaire as declared,
//!   ordered data. Trees are built through the [`DialogTreeBuilder`],
//!   whose finishing pass synthesizes missing diagnostics and verifies
//!   that every cross-field reference points strictly backwards, so a
//!   reordered dialog fails at construction time instead of at runtime.
//

use std::collections::HashSet;

use enum_debug::EnumDebug as _;
use indexmap::IndexMap;

use crate::field::{DefaultSpec, FieldSpec, Message};
use crate::value::{Value, ValueKind};


/***** ERRORS *****/
/// Defines errors that relate to constructing a [`DialogTree`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The same field was declared twice.
    #[error("Field '{name}' is declared twice")]
    DuplicateField { name: String },
    /// A field's default, constraints or diagnostics read a field that is not declared strictly
    /// before it.
    #[error("Field '{field}' references '{reference}', which is not declared before it")]
    ForwardReference { field: String, reference: String },
    /// A field's fixed default does not have the field's datatype.
    #[error("Field '{field}' has a default of the wrong type (expected {expected}, got {got})")]
    DefaultTypeMismatch { field: String, expected: ValueKind, got: String },
}





/***** LIBRARY *****/
/// Builds a [`DialogTree`] by declaring its full shape up front.
#[derive(Debug, Default)]
pub struct DialogTreeBuilder {
    /// The fields declared so far, in order.
    fields: IndexMap<String, FieldSpec>,
}
impl DialogTreeBuilder {
    /// Constructor for an empty DialogTreeBuilder.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Declares the next field of the dialog.
    ///
    /// # Arguments
    /// - `name`: The field's name; a unique, stable identifier within the tree.
    /// - `spec`: The field's [`FieldSpec`].
    ///
    /// # Returns
    /// Itself, for chaining.
    ///
    /// # Errors
    /// This function errors if a field with this name was already declared.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Result<Self, Error> {
        let name: String = name.into();
        if self.fields.insert(name.clone(), spec).is_some() {
            return Err(Error::DuplicateField { name });
        }
        Ok(self)
    }

    /// Finalizes the tree.
    ///
    /// This runs the two construction-time passes:
    /// 1. every prompted field without diagnostics gets the generic
    ///    [fallback](Message::fallback) synthesized, so validation always has something to show;
    /// 2. every cross-field reference (in defaults, constraints and diagnostics) must name a
    ///    field declared _strictly before_ the referencing one, and fixed defaults must match
    ///    their field's datatype.
    ///
    /// # Returns
    /// The finished, immutable [`DialogTree`].
    ///
    /// # Errors
    /// This function errors if a reference points forward (or nowhere), or if a default has the
    /// wrong type.
    pub fn finish(mut self) -> Result<DialogTree, Error> {
        // Pass 1: synthesize the fallback diagnostic
        for spec in self.fields.values_mut() {
            if spec.prompt.is_some() && spec.messages.is_empty() {
                spec.messages.push(Message::fallback());
            }
        }

        // Pass 2: references must point strictly backwards
        let mut declared: HashSet<String> = HashSet::new();
        for (name, spec) in &self.fields {
            for reference in spec.references() {
                if !declared.contains(reference) {
                    return Err(Error::ForwardReference { field: name.clone(), reference: reference.into() });
                }
            }
            if let (Some(DefaultSpec::Value(value)), Some(kind)) = (&spec.default, spec.datatype) {
                if !kind.admits(value) {
                    return Err(Error::DefaultTypeMismatch { field: name.clone(), expected: kind, got: value.variant().to_string() });
                }
            }

            declared.insert(name.clone());
            for (child, child_spec) in &spec.children {
                for reference in child_spec.references() {
                    if !declared.contains(reference) {
                        return Err(Error::ForwardReference { field: format!("{name}.{child}"), reference: reference.into() });
                    }
                }
                declared.insert(format!("{name}.{child}"));
            }
        }

        Ok(DialogTree { fields: self.fields })
    }
}



/// The full questionnaire: an ordered mapping of field name to [`FieldSpec`].
///
/// Construction goes through the [`DialogTreeBuilder`]; after that the tree is immutable.
#[derive(Clone, Debug)]
pub struct DialogTree {
    /// The fields, in declared order.
    fields: IndexMap<String, FieldSpec>,
}
impl DialogTree {
    /// Returns the fields, in declared order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> { self.fields.iter().map(|(name, spec)| (name.as_str(), spec)) }

    /// Looks up a field by name.
    ///
    /// # Arguments
    /// - `name`: The field name to look for.
    ///
    /// # Returns
    /// The field's [`FieldSpec`], or [`None`] if no such field is declared.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> { self.fields.get(name) }

    /// Returns every construction-time preset in the tree, including those of nested sub-fields
    /// (as `parent.child` paths), in declared order.
    pub fn presets(&self) -> impl Iterator<Item = (String, &Value)> {
        self.fields.iter().flat_map(|(name, spec)| {
            let own: Option<(String, &Value)> = spec.preset.as_ref().map(|value| (name.clone(), value));
            let children = spec
                .children
                .iter()
                .filter_map(move |(child, child_spec)| child_spec.preset.as_ref().map(move |value| (format!("{name}.{child}"), value)));
            own.into_iter().chain(children)
        })
    }

    /// Returns the number of fields in the tree.
    #[inline]
    pub fn len(&self) -> usize { self.fields.len() }

    /// Checks whether the tree has no fields at all.
    #[inline]
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}





/***** TESTS *****/
