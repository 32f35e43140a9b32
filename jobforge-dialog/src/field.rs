//  FIELD.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 14:55:02
//  Last edited:
//    02 Jun 2025, 14:12:36
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`FieldSpec`], the declarative description of a single
//!   question in the dialog: its prompt, default, datatype, constraints,
//!   diagnostics and reformat rule. Everything is plain data; the engine
//!   evaluates it lazily at the moment it is needed.
//

use indexmap::IndexMap;
use jobforge_cluster::begin::canonicalize_begin;
use jobforge_cluster::catalog::{Partition, ResourceCatalog};
use jobforge_cluster::walltime::hours_to_walltime;

use crate::constraint::{Constraint, PartitionResource};
use crate::record::{self, AnswerRecord};
use crate::value::{Value, ValueKind};


/***** ERRORS *****/
/// Defines errors that relate to evaluating the lazy parts of a [`FieldSpec`].
///
/// Like [`constraint::Error`](crate::constraint::Error), these always mean the dialog definition
/// itself is broken, not that the user answered badly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template referenced a field that the record does not know.
    #[error(transparent)]
    Record(#[from] record::Error),
    /// A template had a `${` without a matching `}`.
    #[error("Unclosed placeholder in template {template:?}")]
    UnclosedPlaceholder { template: String },
    /// A diagnostic referenced a field that was expected to hold text.
    #[error("Field '{field}' does not hold text (cannot use it as a partition name)")]
    NotText { field: String },
    /// A diagnostic referenced a field that was expected to hold a list of names.
    #[error("Field '{field}' does not hold a list of names")]
    NotAList { field: String },
    /// A diagnostic referenced a partition that is not in the catalog.
    #[error("Partition '{name}' is not in the resource catalog")]
    UnknownPartition { name: String },
    /// A reformat rule expected a numeric value.
    #[error("Cannot reformat non-numeric value '{value}' into a walltime")]
    NotHours { value: String },
    /// A reformat rule expected a begin time.
    #[error("Cannot reformat '{value}' into a begin time")]
    NotBegin { value: String },
}





/***** HELPER FUNCTIONS *****/
/// Expands `${name}` placeholders in a template.
///
/// # Arguments
/// - `template`: The template text to expand.
/// - `resolve`: Maps a placeholder name to its replacement; [`None`] makes the expansion fail.
///
/// # Returns
/// The expanded text.
///
/// # Errors
/// This function errors if a placeholder is unclosed or resolves to nothing.
fn expand(template: &str, mut resolve: impl FnMut(&str) -> Option<String>) -> Result<String, Error> {
    let mut result: String = String::with_capacity(template.len());
    let mut rest: &str = template;
    while let Some(pos) = rest.find("${") {
        result.push_str(&rest[..pos]);
        let Some(end) = rest[pos + 2..].find('}') else {
            return Err(Error::UnclosedPlaceholder { template: template.into() });
        };
        let name: &str = &rest[pos + 2..pos + 2 + end];
        match resolve(name) {
            Some(replacement) => result.push_str(&replacement),
            None => return Err(Error::Record(record::Error::UnknownField { name: name.into() })),
        }
        rest = &rest[pos + 2 + end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

/// Collects the `${name}` placeholders in a template.
///
/// # Arguments
/// - `template`: The template text to scan.
///
/// # Returns
/// The placeholder names, in order of appearance. Unclosed placeholders are simply not reported;
/// expansion will complain about them loudly enough.
fn placeholders(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = vec![];
    let mut rest: &str = template;
    while let Some(pos) = rest.find("${") {
        let Some(end) = rest[pos + 2..].find('}') else { break };
        names.push(&rest[pos + 2..pos + 2 + end]);
        rest = &rest[pos + 2 + end + 1..];
    }
    names
}





/***** LIBRARY *****/
/// Where a field's fallback value comes from when the user gives empty input.
///
/// Defaults are resolved lazily, at the moment the question is asked, so that they can reflect
/// answers already given (e.g., an output filename built from the job's name).
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultSpec {
    /// A fixed value, already of the field's target type.
    Value(Value),
    /// A text template; `${name}` placeholders are replaced with earlier answers.
    Template(String),
}
impl DefaultSpec {
    /// Resolves this default against the answers given so far.
    ///
    /// # Arguments
    /// - `record`: The [`AnswerRecord`] as filled in so far.
    ///
    /// # Returns
    /// The fallback [`Value`]. Templates always resolve to [text](Value::Text); the engine still
    /// coerces that through the field's datatype.
    ///
    /// # Errors
    /// This function errors if a template placeholder cannot be resolved.
    pub fn resolve(&self, record: &AnswerRecord) -> Result<Value, Error> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Template(template) => Ok(Value::Text(expand(template, |name| record.get(name).map(Value::to_string))?)),
        }
    }

    /// Returns the fields this default reads.
    #[inline]
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Value(_) => vec![],
            Self::Template(template) => placeholders(template),
        }
    }
}



/// A diagnostic shown to the user when a candidate answer fails its constraints.
///
/// Like everything else in the tree, diagnostics are data; rendering one receives the offending
/// value and the live record/catalog explicitly.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Literal text; `${value}` expands to the offending value, `${name}` to earlier answers.
    Text(String),
    /// Tells the user which partitions actually exist.
    PartitionList,
    /// Tells the user which groups they are actually in.
    GroupList {
        /// The (silent) field holding the group list.
        field: String,
    },
    /// Tells the user the computed capacity limit of the partition they picked.
    PartitionLimit {
        /// The (earlier) field whose answer names the partition.
        field:    String,
        /// Which capacity was exceeded.
        resource: PartitionResource,
        /// The reserve subtracted from the raw capacity.
        reserve:  f64,
    },
}
impl Message {
    /// Constructor for the generic diagnostic synthesized for fields that define none.
    #[inline]
    pub fn fallback() -> Self { Self::Text("The value you supplied, ${value}, cannot be used here.".into()) }

    /// Renders this diagnostic for a rejected candidate.
    ///
    /// # Arguments
    /// - `value`: The candidate that failed validation.
    /// - `record`: The [`AnswerRecord`] as filled in so far.
    /// - `catalog`: The [`ResourceCatalog`] describing the cluster.
    ///
    /// # Returns
    /// The text to show to the user.
    ///
    /// # Errors
    /// This function errors if the diagnostic references record fields or partitions that do not
    /// resolve (a dialog bug).
    pub fn render(&self, value: &Value, record: &AnswerRecord, catalog: &ResourceCatalog) -> Result<String, Error> {
        match self {
            Self::Text(template) => expand(template, |name| {
                if name == "value" { Some(value.to_string()) } else { record.get(name).map(Value::to_string) }
            }),

            Self::PartitionList => {
                Ok(format!("{value} is not the name of a partition. They are {}.", catalog.names().collect::<Vec<&str>>().join(", ")))
            },

            Self::GroupList { field } => {
                let names: &[String] = record.expect(field)?.as_list().ok_or_else(|| Error::NotAList { field: field.clone() })?;
                Ok(format!("{value} is not one of your groups. They are {}.", names.join(", ")))
            },

            Self::PartitionLimit { field, resource, reserve } => {
                let name: &str = record.expect(field)?.as_text().ok_or_else(|| Error::NotText { field: field.clone() })?;
                let partition: &Partition = catalog.get(name).ok_or_else(|| Error::UnknownPartition { name: name.into() })?;
                Ok(format!("In {name}, the maximum {} is {}.", resource.describe(), resource.of(partition) - reserve))
            },
        }
    }

    /// Returns the fields this diagnostic reads.
    #[inline]
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Text(template) => placeholders(template).into_iter().filter(|name| *name != "value").collect(),
            Self::PartitionList => vec![],
            Self::GroupList { field } => vec![field],
            Self::PartitionLimit { field, .. } => vec![field],
        }
    }
}



/// How a valid answer is rewritten into its canonical stored form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reformat {
    /// A number of hours becomes a scheduler walltime (`[days-]HH:MM:SS`).
    HoursToWalltime,
    /// A human begin time (`now`, `tomorrow`, a timestamp) becomes `YYYY-MM-DDTHH:MM`.
    BeginTime,
}
impl Reformat {
    /// Applies this rule to an already-validated value.
    ///
    /// # Arguments
    /// - `value`: The value to rewrite.
    ///
    /// # Returns
    /// The canonical [`Value`] to store instead.
    ///
    /// # Errors
    /// This function errors if the value does not have the shape the rule needs; validation
    /// should have guaranteed that it does.
    pub fn apply(&self, value: Value) -> Result<Value, Error> {
        match self {
            Self::HoursToWalltime => match value.as_f64() {
                Some(hours) => Ok(Value::Text(hours_to_walltime(hours))),
                None => Err(Error::NotHours { value: value.to_string() }),
            },
            Self::BeginTime => match value.as_text().and_then(canonicalize_begin) {
                Some(moment) => Ok(Value::Text(moment)),
                None => Err(Error::NotBegin { value: value.to_string() }),
            },
        }
    }
}



/// The declarative description of one question in the dialog.
///
/// A field without a [`prompt`](FieldSpec::prompt) is _silent_: the user is never asked about
/// it, but its [`preset`](FieldSpec::preset) (and those of its [children](FieldSpec::children))
/// stay readable by later fields' defaults, constraints and diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSpec {
    /// The question shown to the user, if any.
    pub prompt: Option<String>,
    /// The fallback used when the user gives empty input.
    pub default: Option<DefaultSpec>,
    /// The datatype raw input is coerced into; [`None`] takes input verbatim.
    pub datatype: Option<ValueKind>,
    /// The predicates a candidate must satisfy, all of them, in order.
    pub constraints: Vec<Constraint>,
    /// The diagnostics shown (all of them, in order) when a candidate is rejected.
    pub messages: Vec<Message>,
    /// How a valid answer is rewritten before storing, if at all.
    pub reformat: Option<Reformat>,
    /// A value attached at construction time (for silent fields).
    pub preset: Option<Value>,
    /// Auxiliary sub-fields, addressed as `<this field>.<child>`.
    pub children: IndexMap<String, FieldSpec>,
}
impl FieldSpec {
    /// Constructor for an empty FieldSpec, to be refined with the `with_*` methods.
    #[inline]
    pub fn new() -> Self { Self::default() }

    /// Sets the question shown to the user.
    #[inline]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Sets a fixed default value.
    #[inline]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSpec::Value(value.into()));
        self
    }

    /// Sets a templated default value (`${name}` placeholders read earlier answers).
    #[inline]
    pub fn with_default_template(mut self, template: impl Into<String>) -> Self {
        self.default = Some(DefaultSpec::Template(template.into()));
        self
    }

    /// Sets the datatype raw input is coerced into.
    #[inline]
    pub fn with_datatype(mut self, kind: ValueKind) -> Self {
        self.datatype = Some(kind);
        self
    }

    /// Adds a constraint (checked after any added before it).
    #[inline]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Adds a rejection diagnostic (shown after any added before it).
    #[inline]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the reformat rule applied to valid answers.
    #[inline]
    pub fn with_reformat(mut self, reformat: Reformat) -> Self {
        self.reformat = Some(reformat);
        self
    }

    /// Sets the construction-time value of this (silent) field.
    #[inline]
    pub fn with_preset(mut self, value: impl Into<Value>) -> Self {
        self.preset = Some(value.into());
        self
    }

    /// Adds an auxiliary sub-field.
    #[inline]
    pub fn with_child(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.children.insert(name.into(), spec);
        self
    }

    /// Returns every field that this field's default, constraints or diagnostics read.
    ///
    /// Used by the tree's finishing pass to enforce that dependencies point strictly backwards.
    pub fn references(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        if let Some(default) = &self.default {
            names.extend(default.references());
        }
        for constraint in &self.constraints {
            names.extend(constraint.references());
        }
        for message in &self.messages {
            names.extend(message.references());
        }
        names
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_template_defaults_are_lazy() {
        let mut record = AnswerRecord::new();
        record.store("jobname", Value::Text("myjob".into())).unwrap();

        let default = DefaultSpec::Template("/home/me/${jobname}.txt".into());
        assert_eq!(default.resolve(&record).unwrap(), Value::Text("/home/me/myjob.txt".into()));
        assert_eq!(default.references(), vec!["jobname"]);

        // An unresolvable placeholder is a loud error
        assert!(matches!(DefaultSpec::Template("${nope}".into()).resolve(&record), Err(Error::Record(record::Error::UnknownField { .. }))));
    }

    #[test]
    fn test_unclosed_placeholder() {
        assert!(matches!(DefaultSpec::Template("${jobname".into()).resolve(&AnswerRecord::new()), Err(Error::UnclosedPlaceholder { .. })));
    }

    #[test]
    fn test_fallback_message() {
        let record = AnswerRecord::new();
        let catalog = ResourceCatalog::from_partitions(
            [("basic".to_string(), Partition { cores: 52, ram_gb: 384, features: None, gpus: None, max_hours: 72.0 })].into_iter().collect(),
        );
        let rendered: String = Message::fallback().render(&Value::Int(99), &record, &catalog).unwrap();
        assert_eq!(rendered, "The value you supplied, 99, cannot be used here.");
    }

    #[test]
    fn test_partition_limit_message() {
        let mut record = AnswerRecord::new();
        record.store("partition", Value::Text("basic".into())).unwrap();
        let catalog = ResourceCatalog::from_partitions(
            [("basic".to_string(), Partition { cores: 52, ram_gb: 384, features: None, gpus: None, max_hours: 72.0 })].into_iter().collect(),
        );

        let message = Message::PartitionLimit { field: "partition".into(), resource: PartitionResource::RamGb, reserve: 2.0 };
        assert_eq!(message.render(&Value::Int(400), &record, &catalog).unwrap(), "In basic, the maximum amount of memory (in GB) is 382.");
    }

    #[test]
    fn test_reformat() {
        assert_eq!(Reformat::HoursToWalltime.apply(Value::Real(1.5)).unwrap(), Value::Text("01:30:00".into()));
        assert_eq!(Reformat::HoursToWalltime.apply(Value::Int(1)).unwrap(), Value::Text("01:00:00".into()));
        assert!(Reformat::HoursToWalltime.apply(Value::Text("soon".into())).is_err());
        assert!(matches!(Reformat::BeginTime.apply(Value::Text("2025-06-01T14:00".into())).unwrap(), Value::Text(t) if t == "2025-06-01T14:00"));
    }
}
