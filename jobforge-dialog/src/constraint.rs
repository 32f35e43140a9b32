//  CONSTRAINT.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 14:02:19
//  Last edited:
//    02 Jun 2025, 13:50:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the declarative [`Constraint`]s that candidate answers are
//!   checked against. Constraints are plain data; evaluating one
//!   receives the live [`AnswerRecord`] and the [`ResourceCatalog`] as
//!   explicit arguments, which is how bounds like "at most the chosen
//!   partition's RAM minus the reserve" are resolved.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::fs::{self, DirBuilder};
use std::os::unix::fs::DirBuilderExt as _;
use std::path::Path;

use enum_debug::EnumDebug;
use jobforge_cluster::catalog::{Partition, ResourceCatalog};
use jobforge_cluster::begin::is_begin;
use log::debug;

use crate::record::{self, AnswerRecord};
use crate::value::Value;


/***** ERRORS *****/
/// Defines errors that relate to evaluating [`Constraint`]s.
///
/// These are never user errors; every variant means the dialog definition itself is inconsistent
/// (e.g., a bound referencing a field that holds no text).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced field could not be read from the record.
    #[error(transparent)]
    Record(#[from] record::Error),
    /// A referenced field was expected to hold a partition name.
    #[error("Field '{field}' does not hold text (cannot use it as a partition name)")]
    NotText { field: String },
    /// A referenced field was expected to hold a list of names.
    #[error("Field '{field}' does not hold a list of names")]
    NotAList { field: String },
    /// A referenced partition vanished from the catalog.
    #[error("Partition '{name}' is not in the resource catalog")]
    UnknownPartition { name: String },
    /// A bounded constraint was put on a non-numeric field.
    #[error("Cannot apply numeric bounds to non-numeric value '{value}'")]
    NotNumeric { value: String },
}





/***** LIBRARY *****/
/// The per-partition capacities that a [`Bound`] can derive from.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, PartialEq)]
pub enum PartitionResource {
    /// The partition's memory capacity, in GB.
    RamGb,
    /// The partition's core count.
    Cores,
    /// The partition's maximum run time, in hours.
    MaxHours,
}
impl PartitionResource {
    /// Reads this resource from a partition's catalog entry.
    ///
    /// # Arguments
    /// - `partition`: The [`Partition`] to read.
    ///
    /// # Returns
    /// The resource's magnitude, as a number.
    #[inline]
    pub fn of(&self, partition: &Partition) -> f64 {
        match self {
            Self::RamGb => partition.ram_gb as f64,
            Self::Cores => partition.cores as f64,
            Self::MaxHours => partition.max_hours,
        }
    }

    /// Returns a human-readable name for this resource, for use in diagnostics.
    #[inline]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RamGb => "amount of memory (in GB)",
            Self::Cores => "number of cores",
            Self::MaxHours => "run time (in hours)",
        }
    }
}



/// Where a numeric bound gets its magnitude from.
#[derive(Clone, Debug, EnumDebug, PartialEq)]
pub enum BoundSource {
    /// A fixed number, known when the dialog is declared.
    Const(f64),
    /// A capacity of the partition named by an earlier answer, less a reserve held back for the
    /// system itself.
    Partition {
        /// The (earlier) field whose answer names the partition.
        field:    String,
        /// Which of the partition's capacities to read.
        resource: PartitionResource,
        /// How much of that capacity is not handed out to jobs.
        reserve:  f64,
    },
}
impl BoundSource {
    /// Resolves this source to a concrete number.
    ///
    /// # Arguments
    /// - `record`: The [`AnswerRecord`] as filled in so far.
    /// - `catalog`: The [`ResourceCatalog`] describing the cluster.
    ///
    /// # Returns
    /// The bound's magnitude.
    ///
    /// # Errors
    /// This function errors if the referenced field is absent, does not hold text, or names an
    /// unknown partition.
    pub fn resolve(&self, record: &AnswerRecord, catalog: &ResourceCatalog) -> Result<f64, Error> {
        match self {
            Self::Const(value) => Ok(*value),
            Self::Partition { field, resource, reserve } => {
                let name: &str = record.expect(field)?.as_text().ok_or_else(|| Error::NotText { field: field.clone() })?;
                let partition: &Partition = catalog.get(name).ok_or_else(|| Error::UnknownPartition { name: name.into() })?;
                Ok(resource.of(partition) - reserve)
            },
        }
    }

    /// Returns the field this source reads, if any.
    #[inline]
    pub fn references(&self) -> Option<&str> {
        match self {
            Self::Const(_) => None,
            Self::Partition { field, .. } => Some(field),
        }
    }
}
impl Display for BoundSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Partition { field, resource, reserve } => {
                write!(f, "{}(${{{field}}})", resource.variant())?;
                if *reserve != 0.0 {
                    write!(f, " - {reserve}")?;
                }
                Ok(())
            },
        }
    }
}



/// One side of a numeric range.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    /// Where the magnitude comes from.
    pub source:    BoundSource,
    /// Whether a value exactly at the bound is still acceptable.
    pub inclusive: bool,
}
impl Bound {
    /// Shorthand constructor for an inclusive bound on a fixed number.
    #[inline]
    pub fn at(value: f64) -> Self { Self { source: BoundSource::Const(value), inclusive: true } }

    /// Shorthand constructor for an exclusive bound on a fixed number.
    #[inline]
    pub fn beyond(value: f64) -> Self { Self { source: BoundSource::Const(value), inclusive: false } }

    /// Shorthand constructor for an inclusive bound on a partition capacity.
    ///
    /// # Arguments
    /// - `field`: The (earlier) field whose answer names the partition.
    /// - `resource`: Which of the partition's capacities to read.
    /// - `reserve`: How much of that capacity is held back.
    #[inline]
    pub fn partition(field: impl Into<String>, resource: PartitionResource, reserve: f64) -> Self {
        Self { source: BoundSource::Partition { field: field.into(), resource, reserve }, inclusive: true }
    }
}



/// A declarative predicate on a candidate answer.
///
/// A field's candidate must satisfy _all_ of its constraints, in declaration order.
#[derive(Clone, Debug, EnumDebug, PartialEq)]
pub enum Constraint {
    /// The answer must be non-empty text.
    NotEmpty,
    /// The answer must be one of a fixed set of options (case-insensitively).
    OneOf {
        /// The acceptable options.
        options:  Vec<String>,
        /// Whether the empty answer is also acceptable.
        or_empty: bool,
    },
    /// The answer must name a partition in the resource catalog.
    KnownPartition,
    /// The answer must appear in the list held by an earlier (usually silent) field.
    MemberOf {
        /// The field holding the list.
        field: String,
    },
    /// The answer must be a number within the given range.
    Bounded {
        /// The smallest acceptable value, if any.
        min: Option<Bound>,
        /// The largest acceptable value, if any.
        max: Option<Bound>,
    },
    /// The answer must be a path to an existing, readable directory.
    DirReadable,
    /// The answer must be a path to a readable & writable directory, created on demand.
    DirReadWrite {
        /// Whether to create the directory (mode 0750, with parents) if it is missing.
        create: bool,
    },
    /// The answer must be a path whose parent directory exists and is writable.
    ParentDirWritable,
    /// The answer must be a moment we can hand to the scheduler's begin-time option.
    BeginTime,
}
impl Constraint {
    /// Checks a candidate answer against this constraint.
    ///
    /// # Arguments
    /// - `value`: The (coerced) candidate to check.
    /// - `record`: The [`AnswerRecord`] as filled in so far; constraints may read any field
    ///   evaluated before the one being checked.
    /// - `catalog`: The [`ResourceCatalog`] describing the cluster.
    ///
    /// # Returns
    /// True if the candidate satisfies the constraint, or false if it should be rejected.
    ///
    /// # Errors
    /// This function errors if the constraint itself is inconsistent with the dialog (see
    /// [`Error`]); never because the candidate is merely invalid.
    pub fn check(&self, value: &Value, record: &AnswerRecord, catalog: &ResourceCatalog) -> Result<bool, Error> {
        match self {
            Self::NotEmpty => Ok(value.as_text().map(|text| !text.is_empty()).unwrap_or(true)),

            Self::OneOf { options, or_empty } => {
                let Some(text) = value.as_text() else { return Ok(false) };
                if text.is_empty() {
                    return Ok(*or_empty);
                }
                let text: String = text.to_lowercase();
                Ok(options.iter().any(|option| option.to_lowercase() == text))
            },

            Self::KnownPartition => Ok(value.as_text().map(|name| catalog.get(name).is_some()).unwrap_or(false)),

            Self::MemberOf { field } => {
                let names: &[String] = record.expect(field)?.as_list().ok_or_else(|| Error::NotAList { field: field.clone() })?;
                Ok(value.as_text().map(|text| names.iter().any(|name| name == text)).unwrap_or(false))
            },

            Self::Bounded { min, max } => {
                let value: f64 = value.as_f64().ok_or_else(|| Error::NotNumeric { value: value.to_string() })?;
                if let Some(min) = min {
                    let bound: f64 = min.source.resolve(record, catalog)?;
                    if value < bound || (!min.inclusive && value == bound) {
                        return Ok(false);
                    }
                }
                if let Some(max) = max {
                    let bound: f64 = max.source.resolve(record, catalog)?;
                    if value > bound || (!max.inclusive && value == bound) {
                        return Ok(false);
                    }
                }
                Ok(true)
            },

            Self::DirReadable => {
                let Some(path) = value.as_text() else { return Ok(false) };
                Ok(fs::read_dir(path).is_ok())
            },

            Self::DirReadWrite { create } => {
                let Some(path) = value.as_text() else { return Ok(false) };
                let path: &Path = Path::new(path);
                if *create && !path.exists() {
                    debug!("Creating directory '{}'...", path.display());
                    if let Err(err) = DirBuilder::new().recursive(true).mode(0o750).create(path) {
                        debug!("Failed to create '{}': {err}", path.display());
                        return Ok(false);
                    }
                }
                Ok(fs::read_dir(path).is_ok() && dir_writable(path))
            },

            Self::ParentDirWritable => {
                let Some(path) = value.as_text() else { return Ok(false) };
                let parent: &Path = match Path::new(path).parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                Ok(dir_writable(parent))
            },

            Self::BeginTime => Ok(value.as_text().map(is_begin).unwrap_or(false)),
        }
    }

    /// Returns the (earlier) field this constraint reads, if any.
    #[inline]
    pub fn references(&self) -> Option<&str> {
        match self {
            Self::MemberOf { field } => Some(field),
            Self::Bounded { min, max } => min.as_ref().and_then(|b| b.source.references()).or_else(|| max.as_ref().and_then(|b| b.source.references())),
            _ => None,
        }
    }
}
impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::NotEmpty => write!(f, "value must not be empty"),
            Self::OneOf { options, or_empty } => {
                write!(f, "value must be one of {options:?}")?;
                if *or_empty {
                    write!(f, " (or empty)")?;
                }
                Ok(())
            },
            Self::KnownPartition => write!(f, "value must name a known partition"),
            Self::MemberOf { field } => write!(f, "value must be listed in ${{{field}}}"),
            Self::Bounded { min, max } => {
                write!(f, "value must lie in ")?;
                match min {
                    Some(min) => write!(f, "{}{} .. ", if min.inclusive { '[' } else { '(' }, min.source)?,
                    None => write!(f, "(.. ")?,
                }
                match max {
                    Some(max) => write!(f, "{}{}", max.source, if max.inclusive { ']' } else { ')' }),
                    None => write!(f, ".)"),
                }
            },
            Self::DirReadable => write!(f, "value must be a readable directory"),
            Self::DirReadWrite { create } => {
                write!(f, "value must be a readable & writable directory")?;
                if *create {
                    write!(f, " (created on demand)")?;
                }
                Ok(())
            },
            Self::ParentDirWritable => write!(f, "value's parent directory must be writable"),
            Self::BeginTime => write!(f, "value must be a begin time"),
        }
    }
}





/***** HELPER FUNCTIONS *****/
/// Checks whether we can write files in the given directory.
///
/// # Arguments
/// - `path`: The directory to probe.
///
/// # Returns
/// True if creating a file there succeeds.
#[inline]
fn dir_writable(path: &Path) -> bool { tempfile::tempfile_in(path).is_ok() }





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use jobforge_cluster::catalog::Partition;

    use super::*;


    /// Builds a small catalog to test topology-dependent bounds against.
    fn catalog() -> ResourceCatalog {
        let mut partitions: IndexMap<String, Partition> = IndexMap::new();
        partitions.insert("basic".into(), Partition { cores: 52, ram_gb: 384, features: None, gpus: None, max_hours: 72.0 });
        ResourceCatalog::from_partitions(partitions)
    }

    /// Builds a record in which the user already picked the `basic` partition.
    fn record() -> AnswerRecord {
        let mut record = AnswerRecord::new();
        record.store("partition", Value::Text("basic".into())).unwrap();
        record
    }


    #[test]
    fn test_partition_derived_bounds() {
        // 1 < mem <= ram(partition) - 2
        let constraint = Constraint::Bounded { min: Some(Bound::beyond(1.0)), max: Some(Bound::partition("partition", PartitionResource::RamGb, 2.0)) };

        let (catalog, record) = (catalog(), record());
        assert!(constraint.check(&Value::Int(382), &record, &catalog).unwrap());
        assert!(constraint.check(&Value::Int(383), &record, &catalog).unwrap());
        assert!(!constraint.check(&Value::Int(384), &record, &catalog).unwrap());
        assert!(!constraint.check(&Value::Int(390), &record, &catalog).unwrap());
        assert!(!constraint.check(&Value::Int(1), &record, &catalog).unwrap());
        assert!(constraint.check(&Value::Int(2), &record, &catalog).unwrap());
    }

    #[test]
    fn test_bounds_fail_loudly_without_partition() {
        let constraint = Constraint::Bounded { min: None, max: Some(Bound::partition("partition", PartitionResource::Cores, 2.0)) };
        let catalog = catalog();

        // The partition has not been answered yet; this is a dialog bug, not a user error
        assert!(matches!(constraint.check(&Value::Int(8), &AnswerRecord::new(), &catalog), Err(Error::Record(record::Error::UnknownField { .. }))));
    }

    #[test]
    fn test_one_of() {
        let constraint = Constraint::OneOf { options: vec!["amber20".into(), "gaussian".into()], or_empty: true };
        let (catalog, record) = (catalog(), AnswerRecord::new());

        assert!(constraint.check(&Value::Text("Gaussian".into()), &record, &catalog).unwrap());
        assert!(constraint.check(&Value::Text("".into()), &record, &catalog).unwrap());
        assert!(!constraint.check(&Value::Text("vasp".into()), &record, &catalog).unwrap());
    }

    #[test]
    fn test_member_of() {
        let mut record = AnswerRecord::new();
        record.store("user.groups", Value::List(vec!["users".into(), "chem".into()])).unwrap();
        let catalog = catalog();

        let constraint = Constraint::MemberOf { field: "user.groups".into() };
        assert!(constraint.check(&Value::Text("chem".into()), &record, &catalog).unwrap());
        assert!(!constraint.check(&Value::Text("physics".into()), &record, &catalog).unwrap());
    }

    #[test]
    fn test_known_partition() {
        let (catalog, record) = (catalog(), AnswerRecord::new());
        assert!(Constraint::KnownPartition.check(&Value::Text("basic".into()), &record, &catalog).unwrap());
        assert!(!Constraint::KnownPartition.check(&Value::Text("huge".into()), &record, &catalog).unwrap());
    }

    #[test]
    fn test_dir_constraints() {
        let tmp = tempfile::tempdir().unwrap();
        let (catalog, record) = (catalog(), AnswerRecord::new());

        let dir: String = tmp.path().display().to_string();
        assert!(Constraint::DirReadable.check(&Value::Text(dir.clone()), &record, &catalog).unwrap());
        assert!(!Constraint::DirReadable.check(&Value::Text(format!("{dir}/nope")), &record, &catalog).unwrap());

        // DirReadWrite with create makes the directory appear
        let scratch: String = format!("{dir}/scratch");
        assert!(Constraint::DirReadWrite { create: true }.check(&Value::Text(scratch.clone()), &record, &catalog).unwrap());
        assert!(std::path::Path::new(&scratch).is_dir());

        assert!(Constraint::ParentDirWritable.check(&Value::Text(format!("{dir}/job.slurm")), &record, &catalog).unwrap());
        assert!(!Constraint::ParentDirWritable.check(&Value::Text(format!("{dir}/nope/job.slurm")), &record, &catalog).unwrap());
    }
}
