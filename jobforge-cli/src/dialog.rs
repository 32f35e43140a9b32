//  DIALOG.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 13:48:50
//  Last edited:
//    03 Jun 2025, 10:21:17
//  Auto updated?
//    Yes
//
//  Description:
//!   Declares the actual questionnaire: which questions are asked, in
//!   which order, with which defaults, datatypes, constraints and
//!   diagnostics. The shape of the dialog lives here; evaluating it is
//!   `jobforge-dialog`'s business.
//

use std::env;
use std::path::PathBuf;

use jobforge_cluster::catalog::ResourceCatalog;
use jobforge_cluster::groups::{self, user_groups};
use jobforge_dialog::constraint::{Bound, Constraint, PartitionResource};
use jobforge_dialog::field::{FieldSpec, Message, Reformat};
use jobforge_dialog::tree::{self, DialogTree, DialogTreeBuilder};
use jobforge_dialog::value::{Value, ValueKind};


/***** CONSTANTS *****/
/// How much of a partition's RAM (in GB) is never handed out to jobs.
pub const RAM_RESERVE_GB: f64 = 2.0;

/// How many of a partition's cores are never handed out to jobs.
pub const CORES_RESERVE: f64 = 2.0;

/// The software the cluster has modules for, and which modules a job for it must load.
pub const PROGRAMS: [ProgramInfo; 2] = [
    ProgramInfo { name: "amber20", desc: "biomolecular simulation", modules: &["amber/20"] },
    ProgramInfo { name: "gaussian", desc: "electronic structure modeling", modules: &["gaussian"] },
];





/***** ERRORS *****/
/// Defines errors that relate to declaring the questionnaire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The questionnaire itself is inconsistent (should never escape development).
    #[error(transparent)]
    Tree(#[from] tree::Error),
    /// We could not find out which groups the user is in.
    #[error("Failed to collect your group memberships")]
    Groups { source: groups::Error },
    /// We could not find the user's home directory.
    #[error("Failed to find your home directory")]
    MissingHome,
    /// We could not resolve the current working directory.
    #[error("Failed to resolve the current working directory")]
    CurrentDir { source: std::io::Error },
}





/***** LIBRARY *****/
/// A program the cluster has modules for.
#[derive(Clone, Copy, Debug)]
pub struct ProgramInfo {
    /// The name the user answers with.
    pub name:    &'static str,
    /// What the program is for.
    pub desc:    &'static str,
    /// The modules a job running it must load.
    pub modules: &'static [&'static str],
}

/// Finds a program by the name the user answered.
///
/// # Arguments
/// - `name`: The answered name; matched case-insensitively.
///
/// # Returns
/// The [`ProgramInfo`] if we know the program, or [`None`] otherwise.
#[inline]
pub fn find_program(name: &str) -> Option<&'static ProgramInfo> { PROGRAMS.iter().find(|program| program.name.eq_ignore_ascii_case(name)) }



/// Declares the job questionnaire over the given cluster.
///
/// Field order matters: constraints and defaults only ever read fields declared before them,
/// and the tree's finishing pass enforces exactly that.
///
/// # Arguments
/// - `catalog`: The [`ResourceCatalog`] that partition names and capacity bounds resolve
///   against.
///
/// # Returns
/// The finished [`DialogTree`], ready to be evaluated.
///
/// # Errors
/// This function errors if the environment cannot be inspected (user, groups, home directory),
/// or if the questionnaire fails its own construction-time checks.
pub fn job_dialog(catalog: &ResourceCatalog) -> Result<DialogTree, Error> {
    let username: String = env::var("USER").unwrap_or_else(|_| String::from("nobody"));
    let groups: Vec<String> = user_groups().map_err(|source| Error::Groups { source })?;
    let home: String = dirs::home_dir().ok_or(Error::MissingHome)?.display().to_string();
    let cwd: PathBuf = env::current_dir().map_err(|source| Error::CurrentDir { source })?;

    let tree: DialogTree = DialogTreeBuilder::new()
        // Never asked about; holds who we are and which groups we can bill to
        .field("user", FieldSpec::new().with_preset(username.clone()).with_child("groups", FieldSpec::new().with_preset(Value::List(groups))))?
        .field("jobname", FieldSpec::new().with_prompt("Name of your job").with_datatype(ValueKind::Text).with_constraint(Constraint::NotEmpty))?
        .field(
            "output",
            FieldSpec::new()
                .with_prompt("Name of your job's output file")
                .with_default_template(format!("{home}/${{jobname}}.txt"))
                .with_datatype(ValueKind::Text),
        )?
        .field(
            "program",
            FieldSpec::new()
                .with_prompt("What program do you want to run")
                .with_default("")
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::OneOf { options: PROGRAMS.iter().map(|program| program.name.into()).collect(), or_empty: true }),
        )?
        .field(
            "partition",
            FieldSpec::new()
                .with_prompt("Name of the partition where you want to run your job")
                .with_default(catalog.default_partition())
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::KnownPartition)
                .with_message(Message::PartitionList),
        )?
        .field(
            "account",
            FieldSpec::new()
                .with_prompt(format!("What account is your user id, {username}, associated with"))
                .with_default("users")
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::MemberOf { field: "user.groups".into() })
                .with_message(Message::GroupList { field: "user.groups".into() }),
        )?
        .field(
            "datadir",
            FieldSpec::new()
                .with_prompt("Where is your input data directory")
                .with_default(home.clone())
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::DirReadable),
        )?
        .field(
            "scratchdir",
            FieldSpec::new()
                .with_prompt("Where is your scratch directory")
                .with_default(format!("{home}/scratch"))
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::DirReadWrite { create: true }),
        )?
        .field(
            "mem",
            FieldSpec::new()
                .with_prompt("How much memory (in GB)")
                .with_default(16i64)
                .with_datatype(ValueKind::Int)
                .with_constraint(Constraint::Bounded {
                    min: Some(Bound::beyond(1.0)),
                    max: Some(Bound::partition("partition", PartitionResource::RamGb, RAM_RESERVE_GB)),
                })
                .with_message(Message::PartitionLimit { field: "partition".into(), resource: PartitionResource::RamGb, reserve: RAM_RESERVE_GB }),
        )?
        .field(
            "cores",
            FieldSpec::new()
                .with_prompt("How many cores")
                .with_default(8i64)
                .with_datatype(ValueKind::Int)
                .with_constraint(Constraint::Bounded {
                    min: Some(Bound::beyond(0.0)),
                    max: Some(Bound::partition("partition", PartitionResource::Cores, CORES_RESERVE)),
                })
                .with_message(Message::PartitionLimit { field: "partition".into(), resource: PartitionResource::Cores, reserve: CORES_RESERVE }),
        )?
        .field(
            "time",
            FieldSpec::new()
                .with_prompt("How long should this run (in hours)")
                .with_default(1.0)
                .with_datatype(ValueKind::Real)
                .with_constraint(Constraint::Bounded { min: None, max: Some(Bound::partition("partition", PartitionResource::MaxHours, 0.0)) })
                .with_message(Message::PartitionLimit { field: "partition".into(), resource: PartitionResource::MaxHours, reserve: 0.0 })
                .with_reformat(Reformat::HoursToWalltime),
        )?
        .field(
            "start",
            FieldSpec::new()
                .with_prompt("When do you want the job to run")
                .with_default("now")
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::BeginTime)
                .with_reformat(Reformat::BeginTime),
        )?
        .field(
            "jobfile",
            FieldSpec::new()
                .with_prompt("What will be the name of this new jobfile")
                .with_default_template(format!("{}/${{jobname}}.slurm", cwd.display()))
                .with_datatype(ValueKind::Text)
                .with_constraint(Constraint::ParentDirWritable)
                .with_message(Message::Text("Either ${value} doesn't exist, or you cannot write to it.".into())),
        )?
        .finish()?;

    Ok(tree)
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    /// A catalog in the shape the inventory tool produces it.
    fn catalog() -> ResourceCatalog {
        ResourceCatalog::parse(
            "PARTITION  CPUS  MEMORY  AVAIL_FEATURES  GRES  TIMELIMIT
basic*     52    384000  (null)          (null)      infinite
medium     52    768000  (null)          (null)      3-00:00:00
",
        )
        .unwrap()
    }


    #[test]
    fn test_find_program() {
        assert_eq!(find_program("amber20").map(|p| p.name), Some("amber20"));
        assert_eq!(find_program("Gaussian").map(|p| p.name), Some("gaussian"));
        assert!(find_program("vasp").is_none());
    }

    #[test]
    fn test_questionnaire_passes_its_own_checks() {
        // This exercises the finishing pass: fallback messages and the forward-only reference
        // rule over the real questionnaire
        let tree: DialogTree = job_dialog(&catalog()).unwrap();

        let names: Vec<&str> = tree.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec![
            "user", "jobname", "output", "program", "partition", "account", "datadir", "scratchdir", "mem", "cores", "time", "start", "jobfile"
        ]);

        // The silent field holds the presets, the prompted ones a question
        assert!(tree.get("user").unwrap().prompt.is_none());
        assert!(tree.get("jobname").unwrap().prompt.is_some());

        // Every prompted field ends up with at least one diagnostic
        for (name, spec) in tree.iter() {
            if spec.prompt.is_some() {
                assert!(!spec.messages.is_empty(), "field '{name}' has no diagnostics");
            }
        }
    }

    #[test]
    fn test_partition_default_follows_the_catalog() {
        let tree: DialogTree = job_dialog(&catalog()).unwrap();
        assert_eq!(tree.get("partition").unwrap().default, Some(jobforge_dialog::field::DefaultSpec::Value(Value::Text("basic".into()))));
    }
}
