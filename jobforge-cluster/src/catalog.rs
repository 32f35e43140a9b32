//  CATALOG.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 11:31:09
//  Last edited:
//    27 May 2025, 10:40:23
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the [`ResourceCatalog`], the read-only table of
//!   per-partition capacities that the dialog's topology-dependent
//!   bounds are checked against. The catalog is populated once per run
//!   by querying the scheduler's `sinfo` tool; a cluster without that
//!   tool cannot run this program at all.
//

use std::io::ErrorKind;
use std::process::{Command, Output};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::walltime::{INFINITE_HOURS, walltime_to_hours};


/***** CONSTANTS *****/
/// The name of the scheduler's inventory tool.
pub const QUERY_TOOL: &str = "sinfo";

/// The fixed-column output format we ask the inventory tool for.
///
/// Column order: partition name, core count, memory (MB), feature flags, generic resources
/// (GPUs), maximum run time.
pub const QUERY_FORMAT: &str = "%50P %10c  %10m  %25f  %10G %l";





/***** ERRORS *****/
/// Defines errors that relate to building the [`ResourceCatalog`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The inventory tool is not installed (or not in `$PATH`).
    #[error("The scheduler does not appear to be on this machine ('{QUERY_TOOL}' not found)")]
    ToolNotFound { source: std::io::Error },
    /// We failed to spawn the inventory tool for another reason.
    #[error("Failed to run '{QUERY_TOOL}'")]
    ToolSpawn { source: std::io::Error },
    /// The inventory tool ran but reported failure.
    #[error("'{QUERY_TOOL}' exited with status {status}: {stderr}")]
    ToolFailure { status: i32, stderr: String },
    /// A line of inventory output did not have the six expected columns.
    #[error("Cannot parse inventory line {line} ({got} column(s), expected 6): {raw:?}")]
    MalformedLine { line: usize, got: usize, raw: String },
    /// A numeric column did not parse.
    #[error("Cannot parse {what} {raw:?} on inventory line {line}")]
    MalformedNumber { what: &'static str, raw: String, line: usize, source: std::num::ParseIntError },
    /// The inventory was empty.
    #[error("The scheduler reported no partitions at all")]
    NoPartitions,
}





/***** LIBRARY *****/
/// A generic (GPU) resource attached to a partition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GpuSpec {
    /// The type of accelerator (e.g., `A100`).
    pub kind:  String,
    /// How many of them every node in the partition has.
    pub count: u32,
}
impl GpuSpec {
    /// Parses the inventory tool's generic-resource column (e.g., `gpu:A100:2`).
    ///
    /// # Arguments
    /// - `raw`: The raw column value.
    ///
    /// # Returns
    /// The parsed spec, or [`None`] if the column does not describe a GPU.
    fn parse(raw: &str) -> Option<Self> {
        // Some clusters suffix the count with a socket list, e.g. `gpu:A40:8(S:0-1)`
        let raw: &str = raw.split('(').next().unwrap_or(raw);

        let mut parts = raw.split(':');
        if parts.next() != Some("gpu") {
            return None;
        }
        let kind: &str = parts.next()?;
        let count: u32 = parts.next().and_then(|c| c.parse().ok()).unwrap_or(1);

        Some(Self { kind: kind.into(), count })
    }
}



/// The capacities of a single partition.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    /// The number of cores on a node in this partition.
    pub cores: u32,
    /// The amount of RAM on a node in this partition, in GB.
    pub ram_gb: u64,
    /// Any feature flags the partition advertises.
    pub features: Option<String>,
    /// The partition's GPUs, if it has any.
    pub gpus: Option<GpuSpec>,
    /// The longest a job may run here, in hours. `infinite` is mapped to one year.
    pub max_hours: f64,
}



/// A read-only mapping of partition name to capacities.
///
/// Constructed once per process by [`probing`](ResourceCatalog::probe) the scheduler's inventory
/// tool; the dialog's constraints only ever read it.
#[derive(Clone, Debug)]
pub struct ResourceCatalog {
    /// The partitions, in the order the inventory listed them.
    partitions: IndexMap<String, Partition>,
    /// The name of the partition the inventory marked as the cluster's default, if any.
    default:    Option<String>,
}
impl ResourceCatalog {
    /// Queries the current environment for the description of the cluster.
    ///
    /// # Returns
    /// A new ResourceCatalog describing every partition the scheduler knows of.
    ///
    /// # Errors
    /// This function errors if the inventory tool is missing (the distinguishing startup
    /// failure), if it could not be run, or if its output cannot be understood.
    pub fn probe() -> Result<Self, Error> {
        let mut cmd: Command = Command::new(QUERY_TOOL);
        cmd.arg("-o").arg(QUERY_FORMAT);

        debug!("Running '{cmd:?}'...");
        let output: Output = match cmd.output() {
            Ok(output) => output,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(Error::ToolNotFound { source: err }),
            Err(err) => return Err(Error::ToolSpawn { source: err }),
        };
        if !output.status.success() {
            return Err(Error::ToolFailure {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().into(),
            });
        }

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parses the inventory tool's fixed-column output.
    ///
    /// # Arguments
    /// - `raw`: The raw output of the tool, including its header line.
    ///
    /// # Returns
    /// A new ResourceCatalog with one entry per partition. A partition listed more than once
    /// (one line per node configuration) keeps the last line's values.
    ///
    /// # Errors
    /// This function errors if any line does not carry the six expected columns, or if a numeric
    /// column does not parse.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let mut partitions: IndexMap<String, Partition> = IndexMap::new();
        let mut default: Option<String> = None;

        // The first line of the output is just headers
        for (i, line) in raw.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split_whitespace().collect();
            let [name, cores, memory, features, gres, time] = columns[..] else {
                return Err(Error::MalformedLine { line: i + 1, got: columns.len(), raw: line.into() });
            };

            // The inventory marks the cluster's default partition with a trailing '*'
            let name: &str = match name.strip_suffix('*') {
                Some(name) => {
                    default = Some(name.into());
                    name
                },
                None => name,
            };

            let cores: u32 = match cores.parse() {
                Ok(cores) => cores,
                Err(err) => return Err(Error::MalformedNumber { what: "core count", raw: cores.into(), line: i + 1, source: err }),
            };

            // Memory is printed in MB, sometimes with a trailing '+'
            let digits: String = memory.chars().filter(char::is_ascii_digit).collect();
            let ram_mb: u64 = match digits.parse() {
                Ok(ram) => ram,
                Err(err) => return Err(Error::MalformedNumber { what: "memory size", raw: memory.into(), line: i + 1, source: err }),
            };

            let features: Option<String> = if features.to_lowercase().contains("null") { None } else { Some(features.into()) };
            let gpus: Option<GpuSpec> = if gres.to_lowercase().contains("null") { None } else { GpuSpec::parse(gres) };
            let max_hours: f64 = if time == "infinite" { INFINITE_HOURS } else { walltime_to_hours(time) };

            let entry: Partition = Partition { cores, ram_gb: ram_mb / 1000, features, gpus, max_hours };
            if partitions.insert(name.into(), entry).is_some() {
                warn!("Partition '{name}' is listed more than once; keeping the last line");
            }
        }

        if partitions.is_empty() {
            return Err(Error::NoPartitions);
        }
        debug!("Inventory reported {} partition(s)", partitions.len());
        Ok(Self { partitions, default })
    }

    /// Builds a catalog directly from a partition table.
    ///
    /// Mostly useful for tests; real runs use [`probe()`](Self::probe).
    ///
    /// # Arguments
    /// - `partitions`: The partition table to wrap.
    ///
    /// # Returns
    /// A new ResourceCatalog without a marked default partition.
    #[inline]
    pub fn from_partitions(partitions: IndexMap<String, Partition>) -> Self { Self { partitions, default: None } }

    /// Looks up a partition by name.
    ///
    /// # Arguments
    /// - `name`: The partition name to look for.
    ///
    /// # Returns
    /// The [`Partition`] if it exists, or [`None`] otherwise.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Partition> { self.partitions.get(name) }

    /// Returns the name of the partition that new jobs land on when none is chosen.
    ///
    /// # Returns
    /// The inventory's marked default if it had one, or else the first listed partition.
    #[inline]
    pub fn default_partition(&self) -> &str {
        match &self.default {
            Some(name) => name.as_str(),
            // Safe since construction guarantees at least one partition
            None => self.partitions.keys().next().unwrap().as_str(),
        }
    }

    /// Returns the partition names, in inventory order.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> { self.partitions.keys().map(String::as_str) }

    /// Returns the number of partitions in the catalog.
    #[inline]
    pub fn len(&self) -> usize { self.partitions.len() }

    /// Checks whether there are no partitions in the catalog (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool { self.partitions.is_empty() }
}





/***** TESTS *****/
