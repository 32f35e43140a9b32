//  LIB.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 11:02:35
//  Last edited:
//    27 May 2025, 10:12:48
//  Auto updated?
//    Yes
//
//  Description:
//!   Describes the cluster that jobs will be submitted to. The central
//!   type is the [`ResourceCatalog`](catalog::ResourceCatalog), a
//!   read-only table of per-partition capacities probed from the
//!   scheduler's inventory tool at startup. The dialog's
//!   topology-dependent bounds are resolved against it.
//

// Declare modules
pub mod begin;
pub mod catalog;
pub mod groups;
pub mod walltime;

// Pull the common ones into the crate namespace
pub use catalog::{GpuSpec, Partition, ResourceCatalog};
