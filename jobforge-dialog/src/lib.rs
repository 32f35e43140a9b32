//  LIB.rs
//    by Lut99
//
//  Created:
//    14 Oct 2024, 13:10:27
//  Last edited:
//    02 Jun 2025, 11:29:54
//  Auto updated?
//    Yes
//
//  Description:
//!   The heart of `jobforge`: a declarative dialog tree and the engine
//!   that evaluates it. A [`DialogTree`](tree::DialogTree) describes the
//!   questionnaire as plain data (prompts, defaults, datatypes,
//!   constraints, diagnostics, reformat rules); the
//!   [`Engine`](engine::Engine) walks it in declared order, coercing and
//!   validating every answer against the answers already given and the
//!   cluster's [`ResourceCatalog`](jobforge_cluster::ResourceCatalog),
//!   and produces the completed [`AnswerRecord`](record::AnswerRecord)
//!   that the script template is rendered from.
//

// Declare modules
pub mod constraint;
pub mod engine;
pub mod field;
pub mod record;
pub mod tree;
pub mod value;

// Pull the common ones into the crate namespace
pub use constraint::{Bound, BoundSource, Constraint, PartitionResource};
pub use engine::{Engine, Outcome};
pub use field::{DefaultSpec, FieldSpec, Message, Reformat};
pub use record::AnswerRecord;
pub use tree::{DialogTree, DialogTreeBuilder};
pub use value::{Value, ValueKind};
