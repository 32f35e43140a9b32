//  ENGINE.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 10:02:13
//  Last edited:
//    03 Jun 2025, 09:55:31
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the evaluation engine: the walk over a [`DialogTree`]
//!   that prompts, coerces, validates, reformats and collects answers
//!   into an [`AnswerRecord`]. Interactive runs may retry a failed
//!   answer indefinitely; runs fed by a redirected stream die on the
//!   first failure, since nobody is there to correct it.
//

use enum_debug::EnumDebug as _;
use jobforge_cluster::catalog::ResourceCatalog;
use jobforge_shr::input::{self, ABORT_SENTINEL, LineSource, Response, truthy};
use log::debug;

use crate::constraint;
use crate::field::{self, FieldSpec};
use crate::record::{self, AnswerRecord};
use crate::tree::DialogTree;
use crate::value::{CoerceError, Value};


/***** ERRORS *****/
/// Defines errors that relate to evaluating a [`DialogTree`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to read an answer at all (an I/O-level problem, not bad input).
    #[error("Failed to read an answer for field '{field}'")]
    Input { field: String, source: input::Error },
    /// The input stream ran out in the middle of the dialog.
    #[error("Ran out of input while asking for field '{field}'")]
    OutOfInput { field: String },
    /// A scripted answer did not coerce into the field's datatype.
    #[error("Answer for field '{field}' is not usable")]
    Unusable { field: String, source: CoerceError },
    /// A scripted answer was rejected by the field's constraints.
    #[error("Answer '{value}' for field '{field}' was rejected")]
    Rejected { field: String, value: String },
    /// The user looked at the review and said no.
    #[error("The given answers were not confirmed")]
    Declined,
    /// The dialog definition itself misbehaved while we were evaluating it.
    #[error("Failed to evaluate the dialog definition at field '{field}'")]
    Definition { field: String, source: DefinitionError },
}

/// The ways a dialog definition can misbehave at evaluation time.
///
/// The tree's construction-time checks catch most of these up front; this is the loud runtime
/// backstop.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// A constraint could not be evaluated.
    #[error(transparent)]
    Constraint(#[from] constraint::Error),
    /// A default, diagnostic or reformat rule could not be evaluated.
    #[error(transparent)]
    Field(#[from] field::Error),
    /// The record refused a lookup or a store.
    #[error(transparent)]
    Record(#[from] record::Error),
}





/***** AUXILLARY *****/
/// The result of a full dialog pass.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Every prompted field was answered (and, interactively, confirmed).
    Completed(AnswerRecord),
    /// The user deliberately bailed out (the `EOF` sentinel, or an interrupt at a prompt). This
    /// is a _successful_ way for the program to end; no output should be written.
    Aborted,
}

/// What the user made of the review.
#[derive(Clone, Copy, Debug)]
enum Review {
    /// The answers are OK; proceed.
    Confirmed,
    /// The answers are not OK; the run fails, the user re-invokes the tool.
    Declined,
    /// The user bailed out during the review.
    Aborted,
}





/***** LIBRARY *****/
/// Walks a [`DialogTree`] and produces the completed [`AnswerRecord`].
#[derive(Debug)]
pub struct Engine<'c, S> {
    /// The cluster description that topology-dependent constraints resolve against.
    catalog: &'c ResourceCatalog,
    /// Where answers come from. Also decides interactivity, and with it the retry policy.
    source:  S,
}
impl<'c, S: LineSource> Engine<'c, S> {
    /// Constructor for the Engine.
    ///
    /// # Arguments
    /// - `catalog`: The [`ResourceCatalog`] describing the cluster we write jobs for.
    /// - `source`: The [`LineSource`] to read answers from. Whether it
    ///   [is interactive](LineSource::is_interactive) decides the retry policy for the whole run.
    ///
    /// # Returns
    /// A new Engine, ready to [`run()`](Engine::run).
    #[inline]
    pub fn new(catalog: &'c ResourceCatalog, source: S) -> Self { Self { catalog, source } }

    /// Walks the given tree, in declared order, and collects an answer for every prompted field.
    ///
    /// Silent fields are never surfaced, but their presets are readable by every later field.
    /// After a complete interactive pass, the answers are echoed back and must be confirmed.
    ///
    /// # Arguments
    /// - `tree`: The [`DialogTree`] to evaluate.
    ///
    /// # Returns
    /// An [`Outcome`]: either the completed record, or a clean user abort.
    ///
    /// # Errors
    /// This function errors if input failed or ran out, if a non-interactive answer was
    /// uncoercible or rejected, if the user declined the review, or if the dialog definition
    /// itself misbehaved.
    pub fn run(&mut self, tree: &DialogTree) -> Result<Outcome, Error> {
        // Seed the record with everything attached at construction time
        let mut record: AnswerRecord = AnswerRecord::new();
        for (name, value) in tree.presets() {
            let field: String = name.clone();
            record.store(name, value.clone()).map_err(|source| Error::Definition { field, source: source.into() })?;
        }

        // Ask away, in declared order
        for (name, spec) in tree.iter() {
            // Fields without a prompt are never surfaced
            let Some(prompt) = &spec.prompt else { continue };

            match self.ask(name, prompt, spec, &record)? {
                Some(answer) => {
                    record.store(name, answer).map_err(|source| Error::Definition { field: name.into(), source: source.into() })?;
                },
                None => return Ok(Outcome::Aborted),
            }
        }

        // Scripted runs are done now; interactive ones get to look at what they typed
        if self.source.is_interactive() {
            match self.review(tree, &record)? {
                Review::Confirmed => {},
                Review::Declined => return Err(Error::Declined),
                Review::Aborted => return Ok(Outcome::Aborted),
            }
        }
        Ok(Outcome::Completed(record))
    }

    /// Collects the answer for a single field.
    ///
    /// This is the per-field loop: prompt, substitute the default on empty input, coerce,
    /// validate, reformat; interactively looping back to the prompt for as long as it takes.
    ///
    /// # Arguments
    /// - `name`: The field's name in the tree.
    /// - `prompt`: The field's question.
    /// - `spec`: The field's [`FieldSpec`].
    /// - `record`: The [`AnswerRecord`] as filled in so far.
    ///
    /// # Returns
    /// The validated, reformatted answer to store, or [`None`] if the user bailed out.
    ///
    /// # Errors
    /// See [`run()`](Engine::run); this is where most of those conditions are detected.
    fn ask(&mut self, name: &str, prompt: &str, spec: &FieldSpec, record: &AnswerRecord) -> Result<Option<Value>, Error> {
        loop {
            // Resolve the default lazily, every round, so it can reflect earlier answers
            let default: Option<Value> = match &spec.default {
                Some(default) => {
                    Some(default.resolve(record).map_err(|source| Error::Definition { field: name.into(), source: source.into() })?)
                },
                None => None,
            };
            let question: String = match &default {
                Some(default) => format!("{prompt} [{default}]"),
                None => prompt.into(),
            };

            // PROMPT: one scrubbed line
            let line: String = match self.source.read_answer(&question).map_err(|source| Error::Input { field: name.into(), source })? {
                Response::Line(line) => line,
                Response::Interrupted => {
                    debug!("Interrupted while asking for '{name}'; aborting cleanly");
                    return Ok(None);
                },
                Response::EndOfInput => return Err(Error::OutOfInput { field: name.into() }),
            };
            if line == ABORT_SENTINEL {
                debug!("Read the abort sentinel while asking for '{name}'; aborting cleanly");
                return Ok(None);
            }

            // Empty input takes the default instead; a typed default skips coercion
            let candidate: Value = if line.is_empty() {
                match default {
                    Some(Value::Text(text)) => match self.coerce(name, spec, &text)? {
                        Some(candidate) => candidate,
                        None => continue,
                    },
                    Some(value) => value,
                    None => match self.coerce(name, spec, "")? {
                        Some(candidate) => candidate,
                        None => continue,
                    },
                }
            } else {
                match self.coerce(name, spec, &line)? {
                    Some(candidate) => candidate,
                    None => continue,
                }
            };

            // VALIDATE: every constraint, in declared order
            let mut valid: bool = true;
            for constraint in &spec.constraints {
                debug!("{name}: checking '{candidate}' against {} ({constraint})", constraint.variant());
                if !constraint.check(&candidate, record, self.catalog).map_err(|source| Error::Definition { field: name.into(), source: source.into() })? {
                    valid = false;
                    break;
                }
            }
            if !valid {
                // Help the user get it right next time
                for message in &spec.messages {
                    let text: String =
                        message.render(&candidate, record, self.catalog).map_err(|source| Error::Definition { field: name.into(), source: source.into() })?;
                    println!("{text}");
                }
                if !self.source.is_interactive() {
                    return Err(Error::Rejected { field: name.into(), value: candidate.to_string() });
                }
                continue;
            }

            // REFORMAT: rewrite into the canonical stored form
            let answer: Value = match &spec.reformat {
                Some(reformat) => {
                    reformat.apply(candidate).map_err(|source| Error::Definition { field: name.into(), source: source.into() })?
                },
                None => candidate,
            };
            debug!("{name}: storing answer '{answer}'");
            return Ok(Some(answer));
        }
    }

    /// Coerces a raw answer through the field's datatype, if it has one.
    ///
    /// # Arguments
    /// - `name`: The field's name, for diagnostics.
    /// - `spec`: The field's [`FieldSpec`].
    /// - `raw`: The raw (scrubbed) input to coerce.
    ///
    /// # Returns
    /// The coerced [`Value`], or [`None`] if coercion failed but the user may retry.
    ///
    /// # Errors
    /// This function errors if coercion failed and the run is not interactive.
    fn coerce(&self, name: &str, spec: &FieldSpec, raw: &str) -> Result<Option<Value>, Error> {
        let Some(kind) = spec.datatype else { return Ok(Some(Value::Text(raw.into()))) };
        match kind.coerce(raw) {
            Ok(candidate) => Ok(Some(candidate)),
            Err(err) => {
                println!("Woops! {:?} should be {}", err.raw, err.kind);
                if self.source.is_interactive() { Ok(None) } else { Err(Error::Unusable { field: name.into(), source: err }) }
            },
        }
    }

    /// Echoes all prompted questions & stored answers back and asks for confirmation.
    ///
    /// # Arguments
    /// - `tree`: The [`DialogTree`] that was just evaluated.
    /// - `record`: The completed [`AnswerRecord`].
    ///
    /// # Returns
    /// What the [user made of it](Review). The confirmation uses the tolerant truthy parse, so
    /// an empty answer means yes.
    ///
    /// # Errors
    /// This function errors if input failed or ran out, or if a prompted field somehow has no
    /// answer.
    fn review(&mut self, tree: &DialogTree, record: &AnswerRecord) -> Result<Review, Error> {
        println!("\n----------------------\n");
        for (name, spec) in tree.iter() {
            if let Some(prompt) = &spec.prompt {
                let answer: &Value = record.expect(name).map_err(|source| Error::Definition { field: name.into(), source: source.into() })?;
                println!("{prompt} => {answer}");
            }
        }

        match self.source.read_answer("\nThese are the answers you provided. Are they OK? [y]").map_err(|source| Error::Input { field: "confirmation".into(), source })? {
            Response::Line(line) if line == ABORT_SENTINEL => Ok(Review::Aborted),
            Response::Line(line) => Ok(if truthy(&line) { Review::Confirmed } else { Review::Declined }),
            Response::Interrupted => Ok(Review::Aborted),
            Response::EndOfInput => Err(Error::OutOfInput { field: "confirmation".into() }),
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use indexmap::IndexMap;
    use jobforge_cluster::catalog::Partition;
    use jobforge_shr::input::{Stream, scrub};

    use crate::constraint::{Bound, Constraint, PartitionResource};
    use crate::field::{Message, Reformat};
    use crate::tree::{DialogTree, DialogTreeBuilder};
    use crate::value::ValueKind;

    use super::*;


    /// A [`LineSource`] that pretends to be a terminal but replays canned answers. Lets the
    /// tests exercise the interactive retry & review paths.
    struct Scripted {
        lines: VecDeque<&'static str>,
    }
    impl Scripted {
        fn new(lines: impl IntoIterator<Item = &'static str>) -> Self { Self { lines: lines.into_iter().collect() } }
    }
    impl LineSource for Scripted {
        fn read_answer(&mut self, _prompt: &str) -> Result<Response, input::Error> {
            match self.lines.pop_front() {
                Some(line) => Ok(Response::Line(scrub(line).into())),
                None => Ok(Response::EndOfInput),
            }
        }

        fn is_interactive(&self) -> bool { true }
    }


    /// The cluster every test runs against: one 384 GB, 52-core partition called `basic`.
    fn catalog() -> ResourceCatalog {
        let mut partitions: IndexMap<String, Partition> = IndexMap::new();
        partitions.insert("basic".into(), Partition { cores: 52, ram_gb: 384, features: None, gpus: None, max_hours: 72.0 });
        ResourceCatalog::from_partitions(partitions)
    }

    /// A small version of the real questionnaire: job name, partition, memory, run time.
    fn tree() -> DialogTree {
        DialogTreeBuilder::new()
            .field("jobname", FieldSpec::new().with_prompt("Name of your job").with_datatype(ValueKind::Text).with_constraint(Constraint::NotEmpty))
            .unwrap()
            .field(
                "partition",
                FieldSpec::new()
                    .with_prompt("Name of the partition where you want to run your job")
                    .with_default("basic")
                    .with_datatype(ValueKind::Text)
                    .with_constraint(Constraint::KnownPartition)
                    .with_message(Message::PartitionList),
            )
            .unwrap()
            .field(
                "mem",
                FieldSpec::new()
                    .with_prompt("How much memory (in GB)")
                    .with_default(16i64)
                    .with_datatype(ValueKind::Int)
                    .with_constraint(Constraint::Bounded {
                        min: Some(Bound::beyond(1.0)),
                        max: Some(Bound::partition("partition", PartitionResource::RamGb, 2.0)),
                    })
                    .with_message(Message::PartitionLimit { field: "partition".into(), resource: PartitionResource::RamGb, reserve: 2.0 }),
            )
            .unwrap()
            .field(
                "time",
                FieldSpec::new()
                    .with_prompt("How long should this run (in hours)")
                    .with_default(1.0)
                    .with_datatype(ValueKind::Real)
                    .with_constraint(Constraint::Bounded {
                        min: None,
                        max: Some(Bound::partition("partition", PartitionResource::MaxHours, 0.0)),
                    })
                    .with_reformat(Reformat::HoursToWalltime),
            )
            .unwrap()
            .finish()
            .unwrap()
    }


    #[test]
    fn test_scripted_run_with_defaults() {
        let catalog = catalog();
        let tree = tree();

        // Blank lines accept the defaults
        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\n\n20\n\n")));
        let Outcome::Completed(record) = engine.run(&tree).unwrap() else { panic!("dialog did not complete") };

        assert_eq!(record.expect("jobname").unwrap(), &Value::Text("myjob".into()));
        assert_eq!(record.expect("partition").unwrap(), &Value::Text("basic".into()));
        assert_eq!(record.expect("mem").unwrap(), &Value::Int(20));
        assert_eq!(record.expect("time").unwrap(), &Value::Text("01:00:00".into()));
    }

    #[test]
    fn test_scripted_runs_are_idempotent() {
        let catalog = catalog();
        let tree = tree();

        let run = || {
            let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\n\n20\n1.5\n")));
            match engine.run(&tree).unwrap() {
                Outcome::Completed(record) => record,
                Outcome::Aborted => panic!("dialog aborted"),
            }
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_out_of_range_is_fatal_when_scripted() {
        let catalog = catalog();
        let tree = tree();

        // 390 GB > 384 - 2
        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\nbasic\n390\n1\n")));
        assert!(matches!(engine.run(&tree), Err(Error::Rejected { field, .. }) if field == "mem"));
    }

    #[test]
    fn test_uncoercible_answer_is_fatal_when_scripted() {
        let catalog = catalog();
        let tree = tree();

        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\nbasic\ntwenty\n1\n")));
        assert!(matches!(engine.run(&tree), Err(Error::Unusable { field, .. }) if field == "mem"));
    }

    #[test]
    fn test_abort_sentinel_aborts_cleanly() {
        let catalog = catalog();
        let tree = tree();

        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\nEOF\n")));
        assert!(matches!(engine.run(&tree), Ok(Outcome::Aborted)));
    }

    #[test]
    fn test_exhausted_stream_is_out_of_input() {
        let catalog = catalog();
        let tree = tree();

        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\n")));
        assert!(matches!(engine.run(&tree), Err(Error::OutOfInput { field }) if field == "partition"));
    }

    #[test]
    fn test_silent_fields_are_skipped_but_readable() {
        let catalog = catalog();
        let tree = DialogTreeBuilder::new()
            .field(
                "user",
                FieldSpec::new()
                    .with_preset(Value::Text("me".into()))
                    .with_child("groups", FieldSpec::new().with_preset(Value::List(vec!["users".into(), "chem".into()]))),
            )
            .unwrap()
            .field(
                "account",
                FieldSpec::new()
                    .with_prompt("What account is your user id associated with")
                    .with_default("users")
                    .with_datatype(ValueKind::Text)
                    .with_constraint(Constraint::MemberOf { field: "user.groups".into() })
                    .with_message(Message::GroupList { field: "user.groups".into() }),
            )
            .unwrap()
            .finish()
            .unwrap();

        // Only `account` consumes input; the silent fields never do
        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("chem\n")));
        let Outcome::Completed(record) = engine.run(&tree).unwrap() else { panic!("dialog did not complete") };
        assert_eq!(record.expect("account").unwrap(), &Value::Text("chem".into()));
        assert_eq!(record.expect("user").unwrap(), &Value::Text("me".into()));

        // A group we are not in is rejected
        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("physics\n")));
        assert!(matches!(engine.run(&tree), Err(Error::Rejected { field, .. }) if field == "account"));
    }

    #[test]
    fn test_interactive_runs_retry_and_review() {
        let catalog = catalog();
        let tree = tree();

        // `390` is rejected, the engine re-prompts, `20` is accepted; review confirmed with `y`
        let mut engine = Engine::new(&catalog, Scripted::new(["myjob", "", "390", "20", "", "y"]));
        let Outcome::Completed(record) = engine.run(&tree).unwrap() else { panic!("dialog did not complete") };
        assert_eq!(record.expect("mem").unwrap(), &Value::Int(20));

        // The empty confirmation also means yes
        let mut engine = Engine::new(&catalog, Scripted::new(["myjob", "", "20", "", ""]));
        assert!(matches!(engine.run(&tree), Ok(Outcome::Completed(_))));
    }

    #[test]
    fn test_declined_review_fails_the_run() {
        let catalog = catalog();
        let tree = tree();

        let mut engine = Engine::new(&catalog, Scripted::new(["myjob", "", "20", "", "n"]));
        assert!(matches!(engine.run(&tree), Err(Error::Declined)));
    }

    #[test]
    fn test_template_default_reads_earlier_answer() {
        let catalog = catalog();
        let tree = DialogTreeBuilder::new()
            .field("jobname", FieldSpec::new().with_prompt("Name of your job").with_datatype(ValueKind::Text))
            .unwrap()
            .field(
                "output",
                FieldSpec::new().with_prompt("Name of your job's output file").with_default_template("/home/me/${jobname}.txt").with_datatype(ValueKind::Text),
            )
            .unwrap()
            .finish()
            .unwrap();

        let mut engine = Engine::new(&catalog, Stream::new(Cursor::new("myjob\n\n")));
        let Outcome::Completed(record) = engine.run(&tree).unwrap() else { panic!("dialog did not complete") };
        assert_eq!(record.expect("output").unwrap(), &Value::Text("/home/me/myjob.txt".into()));
    }
}
