//  MAIN.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 15:12:33
//  Last edited:
//    03 Jun 2025, 11:08:26
//  Auto updated?
//    Yes
//
//  Description:
//!   Entrypoint to the `jobforge` tool: probe the cluster, declare the
//!   questionnaire, run the dialog engine over it and write the
//!   resulting batch script. Exit statuses follow the classic sysexits
//!   convention, so scripted callers can tell bad answers (65) apart
//!   from an exhausted answer stream (66) or a missing scheduler (70).
//

mod cli;
mod dialog;
mod render;

use std::fs;
use std::io::IsTerminal as _;

use clap::Parser as _;
use console::style;
use error_trace::trace;
use humanlog::{DebugMode, HumanLogger};
use jobforge_cluster::catalog::ResourceCatalog;
use jobforge_dialog::engine::{Engine, Error as EngineError, Outcome};
use jobforge_dialog::record::AnswerRecord;
use jobforge_dialog::tree::DialogTree;
use jobforge_shr::input::{Stream, Terminal};
use log::{debug, error, info};


/***** CONSTANTS *****/
/// Exit status: all went well (including deliberate user aborts).
const EX_OK: i32 = 0;
/// Exit status: an answer was unusable, or the user declined the review.
const EX_DATAERR: i32 = 65;
/// Exit status: the answer stream ran out before the dialog was complete.
const EX_NOINPUT: i32 = 66;
/// Exit status: a required external tool or resource is missing or broken.
const EX_SOFTWARE: i32 = 70;





/***** ENTRYPOINT *****/
fn main() {
    // Parse the arguments
    let args = cli::Cli::parse();

    // Setup the logger
    if let Err(err) = HumanLogger::terminal(DebugMode::from_flags(args.trace, args.debug)).init() {
        eprintln!("WARNING: Failed to setup logger: {err} (no logging enabled for this session)");
    }
    info!("jobforge v{}", env!("CARGO_PKG_VERSION"));

    // Probe the cluster; without its inventory there is nothing we can do
    let catalog: ResourceCatalog = match ResourceCatalog::probe() {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("{}", trace!(("Failed to query the cluster inventory"), err));
            std::process::exit(EX_SOFTWARE);
        },
    };

    // Declare the questionnaire over it
    let tree: DialogTree = match dialog::job_dialog(&catalog) {
        Ok(tree) => tree,
        Err(err) => {
            error!("{}", trace!(("Failed to declare the questionnaire"), err));
            std::process::exit(EX_SOFTWARE);
        },
    };

    // Interactivity is decided once, here: a live terminal prompts & retries, a redirected
    // stream consumes scripted answers and dies on the first bad one
    let interactive: bool = std::io::stdin().is_terminal();
    debug!("Running {}", if interactive { "interactively" } else { "non-interactively (input is redirected)" });
    if interactive {
        indoc::printdoc!(
            "

            {welcome}{name}{version}

            This wizard will help you write your first scheduler jobs properly. A batch job
            can be a little tedious to construct; by answering a few questions, you get the
            basics correct the first time.

            You can abort at any time by pressing {ctrl_c} or answering {sentinel}.

        ",
            welcome = style("Welcome to ").bold(),
            name = style("jobforge").bold().green(),
            version = style(format!(" v{}", env!("CARGO_PKG_VERSION"))).bold(),
            ctrl_c = style("Ctrl+C").bold().green(),
            sentinel = style("EOF").bold().green(),
        );
    }

    // Run the dialog
    let outcome: Result<Outcome, EngineError> = if interactive {
        Engine::new(&catalog, Terminal).run(&tree)
    } else {
        Engine::new(&catalog, Stream::new(std::io::stdin().lock())).run(&tree)
    };
    let record: AnswerRecord = match outcome {
        Ok(Outcome::Completed(record)) => record,
        Ok(Outcome::Aborted) => {
            println!("You have asked to exit; no job file was written.");
            std::process::exit(EX_OK);
        },
        Err(err) => {
            let status: i32 = match &err {
                EngineError::OutOfInput { .. } => EX_NOINPUT,
                EngineError::Unusable { .. } | EngineError::Rejected { .. } | EngineError::Declined => EX_DATAERR,
                EngineError::Input { .. } | EngineError::Definition { .. } => EX_SOFTWARE,
            };
            error!("{}", trace!(("Failed to complete the dialog"), err));
            std::process::exit(status);
        },
    };

    // Render the script & write it where the final answer pointed
    let script: String = match render::render_script(&record) {
        Ok(script) => script,
        Err(err) => {
            error!("{}", trace!(("Failed to render the job script"), err));
            std::process::exit(EX_SOFTWARE);
        },
    };
    let path: String = match record.expect("jobfile") {
        Ok(path) => path.to_string(),
        Err(err) => {
            error!("{}", trace!(("Failed to resolve the job file path"), err));
            std::process::exit(EX_SOFTWARE);
        },
    };

    if interactive {
        println!("Writing file {}...", style(&path).bold());
    }
    if let Err(err) = fs::write(&path, script) {
        error!("{}", trace!(("Failed to write job file '{path}'"), err));
        std::process::exit(EX_SOFTWARE);
    }
    debug!("Job file '{path}' written successfully");
}
