//  CLI.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 13:30:28
//  Last edited:
//    16 Jan 2025, 15:02:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the command-line interface of the `jobforge` tool.
//

use clap::Parser;

#[derive(Parser)]
#[clap(name = "jobforge", version, author, about = "A wizard that helps new cluster users write their first batch jobs properly.")]
pub(crate) struct Cli {
    /// Print debug info
    #[clap(long, action, help = "If given, dumps every constraint evaluated during validation, and shows additional logging information.", env = "DEBUG")]
    pub(crate) debug: bool,
    /// Print maximally verbose info
    #[clap(long, action, help = "If given, shows maximally verbose logging information. Implies '--debug'.")]
    pub(crate) trace: bool,
}
