//  GROUPS.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 09:42:10
//  Last edited:
//    16 Jan 2025, 14:26:50
//  Auto updated?
//    Yes
//
//  Description:
//!   Collects the group memberships of the invoking user. Accounting on
//!   the scheduler follows unix groups, so the account a job is billed
//!   to must be one of these.
//

use std::process::{Command, Output};

use log::debug;


/***** ERRORS *****/
/// Defines errors that relate to looking up group memberships.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to spawn the `id` tool.
    #[error("Failed to run 'id -Gn'")]
    Spawn { source: std::io::Error },
    /// The `id` tool ran but reported failure.
    #[error("'id -Gn' exited with status {status}")]
    Failure { status: i32 },
}





/***** LIBRARY FUNCTIONS *****/
/// Collects the group names of the invoking user, including their primary group.
///
/// # Returns
/// The group names, in the order the system reports them.
///
/// # Errors
/// This function errors if the `id` tool could not be run or reported failure.
pub fn user_groups() -> Result<Vec<String>, Error> {
    let mut cmd: Command = Command::new("id");
    cmd.arg("-Gn");

    debug!("Running '{cmd:?}'...");
    let output: Output = cmd.output().map_err(|source| Error::Spawn { source })?;
    if !output.status.success() {
        return Err(Error::Failure { status: output.status.code().unwrap_or(-1) });
    }

    Ok(String::from_utf8_lossy(&output.stdout).split_whitespace().map(String::from).collect())
}
