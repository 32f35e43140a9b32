//  RENDER.rs
//    by Lut99
//
//  Created:
//    15 Oct 2024, 14:40:31
//  Last edited:
//    03 Jun 2025, 10:44:09
//  Auto updated?
//    Yes
//
//  Description:
//!   Renders a completed answer record into the batch script that the
//!   user submits to the scheduler. Every answer is substituted
//!   literally; by the time we get here, the dialog engine has already
//!   vouched for all of them.
//

use indoc::formatdoc;
use jobforge_dialog::record::{self, AnswerRecord};
use jobforge_dialog::value::Value;

use crate::dialog::find_program;


/***** ERRORS *****/
/// Defines errors that relate to rendering the batch script.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The record is missing an answer the template needs (a dialog bug).
    #[error(transparent)]
    Record(#[from] record::Error),
}





/***** LIBRARY FUNCTIONS *****/
/// Renders the batch script for a completed dialog pass.
///
/// # Arguments
/// - `record`: The completed [`AnswerRecord`] to substitute into the template.
///
/// # Returns
/// The full text of the script to write.
///
/// # Errors
/// This function errors if the record is missing any of the answers the template embeds.
pub fn render_script(record: &AnswerRecord) -> Result<String, Error> {
    let account: &Value = record.expect("account")?;
    let start: &Value = record.expect("start")?;
    let user: &Value = record.expect("user")?;
    let mem: &Value = record.expect("mem")?;
    let cores: &Value = record.expect("cores")?;
    let partition: &Value = record.expect("partition")?;
    let time: &Value = record.expect("time")?;
    let output: &Value = record.expect("output")?;
    let jobname: &Value = record.expect("jobname")?;
    let datadir: &Value = record.expect("datadir")?;
    let scratchdir: &Value = record.expect("scratchdir")?;
    let program: &Value = record.expect("program")?;

    // The chosen program decides which modules the job loads
    let modules: String = program
        .as_text()
        .and_then(find_program)
        .map(|program| program.modules.iter().map(|module| format!("module load {module}\n")).collect())
        .unwrap_or_default();

    Ok(formatdoc!(
        r#"#!/bin/bash
        # {jobname}.slurm
        #   generated by jobforge v{version}
        #
        # This file has been generated by answering the questions of the `jobforge` wizard.
        # You can manually change it after generation; it is just a normal batch script.

        ###
        # Note: the scheduler cannot see environment or shell variables. You must type in
        # the values you need. You can add them to the `sbatch` line you type in so that
        # they are explicitly provided.
        ###

        #SBATCH --account={account}
        #SBATCH --begin={start}
        #SBATCH --mail-type=ALL
        #SBATCH --mail-user={user}
        #SBATCH --mem={mem}GB
        #SBATCH --ntasks=1
        #SBATCH --cpus-per-task={cores}
        #SBATCH --partition={partition}
        #SBATCH --time={time}

        #SBATCH -o {output}
        #SBATCH -e {output}.err

        cd $SLURM_SUBMIT_DIR
        echo "I ran on: $SLURM_NODELIST"
        echo "Starting at `date`"

        ###
        # Environment setup
        ###

        NAME={jobname}

        DATADIR={datadir}

        SCRATCH={scratchdir}

        ########################################################################
        # Always a good idea to wipe anything from memory where it
        # is allocated. Other modules are loaded here, as well.
        ########################################################################

        module purge
        {modules}
        mkdir -p $SCRATCH

        ########################################################################
        # Copy data from DATADIR to SCRATCH below.
        ########################################################################


        ########################################################################
        # Run your job by adding commands below.
        ########################################################################


        ########################################################################
        # Copy output files from SCRATCH to ... local storage? ... below.
        ########################################################################


        ########################################################################
        # Be kind and clean the SCRATCH area.
        ########################################################################

        rm -rf $SCRATCH

        echo "Finished at `date`"
        "#,
        version = env!("CARGO_PKG_VERSION"),
    ))
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    /// Builds the record that the end-to-end dialog scenario produces.
    fn record() -> AnswerRecord {
        let mut record = AnswerRecord::new();
        for (name, value) in [
            ("user", Value::Text("me".into())),
            ("jobname", Value::Text("myjob".into())),
            ("output", Value::Text("/home/me/myjob.txt".into())),
            ("program", Value::Text("amber20".into())),
            ("partition", Value::Text("basic".into())),
            ("account", Value::Text("users".into())),
            ("datadir", Value::Text("/home/me".into())),
            ("scratchdir", Value::Text("/home/me/scratch".into())),
            ("mem", Value::Int(20)),
            ("cores", Value::Int(8)),
            ("time", Value::Text("01:00:00".into())),
            ("start", Value::Text("2025-06-01T14:00".into())),
            ("jobfile", Value::Text("/home/me/myjob.slurm".into())),
        ] {
            record.store(name, value).unwrap();
        }
        record
    }


    #[test]
    fn test_answers_are_substituted_literally() {
        let script: String = render_script(&record()).unwrap();

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH --account=users\n"));
        assert!(script.contains("#SBATCH --begin=2025-06-01T14:00\n"));
        assert!(script.contains("#SBATCH --mem=20GB\n"));
        assert!(script.contains("#SBATCH --cpus-per-task=8\n"));
        assert!(script.contains("#SBATCH --partition=basic\n"));
        assert!(script.contains("#SBATCH --time=01:00:00\n"));
        assert!(script.contains("#SBATCH -o /home/me/myjob.txt\n"));
        assert!(script.contains("#SBATCH -e /home/me/myjob.txt.err\n"));
        assert!(script.contains("NAME=myjob\n"));
        assert!(script.contains("SCRATCH=/home/me/scratch\n"));
    }

    #[test]
    fn test_program_modules_are_loaded() {
        let script: String = render_script(&record()).unwrap();
        assert!(script.contains("module purge\nmodule load amber/20\n"));
    }

    #[test]
    fn test_no_program_means_no_modules() {
        // Rebuild the scenario record with an empty program answer; answers are write-once
        let mut record2 = AnswerRecord::new();
        for (name, value) in record().iter() {
            record2.store(name, if name == "program" { Value::Text("".into()) } else { value.clone() }).unwrap();
        }

        let script: String = render_script(&record2).unwrap();
        assert!(!script.contains("module load"));
        assert!(script.contains("module purge\n"));
    }

    #[test]
    fn test_missing_answer_is_loud() {
        let mut record = AnswerRecord::new();
        record.store("jobname", Value::Text("myjob".into())).unwrap();
        assert!(matches!(render_script(&record), Err(Error::Record(record::Error::UnknownField { .. }))));
    }
}
