use std::path::Path;

use anyhow::Result;
use artops_lib::config::Config;
use artops_lib::editor::answers::AnswerMap;
use artops_lib::editor::AnswerProvider;
use artops_lib::editor::EditOutcome;
use artops_lib::file_system::FileOperations;
use artops_lib::file_system::FileSystemInteractor;
use artops_lib::runfiles::update_config;
use artops_lib::runfiles::update_defs;
use artops_lib::runfiles::update_run;
use artops_lib::runfiles::update_slurm;
use artops_lib::runfiles::update_torque;
use log::debug;
use log::info;

use crate::cli::def::UpdateStruct;
use crate::cli::def::UpdateSubcommand;
use crate::host::detect_machine;
use crate::prompt::TerminalPrompt;

/// Where replacement values come from.
///
/// An answers file always wins. Without one, script mode keeps every value
/// and interactive mode asks on the terminal.
pub fn answer_provider(
    answers: Option<&Path>,
    script: bool,
    fs: &impl FileOperations,
) -> Result<Box<dyn AnswerProvider>> {
    match answers {
        Some(path) => {
            debug!("Reading answers from {path:?}");
            Ok(Box::new(fs.try_read_toml::<AnswerMap>(path)?))
        }
        None if script => Ok(Box::new(AnswerMap::new())),
        None => Ok(Box::new(TerminalPrompt)),
    }
}

/// Report what happened to one file.
fn report(outcome: EditOutcome) {
    match outcome {
        EditOutcome::Replaced => info!("File updated"),
        EditOutcome::Unchanged => info!("Nothing changed"),
    }
}

/// Handle `artops update ...`.
pub fn process_update(
    args: &UpdateStruct,
    config: &Config,
    script: bool,
    fs: &FileSystemInteractor,
) -> Result<()> {
    let mut answers = answer_provider(args.answers.as_deref(), script, fs)?;
    let answers = answers.as_mut();

    match &args.subcommand {
        UpdateSubcommand::Defs { home } => report(update_defs(home, answers, fs)?),

        UpdateSubcommand::Config {
            home,
            run_dir,
            config_file,
        } => report(update_config(home, run_dir, config_file, answers, fs)?),

        UpdateSubcommand::Slurm {
            home,
            run_dir,
            submit_file,
            config_file,
        } => {
            let machine = detect_machine(config)?;
            report(update_slurm(
                home,
                run_dir,
                submit_file,
                config_file,
                machine,
                answers,
                fs,
            )?)
        }

        UpdateSubcommand::Torque {
            home,
            run_dir,
            submit_file,
            config_file,
        } => report(update_torque(
            home,
            run_dir,
            submit_file,
            config_file,
            answers,
            fs,
        )?),

        UpdateSubcommand::Run { home } => {
            let machine = detect_machine(config)?;
            update_run(home, machine, answers, fs)?;
            info!("Run in {home:?} is ready");
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/update.rs"]
mod tests;
