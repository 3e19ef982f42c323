use std::env;

use anyhow::Result;
use artops_lib::file_system::FileSystemInteractor;
use artops_lib::staging::stage_halos;
use artops_lib::staging::stage_outputs;
use artops_lib::staging::stage_runtime;
use log::info;

use crate::cli::def::StageSubcommand;
use crate::cli::printing::confirm;

/// Handle `artops stage ...`, always from the current directory.
pub fn process_stage(
    subcommand: StageSubcommand,
    script: bool,
    fs: &FileSystemInteractor,
) -> Result<()> {
    let here = env::current_dir()?;

    match subcommand {
        StageSubcommand::Outputs => stage_outputs(&here, fs)?,
        StageSubcommand::Halos => stage_halos(&here, fs)?,
        StageSubcommand::Runtime => {
            let mut ask = |question: &str| confirm(question, script);
            let handled = stage_runtime(&here, &mut ask, fs)?;
            info!("Handled {handled} runtime directories");
        }
    }

    Ok(())
}
