use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use artops_lib::bailc;
use artops_lib::config::Config;
use artops_lib::ctx;
use artops_lib::transfer::dt_history_request;
use artops_lib::transfer::globus::GlobusCli;
use artops_lib::transfer::TransferPlan;
use artops_lib::transfer::TransferRequest;
use artops_lib::transfer::TransferService;
use log::debug;
use log::info;

use crate::cli::def::DtHistoryStruct;
use crate::cli::def::TransferStruct;
use crate::cli::printing::confirm;
use crate::host::detect_machine;

/// The user's home directory.
fn home_dir() -> Result<PathBuf> {
    match env::var_os("HOME") {
        Some(home) => Ok(home.into()),
        None => bailc!(
            "Could not find the home directory", ;
            "`$HOME` is not set", ;
            "",
        ),
    }
}

/// Resolve `request`, show it, and submit it once confirmed.
pub fn transfer(
    request: TransferRequest,
    service: &impl TransferService,
    config: &Config,
    script: bool,
    dry: bool,
) -> Result<()> {
    let bookmarks = service.bookmarks()?;
    debug!("Found {} bookmarks", bookmarks.len());

    let plan = TransferPlan::resolve(
        request,
        &bookmarks,
        &env::current_dir()?,
        &home_dir()?,
        &config.transfer.home_alias,
    )?;

    info!("{}:{}", plan.source.name, plan.source_path.display());
    info!("Will be transferred to");
    info!("{}:{}", plan.destination.name, plan.destination_path.display());

    if !confirm("Do you want to execute this?", script)? {
        info!("exiting...");
        return Ok(());
    }

    if dry {
        info!("Would have submitted the transfer (dry)");
        return Ok(());
    }

    service.submit(&plan)
}

/// Handle `artops transfer`.
pub fn process_transfer(
    args: &TransferStruct,
    config: &Config,
    script: bool,
    dry: bool,
) -> Result<()> {
    let request = TransferRequest {
        source: args.source.clone(),
        destination: args.destination.clone(),
        source_path: args.source_path.clone(),
        destination_path: args.destination_path.clone(),
        label: args.label.clone(),
    };

    let service = GlobusCli {
        command: config.transfer.command.clone(),
    };

    transfer(request, &service, config, script, dry)
}

/// `python3 <script> <log_dir>` through `sh`.
///
/// The shell expands variables such as `$WORK` in the configured script
/// path. `log_dir` is passed as `$1` so it is never parsed by the shell.
fn dt_history_command(script: &str, log_dir: &Path) -> Command {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(format!("python3 {script} \"$1\""))
        .arg("sh")
        .arg(log_dir);

    command
}

/// Run the timestep history script on `log_dir`.
fn plot_dt_history(script: &str, log_dir: &Path) -> Result<()> {
    let mut command = dt_history_command(script, log_dir);
    debug!("Running {command:?}");

    let status = command.status().with_context(ctx!(
      "Could not run the plotting script", ;
      "Ensure that python3 is installed",
    ))?;

    if !status.success() {
        return Err(anyhow!("`python3 {script}` failed on {log_dir:?}")).with_context(ctx!(
          "It exited with {}", status;
          "Set `dt_history.script` in artops.toml if the script lives elsewhere",
        ));
    }

    Ok(())
}

/// Handle `artops dt-history`.
pub fn process_dt_history(
    args: &DtHistoryStruct,
    config: &Config,
    script: bool,
    dry: bool,
) -> Result<()> {
    let source = match &args.source {
        Some(source) => source.clone(),
        None => detect_machine(config)?.to_string(),
    };

    let request = dt_history_request(&args.log_dir, &source, &config.dt_history.destination)?;

    if dry {
        info!("Would have run {} (dry)", config.dt_history.script);
    } else {
        plot_dt_history(&config.dt_history.script, &args.log_dir)?;
    }

    let service = GlobusCli {
        command: config.transfer.command.clone(),
    };

    transfer(request, &service, config, script, dry)
}

#[cfg(test)]
#[path = "tests/transfer.rs"]
mod tests;
