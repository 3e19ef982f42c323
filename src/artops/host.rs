use std::process::Command;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use artops_lib::bailc;
use artops_lib::config::machine::Machine;
use artops_lib::config::Config;
use artops_lib::ctx;
use log::debug;

/// The host name of this machine.
pub fn hostname() -> Result<String> {
    let output = Command::new("hostname").output().with_context(ctx!(
      "Could not run `hostname`", ;
      "Set `machine` in artops.toml instead",
    ))?;

    if !output.status.success() {
        return Err(anyhow!("`hostname` failed")).with_context(ctx!(
          "It exited with {}", output.status;
          "Set `machine` in artops.toml instead",
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// The configured machine, or the one detected from the host name.
pub fn detect_machine(config: &Config) -> Result<Machine> {
    if let Some(machine) = config.machine {
        return Ok(machine);
    }

    let host = hostname()?;
    debug!("Running on {host}");

    match Machine::from_hostname(&host) {
        Some(machine) => Ok(machine),
        None => bailc!(
            "Could not recognize this machine", ;
            "The host name `{}` does not name a known machine", host;
            "Set `machine` in artops.toml",
        ),
    }
}
