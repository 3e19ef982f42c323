use std::process::Command;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::info;

use super::parse_bookmarks;
use super::Bookmark;
use super::TransferPlan;
use super::TransferService;
use crate::error::ctx;

/// Talks to the transfer service through its command line client.
#[derive(Debug, Clone)]
pub struct GlobusCli {
    /// The client binary.
    pub command: String,
}

impl GlobusCli {
    /// The arguments of `globus transfer` for `plan`.
    pub fn transfer_args(plan: &TransferPlan) -> Vec<String> {
        let mut args = vec!["transfer".to_string()];

        if let Some(label) = &plan.label {
            args.push("--label".to_string());
            args.push(label.clone());
        }

        args.push(plan.source_argument());
        args.push(plan.destination_argument());
        args
    }

    /// Run the client, returning its stdout.
    fn run(&self, args: &[String]) -> Result<String> {
        debug!("Running {} {}", self.command, args.join(" "));

        let output = Command::new(&self.command)
            .args(args)
            .output()
            .with_context(ctx!(
              "Could not run `{}`", self.command;
              "Ensure that the globus CLI is installed and on your PATH",
            ))?;

        if !output.status.success() {
            return Err(anyhow!("`{}` failed", self.command)).with_context(ctx!(
                "It printed: {}", String::from_utf8_lossy(&output.stderr).trim();
                "Try `globus login` if your session has expired",
            ));
        }

        String::from_utf8(output.stdout).with_context(ctx!(
          "Could not read the output of `{}`", self.command;
          "",
        ))
    }
}

impl TransferService for GlobusCli {
    fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        parse_bookmarks(&self.run(&["bookmark".to_string(), "list".to_string()])?)
    }

    fn submit(&self, plan: &TransferPlan) -> Result<()> {
        let out = self.run(&Self::transfer_args(plan))?;

        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            info!("{line}");
        }

        Ok(())
    }
}
