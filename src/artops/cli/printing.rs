use anstyle::AnsiColor;
use anyhow::Context;
use anyhow::Result;
use artops_lib::archive::Batch;
use artops_lib::constants::style_from_fg;
use artops_lib::constants::ERROR_STYLE;
use artops_lib::constants::HELP_STYLE;
use artops_lib::constants::NAME_STYLE;
use artops_lib::constants::PRIMARY_STYLE;
use artops_lib::ctx;
use clap::crate_description;
use clap::crate_name;
use clap::crate_version;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use log::info;

use crate::prompt::ask;

/// Util function for getting the style for the CLI
pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(style_from_fg(AnsiColor::Yellow).bold())
        .header(style_from_fg(AnsiColor::Green).bold().underline())
        .literal(style_from_fg(AnsiColor::Cyan).bold())
        .invalid(style_from_fg(AnsiColor::Blue).bold())
        .error(ERROR_STYLE)
        .valid(HELP_STYLE)
        .placeholder(style_from_fg(AnsiColor::White))
}

/// Print the version of artops.
pub fn print_version(script: bool) {
    if script {
        println!("{} {}", crate_name!(), crate_version!());
        return;
    }

    println!(
        "{PRIMARY_STYLE}{}{PRIMARY_STYLE:#} at version {NAME_STYLE}{}{NAME_STYLE:#}",
        crate_name!(),
        crate_version!()
    );
    println!("{}", crate_description!());
}

/// Format a byte count in GB, the unit archive sizes are discussed in.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / 1e9)
}

/// Log the planned archives, one line per archive.
pub fn print_batches(batches: &[Batch]) {
    for batch in batches {
        info!(
            "{NAME_STYLE}{}{NAME_STYLE:#}: {} files, {}",
            batch.name(),
            batch.files().len(),
            format_gb(batch.size())
        );
    }
}

/// Generates the progress bar shown while archives are written.
pub fn generate_progress_bar(len: u64) -> Result<ProgressBar> {
    let prog_style =
        ProgressStyle::with_template("[{spinner:.green}] {bar:.green/blue} {msg} {pos}/{len}")
            .with_context(ctx!("Failed to create the progress bar",;"",))?
            .progress_chars("##-");

    let bar = ProgressBar::new(len);
    bar.set_style(prog_style);
    bar.set_message("Writing archives...");

    Ok(bar)
}

/// Ask the user a yes/no question
pub fn query_yes_no(question: &str) -> Result<bool> {
    ask(inquire::Confirm::new(&format!("{question} [y/n]: ")).prompt())
}

/// Ask for confirmation, in script mode the answer is always yes.
pub fn confirm(question: &str, script: bool) -> Result<bool> {
    if script {
        info!("{question} yes (script)");
        return Ok(true);
    }

    query_yes_no(question)
}

#[cfg(test)]
#[path = "tests/printing.rs"]
mod tests;
