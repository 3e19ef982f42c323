//! The building process.
//!
//! The shell completions for `artops` are generated from the command
//! definition and placed in `[output_dir]/completions/`.

#![allow(unused)]
#![allow(clippy::missing_docs_in_private_items)]

use std::env;
use std::fs;

use anyhow::Context;
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate_to;
use clap_complete::shells::Bash;
use clap_complete::shells::Fish;
use clap_complete::shells::PowerShell;
use clap_complete::shells::Zsh;

include!("src/artops/cli/def.rs");

fn main() -> Result<()> {
    println!("cargo::rerun-if-changed=src/artops/cli/def.rs");

    let outdir: PathBuf = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    }
    .into();

    let Some(target_dir) = outdir.ancestors().nth(3) else {
        return Ok(());
    };

    let completions = target_dir.join("completions/");

    fs::create_dir_all(&completions)
        .with_context(|| format!("could not create {completions:?}"))?;

    let mut completions_command = Cli::command();

    generate_to(Bash, &mut completions_command, "artops", &completions)?;
    generate_to(Fish, &mut completions_command, "artops", &completions)?;
    generate_to(PowerShell, &mut completions_command, "artops", &completions)?;
    generate_to(Zsh, &mut completions_command, "artops", &completions)?;

    Ok(())
}
