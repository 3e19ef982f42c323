use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use artops_lib::archive::check_collisions;
use artops_lib::archive::directory_archive_name;
use artops_lib::archive::earliest_scale;
use artops_lib::archive::list_output_files;
use artops_lib::archive::log_archive_destination;
use artops_lib::archive::plan_batches;
use artops_lib::archive::remote_mirror_path;
use artops_lib::archive::validate_log_dir;
use artops_lib::archive::without_scale;
use artops_lib::archive::Batch;
use artops_lib::bailc;
use artops_lib::config::Config;
use artops_lib::constants::NAME_STYLE;
use artops_lib::ctx;
use artops_lib::file_system::pack;
use artops_lib::file_system::FileOperations;
use artops_lib::file_system::FileSystemInteractor;
use artops_lib::scale::ScaleScheme;
use chrono::Local;
use indicatif::MultiProgress;
use log::debug;
use log::info;
use log::warn;

use crate::cli::def::ArchiveSubcommand;
use crate::cli::printing::confirm;
use crate::cli::printing::format_gb;
use crate::cli::printing::generate_progress_bar;
use crate::cli::printing::print_batches;

/// Where archives are written.
#[derive(Debug, Clone)]
pub enum ArchiveTarget {
    /// A directory on this machine.
    Local(PathBuf),

    /// A directory on the archive host, written through `ssh`.
    Remote {
        /// The host, as `ssh` knows it.
        host: String,

        /// The directory the archives go into.
        dir: PathBuf,
    },
}

impl ArchiveTarget {
    /// Pick the target from the `--local` flag, otherwise the archive host
    /// named by the configured environment variable.
    pub fn new(local: Option<&Path>, remote_dir: &Path, config: &Config) -> Result<ArchiveTarget> {
        if let Some(dir) = local {
            return Ok(ArchiveTarget::Local(dir.to_path_buf()));
        }

        let host_env = &config.archive.host_env;

        let host = env::var(host_env).with_context(ctx!(
          "The archive host is read from `${}`", host_env;
          "Set it, or pass --local to write the archives here",
        ))?;

        Ok(ArchiveTarget::Remote {
            host,
            dir: config.archive.remote_root.join(remote_dir),
        })
    }

    /// Where the archive `name` ends up.
    pub fn describe(&self, name: &str) -> String {
        match self {
            ArchiveTarget::Local(dir) => dir.join(name).display().to_string(),
            ArchiveTarget::Remote { host, dir } => format!("{host}:{}", dir.join(name).display()),
        }
    }

    /// Fail if any of `names` already exists at the target.
    ///
    /// The archive host is asked once, with a listing of the target
    /// directory. A dry run does not contact the host.
    pub fn check_free(&self, names: &[String], fs: &FileSystemInteractor) -> Result<()> {
        match self {
            ArchiveTarget::Local(dir) => {
                check_collisions(names, &self.describe(""), |name| dir.join(name).exists())
            }
            ArchiveTarget::Remote { host, dir } => {
                if fs.dry_run {
                    debug!("Would have listed {} for existing archives (dry)", self.describe(""));
                    return Ok(());
                }

                let listing = list_remote_dir(host, dir)?;
                check_collisions(names, &self.describe(""), |name| {
                    listing.lines().any(|line| line == name)
                })
            }
        }
    }

    /// Write `members` of `base` as the archive `name`.
    pub fn write(
        &self,
        name: &str,
        base: &Path,
        members: &[PathBuf],
        fs: &FileSystemInteractor,
    ) -> Result<()> {
        match self {
            ArchiveTarget::Local(dir) => {
                fs.create_dir_all(dir)?;
                fs.write_archive(&dir.join(name), base, members)
            }
            ArchiveTarget::Remote { host, dir } => {
                if fs.dry_run {
                    info!("Would have streamed {name} to {host} (dry)");
                    return Ok(());
                }

                stream_to_host(host, &dir.join(name), base, members)
            }
        }
    }
}

/// Quote `path` for a POSIX shell on the other end of `ssh`.
pub fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

/// The names in `dir` on `host`, one per line.
fn list_remote_dir(host: &str, dir: &Path) -> Result<String> {
    let remote_command = format!("ls -1A -- {}", shell_quote(dir));
    debug!("Running ssh {host} \"{remote_command}\"");

    let output = Command::new("ssh")
        .arg(host)
        .arg(&remote_command)
        .output()
        .with_context(ctx!(
          "Could not start ssh to {host}", ;
          "Ensure that ssh is installed and on your PATH",
        ))?;

    if !output.status.success() {
        return Err(anyhow!(
            "ssh exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .with_context(ctx!(
          "Could not list {dir:?} on {host}", ;
          "Check that the directory exists on the archive",
        ));
    }

    String::from_utf8(output.stdout).with_context(ctx!(
      "The listing of {dir:?} on {host} is not valid UTF-8", ;
      "",
    ))
}

/// Pipe a tar stream into `ssh <host> "cat > <path>"`.
///
/// `ssh` keeps the terminal, so password prompts reach the user directly.
/// The shell on the host refuses to overwrite an existing file. If packing
/// fails the connection is killed, so `cat` never sees a clean end of input.
pub fn stream_to_host(host: &str, path: &Path, base: &Path, members: &[PathBuf]) -> Result<()> {
    let remote_command = format!("set -C; cat > {}", shell_quote(path));
    debug!("Running ssh {host} \"{remote_command}\"");

    let mut child = Command::new("ssh")
        .arg(host)
        .arg(&remote_command)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(ctx!(
          "Could not start ssh to {host}", ;
          "Ensure that ssh is installed and on your PATH",
        ))?;

    let Some(mut stdin) = child.stdin.take() else {
        bailc!(
            "Could not open a pipe to ssh", ;
            "The archive stream has nowhere to go", ;
            "",
        );
    };

    if let Err(e) = pack(&mut stdin, base, members) {
        if let Err(kill) = child.kill() {
            warn!("Could not stop ssh to {host}: {kill}");
        }
        let _ = child.wait();
        drop(stdin);

        warn!(
            "{host}:{} may hold an incomplete archive, remove it before retrying",
            path.display()
        );

        return Err(e);
    }

    drop(stdin);

    let status = child.wait().with_context(ctx!(
      "ssh to {host} did not finish", ;
      "",
    ))?;

    if !status.success() {
        return Err(anyhow!("ssh exited with {status}")).with_context(ctx!(
          "Could not write {path:?} on {host}", ;
          "Check that the directory exists on the archive and nothing is there yet",
        ));
    }

    Ok(())
}

/// Handle `artops archive ...`.
pub fn process_archive(
    subcommand: &ArchiveSubcommand,
    config: &Config,
    script: bool,
    progress: &MultiProgress,
    fs: &FileSystemInteractor,
) -> Result<()> {
    match subcommand {
        ArchiveSubcommand::Outputs {
            max_size,
            local,
            skip_first,
        } => archive_outputs(
            max_size.unwrap_or(config.archive.max_size),
            local.as_deref(),
            *skip_first,
            config,
            script,
            progress,
            fs,
        ),

        ArchiveSubcommand::Dir {
            dir,
            remote,
            no_date,
            delete,
            local,
        } => {
            let remote = match remote {
                Some(remote) => remote.clone(),
                None => remote_mirror_path(&env::current_dir()?, &config.username()?)?,
            };

            archive_dir(
                dir,
                &remote,
                *no_date,
                *delete,
                local.as_deref(),
                config,
                script,
                fs,
            )
        }

        ArchiveSubcommand::Log { dir } => {
            let log_dir: PathBuf = env::current_dir()?.join(dir).components().collect();
            validate_log_dir(&log_dir, config.scratch()?)?;

            let name = log_dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let remote = log_archive_destination(name)?;

            archive_dir(&log_dir, &remote, true, true, None, config, script, fs)
        }
    }
}

/// `archive outputs`, run from the output directory.
fn archive_outputs(
    max_size: u64,
    local: Option<&Path>,
    skip_first: bool,
    config: &Config,
    script: bool,
    progress: &MultiProgress,
    fs: &FileSystemInteractor,
) -> Result<()> {
    let here = env::current_dir()?;

    let mut files = list_output_files(
        &here,
        &ScaleScheme::LastToken,
        config.archive.anchor_extension.as_deref(),
        fs,
    )?;

    let Some(earliest) = earliest_scale(&files) else {
        info!("No outputs in {here:?}, nothing to archive");
        return Ok(());
    };

    let include = !skip_first
        && confirm(
            &format!("The earliest output here is {earliest}. Do you want to include it?"),
            script,
        )?;

    if !include {
        debug!("Leaving out {earliest}");
        files = without_scale(files, &earliest);
    }

    let batches = plan_batches(files, max_size);

    if batches.is_empty() {
        info!("Nothing left to archive");
        return Ok(());
    }

    let remote_dir = match local {
        Some(_) => PathBuf::new(),
        None => remote_mirror_path(&here, &config.username()?)?,
    };

    let target = ArchiveTarget::new(local, &remote_dir, config)?;

    let names: Vec<String> = batches.iter().map(Batch::name).collect();
    target.check_free(&names, fs)?;

    print_batches(&batches);
    info!(
        "Archives go to {NAME_STYLE}{}{NAME_STYLE:#}",
        target.describe("")
    );

    if !confirm("Do you want to execute this?", script)? {
        info!("exiting...");
        return Ok(());
    }

    let bar = progress.add(generate_progress_bar(batches.len() as u64)?);

    for batch in &batches {
        bar.set_message(batch.name());
        debug!("Writing {} ({})", batch.name(), format_gb(batch.size()));

        target.write(&batch.name(), &here, &batch.members(), fs)?;
        bar.inc(1);
    }

    bar.finish();
    progress.remove(&bar);

    info!("Done!");

    Ok(())
}

/// Pack the directory `dir` into one archive below `remote`.
#[allow(clippy::too_many_arguments)]
fn archive_dir(
    dir: &Path,
    remote: &Path,
    no_date: bool,
    delete: bool,
    local: Option<&Path>,
    config: &Config,
    script: bool,
    fs: &FileSystemInteractor,
) -> Result<()> {
    let dir = fs.canonicalize(dir)?;

    let dir_name = dir.file_name().and_then(|n| n.to_str());
    let (Some(base), Some(dir_name)) = (dir.parent(), dir_name) else {
        bailc!(
            "Cannot archive this directory", ;
            "{dir:?} has no name", ;
            "",
        );
    };

    let name = directory_archive_name(dir_name, Local::now().date_naive(), no_date);
    let target = ArchiveTarget::new(local, remote, config)?;

    target.check_free(std::slice::from_ref(&name), fs)?;

    info!("{dir:?} will be transferred to {}", target.describe(&name));

    if !confirm("Do you want to execute this?", script)? {
        info!("exiting...");
        return Ok(());
    }

    target.write(&name, base, &[PathBuf::from(dir_name)], fs)?;

    if delete {
        fs.remove_dir_all(&dir)?;
    }

    info!("Done!");

    Ok(())
}

#[cfg(test)]
#[path = "tests/archive.rs"]
mod tests;
