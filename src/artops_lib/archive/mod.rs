use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use log::debug;
use log::trace;

use crate::bailc;
use crate::constants::PRODUCTION_ARCHIVE_PATH;
use crate::constants::PRODUCTION_LOG_PREFIX;
use crate::file_system::FileOperations;
use crate::scale::ScaleFactor;
use crate::scale::ScaleScheme;

/// A simulation output file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// The file name, relative to the output directory.
    pub name: String,

    /// The scale factor parsed from the name.
    pub scale: ScaleFactor,

    /// Size in bytes.
    pub size: u64,
}

impl OutputFile {
    /// Describe one output file.
    pub fn new(name: impl Into<String>, scale: ScaleFactor, size: u64) -> Self {
        OutputFile {
            name: name.into(),
            scale,
            size,
        }
    }
}

/// The files going into one archive.
///
/// Files are kept in scale factor order, so the first and last member give
/// the range covered by the archive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    /// Members in scale factor order.
    files: Vec<OutputFile>,

    /// Accumulated size of the members.
    size: u64,
}

impl Batch {
    /// The members of this batch.
    pub fn files(&self) -> &[OutputFile] {
        &self.files
    }

    /// The accumulated size of all members in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Add a file at the end of the batch.
    fn push(&mut self, file: OutputFile) {
        self.size += file.size;
        self.files.push(file);
    }

    /// The smallest and largest scale factor in the batch.
    pub fn scale_range(&self) -> Option<(&ScaleFactor, &ScaleFactor)> {
        Some((&self.files.first()?.scale, &self.files.last()?.scale))
    }

    /// The archive name: `outputs_<min>.tar` or `outputs_<min>_to_<max>.tar`.
    pub fn name(&self) -> String {
        match self.scale_range() {
            Some((min, max)) if min == max => format!("outputs_{min}.tar"),
            Some((min, max)) => format!("outputs_{min}_to_{max}.tar"),
            None => "outputs.tar".to_string(),
        }
    }

    /// The member paths, relative to the output directory.
    pub fn members(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| PathBuf::from(&f.name)).collect()
    }
}

/// Group `files` into archives of roughly `max_size` bytes.
///
/// Files are taken in scale factor order, one scale factor group at a time.
/// A new batch is opened before adding a group once the current batch has
/// grown past `max_size`, so a batch overshoots by at most one group and
/// the files of one scale factor always share a batch.
pub fn plan_batches(files: Vec<OutputFile>, max_size: u64) -> Vec<Batch> {
    let mut groups: BTreeMap<ScaleFactor, Vec<OutputFile>> = BTreeMap::new();

    for file in files {
        groups.entry(file.scale.clone()).or_default().push(file);
    }

    let mut batches: Vec<Batch> = vec![];
    let mut current = Batch::default();

    for (scale, mut group) in groups {
        if current.size() > max_size {
            batches.push(std::mem::take(&mut current));
        }

        group.sort_by(|a, b| a.name.cmp(&b.name));
        trace!("Adding the {} files of {scale} to a batch", group.len());

        for file in group {
            current.push(file);
        }
    }

    if !current.files.is_empty() {
        batches.push(current);
    }

    debug!("Planned {} archives", batches.len());

    batches
}

/// Find the output files in `dir`.
///
/// Files without a scale factor are skipped. If `anchor` is given, only the
/// scale factors that own a file with that extension are kept.
pub fn list_output_files(
    dir: &Path,
    scheme: &ScaleScheme,
    anchor: Option<&str>,
    fs: &impl FileOperations,
) -> Result<Vec<OutputFile>> {
    let mut files = vec![];
    let mut anchored = BTreeSet::new();

    for path in fs.list_dir(dir)? {
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!("Skipping {path:?}, its name is not valid UTF-8");
            continue;
        };

        let Some(scale) = scheme.parse(name) else {
            trace!("Skipping {name}, it has no scale factor");
            continue;
        };

        if anchor.is_some_and(|ext| path.extension().is_some_and(|e| e == ext)) {
            anchored.insert(scale.clone());
        }

        files.push(OutputFile::new(name, scale, fs.file_size(&path)?));
    }

    if anchor.is_some() {
        files.retain(|f| anchored.contains(&f.scale));
    }

    Ok(files)
}

/// The earliest scale factor among `files`.
pub fn earliest_scale(files: &[OutputFile]) -> Option<ScaleFactor> {
    files.iter().map(|f| &f.scale).min().cloned()
}

/// Remove all files of one scale factor.
pub fn without_scale(files: Vec<OutputFile>, scale: &ScaleFactor) -> Vec<OutputFile> {
    files.into_iter().filter(|f| &f.scale != scale).collect()
}

/// Fail fast if any archive in `names` already exists at `destination`.
///
/// `exists` answers for one name, from the local filesystem or from a
/// listing of the archive host.
pub fn check_collisions(
    names: &[String],
    destination: &str,
    exists: impl Fn(&str) -> bool,
) -> Result<()> {
    for name in names {
        if exists(name) {
            bailc!(
                "Archive naming collision", ;
                "{name} already exists in {destination}", ;
                "Move the existing archive away or archive into another directory",
            );
        }
    }

    Ok(())
}

/// The part of `local` below the scratch user directory `username`.
///
/// The archive mirrors the scratch layout, so this is where `local` lives
/// relative to the remote root.
pub fn remote_mirror_path(local: &Path, username: &str) -> Result<PathBuf> {
    let mut components = local.components();

    while let Some(component) = components.next() {
        if component == Component::Normal(username.as_ref()) {
            return Ok(components.as_path().to_path_buf());
        }
    }

    bailc!(
        "Not in a user directory", ;
        "{local:?} is not below a directory named `{}`", username;
        "Run this from your scratch directory or pass the remote directory explicitly",
    );
}

/// The archive name for a whole directory.
pub fn directory_archive_name(dir_name: &str, date: NaiveDate, no_date: bool) -> String {
    if no_date {
        format!("{dir_name}.tar")
    } else {
        format!("{dir_name}_{}.tar", date.format("%Y_%m_%d"))
    }
}

/// Check that `log_dir` is a production log directory directly inside
/// `scratch`.
pub fn validate_log_dir(log_dir: &Path, scratch: &Path) -> Result<()> {
    if log_dir.parent() != Some(scratch) {
        bailc!(
            "Not on scratch", ;
            "{log_dir:?} is not directly inside {scratch:?}", ;
            "Log directories are archived from the scratch directory",
        );
    }

    let name = log_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if !name.starts_with(PRODUCTION_LOG_PREFIX) {
        bailc!(
            "Not a log directory from the production runs", ;
            "`{}` does not start with `{PRODUCTION_LOG_PREFIX}`", name;
            "",
        );
    }

    if !log_dir.is_dir() {
        bailc!(
            "This directory does not exist", ;
            "{log_dir:?} is not a directory", ;
            "",
        );
    }

    Ok(())
}

/// Where a production log directory goes, relative to the mirrored remote
/// root: `art_runs/runs/production/<run>/run/log`.
pub fn log_archive_destination(log_dir_name: &str) -> Result<PathBuf> {
    let tokens = log_dir_name.split('_').collect::<Vec<&str>>();

    let run_tokens = if log_dir_name.contains("fboost") {
        tokens.get(2..6)
    } else {
        tokens.get(2..5)
    };

    let Some(run_tokens) = run_tokens else {
        bailc!(
            "Log directory name is too short", ;
            "Could not find the run name in `{}`", log_dir_name;
            "Expected {PRODUCTION_LOG_PREFIX}<run name>_<job id>",
        );
    };

    Ok(Path::new(PRODUCTION_ARCHIVE_PATH)
        .join(run_tokens.join("_"))
        .join("run")
        .join("log"))
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
