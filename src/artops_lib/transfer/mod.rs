use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use log::trace;

use crate::bailc;
use crate::constants::DT_HISTORY_PLOT;
use crate::constants::PRODUCTION_LOG_PREFIX;

/// Transfers through the `globus` command line client.
pub mod globus;

/// A named transfer location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// The name the user refers to it by.
    pub name: String,

    /// The collection (endpoint) id.
    pub endpoint_id: String,

    /// The path on the endpoint.
    pub path: String,
}

/// Parse the table printed by `globus bookmark list`.
///
/// Columns are separated by `|`: name, bookmark id, endpoint id, endpoint
/// name, path. The header, the divider and blank rows are skipped.
pub fn parse_bookmarks(text: &str) -> Result<Vec<Bookmark>> {
    let mut bookmarks = vec![];

    for line in text.lines() {
        if line.contains("Bookmark ID") || line.contains("-------") || line.trim().is_empty() {
            continue;
        }

        let columns = line.split('|').map(str::trim).collect::<Vec<&str>>();

        if columns.len() < 5 {
            bailc!(
                "Unexpected bookmark listing", ;
                "`{line}` does not have five columns", ;
                "Check the output of `globus bookmark list`",
            );
        }

        trace!("Found bookmark {}", columns[0]);

        bookmarks.push(Bookmark {
            name: columns[0].to_string(),
            endpoint_id: columns[2].to_string(),
            path: columns[4].to_string(),
        });
    }

    Ok(bookmarks)
}

/// Find a bookmark by name, the last one listed wins.
pub fn find_bookmark<'a>(
    bookmarks: &'a [Bookmark],
    name: &str,
    role: &str,
) -> Result<&'a Bookmark> {
    match bookmarks.iter().rev().find(|b| b.name == name) {
        Some(bookmark) => Ok(bookmark),
        None => bailc!(
            "{} bookmark not found", role;
            "There is no bookmark named `{name}`", ;
            "Create it with `globus bookmark create`",
        ),
    }
}

/// What the user asked to transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// The bookmark of the machine we are on.
    pub source: String,

    /// The bookmark to send to.
    pub destination: String,

    /// The file, relative to the working directory.
    pub source_path: PathBuf,

    /// The directory, relative to the destination bookmark.
    pub destination_path: PathBuf,

    /// Shown in the transfer service.
    pub label: Option<String>,
}

/// A transfer with both ends resolved to endpoints and absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// The source endpoint.
    pub source: Bookmark,

    /// The destination endpoint.
    pub destination: Bookmark,

    /// Absolute path of the file on the source.
    pub source_path: PathBuf,

    /// Absolute path of the file on the destination.
    pub destination_path: PathBuf,

    /// Shown in the transfer service.
    pub label: Option<String>,
}

impl TransferPlan {
    /// Resolve `request` against the bookmarks.
    ///
    /// The working directory `cwd` must lie below the source bookmark, a
    /// bookmark path equal to `home_alias` stands for `home`. The file keeps
    /// its name on the destination.
    pub fn resolve(
        request: TransferRequest,
        bookmarks: &[Bookmark],
        cwd: &Path,
        home: &Path,
        home_alias: &str,
    ) -> Result<TransferPlan> {
        let source = find_bookmark(bookmarks, &request.source, "Source")?;
        let destination = find_bookmark(bookmarks, &request.destination, "Destination")?;

        let source_root = if source.path == home_alias {
            home.to_path_buf()
        } else {
            PathBuf::from(source.path.trim_end_matches('/'))
        };

        if !cwd.starts_with(&source_root) {
            bailc!(
                "It doesn't look like you're on the source machine", ;
                "{cwd:?} is not below {source_root:?} of `{}`", source.name;
                "Run this on the machine the source bookmark points to",
            );
        }

        let source_path = cwd.join(&request.source_path);

        let Some(file_name) = source_path.file_name() else {
            bailc!(
                "Not a file", ;
                "{source_path:?} does not name a file", ;
                "",
            );
        };

        let destination_path = Path::new(&destination.path)
            .join(&request.destination_path)
            .join(file_name);

        Ok(TransferPlan {
            source: source.clone(),
            destination: destination.clone(),
            source_path,
            destination_path,
            label: request.label,
        })
    }

    /// `<endpoint id>:<path>` of the source.
    pub fn source_argument(&self) -> String {
        format!("{}:{}", self.source.endpoint_id, self.source_path.display())
    }

    /// `<endpoint id>:<path>` of the destination.
    pub fn destination_argument(&self) -> String {
        format!(
            "{}:{}",
            self.destination.endpoint_id,
            self.destination_path.display()
        )
    }
}

/// A service that copies files between endpoints.
///
/// Transfers run in the background on the service, the source is never
/// deleted.
pub trait TransferService {
    /// All known bookmarks.
    fn bookmarks(&self) -> Result<Vec<Bookmark>>;

    /// Queue a transfer.
    fn submit(&self, plan: &TransferPlan) -> Result<()>;
}

/// The short run name of a production log directory,
/// `runtime_production_<run>/...` -> `<run>`.
pub fn run_short_name(log_dir: &Path) -> Result<String> {
    let first = log_dir
        .components()
        .find_map(|c| c.as_os_str().to_str().filter(|s| s.starts_with(PRODUCTION_LOG_PREFIX)));

    match first {
        Some(name) => Ok(name.replacen(PRODUCTION_LOG_PREFIX, "", 1)),
        None => bailc!(
            "Not a production log directory", ;
            "No part of {log_dir:?} starts with `{PRODUCTION_LOG_PREFIX}`", ;
            "",
        ),
    }
}

/// The transfer sending the timestep plot of `log_dir` to the desktop of
/// `destination`.
pub fn dt_history_request(
    log_dir: &Path,
    source: &str,
    destination: &str,
) -> Result<TransferRequest> {
    let run = run_short_name(log_dir)?;

    Ok(TransferRequest {
        source: source.to_string(),
        destination: destination.to_string(),
        source_path: log_dir.join(DT_HISTORY_PLOT),
        destination_path: Path::new("Desktop").join(&run),
        label: Some(format!("dt_history_{run}")),
    })
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
