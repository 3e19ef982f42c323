use std::env;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use serde::Deserialize;

use self::machine::Machine;
use crate::bailc;
use crate::constants::ANCHOR_EXTENSION_DEFAULT;
use crate::constants::ARCHIVE_HOST_ENV_DEFAULT;
use crate::constants::DT_HISTORY_DESTINATION_DEFAULT;
use crate::constants::DT_HISTORY_SCRIPT_DEFAULT;
use crate::constants::HOME_ALIAS_DEFAULT;
use crate::constants::MAX_ARCHIVE_SIZE_DEFAULT;
use crate::constants::REMOTE_ROOT_DEFAULT;
use crate::constants::TRANSFER_COMMAND_DEFAULT;
use crate::file_system::FileOperations;

pub mod machine;

/// Settings for packaging outputs onto the tape archive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Once a batch grows past this many bytes, the next output group
    /// starts a new archive.
    #[serde(default = "MAX_ARCHIVE_SIZE_DEFAULT")]
    pub max_size: u64,

    /// The directory on the archive host that mirrors the scratch user
    /// directory.
    #[serde(default = "REMOTE_ROOT_DEFAULT")]
    pub remote_root: PathBuf,

    /// Name of the environment variable holding the archive host.
    #[serde(default = "ARCHIVE_HOST_ENV_DEFAULT")]
    pub host_env: String,

    /// Only scale factors owning a file with this extension are archived.
    #[serde(default = "ANCHOR_EXTENSION_DEFAULT")]
    pub anchor_extension: Option<String>,
}

/// Settings for the file-transfer service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferConfig {
    /// The command line client of the transfer service.
    #[serde(default = "TRANSFER_COMMAND_DEFAULT")]
    pub command: String,

    /// Bookmark path meaning "home directory".
    #[serde(default = "HOME_ALIAS_DEFAULT")]
    pub home_alias: String,
}

/// Settings for `dt-history`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DtHistoryConfig {
    /// The plotting script, run through the shell.
    #[serde(default = "DT_HISTORY_SCRIPT_DEFAULT")]
    pub script: String,

    /// The bookmark the plot is sent to.
    #[serde(default = "DT_HISTORY_DESTINATION_DEFAULT")]
    pub destination: String,
}

/// The configuration read from `artops.toml`.
///
/// Every field has a default, a missing file is the same as an empty one.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Force the machine instead of detecting it from the host name.
    pub machine: Option<Machine>,

    /// The user directory name on scratch, `$USER` if left out.
    pub username: Option<String>,

    /// The scratch directory production log directories must live in.
    pub scratch: Option<PathBuf>,

    /// See [ArchiveConfig].
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// See [TransferConfig].
    #[serde(default)]
    pub transfer: TransferConfig,

    /// See [DtHistoryConfig].
    #[serde(default)]
    pub dt_history: DtHistoryConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            max_size: MAX_ARCHIVE_SIZE_DEFAULT(),
            remote_root: REMOTE_ROOT_DEFAULT(),
            host_env: ARCHIVE_HOST_ENV_DEFAULT(),
            anchor_extension: ANCHOR_EXTENSION_DEFAULT(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            command: TRANSFER_COMMAND_DEFAULT(),
            home_alias: HOME_ALIAS_DEFAULT(),
        }
    }
}

impl Default for DtHistoryConfig {
    fn default() -> Self {
        DtHistoryConfig {
            script: DT_HISTORY_SCRIPT_DEFAULT(),
            destination: DT_HISTORY_DESTINATION_DEFAULT(),
        }
    }
}

impl Config {
    /// Load the configuration, falling back to the defaults if there is
    /// no file at `path`.
    pub fn from_file(path: &Path, fs: &impl FileOperations) -> Result<Config> {
        if !path.exists() {
            debug!("No configuration at {path:?}, using the defaults");
            return Ok(Config::default());
        }

        fs.try_read_toml(path)
    }

    /// The name of the user directory on scratch.
    pub fn username(&self) -> Result<String> {
        if let Some(name) = &self.username {
            return Ok(name.clone());
        }

        match env::var("USER") {
            Ok(name) if !name.is_empty() => Ok(name),
            _ => bailc!(
                "Could not determine the user name", ;
                "`$USER` is not set and no `username` is configured", ;
                "Add `username = \"...\"` to artops.toml",
            ),
        }
    }

    /// The scratch directory production log directories must live in.
    pub fn scratch(&self) -> Result<&Path> {
        match &self.scratch {
            Some(dir) => Ok(dir),
            None => bailc!(
                "No scratch directory configured", ;
                "Log archiving only works from the configured scratch directory", ;
                "Add `scratch = \"/scratch/...\"` to artops.toml",
            ),
        }
    }
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
