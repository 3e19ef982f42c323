use std::path::PathBuf;

use anstyle::AnsiColor;
use anstyle::Color;
use anstyle::Style;

/// The default location of the configuration file.
pub const CONFIG_DEFAULT: &str = "./artops.toml";

/// Suffix of the scratch copy written while a file is being edited.
pub const TEMP_SUFFIX: &str = ".temp";

/// Nominal size of one archive before a new one is started: 300 GB.
pub const MAX_ARCHIVE_SIZE_DEFAULT: fn() -> u64 = || 300_000_000_000;

/// Root of the project allocation on the tape archive.
pub const REMOTE_ROOT_DEFAULT: fn() -> PathBuf =
    || "/stornext/ranch_01/ranch/projects/TG-AST200017".into();

/// The environment variable holding the archive host name.
pub const ARCHIVE_HOST_ENV_DEFAULT: fn() -> String = || "ARCHIVER".to_string();

/// Outputs are grouped around the files with this extension.
pub const ANCHOR_EXTENSION_DEFAULT: fn() -> Option<String> = || Some("art".to_string());

/// The file-transfer command line client.
pub const TRANSFER_COMMAND_DEFAULT: fn() -> String = || "globus".to_string();

/// How the transfer service spells "the home directory" in bookmark paths.
pub const HOME_ALIAS_DEFAULT: fn() -> String = || "/~/".to_string();

/// The timestep history plotting script.
pub const DT_HISTORY_SCRIPT_DEFAULT: fn() -> String =
    || "$WORK/ART_snapshot_checks/dt_history.py".to_string();

/// The bookmark that timestep plots are sent to.
pub const DT_HISTORY_DESTINATION_DEFAULT: fn() -> String = || "macbook".to_string();

/// Prefix of the log directories of production runs.
pub const PRODUCTION_LOG_PREFIX: &str = "runtime_production_";

/// Where production log directories live on the archive, below the mirrored root.
pub const PRODUCTION_ARCHIVE_PATH: &str = "art_runs/runs/production";

/// Name of the directory all production runs are kept in.
pub const PRODUCTION_DIR: &str = "production";

/// The file name of the timestep plot written by the history script.
pub const DT_HISTORY_PLOT: &str = "timestep_history.png";

/// Queues accepted on Pleiades.
pub const PLEIADES_QUEUES: [&str; 4] = ["long", "normal", "devel", "debug"];

/// Queues accepted on Stampede2.
pub const STAMPEDE2_QUEUES: [&str; 8] = [
    "development",
    "normal",
    "large",
    "long",
    "flat-quadrant",
    "skx-dev",
    "skx-normal",
    "skx-large",
];

/// Queues accepted on Frontera.
pub const FRONTERA_QUEUES: [&str; 5] = ["development", "normal", "large", "long", "small"];

/// Queues accepted on Anvil.
pub const ANVIL_QUEUES: [&str; 4] = ["debug", "standard", "wide", "highmem"];

/// Cores on a Skylake node, regardless of machine.
pub const SKX_NODE_CPUS: u64 = 48;

/// Create a style with a defined foreground color.
pub const fn style_from_fg(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

/// The styling for the program name.
pub const PRIMARY_STYLE: Style = style_from_fg(AnsiColor::Green).bold();

/// The styling for file and archive names in listings.
pub const NAME_STYLE: Style = style_from_fg(AnsiColor::Cyan).bold();

/// The styling for commands suggested to the user.
pub const CMD_STYLE: Style = style_from_fg(AnsiColor::BrightWhite).bold();

/// The styling for error messages.
pub const ERROR_STYLE: Style = style_from_fg(AnsiColor::Red).bold().blink();

/// The styling for help messages.
pub const HELP_STYLE: Style = style_from_fg(AnsiColor::Green).bold().underline();
