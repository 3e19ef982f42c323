use std::path::PathBuf;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Structure of the main command (artops).
#[allow(unused)]
#[derive(Parser, Debug)]
#[command(
    about = "artops, housekeeping for ART simulation runs",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// The main command issued.
    #[command(subcommand)]
    pub command: ArtopsCommand,

    /// Disable interactive mode, for use in scripts.
    #[arg(short, long, global = true)]
    pub script: bool,

    /// The path to the config file.
    #[arg(short, long, default_value = "./artops.toml", global = true)]
    pub config: PathBuf,

    /// Verbose mode, displays debug info. For even more try: -vv.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Dry run, run but don't actually affect anything.
    #[arg(short, long, global = true)]
    pub dry: bool,
}

/// Arguments supplied with the `archive` command.
#[derive(Args, Debug, Clone)]
pub struct ArchiveStruct {
    /// What to archive.
    #[command(subcommand)]
    pub subcommand: ArchiveSubcommand,
}

/// Enum for subcommands of the `archive` subcommand.
#[derive(Subcommand, Debug, Clone)]
pub enum ArchiveSubcommand {
    /// Pack the outputs in the current directory into size-bounded archives.
    #[command()]
    Outputs {
        /// Start a new archive once one grows past this many bytes
        /// [default: from the config].
        #[arg(long)]
        max_size: Option<u64>,

        /// Write the archives into this local directory instead of the
        /// archive host.
        #[arg(long)]
        local: Option<PathBuf>,

        /// Leave out the earliest output without asking.
        #[arg(long)]
        skip_first: bool,
    },

    /// Pack a whole directory into one archive.
    #[command()]
    Dir {
        /// The directory to archive.
        #[arg()]
        dir: PathBuf,

        /// Where the archive goes, relative to the remote root
        /// [default: mirrors the scratch layout].
        #[arg()]
        remote: Option<PathBuf>,

        /// Do not add today's date to the archive name.
        #[arg(long)]
        no_date: bool,

        /// Delete the directory once it has been archived.
        #[arg(long)]
        delete: bool,

        /// Write the archive into this local directory instead of the
        /// archive host.
        #[arg(long)]
        local: Option<PathBuf>,
    },

    /// Archive and remove a production log directory.
    #[command()]
    Log {
        /// The `runtime_production_*` directory.
        #[arg()]
        dir: PathBuf,
    },
}

/// Arguments supplied with the `update` command.
#[derive(Args, Debug, Clone)]
pub struct UpdateStruct {
    /// Which files to update.
    #[command(subcommand)]
    pub subcommand: UpdateSubcommand,

    /// Take the answers from a toml file instead of asking.
    #[arg(short, long, global = true)]
    pub answers: Option<PathBuf>,
}

/// Enum for subcommands of the `update` subcommand.
#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    /// Set the refinement depth in `defs.h`.
    #[command()]
    Defs {
        /// The simulation home directory.
        #[arg()]
        home: PathBuf,
    },

    /// Update the run configuration.
    #[command()]
    Config {
        /// The simulation home directory.
        #[arg()]
        home: PathBuf,

        /// The run directory, relative to home.
        #[arg()]
        run_dir: PathBuf,

        /// The configuration file in the run directory.
        #[arg()]
        config_file: String,
    },

    /// Update a slurm submission script.
    #[command()]
    Slurm {
        /// The simulation home directory.
        #[arg()]
        home: PathBuf,

        /// The run directory, relative to home.
        #[arg()]
        run_dir: PathBuf,

        /// The submission script in the run directory.
        #[arg()]
        submit_file: String,

        /// The configuration file the job should use.
        #[arg()]
        config_file: String,
    },

    /// Update a PBS submission script.
    #[command()]
    Torque {
        /// The simulation home directory.
        #[arg()]
        home: PathBuf,

        /// The run directory, relative to home.
        #[arg()]
        run_dir: PathBuf,

        /// The submission script in the run directory.
        #[arg()]
        submit_file: String,

        /// The configuration file the job should use.
        #[arg()]
        config_file: String,
    },

    /// Update `defs.h`, `run/config.cfg` and `run/submit.sh` together.
    #[command()]
    Run {
        /// The simulation home directory.
        #[arg()]
        home: PathBuf,
    },
}

/// Arguments supplied with the `stage` command.
#[derive(Args, Debug, Clone, Copy)]
pub struct StageStruct {
    /// What to stage.
    #[command(subcommand)]
    pub subcommand: StageSubcommand,
}

/// Enum for subcommands of the `stage` subcommand.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum StageSubcommand {
    /// Move `run/working_out` into `run/out` for every production run.
    #[command()]
    Outputs,

    /// Move `run/halos` into the analysis tree for every production run.
    #[command()]
    Halos,

    /// Move stdout files and submission scripts into their runtime directories.
    #[command()]
    Runtime,
}

/// Arguments supplied with the `transfer` command.
#[derive(Args, Debug, Clone)]
pub struct TransferStruct {
    /// The bookmark of this machine.
    #[arg()]
    pub source: String,

    /// The bookmark to send to.
    #[arg()]
    pub destination: String,

    /// The file to send, relative to the current directory.
    #[arg()]
    pub source_path: PathBuf,

    /// The directory to send it to, relative to the destination bookmark.
    #[arg()]
    pub destination_path: PathBuf,

    /// A label for the transfer.
    #[arg(short, long)]
    pub label: Option<String>,
}

/// Arguments supplied with the `dt-history` command.
#[derive(Args, Debug, Clone)]
pub struct DtHistoryStruct {
    /// The log directory of a production run.
    #[arg()]
    pub log_dir: PathBuf,

    /// The bookmark of this machine [default: the machine name].
    #[arg(long)]
    pub source: Option<String>,
}

/// Enum for root-level `artops` commands.
#[derive(Subcommand, Debug)]
pub enum ArtopsCommand {
    /// Pack outputs or directories into archives.
    #[command()]
    Archive(ArchiveStruct),

    /// Edit input files and job scripts before a restart.
    #[command()]
    Update(UpdateStruct),

    /// Move outputs, halos and logs into place.
    #[command()]
    Stage(StageStruct),

    /// Send a file to another machine.
    #[command()]
    Transfer(TransferStruct),

    /// Plot the timestep history of a run and send it home.
    #[command()]
    DtHistory(DtHistoryStruct),

    /// Print information about the version.
    #[command()]
    Version,
}
