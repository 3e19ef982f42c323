use std::env;
use std::process::exit;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use artops_lib::config::Config;
use artops_lib::constants::ERROR_STYLE;
use artops_lib::ctx;
use artops_lib::file_system::FileSystemInteractor;
use clap::CommandFactory;
use clap::FromArgMatches;
use colog::default_builder;
use colog::formatter;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::debug;
use log::trace;
use log::LevelFilter;

use super::log::LogTokens;
use super::printing::get_styles;
use crate::archive::process_archive;
use crate::cli::def::ArtopsCommand;
use crate::cli::def::Cli;
use crate::cli::printing::print_version;
use crate::stage::process_stage;
use crate::transfer::process_dt_history;
use crate::transfer::process_transfer;
use crate::update::process_update;

/// This function parses the command that artops was run with.
pub fn parse_command() {
    let styled = Cli::command().styles(get_styles()).get_matches();

    let command = match Cli::from_arg_matches(&styled) {
        Ok(command) => command,
        Err(e) => e.exit(),
    };

    let backtrace_enabled = match env::var("RUST_LIB_BACKTRACE") {
        Ok(s) => s != "0",
        Err(_) => match env::var("RUST_BACKTRACE") {
            Ok(s) => s != "0",
            Err(_) => false,
        },
    };

    if backtrace_enabled {
        if let Err(e) = process_command(&command) {
            eprintln!("{e:?}");
            exit(1);
        }
    } else if let Err(e) = process_command(&command) {
        eprintln!("{}error:{:#} {}", ERROR_STYLE, ERROR_STYLE, e.root_cause());
        eprint!("{}", e);
        exit(1);
    }
}

/// CLAP has parsed the command, now we process it.
pub fn process_command(cmd: &Cli) -> Result<()> {
    let progress = setup_logging(cmd)?;

    let file_system = FileSystemInteractor { dry_run: cmd.dry };

    debug!("Reading the config: {:?}", cmd.config);
    let config = Config::from_file(&cmd.config, &file_system)?;
    trace!("The config is: {config:#?}");

    match &cmd.command {
        ArtopsCommand::Archive(args) => {
            process_archive(&args.subcommand, &config, cmd.script, &progress, &file_system)
        }

        ArtopsCommand::Update(args) => process_update(args, &config, cmd.script, &file_system),

        ArtopsCommand::Stage(args) => process_stage(args.subcommand, cmd.script, &file_system),

        ArtopsCommand::Transfer(args) => process_transfer(args, &config, cmd.script, cmd.dry),

        ArtopsCommand::DtHistory(args) => process_dt_history(args, &config, cmd.script, cmd.dry),

        ArtopsCommand::Version => {
            print_version(cmd.script);
            Ok(())
        }
    }
}

/// Set up the logger, returning the progress bar handle the log lines are
/// printed above.
fn setup_logging(cmd: &Cli) -> Result<MultiProgress> {
    let mut log_build = default_builder();
    log_build.format(formatter(LogTokens));

    let bar = MultiProgress::new();

    if cmd.verbose == 2 {
        log_build.filter(None, LevelFilter::Trace);
    } else if cmd.verbose == 1 {
        log_build.filter(None, LevelFilter::Debug);
    } else if cmd.verbose == 0 {
        log_build.filter(None, LevelFilter::Info);
    } else {
        return Err(anyhow!("Only two levels of verbosity supported (ie. -vv)")).context("");
    }

    LogWrapper::new(bar.clone(), log_build.build())
        .try_init()
        .with_context(ctx!(
          "Failed to initialize the command line interface", ;
          "Make sure you are using a supported terminal",
        ))?;

    Ok(bar)
}
