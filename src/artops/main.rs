//! artops keeps ART simulation runs tidy on HPC systems: it archives
//! outputs, stages files between runs, sends files home and edits the
//! input files of a run before it is restarted.

/// Packing outputs and directories onto the archive.
pub mod archive;

/// The command line interface and relevant structures.
pub mod cli;

/// Finding out which machine we are on.
pub mod host;

/// Asking the user for values on the terminal.
pub mod prompt;

/// Moving outputs, halos and logs into place.
pub mod stage;

/// Sending files between machines.
pub mod transfer;

/// Editing input files before a restart.
pub mod update;

/// The main CLI entry-point of the `artops` utility.
fn main() {
    cli::process::parse_command();
}
