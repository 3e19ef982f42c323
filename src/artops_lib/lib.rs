//! The logic behind `artops`, everything that can run without a terminal.

/// The error handling for `artops`.
pub mod error;

/// Constant values.
pub mod constants;

/// Common file operations
pub mod file_system;

/// The optional `artops.toml` and the machines we know about.
pub mod config;

/// Scale factors encoded in output file names.
pub mod scale;

/// Packing outputs into size-bounded archives.
pub mod archive;

/// Line-oriented editing of input files and job scripts.
pub mod editor;

/// The edits applied to a run between restarts.
pub mod runfiles;

/// Moving outputs, halos and logs between directories.
pub mod staging;

/// Bookmarks and transfers between machines.
pub mod transfer;

/// Helper functions for testing, only compiled in test mode.
#[cfg(test)]
mod test_utils;
