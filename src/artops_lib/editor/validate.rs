use std::path::Path;
use std::path::MAIN_SEPARATOR;

use anyhow::Context;
use anyhow::Result;
use log::info;
use regex_lite::Regex;

use crate::bailc;
use crate::config::machine::Machine;
use crate::file_system::FileOperations;

/// The snapshot epoch triple, `(0.x,[01].x,0.x)`.
const EPOCHS_PATTERN: &str = r"^\(0\.\d*,[01]\.\d*,0\.\d*\)$";

/// The constraint a replacement value has to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Anything goes.
    Any,

    /// A whole number.
    Integer,

    /// A floating point number.
    Float,

    /// A directory, created if it does not exist yet.
    Directory,

    /// A snapshot epoch triple.
    Epochs,

    /// A bare name without path separators.
    Name,

    /// A queue of the given machine.
    Queue(Machine),

    /// `HH:MM:SS`.
    Walltime,
}

impl ValueRule {
    /// Check `value`, explaining which constraint failed.
    pub fn check(&self, value: &str, fs: &impl FileOperations) -> Result<()> {
        match self {
            ValueRule::Any => Ok(()),
            ValueRule::Integer => check_integer(value).map(|_| ()),
            ValueRule::Float => check_float(value).map(|_| ()),
            ValueRule::Directory => check_directory(value, fs),
            ValueRule::Epochs => check_epochs(value),
            ValueRule::Name => check_name(value),
            ValueRule::Queue(machine) => check_queue(value, *machine),
            ValueRule::Walltime => check_walltime(value).map(|_| ()),
        }
    }
}

/// Parse an integer.
pub fn check_integer(value: &str) -> Result<i64> {
    match value.trim().parse::<i64>() {
        Ok(i) => Ok(i),
        Err(_) => bailc!(
            "This must be an integer", ;
            "`{}` is not a whole number", value;
            "",
        ),
    }
}

/// Parse a count of nodes or ranks, which must be at least one.
pub fn check_count(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bailc!(
            "This must be a positive integer", ;
            "`{}` is not a count", value;
            "",
        ),
    }
}

/// Parse a float.
pub fn check_float(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(x) => Ok(x),
        Err(_) => bailc!(
            "This must be a float", ;
            "`{}` is not a number", value;
            "",
        ),
    }
}

/// Accept any directory path, creating it if it does not exist.
pub fn check_directory(value: &str, fs: &impl FileOperations) -> Result<()> {
    let path = Path::new(value);

    if path.is_dir() {
        return Ok(());
    }

    if path.exists() {
        bailc!(
            "This must be a directory", ;
            "{path:?} exists but is not a directory", ;
            "",
        );
    }

    info!("Creating {path:?}");
    fs.create_dir_all(path)
}

/// Match the snapshot epoch format.
pub fn check_epochs(value: &str) -> Result<()> {
    let pattern = Regex::new(EPOCHS_PATTERN)?;

    if !pattern.is_match(value) {
        bailc!(
            "This does not match the format for epochs", ;
            "`{}` is not of the form (0.x,0.x,0.x)", value;
            "",
        );
    }

    Ok(())
}

/// Reject path separators.
pub fn check_name(value: &str) -> Result<()> {
    if value.contains(MAIN_SEPARATOR) {
        bailc!(
            "Slashes are not allowed here", ;
            "`{}` contains a path separator", value;
            "",
        );
    }

    Ok(())
}

/// Accept only the queues of `machine`.
pub fn check_queue(value: &str, machine: Machine) -> Result<()> {
    if !machine.queues().contains(&value) {
        bailc!(
            "This is not an acceptable queue", ;
            "`{value}` is not a queue on {machine}", ;
            "Choose one of: {}", machine.queues().join(", ")
        );
    }

    Ok(())
}

/// Parse `HH:MM:SS`, minutes and seconds must be below 60.
pub fn check_walltime(value: &str) -> Result<[u64; 3]> {
    let segments = value.trim().split(':').collect::<Vec<&str>>();

    if segments.len() != 3 {
        bailc!(
            "Not an appropriate walltime format", ;
            "`{}` is not HH:MM:SS", value;
            "",
        );
    }

    let mut parsed = [0; 3];

    for (slot, segment) in parsed.iter_mut().zip(&segments) {
        match segment.parse::<u64>() {
            Ok(n) => *slot = n,
            Err(_) => bailc!(
                "Time must be a number", ;
                "`{segment}` in `{value}` is not a whole number", ;
                "",
            ),
        }
    }

    if parsed[1] >= 60 || parsed[2] >= 60 {
        bailc!(
            "Time is not valid", ;
            "Minutes and seconds in `{}` must be below 60", value;
            "",
        );
    }

    Ok(parsed)
}

/// Parse a restart scale factor, which lies in `[0, 1]`.
pub fn check_restart_scale(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(a) if (0.0..=1.0).contains(&a) => Ok(a),
        _ => bailc!(
            "Bad restart option", ;
            "`{}` is not a scale factor between 0 and 1", value;
            "",
        ),
    }
}

#[cfg(test)]
#[path = "tests/validate.rs"]
mod tests;
