//! Line-oriented editing of simulation input files.
//!
//! A file is edited by a list of [Selector]s. Every line is checked against
//! all of them, the last one matching decides how the line is rewritten and
//! other lines are copied unchanged. Nothing is written unless every line
//! was rewritten successfully, and the original file is only replaced if the
//! result differs from it.

use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use log::info;

use crate::error::ctx;
use crate::file_system::FileOperations;

pub mod answers;
pub mod rewrite;
pub mod selector;
pub mod validate;

pub use self::answers::AnswerProvider;
pub use self::selector::Selector;

/// What [update_file] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The file was replaced with the edited version.
    Replaced,

    /// The edited version was identical, the file was left alone.
    Unchanged,
}

/// Run every line of `text` through `selectors`.
pub fn edit_text(
    text: &str,
    selectors: &[Selector],
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<String> {
    let mut edited = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        match selectors.iter().rev().find(|s| s.matcher.matches(line)) {
            Some(selector) => {
                edited.push_str(&selector.rewrite.apply(line, selector, answers, fs)?)
            }
            None => edited.push_str(line),
        }
    }

    Ok(edited)
}

/// Edit the file at `path` in place.
pub fn update_file(
    path: &Path,
    selectors: &[Selector],
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<EditOutcome> {
    info!("Checking {path:?}");

    let original = fs.read_utf8(path)?;

    let edited = edit_text(&original, selectors, answers, fs).with_context(ctx!(
      "Could not update {path:?}", ;
      "The file was left untouched",
    ))?;

    if fs.replace_if_changed(path, &edited)? {
        Ok(EditOutcome::Replaced)
    } else {
        info!("No changes to {path:?}");
        Ok(EditOutcome::Unchanged)
    }
}
