use std::fmt::Display;

use crate::constants::ERROR_STYLE;
use crate::constants::HELP_STYLE;

/// The error context structure, provides an explanation and help.
///
/// The first element is the "cause" shown under the error, the second
/// is a hint telling the user what to do about it. Either may be empty,
/// in which case it is not printed.
///
/// ```should_panic
/// # use artops_lib::error::Ctx;
/// # use anyhow::anyhow;
/// # use anyhow::Result;
/// # use anyhow::Context;
/// # fn main() -> Result<()> {
/// Err(anyhow!("Bookmark not found"))
///     .context(Ctx("no bookmark `stampede2`", "run `globus bookmark list`"))
/// # }
/// ```
#[derive(Debug)]
pub struct Ctx<A, B>(pub A, pub B)
where
    A: Display,
    B: Display;

impl<A: Display, B: Display> Display for Ctx<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !format!("{}", self.0).is_empty() {
            writeln!(f, "{}caused by:{:#} {}", ERROR_STYLE, ERROR_STYLE, self.0)?;
        }

        if !format!("{}", self.1).is_empty() {
            writeln!(f, "\n{}help:{:#} {}", HELP_STYLE, HELP_STYLE, self.1)?;
        }

        Ok(())
    }
}

/// Shorthand for attaching a [Ctx] to a fallible operation.
///
/// ```ignore
/// ctx!([cause], [cause args]...; [help], [help args]...)
/// ```
/// desugars to
/// ```ignore
/// || Ctx(format!([cause], [cause args]...), format!([help], [help args]...))
/// ```
///
/// The `;` and trailing `,` are part of the syntax.
///
/// ```no_run
/// # use artops_lib::error::Ctx;
/// # use artops_lib::ctx;
/// # use std::path::PathBuf;
/// # use anyhow::Context;
/// # let path: PathBuf = "run/submit.sh".parse().unwrap();
/// std::fs::read(&path).with_context(ctx!(
///   "Could not read the submission script {path:?}", ;
///   "Check that you are in the simulation home directory",
/// ));
/// ```
#[macro_export]
macro_rules! ctx {
    {$cause: expr,  $($arg_cause: expr)*; $help: expr, $($arg_help: tt)*} => {
      || $crate::error::Ctx(format!($cause, $($arg_cause)*), format!($help, $($arg_help)*))
    };
}

/// [anyhow::bail] with a [Ctx] attached.
///
/// ```no_run
/// # use artops_lib::error::Ctx;
/// # use artops_lib::ctx;
/// # use artops_lib::bailc;
/// # use anyhow::Context;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// bailc!(
///     "Not on scratch", ;
///     "The current directory is not under /scratch", ;
///     "cd to the production directory first",
/// );
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! bailc {
    {
        $text: expr,  $($arg_text: expr)*;
        $cause: expr,  $($arg_cause: expr)*;
        $help: expr, $($arg_help: tt)*
    } => {
        return Err(anyhow::anyhow!($text, $($arg_text)*))
            .with_context($crate::error::ctx!($cause, $($arg_cause)*; $help, $($arg_help)*))
    };
    {$text: expr $(,$arg_text: expr)*} => {
        return Err(anyhow::anyhow!($text, $($arg_text)*))
            .with_context($crate::error::ctx!("",;"",))
    };
}

pub use ctx;
