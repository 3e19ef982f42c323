use super::rewrite::Rewrite;
use super::rewrite::Separator;
use super::validate::ValueRule;

/// Which lines of a file a [Selector] applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// Lines starting with the string.
    Prefix(String),

    /// Lines starting with `prefix` that also contain `token` somewhere.
    PrefixContaining {
        /// The line start.
        prefix: String,

        /// Must appear anywhere in the line.
        token: String,
    },

    /// Lines containing `token` that are not commented out with `#`.
    Contains {
        /// Must appear anywhere in the line.
        token: String,
    },
}

impl LineMatch {
    /// Does this apply to `line`?
    pub fn matches(&self, line: &str) -> bool {
        match self {
            LineMatch::Prefix(prefix) => line.starts_with(prefix.as_str()),
            LineMatch::PrefixContaining { prefix, token } => {
                line.starts_with(prefix.as_str()) && line.contains(token.as_str())
            }
            LineMatch::Contains { token } => {
                !line.trim_start().starts_with('#') && line.contains(token.as_str())
            }
        }
    }
}

/// Picks lines out of a file and says how to edit them.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// Identifies the selector in answer files and prompts.
    pub name: String,

    /// Which lines this edits.
    pub matcher: LineMatch,

    /// The constraint on replacement values.
    pub rule: ValueRule,

    /// How the line is rewritten.
    pub rewrite: Rewrite,

    /// Use this instead of asking.
    pub answer: Option<String>,
}

impl Selector {
    /// A selector with every part spelled out.
    pub fn new(
        name: impl Into<String>,
        matcher: LineMatch,
        rule: ValueRule,
        rewrite: Rewrite,
    ) -> Self {
        Selector {
            name: name.into(),
            matcher,
            rule,
            rewrite,
            answer: None,
        }
    }

    /// Edit the last whitespace separated token of lines starting with
    /// `prefix`. The prefix doubles as the name.
    pub fn prefix(prefix: &str, rule: ValueRule) -> Self {
        Selector::new(
            prefix,
            LineMatch::Prefix(prefix.to_string()),
            rule,
            Rewrite::LastToken(Separator::Whitespace),
        )
    }

    /// Like [Selector::prefix], but the value follows the last `separator`.
    pub fn prefix_separated(prefix: &str, separator: &str, rule: ValueRule) -> Self {
        Selector::new(
            prefix,
            LineMatch::Prefix(prefix.to_string()),
            rule,
            Rewrite::LastToken(Separator::Literal(separator.to_string())),
        )
    }

    /// Answer every question of this selector with `answer`.
    pub fn with_answer(mut self, answer: impl ToString) -> Self {
        self.answer = Some(answer.to_string());
        self
    }

    /// Rename the selector.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
