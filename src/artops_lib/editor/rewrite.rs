use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Range;

use anyhow::Context;
use anyhow::Result;

use super::answers::normalize;
use super::answers::AnswerProvider;
use super::answers::Question;
use super::selector::Selector;
use super::validate::check_restart_scale;
use super::validate::ValueRule;
use crate::bailc;
use crate::file_system::FileOperations;

/// What comes before the value on a `key value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    /// The value is the last whitespace separated token.
    Whitespace,

    /// The value follows the last occurrence of this string.
    Literal(String),
}

impl Display for Separator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Separator::Whitespace => write!(f, "whitespace"),
            Separator::Literal(s) => write!(f, "`{s}`"),
        }
    }
}

/// How MPI ranks are spread over the cores of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    /// MPI ranks on every node.
    pub ranks_per_node: u64,

    /// Cores of one node.
    pub node_cpus: u64,
}

impl NodeLayout {
    /// Check that `ranks_per_node` divides the cores of a node evenly.
    pub fn new(ranks_per_node: u64, node_cpus: u64) -> Result<Self> {
        if ranks_per_node == 0 || node_cpus % ranks_per_node != 0 {
            bailc!(
                "Uneven number of cores per rank", ;
                "Running {ranks_per_node} MPI ranks per node does not divide {node_cpus} cores", ;
                "Choose a number of ranks that divides {node_cpus}",
            );
        }

        Ok(NodeLayout {
            ranks_per_node,
            node_cpus,
        })
    }

    /// Cores given to every rank.
    pub fn cpus_per_task(&self) -> u64 {
        self.node_cpus / self.ranks_per_node
    }

    /// All ranks of a job on `nodes` nodes.
    pub fn total_ranks(&self, nodes: u64) -> u64 {
        nodes * self.ranks_per_node
    }
}

/// The ways a matched line can be rewritten.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Replace the single value of a `key value` line.
    LastToken(Separator),

    /// Replace the values of `key=value` tokens, one question per key.
    KeyedFields(Vec<String>),

    /// Rewrite a `#PBS -l select=...` resource request. Nothing is asked.
    ResourceSelect {
        /// Number of nodes.
        nodes: u64,

        /// Node model name.
        model: String,

        /// Ranks and cores.
        layout: NodeLayout,
    },

    /// Rewrite an `mpiexec -np ...` launch line and ask for the restart
    /// option.
    Mpiexec {
        /// Number of nodes.
        nodes: u64,

        /// Ranks and cores.
        layout: NodeLayout,

        /// The config file to run with.
        config: String,
    },

    /// Rewrite an `ibrun` launch line and ask for the restart scale factor.
    Ibrun {
        /// Replaces the config file if given.
        config: Option<String>,
    },

    /// Point a `cp <config> ...` line at another config file.
    ConfigCopy {
        /// The config file name.
        config: String,
    },
}

/// Byte ranges of the whitespace separated tokens of `line`.
pub fn token_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = vec![];
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }

    if let Some(s) = start {
        spans.push(s..line.len());
    }

    spans
}

/// Where the value of a `key value` line sits.
pub fn value_span(line: &str, separator: &Separator) -> Option<Range<usize>> {
    match separator {
        Separator::Whitespace => token_spans(line).pop(),
        Separator::Literal(sep) => {
            let after = line.rfind(sep.as_str())? + sep.len();
            let rest = &line[after..];

            if rest.trim().is_empty() {
                return Some(after..after);
            }

            let start = after + rest.len() - rest.trim_start().len();
            let end = after + rest.trim_end().len();

            Some(start..end)
        }
    }
}

/// Replace the given ranges of `line`. The ranges must not overlap.
fn splice(line: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;

    for (range, text) in edits {
        out.push_str(&line[cursor..range.start]);
        out.push_str(&text);
        cursor = range.end;
    }

    out.push_str(&line[cursor..]);
    out
}

/// The fields of a `select=4:model=bro:...` resource request.
pub fn parse_select(request: &str) -> Result<BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();

    for field in request.split(':') {
        let Some((key, value)) = field.split_once('=') else {
            bailc!(
                "Malformed resource request", ;
                "`{field}` in `{request}` is not key=value", ;
                "",
            );
        };

        fields.insert(key.to_string(), value.to_string());
    }

    Ok(fields)
}

/// Check an `mpiexec` restart option, `-r=<scale>` or `-root=<location>`.
pub fn check_restart_option(option: &str) -> Result<()> {
    if let Some(scale) = option.strip_prefix("-r=") {
        check_restart_scale(scale)?;
    } else if !option.starts_with("-root=") {
        bailc!(
            "Bad restart option", ;
            "`{option}` is neither -r=<scale factor> nor -root=<location>", ;
            "",
        );
    }

    Ok(())
}

/// Get the new value for one question, `None` keeps the current one.
fn decide(
    selector: &Selector,
    key: String,
    line: &str,
    current: &str,
    answers: &mut dyn AnswerProvider,
) -> Result<Option<String>> {
    let answer = match &selector.answer {
        Some(preset) => Some(preset.clone()),
        None => answers.answer(&Question {
            key,
            prompt: line.trim_end().to_string(),
            current: current.to_string(),
        })?,
    };

    Ok(normalize(answer))
}

/// Ask for and validate the value at `span`.
///
/// A kept value is only checked for directories, which get created.
fn edit_value(
    line: &str,
    span: Range<usize>,
    key: String,
    selector: &Selector,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<Option<(Range<usize>, String)>> {
    let current = &line[span.clone()];

    match decide(selector, key, line, current, answers)? {
        Some(new) => {
            selector.rule.check(&new, fs)?;
            Ok(Some((span, new)))
        }
        None => {
            if selector.rule == ValueRule::Directory {
                selector.rule.check(current, fs)?;
            }
            Ok(None)
        }
    }
}

impl Rewrite {
    /// Rewrite `line` for `selector`.
    ///
    /// Everything outside the edited values, including the line ending,
    /// is kept byte for byte.
    pub fn apply(
        &self,
        line: &str,
        selector: &Selector,
        answers: &mut dyn AnswerProvider,
        fs: &impl FileOperations,
    ) -> Result<String> {
        let edits = match self {
            Rewrite::LastToken(separator) => {
                let Some(span) = value_span(line, separator) else {
                    let line = line.trim_end();
                    bailc!(
                        "Could not find the value to edit", ;
                        "The separator {separator} does not appear in `{line}`", ;
                        "",
                    );
                };

                edit_value(line, span, selector.name.clone(), selector, answers, fs)?
                    .into_iter()
                    .collect()
            }

            Rewrite::KeyedFields(keys) => keyed_fields(line, keys, selector, answers, fs)?,

            Rewrite::ResourceSelect {
                nodes,
                model,
                layout,
            } => {
                let Some(span) = token_spans(line).pop() else {
                    bailc!("Empty resource request line");
                };

                let mut fields = vec![];

                for field in line[span.clone()].split(':') {
                    let Some((key, _)) = field.split_once('=') else {
                        bailc!(
                            "Malformed resource request", ;
                            "`{field}` is not key=value", ;
                            "",
                        );
                    };

                    let value = match key {
                        "select" => nodes.to_string(),
                        "model" => model.clone(),
                        "mpiprocs" => layout.ranks_per_node.to_string(),
                        "ncpus" => layout.node_cpus.to_string(),
                        _ => bailc!(
                            "Key not recognized", ;
                            "`{key}` is not a known resource", ;
                            "Only select, model, mpiprocs and ncpus can be set",
                        ),
                    };

                    fields.push(format!("{key}={value}"));
                }

                vec![(span, fields.join(":"))]
            }

            Rewrite::Mpiexec {
                nodes,
                layout,
                config,
            } => {
                let spans = token_spans(line);
                let token = |i: usize| &line[spans[i].clone()];

                if spans.len() < 11
                    || token(1) != "-np"
                    || !token(5).starts_with("-n")
                    || !token(6).starts_with("-t")
                {
                    bailc!(
                        "Unexpected launch line", ;
                        "`{}` is not `mpiexec -np N ... -nR -tC ... CONFIG RESTART`",
                        line.trim_end();
                        "",
                    );
                }

                let current = token(10);
                let restart = decide(selector, selector.name.clone(), line, current, answers)?;
                check_restart_option(restart.as_deref().unwrap_or(current))?;

                let mut edits = vec![
                    (spans[2].clone(), layout.total_ranks(*nodes).to_string()),
                    (spans[5].clone(), format!("-n{}", layout.ranks_per_node)),
                    (spans[6].clone(), format!("-t{}", layout.cpus_per_task())),
                    (spans[9].clone(), config.clone()),
                ];

                if let Some(restart) = restart {
                    edits.push((spans[10].clone(), restart));
                }

                edits
            }

            Rewrite::Ibrun { config } => {
                let spans = token_spans(line);
                let offset = match spans.first() {
                    Some(first) if &line[first.clone()] == "remora" => 1,
                    _ => 0,
                };

                if spans.len() < 4 + offset {
                    bailc!(
                        "Unexpected launch line", ;
                        "`{}` is not `ibrun EXECUTABLE CONFIG RESTART`", line.trim_end();
                        "",
                    );
                }

                let restart_span = spans[3 + offset].clone();
                let current = &line[restart_span.clone()];
                let mut edits = vec![];

                if let Some(config) = config {
                    edits.push((spans[2 + offset].clone(), config.clone()));
                }

                let decided = decide(selector, selector.name.clone(), line, current, answers)?;
                if let Some(scale) = decided {
                    check_restart_scale(&scale)?;
                    edits.push((restart_span, format!("-r={scale}")));
                }

                edits
            }

            Rewrite::ConfigCopy { config } => {
                let spans = token_spans(line);

                let Some(old) = spans
                    .get(1)
                    .and_then(|span| line[span.clone()].rsplit('/').next())
                    .filter(|old| !old.is_empty())
                else {
                    bailc!(
                        "Unexpected copy line", ;
                        "`{}` has no source file", line.trim_end();
                        "",
                    );
                };

                spans
                    .iter()
                    .filter(|span| line[(*span).clone()].rsplit('/').next() == Some(old))
                    .map(|span| (span.end - old.len()..span.end, config.clone()))
                    .collect()
            }
        };

        Ok(splice(line, edits))
    }
}

/// One question per `key=value` token.
fn keyed_fields(
    line: &str,
    keys: &[String],
    selector: &Selector,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<Vec<(Range<usize>, String)>> {
    let spans = token_spans(line);
    let mut edits = vec![];

    for key in keys {
        let marker = format!("{key}=");

        let Some(span) = spans.iter().find(|s| line[(*s).clone()].starts_with(&marker)) else {
            let line = line.trim_end();
            bailc!(
                "Could not find the value to edit", ;
                "`{line}` has no `{marker}` field", ;
                "",
            );
        };

        let value = span.start + marker.len()..span.end;
        let question = format!("{}:{key}", selector.name);

        if let Some(edit) = edit_value(line, value, question, selector, answers, fs)? {
            edits.push(edit);
        }
    }

    Ok(edits)
}

/// Read the value of the last line in `text` matching `selector`.
///
/// Only works for [Rewrite::LastToken] selectors.
pub fn current_value(text: &str, selector: &Selector) -> Option<String> {
    let Rewrite::LastToken(separator) = &selector.rewrite else {
        return None;
    };

    text.lines()
        .filter(|line| selector.matcher.matches(line))
        .last()
        .and_then(|line| value_span(line, separator).map(|span| line[span].to_string()))
}
