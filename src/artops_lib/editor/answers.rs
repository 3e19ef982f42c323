use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt::Display;

use anyhow::Result;
use serde::Deserialize;

/// A value the editor needs a decision on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Identifies the question, pre-supplied answers are looked up by it.
    ///
    /// This is the selector name, or `<selector>:<field>` for lines with
    /// several editable fields.
    pub key: String,

    /// What to show the user, usually the line being edited.
    pub prompt: String,

    /// The value currently in the file.
    pub current: String,
}

/// A source of replacement values.
///
/// `Ok(None)` keeps the current value.
pub trait AnswerProvider {
    /// Answer one question.
    fn answer(&mut self, question: &Question) -> Result<Option<String>>;
}

/// Treat blank answers as "keep the current value".
pub fn normalize(answer: Option<String>) -> Option<String> {
    answer
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}

/// A scalar in an answers file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Quoted.
    Text(String),

    /// A bare integer.
    Integer(i64),

    /// A bare float.
    Float(f64),
}

impl Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerValue::Text(s) => write!(f, "{s}"),
            AnswerValue::Integer(i) => write!(f, "{i}"),
            AnswerValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Answers keyed by [Question::key], for scripted runs.
///
/// Unknown keys keep the current value. Deserializes from a flat toml
/// table:
///
/// ```toml
/// "auni-stop" = 0.5
/// "#SBATCH --time" = "48:00:00"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, AnswerValue>")]
pub struct AnswerMap(BTreeMap<String, String>);

impl From<BTreeMap<String, AnswerValue>> for AnswerMap {
    fn from(values: BTreeMap<String, AnswerValue>) -> Self {
        AnswerMap(
            values
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
        )
    }
}

impl AnswerMap {
    /// An empty map, which keeps every value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer.
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or overwrite an answer.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) {
        self.0.insert(key.into(), value.to_string());
    }
}

impl AnswerProvider for AnswerMap {
    fn answer(&mut self, question: &Question) -> Result<Option<String>> {
        Ok(self.0.get(&question.key).cloned())
    }
}

/// Hands out answers in order, whatever the question.
///
/// Once exhausted every value is kept.
#[derive(Debug, Clone, Default)]
pub struct FixedAnswers {
    /// The remaining answers.
    queue: VecDeque<String>,

    /// Every question asked so far.
    pub asked: Vec<Question>,
}

impl FixedAnswers {
    /// Answer with `answers`, an empty string keeps the current value.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FixedAnswers {
            queue: answers.into_iter().map(Into::into).collect(),
            asked: vec![],
        }
    }
}

impl AnswerProvider for FixedAnswers {
    fn answer(&mut self, question: &Question) -> Result<Option<String>> {
        self.asked.push(question.clone());
        Ok(self.queue.pop_front())
    }
}
