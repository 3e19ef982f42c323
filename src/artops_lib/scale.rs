use std::cmp::Ordering;
use std::fmt::Display;

/// The scale factor of a simulation output, as written in its filename.
///
/// Scale factors are zero-padded fixed-width decimals, so the string
/// itself is the sort and grouping key. [ScaleFactor::value] is only used
/// when the numerically latest output is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScaleFactor(String);

impl ScaleFactor {
    /// Wrap a token read from a filename.
    pub fn new(token: impl Into<String>) -> Self {
        ScaleFactor(token.into())
    }

    /// The token as it appears in the filename.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric value, if the token is a number.
    pub fn value(&self) -> Option<f64> {
        self.0.parse().ok()
    }

    /// Compare by numeric value, falling back to the string for tokens that
    /// are not numbers.
    pub fn cmp_value(&self, other: &ScaleFactor) -> Ordering {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => self.cmp(other),
        }
    }
}

impl Display for ScaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reads the scale factor of a file whose name starts with `prefix` from
/// the characters `start..end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedOffset {
    /// Filenames this rule applies to.
    pub prefix: String,

    /// First character of the scale factor.
    pub start: usize,

    /// One past the last character of the scale factor.
    pub end: usize,
}

impl FixedOffset {
    /// A rule for names starting with `prefix`.
    pub fn new(prefix: &str, start: usize, end: usize) -> Self {
        FixedOffset {
            prefix: prefix.to_string(),
            start,
            end,
        }
    }
}

/// How the scale factor is embedded in a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleScheme {
    /// The last `_`-separated token before the extension,
    /// `out_0.10000.art` -> `0.10000`.
    LastToken,

    /// The first matching rule wins. Names matching no rule have no scale
    /// factor.
    FixedOffsets(Vec<FixedOffset>),
}

impl ScaleScheme {
    /// Continuous outputs written to `working_out`, `continuous_a0.5000.art`.
    pub fn continuous_outputs() -> Self {
        ScaleScheme::FixedOffsets(vec![FixedOffset::new("continuous_a", 12, 18)])
    }

    /// Halo catalogues and the outputs they were found in.
    pub fn halo_files() -> Self {
        ScaleScheme::FixedOffsets(vec![
            FixedOffset::new("halos_", 7, 13),
            FixedOffset::new("out_", 5, 11),
        ])
    }

    /// Read the scale factor from `file_name`.
    pub fn parse(&self, file_name: &str) -> Option<ScaleFactor> {
        match self {
            ScaleScheme::LastToken => {
                let stem = match file_name.rsplit_once('.') {
                    Some((stem, _)) => stem,
                    None => file_name,
                };

                let (_, token) = stem.rsplit_once('_')?;

                if token.is_empty() {
                    None
                } else {
                    Some(ScaleFactor::new(token))
                }
            }

            ScaleScheme::FixedOffsets(rules) => rules
                .iter()
                .find(|rule| file_name.starts_with(&rule.prefix))
                .and_then(|rule| file_name.get(rule.start..rule.end))
                .map(ScaleFactor::new),
        }
    }
}
