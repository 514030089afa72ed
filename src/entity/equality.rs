use serde::Deserialize;
use value_debouncer::ValueEq;

/// How two input lines are compared when deciding whether the input changed.
#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualityMode {
    #[default]
    Exact,
    /// Ignore leading and trailing whitespace
    Trim,
    /// Ignore ASCII case
    IgnoreCase,
}

impl EqualityMode {
    pub fn same_line(&self, a: &str, b: &str) -> bool {
        match self {
            EqualityMode::Exact => a == b,
            EqualityMode::Trim => a.trim() == b.trim(),
            EqualityMode::IgnoreCase => a.eq_ignore_ascii_case(b),
        }
    }
}

/// The host's holder starts empty, so lines are compared inside an `Option`.
impl ValueEq<Option<String>> for EqualityMode {
    fn same(&self, a: &Option<String>, b: &Option<String>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.same_line(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
