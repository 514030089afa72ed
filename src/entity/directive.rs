use thiserror::Error;
use value_debouncer::Delay;

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A new input value
    Value(String),
    /// `:delay <ms>`
    Delay(Delay),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("unknown directive `:{0}`")]
    Unknown(String),

    #[error("`:delay` expects milliseconds, got `{0}`")]
    InvalidDelay(String),
}

impl Line {
    /// Lines starting with `:` are directives, `::` escapes a literal `:`.
    pub fn parse(line: &str) -> Result<Self, DirectiveError> {
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Line::Value(line.to_string()));
        };
        if rest.starts_with(':') {
            return Ok(Line::Value(rest.to_string()));
        }

        let mut parts = rest.split_whitespace();
        match parts.next() {
            Some("delay") => {
                let arg = parts.next().unwrap_or_default();
                arg.parse::<i64>()
                    .map(|ms| Line::Delay(Delay::from_millis(ms)))
                    .map_err(|_| DirectiveError::InvalidDelay(arg.to_string()))
            }
            other => Err(DirectiveError::Unknown(other.unwrap_or_default().to_string())),
        }
    }
}
