use crate::error::RampError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Request description handed unparsed to `vegeta attack`: `METHOD URL` on
/// the first line, optionally followed by header and body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    text: String,
}

impl Target {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn method(&self) -> &str {
        self.request_line().0
    }

    pub fn url(&self) -> &str {
        self.request_line().1
    }

    fn request_line(&self) -> (&str, &str) {
        let line = self.text.lines().next().unwrap_or_default();
        let mut parts = line.split_whitespace();
        (
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
        )
    }
}

impl FromStr for Target {
    type Err = RampError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        if text.is_empty() {
            return Err(RampError::InvalidTarget("no target given".to_owned()));
        }

        let line = text.lines().next().unwrap_or_default();
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(_), Some(_)) => Ok(Self {
                text: text.to_owned(),
            }),
            _ => Err(RampError::InvalidTarget(format!(
                "expected 'METHOD URL' on the first line, got '{line}'"
            ))),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method(), self.url())
    }
}
