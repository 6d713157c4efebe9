use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Duration read from human-friendly text such as `5s` or `1m 30s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampDuration {
    duration: Duration,
}

impl RampDuration {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn get_duration(&self) -> Duration {
        self.duration
    }

    pub fn is_zero(&self) -> bool {
        self.duration.is_zero()
    }

    /// Renders the duration in the single-unit form Go's `time.ParseDuration` accepts.
    pub fn as_go_duration(&self) -> String {
        if self.duration.subsec_nanos() == 0 {
            format!("{}s", self.duration.as_secs())
        } else {
            format!("{}ms", self.duration.as_millis())
        }
    }
}

impl FromStr for RampDuration {
    type Err = humantime::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "0" || s == "disabled" {
            Ok(Self::new(Duration::ZERO))
        } else {
            Ok(Self::new(humantime::parse_duration(s)?))
        }
    }
}

impl Display for RampDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", humantime::format_duration(self.duration))
    }
}

impl Serialize for RampDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RampDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
