use crate::defaults::*;
use crate::duration::RampDuration;
use crate::error::RampError;
use crate::ladder::{BucketSchema, RateLadder};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    pub output_dir: PathBuf,
    pub ladder: LadderConfig,
    pub buckets: BucketsConfig,
    pub attack: AttackConfig,
    pub reducer: ReducerConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    pub count: u32,
    pub ratio: f64,
    pub base: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketsConfig {
    pub count: u32,
    pub ratio: f64,
    pub base_ns: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackConfig {
    pub vegeta_path: String,
    pub duration: RampDuration,
    pub cooldown: RampDuration,
    /// Passed to `vegeta attack` unchanged, e.g. `["-timeout", "30s"]`.
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducerConfig {
    pub mode: ReducerMode,
}

/// How a raw artifact is turned into a latency histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerMode {
    /// `vegeta report -type=json -buckets ...` bins the results.
    #[default]
    Report,
    /// `vegeta encode --to csv` dumps every result and binning happens here.
    Decode,
}

impl FromStr for ReducerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(ReducerMode::Report),
            "decode" => Ok(ReducerMode::Decode),
            _ => Err(format!(
                "unknown reducer mode '{s}', expected 'report' or 'decode'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub enabled: bool,
    /// Opens the interactive gnuplot window after the image is written.
    pub display: bool,
    pub gnuplot_path: String,
    /// gnuplot description; without one `./ramp-requests.plt` is used when
    /// present, otherwise a bundled description is written to the output directory.
    pub plot_file: Option<PathBuf>,
    pub image_file: PathBuf,
    pub image_size: String,
    pub html_chart: bool,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ladder: LadderConfig {
                count: DEFAULT_RATE_COUNT,
                ratio: DEFAULT_RATIO,
                base: DEFAULT_RATE_BASE,
            },
            buckets: BucketsConfig {
                count: DEFAULT_BUCKET_COUNT,
                ratio: DEFAULT_RATIO,
                base_ns: DEFAULT_BUCKET_BASE_NS,
            },
            attack: AttackConfig {
                vegeta_path: DEFAULT_VEGETA_PATH.to_owned(),
                duration: RampDuration::from_str(DEFAULT_ATTACK_DURATION)
                    .unwrap_or(RampDuration::from_secs(5)),
                cooldown: RampDuration::from_str(DEFAULT_COOLDOWN)
                    .unwrap_or(RampDuration::from_secs(5)),
                extra_args: Vec::new(),
            },
            reducer: ReducerConfig {
                mode: ReducerMode::default(),
            },
            render: RenderConfig {
                enabled: true,
                display: true,
                gnuplot_path: DEFAULT_GNUPLOT_PATH.to_owned(),
                plot_file: None,
                image_file: PathBuf::from(DEFAULT_IMAGE_FILE),
                image_size: DEFAULT_IMAGE_SIZE.to_owned(),
                html_chart: DEFAULT_HTML_CHART,
            },
        }
    }
}

impl RampConfig {
    /// Layers built-in defaults, the TOML file and `RAMP_` prefixed
    /// environment variables (`RAMP_LADDER__COUNT=20`).
    ///
    /// Without an explicit path, `RAMP_CONFIG_PATH` or `ramp.toml` is used
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<RampConfig, RampError> {
        let mut figment = Figment::from(Serialized::defaults(RampConfig::default()));

        match resolve_path(path)? {
            Some(path) => {
                info!("Loading config from path: '{}'...", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => info!("No config file found, using defaults."),
        }

        figment
            .merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"))
            .extract()
            .map_err(|error| RampError::CannotLoadConfiguration(error.to_string()))
    }

    pub fn rate_ladder(&self) -> Result<RateLadder, RampError> {
        RateLadder::generate(self.ladder.count, self.ladder.ratio, self.ladder.base)
    }

    pub fn bucket_schema(&self) -> Result<BucketSchema, RampError> {
        BucketSchema::generate(self.buckets.count, self.buckets.ratio, self.buckets.base_ns)
    }

    pub fn validate(&self) -> Result<(), RampError> {
        self.rate_ladder()?;
        self.bucket_schema()?;
        if self.attack.duration.is_zero() {
            return Err(RampError::InvalidParameter(
                "attack duration must be greater than zero".to_owned(),
            ));
        }
        if self.attack.vegeta_path.trim().is_empty() {
            return Err(RampError::InvalidParameter(
                "vegeta path cannot be empty, set attack.vegeta_path or --vegeta".to_owned(),
            ));
        }
        Ok(())
    }
}

fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, RampError> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(RampError::CannotLoadConfiguration(format!(
                "config file '{}' does not exist",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return resolve_path(Some(Path::new(&path)));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default_path.is_file().then_some(default_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn defaults_cover_fifty_rates_and_seventy_two_buckets() {
        let config = RampConfig::default();
        config.validate().unwrap();

        assert_eq!(config.rate_ladder().unwrap().len(), 50);
        assert_eq!(config.bucket_schema().unwrap().len(), 72);
        assert_eq!(
            config.attack.duration.get_duration(),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.attack.cooldown.get_duration(),
            Duration::from_secs(5)
        );
        assert_eq!(config.reducer.mode, ReducerMode::Report);
        assert!((DEFAULT_RATIO - 10f64.powf(0.1)).abs() < 1e-15);
    }

    #[test]
    fn file_values_override_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ramp.toml");
        fs::write(
            &path,
            r#"
output_dir = "/tmp/sweep"

[ladder]
count = 20
base = 10.0

[attack]
duration = "10s"
cooldown = "disabled"
extra_args = ["-timeout", "30s"]

[reducer]
mode = "decode"

[render]
display = false
"#,
        )
        .unwrap();

        let config = RampConfig::load(Some(&path)).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/sweep"));
        assert_eq!(config.ladder.count, 20);
        assert_eq!(config.ladder.base, 10.0);
        assert_eq!(config.ladder.ratio, DEFAULT_RATIO);
        assert_eq!(
            config.attack.duration.get_duration(),
            Duration::from_secs(10)
        );
        assert!(config.attack.cooldown.is_zero());
        assert_eq!(config.attack.extra_args, vec!["-timeout", "30s"]);
        assert_eq!(config.reducer.mode, ReducerMode::Decode);
        assert!(!config.render.display);
        assert!(config.render.enabled);
    }

    #[test]
    fn bundled_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/ramp.toml");
        assert_eq!(
            RampConfig::load(Some(&path)).unwrap(),
            RampConfig::default()
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing.toml");
        assert!(matches!(
            RampConfig::load(Some(&path)),
            Err(RampError::CannotLoadConfiguration(_))
        ));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ramp.toml");
        fs::write(&path, "[attack]\nduration = \"soon\"\n").unwrap();
        assert!(matches!(
            RampConfig::load(Some(&path)),
            Err(RampError::CannotLoadConfiguration(_))
        ));
    }

    #[test]
    fn validation_fails_before_any_load() {
        let mut config = RampConfig::default();
        config.ladder.ratio = 1.0;
        assert!(matches!(
            config.validate(),
            Err(RampError::InvalidParameter(_))
        ));

        let mut config = RampConfig::default();
        config.attack.duration = RampDuration::from_secs(0);
        assert!(matches!(
            config.validate(),
            Err(RampError::InvalidParameter(_))
        ));
    }

    #[test]
    fn parses_reducer_mode() {
        assert_eq!("Decode".parse::<ReducerMode>(), Ok(ReducerMode::Decode));
        assert!("histogram".parse::<ReducerMode>().is_err());
    }
}
