use crate::config::{RampConfig, ReducerMode};
use crate::duration::RampDuration;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::str::FromStr;

const USAGE_EXAMPLE: &str = "Example:\n  echo GET http://localhost:8080/ | load-ramp";

/// Sweeps an HTTP target over a geometric ladder of request rates with vegeta
/// and plots the latency distribution of every rate with gnuplot.
///
/// The target is read from stdin (or --target-file) in vegeta's format.
#[derive(Parser, Debug)]
#[command(author, version, about, after_help = USAGE_EXAMPLE)]
#[command(disable_help_flag = true)]
pub struct RampArgs {
    /// Print help
    #[arg(short, long)]
    pub help: bool,

    /// Configuration file, defaults to $RAMP_CONFIG_PATH or ./ramp.toml when present
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read the target from this file instead of stdin
    #[arg(short, long)]
    pub target_file: Option<PathBuf>,

    /// Directory for artifacts, datasets and the rendered plot
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of rates in the ladder
    #[arg(short = 'n', long)]
    pub rates: Option<u32>,

    /// First rate of the ladder, in requests per second
    #[arg(short = 'b', long)]
    pub rate_base: Option<f64>,

    /// Attack duration per rate, e.g. 5s or 1m
    #[arg(short, long, value_parser = RampDuration::from_str)]
    pub duration: Option<RampDuration>,

    /// Pause after every attack, "0" disables it
    #[arg(long, value_parser = RampDuration::from_str)]
    pub cooldown: Option<RampDuration>,

    /// vegeta executable
    #[arg(long)]
    pub vegeta: Option<String>,

    /// How artifacts are reduced: report or decode
    #[arg(short, long, value_parser = ReducerMode::from_str)]
    pub reducer: Option<ReducerMode>,

    /// Write the datasets only, skip gnuplot
    #[arg(long)]
    pub no_render: bool,

    /// Write the PNG but do not open the interactive gnuplot window
    #[arg(long)]
    pub no_display: bool,

    /// Also write an interactive HTML chart
    #[arg(long)]
    pub html_chart: bool,

    /// Write a trace level log to this file
    #[arg(long)]
    pub debug: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl RampArgs {
    /// Command line values win over the configuration file and environment.
    pub fn apply(&self, config: &mut RampConfig) {
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(rates) = self.rates {
            config.ladder.count = rates;
        }
        if let Some(rate_base) = self.rate_base {
            config.ladder.base = rate_base;
        }
        if let Some(duration) = self.duration {
            config.attack.duration = duration;
        }
        if let Some(cooldown) = self.cooldown {
            config.attack.cooldown = cooldown;
        }
        if let Some(vegeta) = &self.vegeta {
            config.attack.vegeta_path = vegeta.clone();
        }
        if let Some(mode) = self.reducer {
            config.reducer.mode = mode;
        }
        if self.no_render {
            config.render.enabled = false;
        }
        if self.no_display {
            config.render.display = false;
        }
        if self.html_chart {
            config.render.html_chart = true;
        }
    }

    pub fn usage() -> String {
        RampArgs::command().render_help().to_string()
    }
}
