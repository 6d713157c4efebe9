use crate::config::RenderConfig;
use crate::dataset::RateProfile;
use crate::defaults::{DEFAULT_PLOT_FILE, HTML_CHART_FILE};
use crate::error::RampError;
use crate::executor::{Executor, Invocation};
use charming::component::{Axis, Legend, Title};
use charming::element::{AxisType, NameLocation, SplitLine, Tooltip, Trigger};
use charming::series::{Line, Scatter};
use charming::theme::Theme;
use charming::{Chart, HtmlRenderer};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

const BUNDLED_PLOT: &str = include_str!("../assets/ramp-requests.plt");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Image,
    Display,
    Html,
}

impl RenderStage {
    pub fn name(&self) -> &'static str {
        match self {
            RenderStage::Image => "image",
            RenderStage::Display => "display",
            RenderStage::Html => "html",
        }
    }
}

/// Hands the written datasets to gnuplot, and optionally draws an HTML chart.
/// Nothing here is fatal: every failure is returned for reporting only.
pub struct Renderer {
    executor: Arc<dyn Executor>,
    config: RenderConfig,
    output_dir: PathBuf,
}

impl Renderer {
    pub fn new(executor: Arc<dyn Executor>, config: RenderConfig, output_dir: &Path) -> Self {
        Self {
            executor,
            config,
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub async fn render(&self, profiles: &[RateProfile]) -> Vec<RampError> {
        let mut failures = Vec::new();
        if !self.config.enabled {
            info!("Rendering disabled.");
            return failures;
        }

        if let Err(cause) = self.render_image().await {
            failures.push(render_failed(RenderStage::Image, cause));
        }
        if self.config.display {
            if let Err(cause) = self.render_display().await {
                failures.push(render_failed(RenderStage::Display, cause));
            }
        }
        if self.config.html_chart {
            if let Err(cause) = self.render_html(profiles) {
                failures.push(render_failed(RenderStage::Html, cause));
            }
        }

        for failure in &failures {
            error!("{failure}");
        }
        failures
    }

    async fn render_image(&self) -> Result<(), String> {
        let plot_file = self.plot_file()?;
        let invocation = Invocation::new(&self.config.gnuplot_path)
            .arg("-e")
            .arg(format!("set term png size {}", self.config.image_size))
            .arg(plot_file.to_string_lossy())
            .current_dir(&self.output_dir);
        let output = self
            .executor
            .execute(&invocation)
            .await
            .map_err(|error| error.to_string())?;

        let image_path = self.output_dir.join(&self.config.image_file);
        std::fs::write(&image_path, &output.stdout).map_err(|error| error.to_string())?;
        info!("Generated plot at: {}", image_path.display());
        Ok(())
    }

    async fn render_display(&self) -> Result<(), String> {
        let plot_file = self.plot_file()?;
        let invocation = Invocation::new(&self.config.gnuplot_path)
            .arg("-persist")
            .arg(plot_file.to_string_lossy())
            .current_dir(&self.output_dir);
        self.executor
            .execute(&invocation)
            .await
            .map(|_| ())
            .map_err(|error| error.to_string())
    }

    fn render_html(&self, profiles: &[RateProfile]) -> Result<(), String> {
        let render_start = Instant::now();
        let chart = create_profile_chart(profiles);
        let chart_path = self.output_dir.join(HTML_CHART_FILE);

        let mut renderer = HtmlRenderer::new("latency profile", 1600, 1200).theme(Theme::Dark);
        renderer
            .save(&chart, &chart_path)
            .map_err(|error| format!("Failed to save HTML plot: {error}"))?;

        info!(
            "Generated HTML chart at: {} ({} rates, chart render: {:.2?})",
            chart_path.display(),
            profiles.len(),
            render_start.elapsed()
        );
        Ok(())
    }

    // gnuplot runs inside the output directory, so a relative plot file is
    // resolved against the directory the sweep was started from.
    fn plot_file(&self) -> Result<PathBuf, String> {
        let current_dir = env::current_dir().map_err(|error| error.to_string())?;
        let plot_file = match &self.config.plot_file {
            Some(plot_file) => current_dir.join(plot_file),
            None => {
                let local = current_dir.join(DEFAULT_PLOT_FILE);
                if local.is_file() {
                    local
                } else {
                    self.write_bundled_plot()?
                }
            }
        };
        if !plot_file.is_file() {
            return Err(format!("plot file '{}' not found", plot_file.display()));
        }
        Ok(plot_file)
    }

    fn write_bundled_plot(&self) -> Result<PathBuf, String> {
        let plot_file = self.output_dir.join(DEFAULT_PLOT_FILE);
        std::fs::write(&plot_file, BUNDLED_PLOT)
            .map_err(|error| format!("cannot write '{}': {error}", plot_file.display()))?;
        debug!("Using bundled plot description: {}", plot_file.display());
        Ok(plot_file)
    }
}

fn render_failed(stage: RenderStage, cause: String) -> RampError {
    RampError::RenderFailed {
        stage: stage.name(),
        cause,
    }
}

/// Latency density as a scatter of `[rate, latency in µs]` for every bucket
/// holding successful requests, with the success ratio on a second axis.
pub fn create_profile_chart(profiles: &[RateProfile]) -> Chart {
    let density = profiles
        .iter()
        .flat_map(|profile| profile.rows.iter())
        .filter(|row| row.fraction > 0.0)
        .map(|row| {
            let latency_us = (row.boundary_ns as f64 / 1_000.0).max(0.001);
            vec![row.rate, latency_us, row.fraction]
        })
        .collect::<Vec<_>>();
    let success = profiles
        .iter()
        .map(|profile| vec![profile.rate, profile.success_ratio])
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Latency profile")
                .subtext(format!("{} rates", profiles.len()))
                .left("center"),
        )
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().top("bottom"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Log)
                .name("rate (req/s)")
                .name_location(NameLocation::Middle)
                .name_gap(30)
                .split_line(SplitLine::new().show(true)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Log)
                .name("latency (µs)")
                .position("left")
                .split_line(SplitLine::new().show(true)),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("success ratio")
                .position("right"),
        )
        .series(
            Scatter::new()
                .name("successful responses")
                .symbol_size(6.0)
                .data(density),
        )
        .series(
            Line::new()
                .name("success ratio")
                .data(success)
                .y_axis_index(1.0),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RampConfig;
    use crate::dataset::HistogramRow;
    use crate::error::ExecError;
    use crate::executor::CommandOutput;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;

    struct PlotExecutor {
        invocations: Mutex<Vec<Invocation>>,
        fail_display: bool,
    }

    #[async_trait]
    impl Executor for PlotExecutor {
        async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
            self.invocations.lock().unwrap().push(invocation.clone());
            let display = invocation.args.first().map(String::as_str) == Some("-persist");
            if display && self.fail_display {
                return Err(ExecError::NonZeroExit {
                    program: invocation.program.clone(),
                    status: "exit status: 1".into(),
                    stderr: "cannot open display".into(),
                });
            }
            Ok(CommandOutput {
                stdout: b"\x89PNG".to_vec(),
                stderr: Vec::new(),
            })
        }
    }

    fn setup(fail_display: bool) -> (tempfile::TempDir, RenderConfig, Arc<PlotExecutor>) {
        let directory = tempfile::tempdir().unwrap();
        let plot_file = directory.path().join("ramp-requests.plt");
        fs::write(&plot_file, "plot 'results_success.txt'\n").unwrap();
        let mut config = RampConfig::default().render;
        config.plot_file = Some(plot_file);
        let executor = Arc::new(PlotExecutor {
            invocations: Mutex::new(Vec::new()),
            fail_display,
        });
        (directory, config, executor)
    }

    #[tokio::test]
    async fn writes_png_then_opens_display() {
        let (directory, config, executor) = setup(false);
        let renderer = Renderer::new(executor.clone(), config, directory.path());

        let failures = renderer.render(&[]).await;

        assert!(failures.is_empty());
        assert_eq!(
            fs::read(directory.path().join("result.png")).unwrap(),
            b"\x89PNG"
        );
        let invocations = executor.invocations.lock().unwrap();
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].args[0], "-e");
        assert_eq!(invocations[0].args[1], "set term png size 1280, 800");
        assert_eq!(invocations[1].args[0], "-persist");
        assert_eq!(
            invocations[1].working_dir.as_deref(),
            Some(directory.path())
        );
    }

    #[tokio::test]
    async fn reports_failed_stage_without_stopping() {
        let (directory, config, executor) = setup(true);
        let renderer = Renderer::new(executor, config, directory.path());

        let failures = renderer.render(&[]).await;

        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0],
            RampError::RenderFailed {
                stage: "display",
                ..
            }
        ));
        assert!(directory.path().join("result.png").exists());
    }

    #[tokio::test]
    async fn missing_plot_file_fails_both_gnuplot_stages() {
        let (directory, mut config, executor) = setup(false);
        config.plot_file = Some(directory.path().join("missing.plt"));
        let renderer = Renderer::new(executor.clone(), config, directory.path());

        let failures = renderer.render(&[]).await;

        assert_eq!(failures.len(), 2);
        assert!(executor.invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_bundled_plot_description() {
        let (directory, mut config, executor) = setup(false);
        config.plot_file = None;
        config.display = false;
        let renderer = Renderer::new(executor.clone(), config, directory.path());

        assert!(renderer.render(&[]).await.is_empty());

        let bundled = directory.path().join("ramp-requests.plt");
        assert!(fs::read_to_string(&bundled)
            .unwrap()
            .contains("results_latency.txt"));
        let invocations = executor.invocations.lock().unwrap();
        assert_eq!(invocations[0].args[2], bundled.to_string_lossy());
    }

    #[tokio::test]
    async fn disabled_rendering_does_nothing() {
        let (directory, mut config, executor) = setup(false);
        config.enabled = false;
        let renderer = Renderer::new(executor.clone(), config, directory.path());

        assert!(renderer.render(&[]).await.is_empty());
        assert!(executor.invocations.lock().unwrap().is_empty());
    }

    #[test]
    fn chart_skips_empty_buckets() {
        let profile = RateProfile {
            rate: 1.0,
            rows: vec![
                HistogramRow {
                    rate: 1.0,
                    boundary_ns: 0,
                    fraction: 0.0,
                },
                HistogramRow {
                    rate: 1.0,
                    boundary_ns: 1_000,
                    fraction: 1.0,
                },
            ],
            success_ratio: 1.0,
            requests: 5,
        };
        let chart = create_profile_chart(&[profile]).to_string();
        assert!(chart.contains("successful responses"));
        assert!(chart.contains("success ratio"));
    }
}
