use crate::cache::{ArtifactStore, RunCache};
use crate::config::RampConfig;
use crate::dataset::{DatasetWriter, RateProfile};
use crate::driver::LoadDriver;
use crate::duration::RampDuration;
use crate::error::RampError;
use crate::executor::Executor;
use crate::ladder::{BucketSchema, RateLadder};
use crate::reducer::ResultReducer;
use crate::render::Renderer;
use crate::summary::SweepSummary;
use crate::target::Target;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Stages of one sweep, in the order they are entered.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepStage {
    Init,
    CheckCache { rate: f64 },
    RunLoad { rate: f64 },
    Reduce { rate: f64 },
    WriteDatasets,
    Render,
    Done,
    Failed { reason: String },
}

impl Display for SweepStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepStage::Init => write!(f, "init"),
            SweepStage::CheckCache { rate } => write!(f, "check cache at {rate}/s"),
            SweepStage::RunLoad { rate } => write!(f, "run load at {rate}/s"),
            SweepStage::Reduce { rate } => write!(f, "reduce at {rate}/s"),
            SweepStage::WriteDatasets => write!(f, "write datasets"),
            SweepStage::Render => write!(f, "render"),
            SweepStage::Done => write!(f, "done"),
            SweepStage::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// What a finished sweep produced.
#[derive(Debug)]
pub struct SweepOutcome {
    pub profiles: Vec<RateProfile>,
    pub attacks: usize,
    pub render_failures: Vec<RampError>,
}

/// Runs the rate ladder: attacks every uncached rate, reduces every artifact,
/// writes both datasets and renders them.
pub struct Sweep {
    target: Target,
    ladder: RateLadder,
    schema: BucketSchema,
    duration: RampDuration,
    cache: Arc<RunCache>,
    driver: LoadDriver,
    reducer: ResultReducer,
    writer: DatasetWriter,
    renderer: Renderer,
    interrupted: Arc<AtomicBool>,
    stage: SweepStage,
}

impl Sweep {
    pub fn new(
        config: &RampConfig,
        target: Target,
        executor: Arc<dyn Executor>,
        store: Arc<dyn ArtifactStore>,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self, RampError> {
        config.validate()?;
        let cache = Arc::new(RunCache::new(store));
        Ok(Self {
            target,
            ladder: config.rate_ladder()?,
            schema: config.bucket_schema()?,
            duration: config.attack.duration,
            driver: LoadDriver::new(
                executor.clone(),
                cache.clone(),
                &config.attack.vegeta_path,
                config.attack.cooldown,
                config.attack.extra_args.clone(),
                interrupted.clone(),
            ),
            reducer: ResultReducer::new(
                executor.clone(),
                &config.attack.vegeta_path,
                config.reducer.mode,
            ),
            writer: DatasetWriter::new(&config.output_dir),
            renderer: Renderer::new(executor, config.render.clone(), &config.output_dir),
            cache,
            interrupted,
            stage: SweepStage::Init,
        })
    }

    pub fn stage(&self) -> &SweepStage {
        &self.stage
    }

    pub async fn run(&mut self) -> Result<SweepOutcome, RampError> {
        match self.execute().await {
            Ok(outcome) => {
                self.enter(SweepStage::Done);
                Ok(outcome)
            }
            Err(error) => {
                // vegeta receives the same SIGINT and fails the running attack.
                let error = if self.interrupted.load(Ordering::SeqCst) {
                    RampError::Interrupted
                } else {
                    error
                };
                self.enter(SweepStage::Failed {
                    reason: error.to_string(),
                });
                error!("Sweep failed: {error}");
                Err(error)
            }
        }
    }

    async fn execute(&mut self) -> Result<SweepOutcome, RampError> {
        let started = Instant::now();
        info!(
            "Starting sweep of {} rates ({} to {}/s) against: {}",
            self.ladder.len(),
            self.ladder.rates().first().copied().unwrap_or_default(),
            self.ladder.rates().last().copied().unwrap_or_default(),
            self.target
        );

        let attacks = self.attack_uncached().await?;
        let profiles = self.reduce_all().await?;

        self.enter(SweepStage::WriteDatasets);
        self.writer.write(&profiles)?;
        SweepSummary::new(&profiles, started.elapsed(), attacks).print();

        self.enter(SweepStage::Render);
        let render_failures = self.renderer.render(&profiles).await;

        Ok(SweepOutcome {
            profiles,
            attacks,
            render_failures,
        })
    }

    async fn attack_uncached(&mut self) -> Result<usize, RampError> {
        let rates = self.ladder.rates().to_vec();
        let mut attacks = 0;
        for rate in rates {
            if self.interrupted.load(Ordering::SeqCst) {
                info!("Interrupted before rate {rate}/s, completed artifacts stay cached.");
                return Err(RampError::Interrupted);
            }

            self.enter(SweepStage::CheckCache { rate });
            if self.cache.exists(rate) {
                info!(
                    "Skipping rate {rate}/s, found {}",
                    self.cache.artifact_path(rate).display()
                );
                continue;
            }

            self.enter(SweepStage::RunLoad { rate });
            self.driver.run(&self.target, rate, self.duration).await?;
            attacks += 1;
        }
        Ok(attacks)
    }

    async fn reduce_all(&mut self) -> Result<Vec<RateProfile>, RampError> {
        let rates = self.ladder.rates().to_vec();
        let mut profiles = Vec::with_capacity(rates.len());
        for rate in rates {
            self.enter(SweepStage::Reduce { rate });
            let artifact_path = self.cache.artifact_path(rate);
            let profile = self
                .reducer
                .reduce(rate, &artifact_path, &self.schema)
                .await?;
            profiles.push(profile);
        }
        Ok(profiles)
    }

    fn enter(&mut self, stage: SweepStage) {
        debug!("Sweep stage: {stage}");
        self.stage = stage;
    }
}
