use crate::artifact::ArtifactKey;
use crate::cache::RunCache;
use crate::duration::RampDuration;
use crate::error::RampError;
use crate::executor::{Executor, Invocation};
use crate::target::Target;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::info;

/// Drives `vegeta attack` at one rate and lets the target cool down afterwards.
pub struct LoadDriver {
    executor: Arc<dyn Executor>,
    cache: Arc<RunCache>,
    vegeta_path: String,
    cooldown: RampDuration,
    extra_args: Vec<String>,
    interrupted: Arc<AtomicBool>,
}

impl LoadDriver {
    pub fn new(
        executor: Arc<dyn Executor>,
        cache: Arc<RunCache>,
        vegeta_path: impl Into<String>,
        cooldown: RampDuration,
        extra_args: Vec<String>,
        interrupted: Arc<AtomicBool>,
    ) -> Self {
        Self {
            executor,
            cache,
            vegeta_path: vegeta_path.into(),
            cooldown,
            extra_args,
            interrupted,
        }
    }

    /// Runs one attack and returns the path of the artifact it wrote.
    ///
    /// An interrupt seen when vegeta returns discards the artifact, since a
    /// gracefully stopped attack is shorter than requested. One arriving
    /// during the cooldown keeps it.
    pub async fn run(
        &self,
        target: &Target,
        rate: f64,
        duration: RampDuration,
    ) -> Result<PathBuf, RampError> {
        let key = ArtifactKey::from_rate(rate);
        let artifact_path = self.cache.artifact_path(rate);
        let invocation = Invocation::new(&self.vegeta_path)
            .arg("attack")
            .arg("-duration")
            .arg(duration.as_go_duration())
            .arg("-rate")
            .arg(key.attack_rate())
            .arg("-output")
            .arg(artifact_path.to_string_lossy())
            .args(self.extra_args.iter().cloned())
            .stdin(format!("{}\n", target.as_str()));

        if let Err(error) = self.executor.execute(&invocation).await {
            self.cache.discard(rate);
            return Err(RampError::LoadGenerationFailed {
                rate,
                cause: error.to_string(),
            });
        }

        if self.interrupted.load(Ordering::SeqCst) {
            self.cache.discard(rate);
            return Err(RampError::Interrupted);
        }

        if !self.cache.exists(rate) {
            return Err(RampError::LoadGenerationFailed {
                rate,
                cause: format!("no artifact written at '{}'", artifact_path.display()),
            });
        }

        if !self.cooldown.is_zero() {
            info!("Cooling down for {}...", self.cooldown);
            sleep(self.cooldown.get_duration()).await;
        }
        Ok(artifact_path)
    }
}
