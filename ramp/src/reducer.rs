use crate::artifact::RawResultArtifact;
use crate::config::ReducerMode;
use crate::dataset::{HistogramRow, RateProfile};
use crate::error::RampError;
use crate::executor::{Executor, Invocation};
use crate::ladder::BucketSchema;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Request counts per bucket of a schema, plus the overall success ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    counts: Vec<u64>,
    success_ratio: f64,
}

/// The parts of `vegeta report -type=json` used here.
#[derive(Debug, Deserialize)]
pub struct JsonReport {
    pub success: f64,
    #[serde(default)]
    pub buckets: BTreeMap<String, u64>,
}

impl Histogram {
    pub fn from_artifact(artifact: &RawResultArtifact, schema: &BucketSchema) -> Self {
        let mut counts = vec![0u64; schema.len()];
        for entry in artifact.entries() {
            counts[schema.classify(entry.latency_ns)] += 1;
        }

        // Independent of the buckets: failures count against every bucket alike.
        let successes = artifact.entries().iter().filter(|e| e.success).count();
        let success_ratio = if artifact.is_empty() {
            0.0
        } else {
            successes as f64 / artifact.entries().len() as f64
        };

        Self {
            counts,
            success_ratio,
        }
    }

    /// Lays the report's bucket counts out in schema order. Boundaries the
    /// report does not mention count zero.
    pub fn from_report(report: &JsonReport, schema: &BucketSchema) -> Result<Self, String> {
        let mut counts = vec![0u64; schema.len()];
        for (boundary, &count) in &report.buckets {
            let boundary_ns = boundary
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("invalid bucket boundary '{boundary}'"))?;
            let index = schema
                .boundaries()
                .binary_search(&boundary_ns)
                .map_err(|_| format!("bucket {boundary_ns}ns is not part of the schema"))?;
            counts[index] = count;
        }

        if !(0.0..=1.0).contains(&report.success) {
            return Err(format!("success ratio {} is out of range", report.success));
        }

        Ok(Self {
            counts,
            success_ratio: report.success,
        })
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn success_ratio(&self) -> f64 {
        self.success_ratio
    }

    /// Turns counts into `count / total * success_ratio` rows, one per bucket.
    pub fn into_profile(self, rate: f64, schema: &BucketSchema) -> Result<RateProfile, RampError> {
        let total = self.total();
        if total == 0 {
            return Err(RampError::EmptyArtifact { rate });
        }

        let rows = schema
            .boundaries()
            .iter()
            .zip(&self.counts)
            .map(|(&boundary_ns, &count)| HistogramRow {
                rate,
                boundary_ns,
                fraction: count as f64 / total as f64 * self.success_ratio,
            })
            .collect();

        Ok(RateProfile {
            rate,
            rows,
            success_ratio: self.success_ratio,
            requests: total,
        })
    }
}

/// Histogram rows and success ratio of one artifact.
pub fn reduce(
    artifact: &RawResultArtifact,
    schema: &BucketSchema,
) -> Result<(Vec<HistogramRow>, f64), RampError> {
    let profile = Histogram::from_artifact(artifact, schema).into_profile(artifact.rate(), schema)?;
    Ok((profile.rows, profile.success_ratio))
}

/// Reduces artifacts on disk with the help of the vegeta CLI.
pub struct ResultReducer {
    executor: Arc<dyn Executor>,
    vegeta_path: String,
    mode: ReducerMode,
}

impl ResultReducer {
    pub fn new(
        executor: Arc<dyn Executor>,
        vegeta_path: impl Into<String>,
        mode: ReducerMode,
    ) -> Self {
        Self {
            executor,
            vegeta_path: vegeta_path.into(),
            mode,
        }
    }

    pub async fn reduce(
        &self,
        rate: f64,
        artifact_path: &Path,
        schema: &BucketSchema,
    ) -> Result<RateProfile, RampError> {
        let histogram = match self.mode {
            ReducerMode::Report => self.report(rate, artifact_path, schema).await?,
            ReducerMode::Decode => {
                let artifact = self.decode(rate, artifact_path).await?;
                Histogram::from_artifact(&artifact, schema)
            }
        };
        debug!(
            "Reduced rate {rate}/s: {} requests, success ratio {}",
            histogram.total(),
            histogram.success_ratio()
        );
        histogram.into_profile(rate, schema)
    }

    async fn report(
        &self,
        rate: f64,
        artifact_path: &Path,
        schema: &BucketSchema,
    ) -> Result<Histogram, RampError> {
        let invocation = Invocation::new(&self.vegeta_path)
            .arg("report")
            .arg("-type=json")
            .arg("-buckets")
            .arg(schema.literal())
            .arg(artifact_path.to_string_lossy());
        let output = self
            .executor
            .execute(&invocation)
            .await
            .map_err(|error| report_failed(rate, error))?;

        let report = serde_json::from_slice::<JsonReport>(&output.stdout)
            .map_err(|error| report_failed(rate, error))?;
        Histogram::from_report(&report, schema)
            .map_err(|cause| RampError::ReportFailed { rate, cause })
    }

    async fn decode(
        &self,
        rate: f64,
        artifact_path: &Path,
    ) -> Result<RawResultArtifact, RampError> {
        let invocation = Invocation::new(&self.vegeta_path)
            .arg("encode")
            .arg("--to")
            .arg("csv")
            .arg(artifact_path.to_string_lossy());
        let output = self
            .executor
            .execute(&invocation)
            .await
            .map_err(|error| report_failed(rate, error))?;

        RawResultArtifact::from_csv(rate, output.stdout.as_slice())
            .map_err(|error| report_failed(rate, error))
    }
}

fn report_failed(rate: f64, error: impl ToString) -> RampError {
    RampError::ReportFailed {
        rate,
        cause: error.to_string(),
    }
}
