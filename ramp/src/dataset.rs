use crate::defaults::{LATENCY_DATASET_FILE, SUCCESS_DATASET_FILE};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Share of all requests at `rate` that succeeded within the bucket
/// starting at `boundary_ns`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramRow {
    pub rate: f64,
    pub boundary_ns: u64,
    pub fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuccessRow {
    pub rate: f64,
    pub success_ratio: f64,
}

/// Reduced outcome of one rate step.
#[derive(Debug, Clone, PartialEq)]
pub struct RateProfile {
    pub rate: f64,
    pub rows: Vec<HistogramRow>,
    pub success_ratio: f64,
    pub requests: u64,
}

impl RateProfile {
    pub fn success_row(&self) -> SuccessRow {
        SuccessRow {
            rate: self.rate,
            success_ratio: self.success_ratio,
        }
    }

    /// Bucket holding the largest share of successful requests.
    pub fn modal_row(&self) -> Option<&HistogramRow> {
        self.rows
            .iter()
            .max_by(|a, b| a.fraction.total_cmp(&b.fraction))
    }
}

/// Writes the two gnuplot-ready dataset files.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    latency_path: PathBuf,
    success_path: PathBuf,
}

impl DatasetWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            latency_path: output_dir.join(LATENCY_DATASET_FILE),
            success_path: output_dir.join(SUCCESS_DATASET_FILE),
        }
    }

    pub fn latency_path(&self) -> &Path {
        &self.latency_path
    }

    pub fn success_path(&self) -> &Path {
        &self.success_path
    }

    /// One `rate latency fraction` line per bucket, and a blank line after
    /// each rate so gnuplot treats every rate as its own curve segment.
    pub fn write_latency_dataset(&self, profiles: &[RateProfile]) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.latency_path)?);
        for profile in profiles {
            for row in &profile.rows {
                writeln!(
                    out,
                    "{} {} {}",
                    format_number(row.rate),
                    format_number(row.boundary_ns as f64),
                    format_number(row.fraction)
                )?;
            }
            writeln!(out)?;
        }
        out.flush()
    }

    pub fn write_success_dataset(&self, profiles: &[RateProfile]) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.success_path)?);
        for row in profiles.iter().map(RateProfile::success_row) {
            writeln!(
                out,
                "{} {}",
                format_number(row.rate),
                format_number(row.success_ratio)
            )?;
        }
        out.flush()
    }

    pub fn write(&self, profiles: &[RateProfile]) -> io::Result<()> {
        self.write_latency_dataset(profiles)?;
        self.write_success_dataset(profiles)?;
        info!(
            "Wrote {} and {}",
            self.latency_path.display(),
            self.success_path.display()
        );
        Ok(())
    }
}

// Shortest round-trip form, keeping `.0` on integral values.
fn format_number(value: f64) -> String {
    format!("{value:?}")
}
