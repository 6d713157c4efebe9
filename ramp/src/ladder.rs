use crate::artifact::ArtifactKey;
use crate::error::RampError;

/// Ordered sequence of request rates tested by one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLadder {
    rates: Vec<f64>,
}

impl RateLadder {
    /// Builds `rate[i] = base * ratio^i` for `i in 0..count`.
    ///
    /// Rejects ladders whose rates would share an artifact name, since the
    /// run cache could then not tell them apart.
    pub fn generate(count: u32, ratio: f64, base: f64) -> Result<Self, RampError> {
        let rates = log_space("rate ladder", count, ratio, base)?;
        if ArtifactKey::from_rate(rates[0]).value() == 0 {
            return Err(RampError::InvalidParameter(format!(
                "rate ladder base {base} is below the smallest addressable rate of 0.001/s"
            )));
        }
        for pair in rates.windows(2) {
            if ArtifactKey::from_rate(pair[0]) == ArtifactKey::from_rate(pair[1]) {
                return Err(RampError::InvalidParameter(format!(
                    "rates {} and {} map to the same artifact",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { rates })
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Latency bucket boundaries in whole nanoseconds, starting with 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSchema {
    boundaries: Vec<u64>,
}

impl BucketSchema {
    pub fn generate(count: u32, ratio: f64, base_ns: f64) -> Result<Self, RampError> {
        let points = log_space("bucket schema", count, ratio, base_ns)?;
        let mut boundaries = Vec::with_capacity(points.len() + 1);
        boundaries.push(0);
        boundaries.extend(points.iter().map(|&point| truncate(point)));

        for pair in boundaries.windows(2) {
            if pair[0] >= pair[1] {
                return Err(RampError::InvalidParameter(format!(
                    "bucket boundaries must strictly increase in whole ns, got {} then {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { boundaries })
    }

    pub fn boundaries(&self) -> &[u64] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Index of the half-open bucket `[b[i], b[i+1])` holding the latency.
    /// The last bucket has no upper bound.
    pub fn classify(&self, latency_ns: u64) -> usize {
        self.boundaries
            .partition_point(|&boundary| boundary <= latency_ns)
            .saturating_sub(1)
    }

    /// Renders the schema the way `vegeta report -buckets` expects it.
    pub fn literal(&self) -> String {
        let boundaries = self
            .boundaries
            .iter()
            .map(|boundary| format!("{boundary}ns"))
            .collect::<Vec<_>>()
            .join(",");
        format!("[{boundaries}]")
    }
}

/// Relative slack absorbing floating point drift such as
/// `9999.999999999998` for `10^4` before truncating to a whole number.
const TRUNCATION_TOLERANCE: f64 = 1e-12;

pub(crate) fn truncate(value: f64) -> u64 {
    (value * (1.0 + TRUNCATION_TOLERANCE)).trunc() as u64
}

fn log_space(name: &str, count: u32, ratio: f64, base: f64) -> Result<Vec<f64>, RampError> {
    if count == 0 {
        return Err(RampError::InvalidParameter(format!(
            "{name} needs at least one point"
        )));
    }
    if !ratio.is_finite() || ratio <= 1.0 {
        return Err(RampError::InvalidParameter(format!(
            "{name} ratio must be greater than 1, got {ratio}"
        )));
    }
    if !base.is_finite() || base <= 0.0 {
        return Err(RampError::InvalidParameter(format!(
            "{name} base must be positive, got {base}"
        )));
    }

    let points = (0..count)
        .map(|i| base * ratio.powi(i as i32))
        .collect::<Vec<_>>();
    if points.iter().any(|point| !point.is_finite()) {
        return Err(RampError::InvalidParameter(format!(
            "{name} overflows with {count} points of ratio {ratio}"
        )));
    }
    Ok(points)
}
