use crate::ladder::truncate;
use std::fmt::{Display, Formatter};
use std::io::Read;
use thiserror::Error;

const ARTIFACT_PREFIX: &str = "results_";
const ARTIFACT_EXTENSION: &str = "bin";

/// Deterministic name of the raw result artifact for one rate: the rate in
/// requests per 1000 seconds, truncated to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey(u64);

impl ArtifactKey {
    pub fn from_rate(rate: f64) -> Self {
        Self(truncate(rate * 1000.0))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn file_name(&self) -> String {
        format!("{ARTIFACT_PREFIX}{}.{ARTIFACT_EXTENSION}", self.0)
    }

    /// Rate argument understood by `vegeta attack -rate`.
    pub fn attack_rate(&self) -> String {
        format!("{}/1000s", self.0)
    }
}

impl Display for ArtifactKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one request recorded by the load generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEntry {
    pub latency_ns: u64,
    pub success: bool,
}

impl ResultEntry {
    pub fn new(latency_ns: u64, success: bool) -> Self {
        Self {
            latency_ns,
            success,
        }
    }

    pub fn from_status(latency_ns: u64, status_code: u16) -> Self {
        Self::new(latency_ns, (200..400).contains(&status_code))
    }
}

/// Every request issued during one load generation run at one rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResultArtifact {
    rate: f64,
    entries: Vec<ResultEntry>,
}

// Columns of `vegeta encode --to csv`; the rest of the record is ignored.
const CODE_COLUMN: usize = 1;
const LATENCY_COLUMN: usize = 2;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("record {record}: invalid {column} '{value}'")]
    InvalidField {
        record: usize,
        column: &'static str,
        value: String,
    },
}

impl RawResultArtifact {
    pub fn new(rate: f64, entries: Vec<ResultEntry>) -> Self {
        Self { rate, entries }
    }

    /// Decodes the CSV form of a vegeta result stream.
    pub fn from_csv<R: Read>(rate: f64, reader: R) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let code = parse_field(&record, index, CODE_COLUMN, "status code")?;
            let latency_ns = parse_field(&record, index, LATENCY_COLUMN, "latency")?;
            entries.push(ResultEntry::from_status(latency_ns, code));
        }
        Ok(Self::new(rate, entries))
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    column: usize,
    name: &'static str,
) -> Result<T, DecodeError> {
    let value = record.get(column).unwrap_or_default();
    value.parse().map_err(|_| DecodeError::InvalidField {
        record: index + 1,
        column: name,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1.0, 1000 ; "one per second")]
    #[test_case(1.2589254117941673, 1258 ; "one decibel up")]
    #[test_case(10f64.powf(0.1).powi(10), 10000 ; "drifted ten")]
    #[test_case(79432.82347242821, 79432823 ; "top of default ladder")]
    fn derives_key_from_rate(rate: f64, expected: u64) {
        assert_eq!(ArtifactKey::from_rate(rate).value(), expected);
    }

    #[test]
    fn names_artifact_after_key() {
        let key = ArtifactKey::from_rate(1.2589254117941673);
        assert_eq!(key.file_name(), "results_1258.bin");
        assert_eq!(key.attack_rate(), "1258/1000s");
    }

    #[test]
    fn decodes_vegeta_csv() {
        let csv = "\
1700000000000000000,200,1500,0,12,,aGVsbG8=,,0,GET,http://localhost:8080/
1700000000100000000,503,2500,0,0,503 Service Unavailable,,,1,GET,http://localhost:8080/
1700000000200000000,0,30000000000,0,0,timeout,,,2,GET,http://localhost:8080/
1700000000300000000,302,900,0,0,,,,3,GET,http://localhost:8080/
";
        let artifact = RawResultArtifact::from_csv(1.0, csv.as_bytes()).unwrap();

        assert_eq!(
            artifact.entries(),
            &[
                ResultEntry::new(1500, true),
                ResultEntry::new(2500, false),
                ResultEntry::new(30_000_000_000, false),
                ResultEntry::new(900, true),
            ]
        );
    }

    #[test]
    fn rejects_malformed_csv() {
        let csv = "1700000000000000000,abc,1500\n";
        let error = RawResultArtifact::from_csv(1.0, csv.as_bytes()).unwrap_err();
        assert_eq!(error.to_string(), "record 1: invalid status code 'abc'");

        let csv = "1700000000000000000,200\n";
        assert!(matches!(
            RawResultArtifact::from_csv(1.0, csv.as_bytes()),
            Err(DecodeError::InvalidField {
                column: "latency",
                ..
            })
        ));
    }
}
