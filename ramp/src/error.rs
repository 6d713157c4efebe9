use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RampError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Cannot load configuration: {0}")]
    CannotLoadConfiguration(String),
    #[error("Load generation failed at rate {rate}/s: {cause}")]
    LoadGenerationFailed { rate: f64, cause: String },
    #[error("Report failed at rate {rate}/s: {cause}")]
    ReportFailed { rate: f64, cause: String },
    #[error("No requests recorded at rate {rate}/s")]
    EmptyArtifact { rate: f64 },
    #[error("Render stage '{stage}' failed: {cause}")]
    RenderFailed { stage: &'static str, cause: String },
    #[error("Sweep interrupted")]
    Interrupted,
    #[error("IO error")]
    Io(#[from] io::Error),
}

/// Failure of an external process invocation.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot write stdin of '{program}': {source}")]
    Stdin {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },
}

impl RampError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RampError::InvalidParameter(_) | RampError::CannotLoadConfiguration(_) => 3,
            RampError::InvalidTarget(_) => 1,
            RampError::Interrupted => 130,
            _ => 4,
        }
    }
}
