use std::path::PathBuf;

use thiserror::Error;

use crate::attenuation::Species;
use crate::quadrature::Method;

/// Possible RTM errors.
#[derive(Debug, Error)]
pub enum RtmError {
    /// Filtering the profile to the altitude window left no samples
    #[error("no profile samples between {h_start} km and {h_stop} km")]
    EmptyProfileRange {
        /// Lower altitude bound in km
        h_start: f64,
        /// Upper altitude bound in km
        h_stop: f64,
    },
    /// The inputs don't have the expected shape(s)
    #[error("inputs to RTM have the wrong shape")]
    InconsistentInputs,
    /// The altitude samples are not in ascending order
    #[error("profile altitudes are not sorted in ascending order")]
    UnsortedAltitude,
    /// The number of height intervals doesn't suit the quadrature rule
    #[error("{method} integration cannot span {intervals} height intervals")]
    IncompatibleSampleCount {
        /// The rule that was requested
        method: Method,
        /// Number of intervals (`upper - lower`) to integrate over
        intervals: usize,
    },
    /// The attenuation provider doesn't know the model
    #[error("unknown {species} attenuation model {model:?}")]
    UnknownModel {
        /// Absorbing species
        species: Species,
        /// Requested model name
        model: String,
    },
    /// A computed brightness temperature is NaN or infinite
    #[error("brightness temperature at {frequency} GHz is not finite")]
    NonFinite {
        /// Frequency in GHz
        frequency: f64,
    },
    /// A single frequency failed, which aborts the whole sweep
    #[error("solve failed at {frequency} GHz: {source}")]
    SolveFailure {
        /// Frequency in GHz
        frequency: f64,
        /// Underlying cause
        #[source]
        source: Box<RtmError>,
    },
    /// The run configuration is not usable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The requested profile is not in the database
    #[error("no profile for key {0}")]
    ProfileNotFound(String),
    /// The progress artifact could not be written repeatedly
    #[error("couldn't write progress to {path}: {source}")]
    ProgressWrite {
        /// Location of the progress artifact
        path: PathBuf,
        /// Last I/O error seen
        #[source]
        source: std::io::Error,
    },
    /// The result artifact could not be written
    #[error("couldn't persist spectrum to {path}: {source}")]
    Persist {
        /// Location of the result artifact
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },
    /// Reading or writing a CSV artifact failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Reading a JSON profile database failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading a TOML configuration failed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Plain I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RtmError {
    /// Wrap an error that happened while solving one frequency.
    pub(crate) fn solve_failure(frequency: f64, source: RtmError) -> Self {
        RtmError::SolveFailure {
            frequency,
            source: Box::new(source),
        }
    }
}
