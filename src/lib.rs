//! Downwelling microwave brightness temperature spectra.
//!
//! A radiosonde profile is cut to an altitude window, and for each frequency
//! of a grid the downwelling brightness temperature is found by numerically
//! integrating the radiative transfer equation with one of three quadrature
//! rules. The frequencies are solved in parallel and merged into a spectrum
//! sorted by frequency.
//!
//! NOTE: the real work happens in plain Rust modules. The Python interface
//! lives in `python` and is only built with the `python` feature.

pub mod artifacts;
pub mod attenuation;
pub mod config;
pub mod database;
pub(crate) mod error;
pub mod humidity;
pub mod profile;
pub mod progress;
pub mod quadrature;
pub mod rtm;
pub mod spectrum;
pub mod sweep;

#[cfg(feature = "python")]
mod python;

pub use artifacts::{read_spectrum, CsvResultFile, MemoryStore, ResultStore, RunArtifacts};
pub use attenuation::{AttenuationProvider, Species, StandardAttenuation};
pub use config::{ProfileSelection, RunConfig};
pub use database::{ProfileDatabase, ProfileKey, ProfileSource};
pub use error::RtmError;
pub use humidity::SaturationMethod;
pub use profile::{AtmosphericProfile, RawProfile};
pub use progress::{
    LogProgress, NoProgress, ProgressChannel, ProgressFile, ProgressReporter, ProgressSink,
    ProgressStatus, ProgressUpdate, ProgressWatcher,
};
pub use quadrature::Method;
pub use rtm::{DownwellingRtm, RtmParameters, COSMIC_BACKGROUND};
pub use spectrum::{FrequencyGrid, Spectrum, SpectrumSample};
pub use sweep::{run, Sweep};
