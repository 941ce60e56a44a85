//! Run configuration.
//!
//! A run is described by a TOML file. Every field has a default, so an
//! empty file is a valid configuration apart from the profile selection.
//!
//! ```toml
//! oxygen_model = "liebe1992"
//! water_vapor_model = "rosenkranz1998"
//! integration_method = "boole"
//! h_start = 0.0
//! h_stop = 15.0
//! nu_start = 18.0
//! nu_stop = 27.2
//! nu_step = 0.1
//! theta = 51.0
//! relic_background = true
//! worker_count = 4
//! output_dir = ".tmp"
//!
//! [profile]
//! database = "radiosonde.json"
//! year = 2021
//! month = 7
//! day = 14
//! label = 0
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::attenuation::StandardAttenuation;
use crate::database::ProfileKey;
use crate::error::RtmError;
use crate::humidity::SaturationMethod;
use crate::profile::{AtmosphericProfile, RawProfile};
use crate::quadrature::Method;
use crate::rtm::RtmParameters;
use crate::spectrum::FrequencyGrid;

/// Which sounding to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSelection {
    /// Path of the JSON profile database
    pub database: PathBuf,
    /// Year of the sounding
    pub year: u16,
    /// Month of the sounding
    pub month: u8,
    /// Day of the sounding
    pub day: u8,
    /// Launch label within the day
    pub label: u32,
}

impl ProfileSelection {
    /// The database key of the selected sounding.
    pub fn key(&self) -> ProfileKey {
        ProfileKey {
            year: self.year,
            month: self.month,
            day: self.day,
            label: self.label,
        }
    }
}

/// Everything needed for one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Oxygen absorption model name
    pub oxygen_model: String,
    /// Water vapor absorption model name
    pub water_vapor_model: String,
    /// Quadrature rule; unknown names mean Boole
    pub integration_method: Method,
    /// Saturation vapor pressure approximation for the humidity conversion
    pub humidity_method: SaturationMethod,
    /// Bottom of the altitude window in km
    pub h_start: f64,
    /// Top of the altitude window in km
    pub h_stop: f64,
    /// First frequency in GHz
    pub nu_start: f64,
    /// Last frequency in GHz
    pub nu_stop: f64,
    /// Frequency step in GHz
    pub nu_step: f64,
    /// Viewing angle from zenith in degrees
    pub theta: f64,
    /// Whether to add the attenuated cosmic background
    pub relic_background: bool,
    /// Number of worker threads; one per CPU when omitted
    pub worker_count: Option<usize>,
    /// Reject height counts that don't suit the quadrature rule
    pub strict_sample_count: bool,
    /// Directory for the result and progress artifacts
    pub output_dir: PathBuf,
    /// Sounding to use
    pub profile: Option<ProfileSelection>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            oxygen_model: StandardAttenuation::OXYGEN_MODELS[0].to_string(),
            water_vapor_model: StandardAttenuation::WATER_VAPOR_MODELS[0].to_string(),
            integration_method: Method::Boole,
            humidity_method: SaturationMethod::Wmo2008,
            h_start: 0.,
            h_stop: 15.,
            nu_start: 18.0,
            nu_stop: 27.2,
            nu_step: 0.1,
            theta: 51.,
            relic_background: true,
            worker_count: None,
            strict_sample_count: true,
            output_dir: PathBuf::from(".tmp"),
            profile: None,
        }
    }
}

impl RunConfig {
    /// Parse a TOML configuration.
    pub fn from_toml(text: &str) -> Result<Self, RtmError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, RtmError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Check the values that can be checked without a profile.
    ///
    /// An inverted altitude window is left to the profile, which reports it
    /// as an empty range.
    pub fn validate(&self) -> Result<(), RtmError> {
        let invalid = |message: String| Err(RtmError::InvalidConfig(message));

        let finite = [
            ("h_start", self.h_start),
            ("h_stop", self.h_stop),
            ("nu_start", self.nu_start),
            ("nu_stop", self.nu_stop),
            ("nu_step", self.nu_step),
            ("theta", self.theta),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return invalid(format!("{name} must be finite, got {value}"));
        }
        if self.nu_step <= 0. {
            return invalid(format!("nu_step must be positive, got {}", self.nu_step));
        }
        if self.theta.abs() >= 90. {
            return invalid(format!(
                "theta must be within (-90, 90) degrees, got {}",
                self.theta
            ));
        }
        if self.worker_count == Some(0) {
            return invalid("worker_count must be at least 1".to_string());
        }
        Ok(())
    }

    /// The RTM parameters of this run.
    pub fn parameters(&self) -> Result<RtmParameters, RtmError> {
        self.validate()?;
        Ok(RtmParameters {
            oxygen_model: self.oxygen_model.clone(),
            water_vapor_model: self.water_vapor_model.clone(),
            method: self.integration_method,
            theta: self.theta,
            relic_background: self.relic_background,
        })
    }

    /// The frequency grid of this run.
    pub fn grid(&self) -> Result<FrequencyGrid, RtmError> {
        FrequencyGrid::new(self.nu_start, self.nu_stop, self.nu_step)
    }

    /// Cut `raw` to the altitude window of this run.
    pub fn profile(&self, raw: &RawProfile) -> Result<AtmosphericProfile, RtmError> {
        AtmosphericProfile::new(raw, self.h_start, self.h_stop, self.humidity_method)
    }

    /// Explicit worker count, if any.
    pub fn workers(&self) -> Option<NonZeroUsize> {
        self.worker_count.and_then(NonZeroUsize::new)
    }
}
