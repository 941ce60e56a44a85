//! Downwelling radiative transfer for a single frequency.
//!
//! The brightness temperature seen from the bottom of the profile looking up
//! is the Schwarzschild integral
//!
//! ```text
//! Tb(ν) = ∫ T(h) γ(h) exp(-τ(h)) dh + T_cmb exp(-τ_total)
//! ```
//!
//! where `γ` is the total absorption coefficient along the slant path and
//! `τ(h)` is the optical depth from the bottom of the profile up to `h`. Both
//! the outer integral and every `τ(h)` use the same quadrature rule.


use log::debug;
use smallvec::SmallVec;

use crate::attenuation::{AttenuationProvider, Species};
use crate::error::RtmError;
use crate::profile::AtmosphericProfile;
use crate::quadrature::Method;
use crate::spectrum::SpectrumSample;

/// Temperature of the cosmic microwave background in K.
pub const COSMIC_BACKGROUND: f64 = 2.72548;

/// Offset between °C and K.
const ZERO_CELSIUS: f64 = 273.15;

/// Input parameters for the RTM that are constant over a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RtmParameters {
    /// Name of the oxygen absorption model
    pub oxygen_model: String,
    /// Name of the water vapor absorption model
    pub water_vapor_model: String,
    /// Quadrature rule for every integral
    pub method: Method,
    /// Viewing angle from zenith in degrees
    pub theta: f64,
    /// Whether to add the attenuated cosmic background
    pub relic_background: bool,
}

impl RtmParameters {
    /// Path length factor `1 / cos(theta)`.
    pub fn secant(&self) -> f64 {
        1. / self.theta.to_radians().cos()
    }
}

/// The RTM for one profile, ready to be run at any frequency.
///
/// This only borrows its inputs, so it can be shared by many threads.
#[derive(Clone, Copy)]
pub struct DownwellingRtm<'a> {
    profile: &'a AtmosphericProfile,
    parameters: &'a RtmParameters,
    provider: &'a dyn AttenuationProvider,
}

impl std::fmt::Debug for DownwellingRtm<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownwellingRtm")
            .field("profile", self.profile)
            .field("parameters", self.parameters)
            .finish_non_exhaustive()
    }
}

impl<'a> DownwellingRtm<'a> {
    /// Combine a profile with the RTM parameters and absorption models.
    pub fn new(
        profile: &'a AtmosphericProfile,
        parameters: &'a RtmParameters,
        provider: &'a dyn AttenuationProvider,
    ) -> Self {
        Self {
            profile,
            parameters,
            provider,
        }
    }

    /// Total slant-path absorption coefficient in Np/km at every height.
    pub fn absorption(&self, frequency: f64) -> Result<SmallVec<[f64; 64]>, RtmError> {
        let profile = self.profile;
        let gamma = |species, model: &str| {
            self.provider.attenuate(
                species,
                model,
                frequency,
                profile.temperature(),
                profile.pressure(),
                profile.absolute_humidity(),
            )
        };
        let oxygen = gamma(Species::Oxygen, &self.parameters.oxygen_model)?;
        let water_vapor = gamma(Species::WaterVapor, &self.parameters.water_vapor_model)?;
        if oxygen.len() != profile.len() || water_vapor.len() != profile.len() {
            return Err(RtmError::InconsistentInputs);
        }

        let secant = self.parameters.secant();
        Ok(oxygen
            .iter()
            .zip(&water_vapor)
            .map(|(o2, h2o)| secant * (o2 + h2o))
            .collect())
    }

    /// Optical depth of the whole profile along the slant path.
    pub fn total_optical_depth(&self, frequency: f64) -> Result<f64, RtmError> {
        let g = self.absorption(frequency)?;
        let top = self.top_index()?;
        Ok(self
            .parameters
            .method
            .integrate(g.as_slice(), 0, top, self.profile.layer_thickness()))
    }

    /// Compute the downwelling brightness temperature at `frequency` GHz.
    ///
    /// Every height's optical depth is integrated independently from the
    /// bottom of the profile, so this is quadratic in the number of heights.
    pub fn run(&self, frequency: f64) -> Result<SpectrumSample, RtmError> {
        let top = self.top_index()?;
        let method = self.parameters.method;
        let dh = self.profile.layer_thickness();

        let g = self.absorption(frequency)?;
        let t_kelvin: SmallVec<[f64; 64]> = self
            .profile
            .temperature()
            .iter()
            .map(|t| t + ZERO_CELSIUS)
            .collect();

        let emission = method.integrate_callable(
            |h| {
                let tau = method.integrate(g.as_slice(), 0, h, dh);
                t_kelvin[h] * g[h] * f64::exp(-tau)
            },
            0,
            top,
            dh,
        );

        let background = if self.parameters.relic_background {
            let tau = method.integrate(g.as_slice(), 0, top, dh);
            COSMIC_BACKGROUND * f64::exp(-tau)
        } else {
            0.
        };

        let brightness_temperature = emission + background;
        if !brightness_temperature.is_finite() {
            return Err(RtmError::NonFinite { frequency });
        }
        debug!("{frequency} GHz: {brightness_temperature} K");

        Ok(SpectrumSample {
            frequency,
            brightness_temperature,
        })
    }

    /// Index of the highest height sample.
    fn top_index(&self) -> Result<usize, RtmError> {
        self.profile
            .len()
            .checked_sub(1)
            .ok_or(RtmError::InconsistentInputs)
    }
}
