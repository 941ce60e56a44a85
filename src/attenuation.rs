//! Absorption coefficient providers.
//!
//! The radiative transfer solver doesn't know any gas physics itself. It asks
//! an [`AttenuationProvider`] for the absorption coefficient profile of each
//! species at a frequency, naming the model it wants. [`StandardAttenuation`]
//! is the built-in provider.

mod oxygen;
mod water_vapor;

use std::fmt;

use serde::{Deserialize, Serialize};

use self::{oxygen::liebe_1992, water_vapor::rosenkranz_1998};
use crate::error::RtmError;
use crate::humidity::vapor_pressure;

/// Scaling factor to convert from dB/km to Np/km: `0.1 * ln(10)`
const NEP_SCALE: f64 = 0.1 * std::f64::consts::LN_10;

/// An absorbing atmospheric constituent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Molecular oxygen
    Oxygen,
    /// Water vapor
    WaterVapor,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Oxygen => f.write_str("oxygen"),
            Species::WaterVapor => f.write_str("water vapor"),
        }
    }
}

/// Source of absorption coefficient profiles.
pub trait AttenuationProvider: Sync {
    /// Names of the models known for a species.
    fn models(&self, species: Species) -> &[&'static str];

    /// Absorption coefficient in Np/km at every height.
    ///
    /// `t` is the temperature in °C, `p` the pressure in hPa and `rho` the
    /// absolute humidity in g/m³; all three have one value per height.
    fn attenuate(
        &self,
        species: Species,
        model: &str,
        frequency: f64,
        t: &[f64],
        p: &[f64],
        rho: &[f64],
    ) -> Result<Vec<f64>, RtmError>;
}

/// Line-by-line models for oxygen and water vapor.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAttenuation;

impl StandardAttenuation {
    /// Oxygen models, by name.
    pub const OXYGEN_MODELS: [&'static str; 1] = ["liebe1992"];
    /// Water vapor models, by name.
    pub const WATER_VAPOR_MODELS: [&'static str; 1] = ["rosenkranz1998"];
}

impl AttenuationProvider for StandardAttenuation {
    fn models(&self, species: Species) -> &[&'static str] {
        match species {
            Species::Oxygen => &Self::OXYGEN_MODELS,
            Species::WaterVapor => &Self::WATER_VAPOR_MODELS,
        }
    }

    fn attenuate(
        &self,
        species: Species,
        model: &str,
        frequency: f64,
        t: &[f64],
        p: &[f64],
        rho: &[f64],
    ) -> Result<Vec<f64>, RtmError> {
        if t.len() != p.len() || t.len() != rho.len() {
            return Err(RtmError::InconsistentInputs);
        }

        // All models take temperature in K and vapor pressure in hPa
        let absorption: fn(f64, f64, f64, f64) -> f64 = match (species, model) {
            (Species::Oxygen, "liebe1992") => liebe_1992,
            (Species::WaterVapor, "rosenkranz1998") => rosenkranz_1998,
            _ => {
                return Err(RtmError::UnknownModel {
                    species,
                    model: model.to_string(),
                })
            }
        };

        Ok(t.iter()
            .zip(p)
            .zip(rho)
            .map(|((&t, &p), &rho)| {
                absorption(p, t + 273.15, vapor_pressure(t, rho), frequency) * NEP_SCALE
            })
            .collect())
    }
}
