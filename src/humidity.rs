//! Water vapor humidity conversions.
//!
//! Temperatures are in °C, pressures in hPa, absolute humidity (water vapor
//! density) in g/m³ and relative humidity in %.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

/// Ratio of the specific gas constant for water vapor scaled to g/m³ and hPa.
const VAPOR_SCALE: f64 = 216.7;

/// Approximation used for the saturation vapor pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SaturationMethod {
    /// WMO 2008 (CIMO guide) Magnus form
    #[default]
    Wmo2008,
    /// August-Roche-Magnus
    AugustRocheMagnus,
    /// Tetens
    Tetens,
    /// August
    August,
    /// Buck, with separate coefficients over water and over ice
    Buck,
}

impl SaturationMethod {
    /// Every approximation.
    pub const ALL: [SaturationMethod; 5] = [
        SaturationMethod::Wmo2008,
        SaturationMethod::AugustRocheMagnus,
        SaturationMethod::Tetens,
        SaturationMethod::August,
        SaturationMethod::Buck,
    ];

    /// Look up an approximation by name, falling back to WMO 2008.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "wmo2008" => SaturationMethod::Wmo2008,
            "august-roche-magnus" => SaturationMethod::AugustRocheMagnus,
            "tetens" => SaturationMethod::Tetens,
            "august" => SaturationMethod::August,
            "buck" => SaturationMethod::Buck,
            other => {
                warn!("unknown saturation pressure method {other:?}, using wmo2008");
                SaturationMethod::Wmo2008
            }
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            SaturationMethod::Wmo2008 => "wmo2008",
            SaturationMethod::AugustRocheMagnus => "august-roche-magnus",
            SaturationMethod::Tetens => "tetens",
            SaturationMethod::August => "august",
            SaturationMethod::Buck => "buck",
        }
    }
}

impl fmt::Display for SaturationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for SaturationMethod {
    fn from(name: String) -> Self {
        SaturationMethod::from_name(&name)
    }
}

impl From<SaturationMethod> for String {
    fn from(method: SaturationMethod) -> Self {
        method.name().to_string()
    }
}

/// Saturation vapor pressure in hPa.
///
/// Without a total pressure `p` this is the value over a flat surface of pure
/// water; with it, the moist-air enhancement factor is applied.
pub fn saturation_pressure(t: f64, p: Option<f64>, method: SaturationMethod) -> f64 {
    let e = match method {
        SaturationMethod::AugustRocheMagnus => 0.61094 * f64::exp(17.625 * t / (243.04 + t)) * 10.,
        SaturationMethod::Tetens => 0.61078 * f64::exp(17.27 * t / (t + 237.3)) * 10.,
        SaturationMethod::August => f64::exp(20.386 - 5132. / (t + 273.15)) * 1.333,
        SaturationMethod::Buck => {
            if t > 0. {
                6.1121 * f64::exp((18.678 - t / 234.5) * (t / (257.14 + t)))
            } else {
                6.1115 * f64::exp((23.036 - t / 333.7) * (t / (279.82 + t)))
            }
        }
        SaturationMethod::Wmo2008 => 6.112 * f64::exp(17.62 * t / (243.12 + t)),
    };
    match p {
        Some(p) => (1.0016 + 3.15e-6 * p - 0.074 / p) * e,
        None => e,
    }
}

/// Partial pressure of water vapor in hPa from the vapor density.
pub fn vapor_pressure(t: f64, rho: f64) -> f64 {
    rho * (t + 273.15) / VAPOR_SCALE
}

/// Absolute humidity in g/m³ from the relative humidity.
pub fn absolute_humidity(t: f64, p: f64, rel: f64, method: SaturationMethod) -> f64 {
    (rel / 100.) * VAPOR_SCALE * saturation_pressure(t, Some(p), method) / (t + 273.15)
}

/// Relative humidity in % from the absolute humidity.
pub fn relative_humidity(t: f64, p: f64, rho: f64, method: SaturationMethod) -> f64 {
    vapor_pressure(t, rho) / saturation_pressure(t, Some(p), method) * 100.
}
