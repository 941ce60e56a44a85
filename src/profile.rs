//! Vertical atmospheric profiles.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::RtmError;
use crate::humidity::{absolute_humidity, SaturationMethod};

/// A radiosonde sounding as it was measured.
///
/// All four sequences are aligned and sorted by ascending altitude.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawProfile {
    /// Temperature in °C
    pub temperature: Vec<f64>,
    /// Pressure in hPa
    pub pressure: Vec<f64>,
    /// Relative humidity in %
    pub relative_humidity: Vec<f64>,
    /// Altitude in km
    pub altitude: Vec<f64>,
}

/// A profile restricted to an altitude window, ready for the RTM.
///
/// Every sequence has one value per height sample. The profile is immutable
/// once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphericProfile {
    /// Lower bound of the altitude window in km.
    h_start: f64,
    /// Temperature in °C
    temperature: Vec<f64>,
    /// Pressure in hPa
    pressure: Vec<f64>,
    /// Relative humidity in %
    relative_humidity: Vec<f64>,
    /// Altitude in km
    altitude: Vec<f64>,
    /// Absolute humidity in g/m³
    absolute_humidity: Vec<f64>,
    /// Thickness of the layer below each sample in km. The lowest sample's
    /// layer starts at `h_start`.
    layer_thickness: Vec<f64>,
}

impl AtmosphericProfile {
    /// Keep the samples with `h_start <= altitude <= h_stop` and derive the
    /// humidity and layer geometry.
    pub fn new(
        raw: &RawProfile,
        h_start: f64,
        h_stop: f64,
        saturation: SaturationMethod,
    ) -> Result<Self, RtmError> {
        let num_samples = raw.altitude.len();
        if [
            raw.temperature.len(),
            raw.pressure.len(),
            raw.relative_humidity.len(),
        ]
        .iter()
        .any(|&len| len != num_samples)
        {
            return Err(RtmError::InconsistentInputs);
        }
        if raw.altitude.windows(2).any(|w| w[0] > w[1]) {
            return Err(RtmError::UnsortedAltitude);
        }

        let keep: Vec<usize> = (0..num_samples)
            .filter(|&i| h_start <= raw.altitude[i] && raw.altitude[i] <= h_stop)
            .collect();
        if keep.is_empty() {
            return Err(RtmError::EmptyProfileRange { h_start, h_stop });
        }
        debug!(
            "kept {} of {num_samples} profile samples between {h_start} km and {h_stop} km",
            keep.len()
        );

        let select = |values: &[f64]| -> Vec<f64> { keep.iter().map(|&i| values[i]).collect() };
        let temperature = select(&raw.temperature);
        let pressure = select(&raw.pressure);
        let relative_humidity = select(&raw.relative_humidity);
        let altitude = select(&raw.altitude);

        let absolute_humidity = temperature
            .iter()
            .zip(&pressure)
            .zip(&relative_humidity)
            .map(|((&t, &p), &rel)| absolute_humidity(t, p, rel, saturation))
            .collect();

        let layer_thickness = std::iter::once(h_start)
            .chain(altitude.iter().copied())
            .zip(&altitude)
            .map(|(below, &above)| above - below)
            .collect();

        Ok(Self {
            h_start,
            temperature,
            pressure,
            relative_humidity,
            altitude,
            absolute_humidity,
            layer_thickness,
        })
    }

    /// Number of height samples. Never zero.
    pub fn len(&self) -> usize {
        self.altitude.len()
    }

    /// Always `false`; construction rejects empty windows.
    pub fn is_empty(&self) -> bool {
        self.altitude.is_empty()
    }

    /// Lower bound of the altitude window in km.
    pub fn h_start(&self) -> f64 {
        self.h_start
    }

    /// Temperature in °C.
    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    /// Pressure in hPa.
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    /// Relative humidity in %.
    pub fn relative_humidity(&self) -> &[f64] {
        &self.relative_humidity
    }

    /// Altitude in km.
    pub fn altitude(&self) -> &[f64] {
        &self.altitude
    }

    /// Absolute humidity in g/m³.
    pub fn absolute_humidity(&self) -> &[f64] {
        &self.absolute_humidity
    }

    /// Layer thickness in km.
    pub fn layer_thickness(&self) -> &[f64] {
        &self.layer_thickness
    }
}
