//! Frequency grids and brightness temperature spectra.

use serde::{Deserialize, Serialize};

use crate::error::RtmError;

/// Slack when deciding whether `nu_stop` is still on the grid, in steps.
const GRID_TOLERANCE: f64 = 1e-9;

/// Largest number of frequencies a grid may hold.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Frequencies in GHz from `start` to `stop` inclusive, `step` apart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrequencyGrid(Vec<f64>);

impl FrequencyGrid {
    /// Build the arithmetic progression `start, start + step, ...` up to and
    /// including `stop`. It is empty when `start > stop`.
    ///
    /// Each frequency is computed as `start + i * step` so rounding errors
    /// don't accumulate along the grid.
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self, RtmError> {
        if !(step > 0. && step.is_finite()) {
            return Err(RtmError::InvalidConfig(format!(
                "frequency step must be positive, got {step}"
            )));
        }
        if !start.is_finite() || !stop.is_finite() {
            return Err(RtmError::InvalidConfig(
                "frequency bounds must be finite".to_string(),
            ));
        }
        if start > stop {
            return Ok(Self::default());
        }

        let num_steps = ((stop - start) / step + GRID_TOLERANCE).floor();
        if !(num_steps < MAX_GRID_POINTS as f64) {
            return Err(RtmError::InvalidConfig(format!(
                "frequency grid from {start} to {stop} GHz by {step} has more than \
                 {MAX_GRID_POINTS} points"
            )));
        }
        let num_steps = num_steps as usize;
        Ok(Self(
            (0..=num_steps).map(|i| start + i as f64 * step).collect(),
        ))
    }

    /// Number of frequencies.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no frequencies.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The frequencies in GHz, ascending.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Brightness temperature at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSample {
    /// Frequency in GHz
    #[serde(rename = "frequency_ghz")]
    pub frequency: f64,
    /// Downwelling brightness temperature in K
    #[serde(rename = "brightness_temperature_k")]
    pub brightness_temperature: f64,
}

/// Brightness temperatures sorted by ascending frequency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum(Vec<SpectrumSample>);

impl Spectrum {
    /// Sort samples that arrived in any order.
    pub fn from_unordered(mut samples: Vec<SpectrumSample>) -> Self {
        samples.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
        Self(samples)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The samples, by ascending frequency.
    pub fn samples(&self) -> &[SpectrumSample] {
        &self.0
    }

    /// Frequencies in GHz.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|s| s.frequency)
    }

    /// Brightness temperatures in K.
    pub fn brightness_temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|s| s.brightness_temperature)
    }

    /// Encode as CSV with a header row.
    pub fn to_csv(&self) -> Result<Vec<u8>, RtmError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for sample in &self.0 {
            writer.serialize(sample)?;
        }
        writer
            .into_inner()
            .map_err(|e| RtmError::Io(e.into_error()))
    }

    /// Decode CSV written by [`Spectrum::to_csv`].
    pub fn from_csv<R: std::io::Read>(reader: R) -> Result<Self, RtmError> {
        let samples = csv::Reader::from_reader(reader)
            .deserialize()
            .collect::<Result<Vec<SpectrumSample>, _>>()?;
        Ok(Self::from_unordered(samples))
    }
}
