//! Python interface
//!
//! NOTE: this module is intended for the interface between Rust and Python.
//! The real work happens in the other modules, and they do not use `pyo3`,
//! its only used here.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use log::debug;
use numpy::{PyArray1, PyReadonlyArray1, ToPyArray};
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;

use crate::artifacts::{CsvResultFile, MemoryStore, ResultStore, RunArtifacts};
use crate::error::RtmError;
use crate::progress::{LogProgress, ProgressFile, ProgressSink};
use crate::{
    AtmosphericProfile, FrequencyGrid, Method, RawProfile, RtmParameters, SaturationMethod,
    Spectrum, StandardAttenuation, Sweep,
};

impl From<RtmError> for PyErr {
    fn from(e: RtmError) -> Self {
        match e {
            RtmError::Persist { .. } | RtmError::ProgressWrite { .. } | RtmError::Io(_) => {
                PyOSError::new_err(e.to_string())
            }
            _ => PyValueError::new_err(e.to_string()),
        }
    }
}

/// A brightness temperature spectrum.
///
/// Both arrays have one value per frequency, sorted by frequency.
#[pyclass]
#[derive(Debug)]
struct DownwellingSpectrum {
    spectrum: Spectrum,
}

/// Implement all the "getters" for the Python properties
#[pymethods]
impl DownwellingSpectrum {
    #[getter]
    fn frequency<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        let frequency: Vec<f64> = self.spectrum.frequencies().collect();
        frequency.to_pyarray(py)
    }

    #[getter]
    fn brightness_temperature<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        let tb: Vec<f64> = self.spectrum.brightness_temperatures().collect();
        tb.to_pyarray(py)
    }

    fn __len__(&self) -> usize {
        self.spectrum.len()
    }
}

/// Compute the downwelling brightness temperature spectrum.
///
/// The profile inputs are 1d numpy arrays of the same length, sorted by
/// altitude:
///
/// `temperature`: temperature in °C
///
/// `pressure`: pressure in hPa
///
/// `relative_humidity`: relative humidity in %
///
/// `altitude`: altitude in km
///
/// Only samples with `h_start <= altitude <= h_stop` are used. Frequencies
/// run from `nu_start` to `nu_stop` GHz inclusive, `nu_step` apart, and
/// `theta` is the viewing angle from zenith in degrees.
///
/// If `output_dir` is given, the spectrum and the progress percentage are
/// also written there as the files `results` and `progress`.
///
/// The number of worker threads is controlled by `num_threads`. It must be a
/// positive integer, or `None` to automatically choose the number of threads.
#[pyfunction]
#[pyo3(signature = (temperature, pressure, relative_humidity, altitude, h_start, h_stop, nu_start, nu_stop, nu_step, theta, oxygen_model="liebe1992", water_vapor_model="rosenkranz1998", integration_method="boole", humidity_method="wmo2008", relic_background=true, output_dir=None, num_threads=None))]
#[allow(clippy::too_many_arguments)]
fn compute_spectrum(
    py: Python<'_>,
    temperature: PyReadonlyArray1<'_, f64>,
    pressure: PyReadonlyArray1<'_, f64>,
    relative_humidity: PyReadonlyArray1<'_, f64>,
    altitude: PyReadonlyArray1<'_, f64>,
    h_start: f64,
    h_stop: f64,
    nu_start: f64,
    nu_stop: f64,
    nu_step: f64,
    theta: f64,
    oxygen_model: &str,
    water_vapor_model: &str,
    integration_method: &str,
    humidity_method: &str,
    relic_background: bool,
    output_dir: Option<PathBuf>,
    num_threads: Option<usize>,
) -> PyResult<DownwellingSpectrum> {
    let raw = RawProfile {
        temperature: temperature.as_slice()?.to_vec(),
        pressure: pressure.as_slice()?.to_vec(),
        relative_humidity: relative_humidity.as_slice()?.to_vec(),
        altitude: altitude.as_slice()?.to_vec(),
    };
    let profile = AtmosphericProfile::new(
        &raw,
        h_start,
        h_stop,
        SaturationMethod::from_name(humidity_method),
    )?;
    debug!("profile has {} heights", profile.len());

    let parameters = RtmParameters {
        oxygen_model: oxygen_model.to_string(),
        water_vapor_model: water_vapor_model.to_string(),
        method: Method::from_name(integration_method),
        theta,
        relic_background,
    };
    let grid = FrequencyGrid::new(nu_start, nu_stop, nu_step)?;

    let mut sweep = Sweep::new(&profile, &parameters, &StandardAttenuation, grid);
    if let Some(num_threads) = num_threads {
        let num_threads = NonZeroUsize::new(num_threads)
            .ok_or_else(|| PyValueError::new_err("num_threads must be positive"))?;
        sweep = sweep.workers(num_threads);
    }

    let (mut store, mut progress): (Box<dyn ResultStore + Send>, Box<dyn ProgressSink + Send>) =
        match output_dir {
            Some(dir) => {
                let artifacts = RunArtifacts::create(dir)?;
                artifacts.clear()?;
                (
                    Box::new(CsvResultFile::new(artifacts.results_path())),
                    Box::new(ProgressFile::new(artifacts.progress_path())),
                )
            }
            None => (Box::new(MemoryStore::default()), Box::new(LogProgress)),
        };

    // The sweep doesn't touch any Python objects, so let other Python
    // threads run meanwhile
    let spectrum = py.allow_threads(|| sweep.run(store.as_mut(), progress.as_mut()))?;

    Ok(DownwellingSpectrum { spectrum })
}

/// A Python module implemented in Rust.
#[pymodule]
fn downwelling_rtm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_function(wrap_pyfunction!(compute_spectrum, m)?)?;
    m.add_class::<DownwellingSpectrum>()?;
    Ok(())
}
