use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use downwelling_rtm::{
    read_spectrum, run, AtmosphericProfile, AttenuationProvider, DownwellingRtm, FrequencyGrid,
    MemoryStore, Method, NoProgress, ProgressChannel, ProgressSink, ProgressStatus, ProgressUpdate,
    ProgressWatcher, RawProfile, ResultStore, RtmError, RtmParameters, RunArtifacts, RunConfig,
    SaturationMethod, Species, StandardAttenuation, Sweep, COSMIC_BACKGROUND,
};

/// A mid-latitude summer-ish sounding every 500 m up to 12 km.
fn sounding() -> RawProfile {
    let altitude: Vec<f64> = (0..=24).map(|i| 0.5 * i as f64).collect();
    RawProfile {
        temperature: altitude.iter().map(|h| 20. - 6.5 * h).collect(),
        pressure: altitude.iter().map(|h| 1013. * f64::exp(-h / 8.)).collect(),
        relative_humidity: altitude
            .iter()
            .map(|h| f64::max(80. - 6. * h, 5.))
            .collect(),
        altitude,
    }
}

fn parameters(method: Method, relic_background: bool) -> RtmParameters {
    RtmParameters {
        oxygen_model: "liebe1992".to_string(),
        water_vapor_model: "rosenkranz1998".to_string(),
        method,
        theta: 30.,
        relic_background,
    }
}

fn profile() -> AtmosphericProfile {
    // 0 to 8 km: 17 heights, 16 intervals
    AtmosphericProfile::new(&sounding(), 0., 8., SaturationMethod::Wmo2008).unwrap()
}

fn sweep_with(
    profile: &AtmosphericProfile,
    parameters: &RtmParameters,
    provider: &dyn AttenuationProvider,
    grid: FrequencyGrid,
    workers: usize,
) -> Result<downwelling_rtm::Spectrum, RtmError> {
    let mut store = MemoryStore::default();
    Sweep::new(profile, parameters, provider, grid)
        .workers(NonZeroUsize::new(workers).unwrap())
        .run(&mut store, &mut NoProgress)
}

#[test]
fn independent_of_worker_count() {
    let profile = profile();
    for method in Method::ALL {
        let parameters = parameters(method, true);
        let grid = FrequencyGrid::new(18., 27.2, 0.4).unwrap();

        let single = sweep_with(&profile, &parameters, &StandardAttenuation, grid.clone(), 1).unwrap();
        for workers in [2, 4] {
            let parallel =
                sweep_with(&profile, &parameters, &StandardAttenuation, grid.clone(), workers)
                    .unwrap();
            assert_eq!(parallel, single);
        }
    }
}

#[test]
fn spectrum_follows_grid() {
    let profile = profile();
    let parameters = parameters(Method::Boole, true);
    let grid = FrequencyGrid::new(18., 27.2, 0.1).unwrap();
    let spectrum = sweep_with(&profile, &parameters, &StandardAttenuation, grid.clone(), 3).unwrap();

    assert_eq!(spectrum.len(), grid.len());
    let frequencies: Vec<f64> = spectrum.frequencies().collect();
    assert_eq!(frequencies, grid.as_slice());
    assert!(frequencies.windows(2).all(|w| w[0] < w[1]));
    for (i, frequency) in frequencies.iter().enumerate() {
        assert_relative_eq!(*frequency, 18. + 0.1 * i as f64, max_relative = 1e-12);
    }

    // The water vapor line shows up as a bump near 22.235 GHz
    let tb = |freq: f64| {
        spectrum
            .samples()
            .iter()
            .find(|s| (s.frequency - freq).abs() < 1e-6)
            .unwrap()
            .brightness_temperature
    };
    assert!(tb(22.2) > tb(18.));
    assert!(tb(22.2) > tb(27.2));
}

#[test]
fn background_toggle() {
    let profile = profile();
    let with = parameters(Method::Simpson, true);
    let without = parameters(Method::Simpson, false);
    let grid = FrequencyGrid::new(20., 24., 1.).unwrap();

    let enabled = sweep_with(&profile, &with, &StandardAttenuation, grid.clone(), 2).unwrap();
    let disabled = sweep_with(&profile, &without, &StandardAttenuation, grid, 2).unwrap();

    let rtm = DownwellingRtm::new(&profile, &with, &StandardAttenuation);
    for (on, off) in enabled.samples().iter().zip(disabled.samples()) {
        let tau = rtm.total_optical_depth(on.frequency).unwrap();
        assert_relative_eq!(
            off.brightness_temperature,
            on.brightness_temperature - COSMIC_BACKGROUND * f64::exp(-tau),
            max_relative = 1e-12
        );
    }
}

/// The standard models, except that one frequency fails.
struct FailingAt {
    frequency: f64,
    calls: AtomicUsize,
}

impl AttenuationProvider for FailingAt {
    fn models(&self, species: Species) -> &[&'static str] {
        StandardAttenuation.models(species)
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
        self.calls.fetch_add(1, Ordering::Relaxed);
        if (frequency - self.frequency).abs() < 1e-9 {
            return Err(RtmError::UnknownModel {
                species,
                model: model.to_string(),
            });
        }
        StandardAttenuation.attenuate(species, model, frequency, t, p, rho)
    }
}

#[test]
fn one_failure_aborts_everything() {
    let profile = profile();
    let parameters = parameters(Method::Trapezoidal, true);
    let grid = FrequencyGrid::new(18., 21., 0.5).unwrap();
    let provider = FailingAt {
        frequency: 19.,
        calls: AtomicUsize::new(0),
    };

    let mut store = MemoryStore::default();
    let (mut progress, updates) = ProgressChannel::bounded(64);
    let err = Sweep::new(&profile, &parameters, &provider, grid)
        .workers(NonZeroUsize::new(2).unwrap())
        .run(&mut store, &mut progress)
        .unwrap_err();

    match err {
        RtmError::SolveFailure { frequency, .. } => assert_eq!(frequency, 19.),
        other => panic!("unexpected error {other}"),
    }
    assert!(store.0.is_none());

    let updates: Vec<ProgressUpdate> = updates.try_iter().collect();
    assert!(matches!(updates.last(), Some(ProgressUpdate::Failed(_))));
    assert!(!updates.contains(&ProgressUpdate::Percent(100)));
}

#[test]
fn strict_sample_count() {
    // 0 to 7.5 km: 16 heights, 15 intervals
    let profile = AtmosphericProfile::new(&sounding(), 0., 7.5, SaturationMethod::Wmo2008).unwrap();
    let grid = FrequencyGrid::new(22., 23., 0.5).unwrap();

    for method in [Method::Simpson, Method::Boole] {
        let parameters = parameters(method, true);
        let err =
            sweep_with(&profile, &parameters, &StandardAttenuation, grid.clone(), 1).unwrap_err();
        assert!(matches!(
            err,
            RtmError::IncompatibleSampleCount { intervals: 15, .. }
        ));

        let mut store = MemoryStore::default();
        let spectrum = Sweep::new(&profile, &parameters, &StandardAttenuation, grid.clone())
            .strict_sample_count(false)
            .run(&mut store, &mut NoProgress)
            .unwrap();
        assert_eq!(spectrum.len(), 3);
    }

    let parameters = parameters(Method::Trapezoidal, true);
    sweep_with(&profile, &parameters, &StandardAttenuation, grid, 1).unwrap();
}

#[test]
fn progress_reaches_100_after_persisting() {
    let profile = profile();
    let parameters = parameters(Method::Boole, false);
    let grid = FrequencyGrid::new(18., 20.4, 0.1).unwrap();
    assert_eq!(grid.len(), 25);

    let mut store = MemoryStore::default();
    let (mut progress, updates) = ProgressChannel::bounded(64);
    Sweep::new(&profile, &parameters, &StandardAttenuation, grid)
        .workers(NonZeroUsize::new(4).unwrap())
        .run(&mut store, &mut progress)
        .unwrap();
    assert!(store.0.is_some());

    let updates: Vec<ProgressUpdate> = updates.try_iter().collect();
    // Reset, completions 0, 10 and 20, then the final update
    assert_eq!(
        updates,
        [0, 4, 44, 84, 100].map(ProgressUpdate::Percent)
    );
}

#[test]
fn configured_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        h_start: 0.,
        h_stop: 8.,
        nu_start: 22.,
        nu_stop: 23.,
        nu_step: 0.25,
        worker_count: Some(2),
        output_dir: dir.path().join("run"),
        ..RunConfig::default()
    };

    let spectrum = run(&config, &sounding(), &StandardAttenuation).unwrap();
    assert_eq!(spectrum.len(), 5);

    let artifacts = RunArtifacts::create(&config.output_dir).unwrap();
    assert_eq!(read_spectrum(&artifacts.results_path()).unwrap(), spectrum);
    let mut watcher = ProgressWatcher::new(artifacts.progress_path());
    assert_eq!(watcher.poll(), ProgressStatus::Finished);
}

#[test]
fn empty_window_fails_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        h_start: 10.,
        h_stop: 5.,
        output_dir: dir.path().to_path_buf(),
        ..RunConfig::default()
    };
    let provider = FailingAt {
        frequency: -1.,
        calls: AtomicUsize::new(0),
    };

    let err = run(&config, &sounding(), &provider).unwrap_err();
    assert!(matches!(err, RtmError::EmptyProfileRange { .. }));
    assert_eq!(provider.calls.load(Ordering::Relaxed), 0);

    let artifacts = RunArtifacts::create(dir.path()).unwrap();
    assert!(!artifacts.results_path().exists());
    let mut watcher = ProgressWatcher::new(artifacts.progress_path());
    assert_eq!(watcher.poll(), ProgressStatus::Failed);
}

/// A store whose disk is always full.
#[derive(Debug, Default)]
struct BrokenStore {
    attempts: usize,
}

impl ResultStore for BrokenStore {
    fn persist(&mut self, _spectrum: &downwelling_rtm::Spectrum) -> Result<(), RtmError> {
        self.attempts += 1;
        Err(RtmError::Persist {
            path: PathBuf::from("results"),
            source: io::Error::other("no space left on device"),
        })
    }
}

/// Accepts `accepted` updates, then every write fails.
#[derive(Debug, Default)]
struct FlakySink {
    accepted: usize,
    published: Vec<u8>,
    failures: Vec<String>,
}

impl ProgressSink for FlakySink {
    fn publish(&mut self, percent: u8) -> Result<(), RtmError> {
        if self.published.len() >= self.accepted {
            return Err(RtmError::ProgressWrite {
                path: PathBuf::from("progress"),
                source: io::Error::other("no space left on device"),
            });
        }
        self.published.push(percent);
        Ok(())
    }

    fn fail(&mut self, reason: &str) {
        self.failures.push(reason.to_string());
    }
}

#[test]
fn persist_failure_is_not_completion() {
    let profile = profile();
    let parameters = parameters(Method::Boole, true);
    let grid = FrequencyGrid::new(22., 23., 0.25).unwrap();

    let mut store = BrokenStore::default();
    let mut progress = FlakySink {
        accepted: usize::MAX,
        ..FlakySink::default()
    };
    let err = Sweep::new(&profile, &parameters, &StandardAttenuation, grid)
        .workers(NonZeroUsize::new(2).unwrap())
        .run(&mut store, &mut progress)
        .unwrap_err();

    assert!(matches!(err, RtmError::Persist { .. }));
    assert_eq!(store.attempts, 1);
    assert!(!progress.published.contains(&100));
    assert_eq!(progress.failures.len(), 1);
}

#[test]
fn progress_write_failure_aborts() {
    let profile = profile();
    let parameters = parameters(Method::Boole, true);
    // 21 frequencies: the third propagated update is at the 11th arrival
    let grid = FrequencyGrid::new(20., 22., 0.1).unwrap();
    assert_eq!(grid.len(), 21);

    let mut store = MemoryStore::default();
    let mut progress = FlakySink {
        accepted: 2,
        ..FlakySink::default()
    };
    let err = Sweep::new(&profile, &parameters, &StandardAttenuation, grid)
        .workers(NonZeroUsize::new(2).unwrap())
        .run(&mut store, &mut progress)
        .unwrap_err();

    assert!(matches!(err, RtmError::ProgressWrite { .. }));
    assert!(store.0.is_none());
    assert_eq!(progress.published.len(), 2);
    assert!(!progress.published.contains(&100));
    assert_eq!(progress.failures.len(), 1);
}

#[test]
fn unwritable_progress_fails_before_dispatch() {
    let profile = profile();
    let parameters = parameters(Method::Boole, true);
    let grid = FrequencyGrid::new(22., 23., 0.5).unwrap();
    let provider = FailingAt {
        frequency: -1.,
        calls: AtomicUsize::new(0),
    };

    let mut store = MemoryStore::default();
    let mut progress = FlakySink::default();
    let err = Sweep::new(&profile, &parameters, &provider, grid)
        .run(&mut store, &mut progress)
        .unwrap_err();

    assert!(matches!(err, RtmError::ProgressWrite { .. }));
    assert_eq!(provider.calls.load(Ordering::Relaxed), 0);
    assert!(store.0.is_none());
    assert_eq!(progress.failures.len(), 1);
}

#[test]
fn undrained_channel_still_sees_completion() {
    let profile = profile();
    let parameters = parameters(Method::Trapezoidal, true);
    let grid = FrequencyGrid::new(22., 23., 0.25).unwrap();

    let mut store = MemoryStore::default();
    let (mut progress, updates) = ProgressChannel::bounded(1);
    Sweep::new(&profile, &parameters, &StandardAttenuation, grid)
        .workers(NonZeroUsize::new(1).unwrap())
        .run(&mut store, &mut progress)
        .unwrap();
    assert!(store.0.is_some());

    let updates: Vec<ProgressUpdate> = updates.try_iter().collect();
    assert_eq!(updates.last(), Some(&ProgressUpdate::Percent(100)));
}

#[test]
fn undrained_channel_still_sees_failure() {
    let profile = profile();
    let parameters = parameters(Method::Trapezoidal, true);
    let grid = FrequencyGrid::new(18., 21., 0.5).unwrap();
    let provider = FailingAt {
        frequency: 20.,
        calls: AtomicUsize::new(0),
    };

    let mut store = MemoryStore::default();
    let (mut progress, updates) = ProgressChannel::bounded(1);
    Sweep::new(&profile, &parameters, &provider, grid)
        .workers(NonZeroUsize::new(1).unwrap())
        .run(&mut store, &mut progress)
        .unwrap_err();

    let updates: Vec<ProgressUpdate> = updates.try_iter().collect();
    assert!(matches!(updates.last(), Some(ProgressUpdate::Failed(_))));
}
