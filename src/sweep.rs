//! Parallel frequency sweeps.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::artifacts::{CsvResultFile, ResultStore, RunArtifacts};
use crate::attenuation::AttenuationProvider;
use crate::config::RunConfig;
use crate::error::RtmError;
use crate::profile::{AtmosphericProfile, RawProfile};
use crate::progress::{ProgressFile, ProgressReporter, ProgressSink};
use crate::rtm::{DownwellingRtm, RtmParameters};
use crate::spectrum::{FrequencyGrid, Spectrum, SpectrumSample};

/// Runs the RTM over a frequency grid on a pool of worker threads.
///
/// Each frequency is solved independently. Results are merged by frequency,
/// so the spectrum doesn't depend on the number of workers or on the order in
/// which solves finish.
pub struct Sweep<'a> {
    profile: &'a AtmosphericProfile,
    parameters: &'a RtmParameters,
    provider: &'a dyn AttenuationProvider,
    grid: FrequencyGrid,
    num_workers: Option<NonZeroUsize>,
    strict_sample_count: bool,
}

impl std::fmt::Debug for Sweep<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweep")
            .field("parameters", self.parameters)
            .field("num_freqs", &self.grid.len())
            .field("num_workers", &self.num_workers)
            .field("strict_sample_count", &self.strict_sample_count)
            .finish_non_exhaustive()
    }
}

impl<'a> Sweep<'a> {
    /// Prepare a sweep of `grid` over `profile`.
    ///
    /// By default the pool has one worker per CPU and the profile must have a
    /// number of heights the quadrature rule can handle.
    pub fn new(
        profile: &'a AtmosphericProfile,
        parameters: &'a RtmParameters,
        provider: &'a dyn AttenuationProvider,
        grid: FrequencyGrid,
    ) -> Self {
        Self {
            profile,
            parameters,
            provider,
            grid,
            num_workers: None,
            strict_sample_count: true,
        }
    }

    /// Use exactly `num_workers` worker threads.
    pub fn workers(mut self, num_workers: NonZeroUsize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    /// Whether to reject profiles whose height count doesn't suit the rule.
    ///
    /// When disabled, the rule is applied anyway and a warning is logged.
    pub fn strict_sample_count(mut self, strict: bool) -> Self {
        self.strict_sample_count = strict;
        self
    }

    /// The frequencies that will be solved.
    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }

    /// Solve every frequency, persist the spectrum into `store` and report
    /// progress into `progress`.
    ///
    /// Progress only reaches 100% after the spectrum has been persisted. If
    /// any single frequency fails, nothing is persisted and the sink is told
    /// about the failure instead.
    pub fn run(
        &self,
        store: &mut dyn ResultStore,
        progress: &mut dyn ProgressSink,
    ) -> Result<Spectrum, RtmError> {
        if let Err(e) = self.check_sample_count() {
            progress.fail(&e.to_string());
            return Err(e);
        }

        let num_freqs = self.grid.len();
        let mut reporter = match ProgressReporter::start(progress, num_freqs) {
            Ok(reporter) => reporter,
            Err(e) => {
                progress.fail(&e.to_string());
                return Err(e);
            }
        };

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_workers.map_or(0, NonZeroUsize::get))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                let e = RtmError::InvalidConfig(format!("couldn't build worker pool: {e}"));
                reporter.fail(&e.to_string());
                return Err(e);
            }
        };

        info!(
            "Processing downwelling RTM for {num_freqs} frequencies and {} heights on {} workers",
            self.profile.len(),
            pool.current_num_threads()
        );

        let rtm = DownwellingRtm::new(self.profile, self.parameters, self.provider);
        let (sender, receiver) =
            crossbeam_channel::unbounded::<Result<SpectrumSample, RtmError>>();

        // Set once any solve fails, so the remaining frequencies are skipped
        let aborted = AtomicBool::new(false);

        let mut samples = Vec::with_capacity(num_freqs);
        let mut failure = None;

        pool.in_place_scope(|s| {
            let rtm = &rtm;
            let aborted = &aborted;
            let frequencies = self.grid.as_slice();
            s.spawn(move |_| {
                frequencies
                    .par_iter()
                    .for_each_with(sender, |sender, &frequency| {
                        if aborted.load(Ordering::Relaxed) {
                            return;
                        }
                        let result = rtm
                            .run(frequency)
                            .map_err(|e| RtmError::solve_failure(frequency, e));
                        if result.is_err() {
                            aborted.store(true, Ordering::Relaxed);
                        }
                        // The receiver is only dropped after every sender is
                        let _ = sender.send(result);
                    });
            });

            // The work is done in the thread pool, but back here in the
            // calling thread, collect results as they complete and report
            // progress
            for result in &receiver {
                match result {
                    Ok(sample) if failure.is_none() => {
                        samples.push(sample);
                        if let Err(e) = reporter.record_completion() {
                            aborted.store(true, Ordering::Relaxed);
                            failure = Some(e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if failure.is_none() {
                            failure = Some(e);
                        }
                    }
                }
            }
        });

        if let Some(e) = failure {
            error!("Aborted sweep after {} of {num_freqs} frequencies", samples.len());
            reporter.fail(&e.to_string());
            return Err(e);
        }

        debug!("merging {} samples", samples.len());
        let spectrum = Spectrum::from_unordered(samples);
        if let Err(e) = store.persist(&spectrum) {
            reporter.fail(&e.to_string());
            return Err(e);
        }
        reporter.finish()?;

        info!("Completed RTM for {num_freqs} frequencies");
        Ok(spectrum)
    }

    /// The outer integral spans every height, which is where the rule's
    /// interval constraint matters.
    fn check_sample_count(&self) -> Result<(), RtmError> {
        let intervals = self
            .profile
            .len()
            .checked_sub(1)
            .ok_or(RtmError::InconsistentInputs)?;
        match self.parameters.method.check_intervals(intervals) {
            Err(e) if !self.strict_sample_count => {
                warn!("{e}; the result is not a proper integral");
                Ok(())
            }
            result => result,
        }
    }
}

/// Run a whole configured sweep for one raw profile.
///
/// The profile is cut to the configured altitude window before anything is
/// dispatched. Artifacts from an earlier run in the output directory are
/// removed first; the result and progress files are written there.
pub fn run(
    config: &RunConfig,
    raw: &RawProfile,
    provider: &dyn AttenuationProvider,
) -> Result<Spectrum, RtmError> {
    config.validate()?;

    let artifacts = RunArtifacts::create(&config.output_dir)?;
    artifacts.clear()?;
    let mut progress = ProgressFile::new(artifacts.progress_path());
    let mut store = CsvResultFile::new(artifacts.results_path());

    let prepared = config
        .parameters()
        .and_then(|parameters| Ok((parameters, config.profile(raw)?, config.grid()?)));
    let (parameters, profile, grid) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            progress.fail(&e.to_string());
            return Err(e);
        }
    };

    let mut sweep = Sweep::new(&profile, &parameters, provider, grid)
        .strict_sample_count(config.strict_sample_count);
    if let Some(num_workers) = config.workers() {
        sweep = sweep.workers(num_workers);
    }
    sweep.run(&mut store, &mut progress)
}
