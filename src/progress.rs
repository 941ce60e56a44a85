//! Progress reporting for frequency sweeps.
//!
//! The sweep turns completion events into a percentage with
//! [`ProgressReporter`] and pushes it one way into a [`ProgressSink`]. The
//! percentage is monotonic, held at 99 until the spectrum has been persisted,
//! and only every tenth completion is propagated.

use std::fmt;
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{error, info, warn};

use crate::artifacts::write_atomic;
use crate::error::RtmError;

/// Only every `UPDATE_EVERY`-th completion is propagated to the sink.
pub const UPDATE_EVERY: usize = 10;

/// Highest percentage reported before the result artifact exists.
const MAX_RUNNING_PERCENT: u8 = 99;

/// Text recorded in a progress file when the run fails.
const FAILED_MARKER: &str = "failed";

/// Receiver of progress updates.
///
/// Sinks must not block the sweep for long. An `Err` from [`publish`] is
/// fatal to the run, so sinks should only return one for persistent failures.
///
/// [`publish`]: ProgressSink::publish
pub trait ProgressSink {
    /// A new percentage in `0..=100`. `100` means the run is complete.
    fn publish(&mut self, percent: u8) -> Result<(), RtmError>;

    /// The run failed; no more updates will follow.
    fn fail(&mut self, reason: &str);
}

/// Turns completion events into throttled percentages.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    total: usize,
    /// Number of completion events seen so far.
    completed: usize,
}

impl fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("total", &self.total)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl<'a> ProgressReporter<'a> {
    /// Reset the sink to 0% for a run of `total` solves.
    pub fn start(sink: &'a mut dyn ProgressSink, total: usize) -> Result<Self, RtmError> {
        sink.publish(0)?;
        Ok(Self {
            sink,
            total,
            completed: 0,
        })
    }

    /// Percentage for the completions seen so far, never above 99.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = self.completed.min(self.total) * 100 / self.total;
        percent.min(usize::from(MAX_RUNNING_PERCENT)) as u8
    }

    /// Count one finished solve.
    ///
    /// Returns the percentage if this completion was propagated to the sink.
    pub fn record_completion(&mut self) -> Result<Option<u8>, RtmError> {
        let arrival = self.completed;
        self.completed += 1;
        if arrival % UPDATE_EVERY != 0 {
            return Ok(None);
        }
        let percent = self.percent();
        self.sink.publish(percent)?;
        Ok(Some(percent))
    }

    /// The result artifact is in place: report 100%.
    pub fn finish(self) -> Result<(), RtmError> {
        self.sink.publish(100)
    }

    /// Report a terminal failure.
    pub fn fail(self, reason: &str) {
        self.sink.fail(reason);
    }
}

/// Writes the percentage to the log.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn publish(&mut self, percent: u8) -> Result<(), RtmError> {
        info!("Sweep progress: {percent}%");
        Ok(())
    }

    fn fail(&mut self, reason: &str) {
        error!("Sweep failed: {reason}");
    }
}

/// Discards every update.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn publish(&mut self, _percent: u8) -> Result<(), RtmError> {
        Ok(())
    }

    fn fail(&mut self, _reason: &str) {}
}

/// A progress update as seen through a [`ProgressChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Percentage complete; 100 means the result has been persisted
    Percent(u8),
    /// The run failed
    Failed(String),
}

/// Sends updates over a bounded channel without blocking the sweep.
///
/// Intermediate percentages are dropped when the channel is full, since a
/// later one supersedes them. One slot is always kept free for the terminal
/// update (100% or a failure), so the observer sees how the run ended even
/// if it hasn't drained anything. A disconnected receiver is ignored.
#[derive(Debug)]
pub struct ProgressChannel {
    sender: Sender<ProgressUpdate>,
    /// Slots usable by intermediate percentages.
    capacity: usize,
}

impl ProgressChannel {
    /// Create the sink together with the observer's end of the channel.
    ///
    /// Up to `capacity` intermediate updates are buffered.
    pub fn bounded(capacity: usize) -> (Self, Receiver<ProgressUpdate>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity + 1);
        (Self { sender, capacity }, receiver)
    }

    fn send_intermediate(&self, update: ProgressUpdate) {
        if self.sender.len() >= self.capacity {
            warn!("progress channel full, dropping {update:?}");
            return;
        }
        match self.sender.try_send(update) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(update)) => {
                warn!("progress channel full, dropping {update:?}");
            }
        }
    }

    /// Only blocks if an earlier run's terminal update is still unread.
    fn send_terminal(&self, update: ProgressUpdate) {
        // An error means the observer is gone
        let _ = self.sender.send(update);
    }
}

impl ProgressSink for ProgressChannel {
    fn publish(&mut self, percent: u8) -> Result<(), RtmError> {
        if percent >= 100 {
            self.send_terminal(ProgressUpdate::Percent(percent));
        } else {
            self.send_intermediate(ProgressUpdate::Percent(percent));
        }
        Ok(())
    }

    fn fail(&mut self, reason: &str) {
        self.send_terminal(ProgressUpdate::Failed(reason.to_string()));
    }
}

/// Keeps the percentage in a file that other processes can poll.
///
/// The file is replaced atomically on each update so readers never see a
/// partial write. Up to [`ProgressFile::MAX_TRANSIENT_FAILURES`] consecutive
/// failed writes are logged and skipped; the next one aborts the run.
#[derive(Debug)]
pub struct ProgressFile {
    path: PathBuf,
    consecutive_failures: usize,
}

impl ProgressFile {
    /// Consecutive write failures that are tolerated.
    pub const MAX_TRANSIENT_FAILURES: usize = 5;

    /// Report progress into the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            consecutive_failures: 0,
        }
    }

    /// Location of the progress file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressSink for ProgressFile {
    fn publish(&mut self, percent: u8) -> Result<(), RtmError> {
        match write_atomic(&self.path, format!("{percent}\n").as_bytes()) {
            Ok(()) => {
                self.consecutive_failures = 0;
                Ok(())
            }
            Err(source) if self.consecutive_failures < Self::MAX_TRANSIENT_FAILURES => {
                self.consecutive_failures += 1;
                warn!(
                    "couldn't write progress to {} ({} in a row): {source}",
                    self.path.display(),
                    self.consecutive_failures
                );
                Ok(())
            }
            Err(source) => Err(RtmError::ProgressWrite {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn fail(&mut self, reason: &str) {
        error!("Sweep failed: {reason}");
        if let Err(e) = write_atomic(&self.path, format!("{FAILED_MARKER}\n").as_bytes()) {
            warn!("couldn't record failure in {}: {e}", self.path.display());
        }
    }
}

/// What an observer knows about a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Still running, with the last known percentage
    Running(u8),
    /// Finished and the result artifact is available
    Finished,
    /// The run failed
    Failed,
}

/// Polls a [`ProgressFile`] from the observer's side.
///
/// A missing or unreadable file is not an error: the watcher keeps reporting
/// the last value it could read.
#[derive(Debug)]
pub struct ProgressWatcher {
    path: PathBuf,
    last: ProgressStatus,
}

impl ProgressWatcher {
    /// Watch the progress file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: ProgressStatus::Running(0),
        }
    }

    /// Read the file again.
    pub fn poll(&mut self) -> ProgressStatus {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return self.last;
        };
        let contents = contents.trim();
        let status = if contents == FAILED_MARKER {
            ProgressStatus::Failed
        } else {
            match contents.parse::<u8>() {
                Ok(percent) if percent >= 100 => ProgressStatus::Finished,
                Ok(percent) => ProgressStatus::Running(percent),
                Err(_) => return self.last,
            }
        };
        self.last = status;
        status
    }

    /// The last status read.
    pub fn last(&self) -> ProgressStatus {
        self.last
    }
}
