//! Durable run artifacts: the result spectrum and the progress file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::RtmError;
use crate::spectrum::Spectrum;

/// File name of the result artifact inside the run directory.
pub const RESULTS_FILE: &str = "results";
/// File name of the progress artifact inside the run directory.
pub const PROGRESS_FILE: &str = "progress";

/// Replace the file at `path` with `contents` in one step.
///
/// The data goes to a sibling temporary file first, which is then renamed
/// over the destination, so readers see either the old or the new contents.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp_path, path)
}

/// Where a finished spectrum goes.
pub trait ResultStore {
    /// Durably store the spectrum.
    fn persist(&mut self, spectrum: &Spectrum) -> Result<(), RtmError>;
}

/// The spectrum as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvResultFile {
    path: PathBuf,
}

impl CsvResultFile {
    /// Persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for CsvResultFile {
    fn persist(&mut self, spectrum: &Spectrum) -> Result<(), RtmError> {
        let csv = spectrum.to_csv()?;
        write_atomic(&self.path, &csv).map_err(|source| RtmError::Persist {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            "wrote {} samples to {}",
            spectrum.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps the spectrum in memory, for callers that take the return value.
#[derive(Debug, Default)]
pub struct MemoryStore(pub Option<Spectrum>);

impl ResultStore for MemoryStore {
    fn persist(&mut self, spectrum: &Spectrum) -> Result<(), RtmError> {
        self.0 = Some(spectrum.clone());
        Ok(())
    }
}

/// Read a spectrum persisted by [`CsvResultFile`].
pub fn read_spectrum(path: &Path) -> Result<Spectrum, RtmError> {
    Spectrum::from_csv(fs::File::open(path)?)
}

/// The directory holding one run's artifacts.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    dir: PathBuf,
}

impl RunArtifacts {
    /// Use `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, RtmError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the result artifact.
    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    /// Path of the progress artifact.
    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    /// Remove artifacts left by an earlier run.
    pub fn clear(&self) -> Result<(), RtmError> {
        for path in [self.results_path(), self.progress_path()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!("removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
