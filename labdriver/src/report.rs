//! Report sinks for finished runs
use labdriver_core::RunData;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize run data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persists a scored [`RunData`]. A report is a mandatory artifact of a run, so callers treat
/// an error here as fatal.
pub trait ReportSink {
    /// Returns where the report was written.
    fn write(&self, data: &RunData) -> Result<PathBuf, ReportError>;
}

/// Writes each run as pretty-printed JSON to `<dir>/<scenario>-<unix millis>.json`.
///
/// An existing report is never overwritten; a name clash is an [`ReportError::Io`].
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn report_path(&self, data: &RunData) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            data.scenario,
            data.started_at.unix_timestamp_nanos() / 1_000_000
        ))
    }
}

impl ReportSink for JsonReportSink {
    fn write(&self, data: &RunData) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let path = self.report_path(data);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush().map_err(io_error(&path))?;

        debug!("Wrote report to {}", path.display());
        Ok(path)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError {
    let path = path.to_path_buf();
    move |source| ReportError::Io { path, source }
}
