use super::locators::{EXPORT_TO_EXCEL, REPORT_ACTIONS_DROPDOWN};
use crate::browser::{
    wait_and_click, BrowserSession, InteractionFault, SessionError, DEFAULT_ELEMENT_TIMEOUT,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_EXPORT_EXTENSION: &str = "xlsx";
pub const DEFAULT_CANONICAL_NAME: &str = "ppf_data.xlsx";

/// Bounds for waiting on the browser download.
///
/// The export phase gives up after `settle + max_polls * poll_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTimings {
    pub element_timeout: Duration,
    pub settle: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for ExportTimings {
    fn default() -> Self {
        Self {
            element_timeout: DEFAULT_ELEMENT_TIMEOUT,
            settle: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            max_polls: 10,
        }
    }
}

impl ExportTimings {
    pub fn download_budget(&self) -> Duration {
        self.settle + self.poll_interval * self.max_polls
    }
}

/// The export renamed to its canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub faults: Vec<InteractionFault>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no .{extension} download appeared in {} within {waited:?}", dir.display())]
    DownloadTimeout {
        dir: PathBuf,
        extension: String,
        waited: Duration,
        faults: Vec<InteractionFault>,
    },
    #[error("download directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Files with the export extension in one directory.
#[derive(Debug, Clone)]
pub struct DownloadDirectory {
    dir: PathBuf,
    extension: String,
}

impl DownloadDirectory {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Matching file names, sorted. Partial downloads (`.crdownload`) never match.
    pub fn snapshot(&self) -> Result<BTreeSet<String>, std::io::Error> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            if matches {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// First matching file, in name order, that was not in `baseline`.
    pub fn fresh_since(
        &self,
        baseline: &BTreeSet<String>,
    ) -> Result<Option<PathBuf>, std::io::Error> {
        Ok(self
            .snapshot()?
            .into_iter()
            .find(|name| !baseline.contains(name))
            .map(|name| self.dir.join(name)))
    }
}

/// Opens the report page, asks the portal for a spreadsheet export and waits
/// for the browser to save it.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    reports_url: String,
    downloads: DownloadDirectory,
    canonical_name: String,
    timings: ExportTimings,
}

impl ReportExporter {
    pub fn new(reports_url: impl Into<String>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_url: reports_url.into(),
            downloads: DownloadDirectory::new(download_dir, DEFAULT_EXPORT_EXTENSION),
            canonical_name: DEFAULT_CANONICAL_NAME.to_string(),
            timings: ExportTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: ExportTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Switches the expected download type, e.g. for portals that export CSV.
    pub fn with_export_format(
        mut self,
        extension: impl Into<String>,
        canonical_name: impl Into<String>,
    ) -> Self {
        self.downloads = DownloadDirectory::new(self.downloads.dir.clone(), extension);
        self.canonical_name = canonical_name.into();
        self
    }

    pub fn timings(&self) -> &ExportTimings {
        &self.timings
    }

    pub fn canonical_path(&self) -> PathBuf {
        self.downloads.path().join(&self.canonical_name)
    }

    /// Produces the export and closes `session` whatever the outcome.
    ///
    /// Files already in the directory before the export click are ignored, so a
    /// leftover export from an earlier run is never picked up as this run's file.
    pub fn export<S: BrowserSession>(&self, mut session: S) -> Result<ExportedFile, ExportError> {
        let outcome = self.download(&mut session);
        if let Err(err) = session.close() {
            error!(%err, "failed to close browser session");
        }
        match &outcome {
            Ok(file) => info!(path = %file.path.display(), "export ready"),
            Err(err) => error!(%err, "failed to download export"),
        }
        outcome
    }

    fn download<S: BrowserSession>(&self, session: &mut S) -> Result<ExportedFile, ExportError> {
        session.navigate(&self.reports_url)?;

        let mut faults = Vec::new();
        let baseline = self.downloads.snapshot()?;
        if !baseline.is_empty() {
            debug!(existing = ?baseline, "ignoring files present before export");
        }

        for target in [REPORT_ACTIONS_DROPDOWN, EXPORT_TO_EXCEL] {
            let outcome = wait_and_click(session, &target, self.timings.element_timeout)?;
            faults.extend(outcome.fault().cloned());
        }

        let downloaded = match self.await_download(&baseline)? {
            Some(path) => path,
            None => {
                return Err(ExportError::DownloadTimeout {
                    dir: self.downloads.path().to_path_buf(),
                    extension: self.downloads.extension.clone(),
                    waited: self.timings.download_budget(),
                    faults,
                })
            }
        };

        let path = self.promote(&downloaded)?;
        Ok(ExportedFile { path, faults })
    }

    fn await_download(&self, baseline: &BTreeSet<String>) -> Result<Option<PathBuf>, ExportError> {
        thread::sleep(self.timings.settle);

        for poll in 0..=self.timings.max_polls {
            if let Some(path) = self.downloads.fresh_since(baseline)? {
                debug!(poll, path = %path.display(), "download detected");
                return Ok(Some(path));
            }
            if poll == self.timings.max_polls {
                break;
            }
            debug!(poll, "download not present yet");
            thread::sleep(self.timings.poll_interval);
        }

        warn!(
            dir = %self.downloads.path().display(),
            budget = ?self.timings.download_budget(),
            "download never appeared"
        );
        Ok(None)
    }

    fn promote(&self, downloaded: &Path) -> Result<PathBuf, ExportError> {
        let target = self.canonical_path();
        if downloaded == target {
            return Ok(target);
        }
        if target.exists() {
            fs::remove_file(&target)?;
        }
        fs::rename(downloaded, &target)?;
        debug!(from = %downloaded.display(), to = %target.display(), "renamed export");
        Ok(target)
    }
}
