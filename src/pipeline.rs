use crate::absence::{
    classify, ClassificationResult, ClassifyError, Grid, GridError, GridLayout, ReportPeriod,
};
use crate::browser::{BrowserSession, SessionError};
use crate::config::PortalConfig;
use crate::portal::{
    Authenticator, ExportError, ExportedFile, LoginError, LoginReport, ReportExporter,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not start browser: {0}")]
    Launch(#[source] SessionError),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("could not load {}: {source}", path.display())]
    Grid {
        path: PathBuf,
        #[source]
        source: GridError,
    },
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Everything one crawl produced.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub login: LoginReport,
    pub export: ExportedFile,
    pub result: ClassificationResult,
}

/// Login, export and classification for a single run.
#[derive(Debug, Clone)]
pub struct Crawl {
    pub authenticator: Authenticator,
    pub exporter: ReportExporter,
    pub layout: GridLayout,
    pub period: ReportPeriod,
}

impl Crawl {
    pub fn new(
        portal: &PortalConfig,
        download_dir: impl Into<PathBuf>,
        period: ReportPeriod,
    ) -> Self {
        Self {
            authenticator: Authenticator::new(portal),
            exporter: ReportExporter::new(portal.reports_url.clone(), download_dir),
            layout: GridLayout::default(),
            period,
        }
    }

    /// Takes ownership of `session` and closes it before classification starts,
    /// including when login fails.
    pub fn run<S: BrowserSession>(&self, mut session: S) -> Result<CrawlOutcome, PipelineError> {
        let login = match self.authenticator.login(&mut session) {
            Ok(report) => report,
            Err(err) => {
                if let Err(close_err) = session.close() {
                    error!(%close_err, "failed to close browser session after login failure");
                }
                return Err(err.into());
            }
        };
        info!(skipped = login.faults.len(), "logged in");

        let export = self.exporter.export(session)?;
        let result = classify_file(&export.path, &self.layout, self.period)?;

        Ok(CrawlOutcome {
            login,
            export,
            result,
        })
    }
}

/// Loads an export from disk and classifies it.
pub fn classify_file(
    path: &Path,
    layout: &GridLayout,
    period: ReportPeriod,
) -> Result<ClassificationResult, PipelineError> {
    let grid = Grid::from_path(path).map_err(|source| PipelineError::Grid {
        path: path.to_path_buf(),
        source,
    })?;
    let result = classify(&grid, layout, period)?;
    let absent = result.values().filter(|record| record.has_time_offs()).count();
    info!(
        path = %path.display(),
        %period,
        employees = result.len(),
        with_time_offs = absent,
        "classified export"
    );
    Ok(result)
}
