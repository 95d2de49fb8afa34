pub mod auth;
pub mod export;
pub mod locators;

pub use auth::{
    Authenticator, LoginError, LoginReport, LoginState, LoginStep, LoginTimeouts, StepAction,
};
pub use export::{DownloadDirectory, ExportError, ExportTimings, ExportedFile, ReportExporter};
