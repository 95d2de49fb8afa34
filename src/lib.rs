pub mod absence;
pub mod browser;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod portal;
pub mod telemetry;

mod cli;
mod routes;
mod server;

use error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
