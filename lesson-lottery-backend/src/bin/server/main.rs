use std::path::PathBuf;
use std::process::ExitCode;

use lesson_lottery_backend::server::run_server;
use lesson_lottery_backend::telemetry::setup_telemetry;
use lesson_lottery_config::{get_settings, DEFAULT_CONFIG_FILE};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    setup_telemetry();

    let config_file = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);

    let settings = match get_settings(&config_file) {
        Ok(settings) => settings,
        Err(err) => {
            error!("failed to load {}: {err}", config_file.display());
            return ExitCode::FAILURE;
        }
    };

    match run_server(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
