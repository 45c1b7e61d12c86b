use std::process::ExitCode;

use bomobs_service::config::Config;
use bomobs_service::logging::{self, init_logging, log_run_failure, log_run_summary};
use bomobs_service::pipeline;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the same file, so nothing is installed yet.
            let _guard = init_logging(&Default::default());
            log_run_failure(&e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = init_logging(&config.logging);
    tracing::info!(
        source = %logging::DataSource::System,
        bundles = config.source.bundles.len(),
        store = ?config.store.backend,
        index = %config.store.index,
        "starting ingest run"
    );

    match pipeline::run(&config) {
        Ok(summary) => {
            log_run_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_run_failure(&e);
            ExitCode::FAILURE
        }
    }
}
