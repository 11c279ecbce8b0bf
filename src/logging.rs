//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use crate::error::{DataFrameworkError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. When `config.log_dir` is
/// set, output is also written to a daily rolling file; keep the returned
/// guard alive until shutdown so buffered lines are flushed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| DataFrameworkError::Logging(format!("Invalid filter '{}': {}", config.filter, e)))?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()
                .map_err(|e| DataFrameworkError::Logging(e.to_string()))?;
            tracing::debug!("Logging to {:?}", dir);
            Ok(Some(guard))
        }
        None => {
            registry
                .try_init()
                .map_err(|e| DataFrameworkError::Logging(e.to_string()))?;
            Ok(None)
        }
    }
}
