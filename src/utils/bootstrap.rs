//! Bootstrap utilities for the Lambda binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LOG_ENV_VAR, LOG_FORMAT_ENV_VAR};

/// Initialize tracing with the ARCHIVAL_LOG environment variable.
///
/// Defaults to "info" level if ARCHIVAL_LOG is not set. Output is JSON lines
/// without timestamps (CloudWatch stamps ingestion time); set
/// ARCHIVAL_LOG_FORMAT=pretty for human-readable local output.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var(LOG_FORMAT_ENV_VAR).as_deref() {
        Ok("pretty") | Ok("text") => registry.with(tracing_subscriber::fmt::layer()).init(),
        _ => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .without_time(),
            )
            .init(),
    }
}
