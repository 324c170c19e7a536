//! Retry utilities: backoff builders.
//!
//! Uses `backon` for exponential backoff with jitter.

use backon::ExponentialBuilder;

use crate::config::WriteRetryConfig;

/// Backoff for a single archive write.
///
/// Defaults (see [`WriteRetryConfig`]):
/// - Min delay: 50ms
/// - Max delay: 1s
/// - Max retries: 3
/// - Jitter enabled
pub fn write_backoff(config: &WriteRetryConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(config.min_delay())
        .with_max_delay(config.max_delay())
        .with_max_times(config.max_retries)
        .with_jitter()
}
