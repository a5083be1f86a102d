//! Tracing subscriber set-up.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::IdentitySettings;

/// Failure to install the global subscriber.
#[derive(Debug, thiserror::Error)]
#[error("tracing init failed: {message}")]
pub struct TelemetryError {
    message: String,
}

/// Install the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG`. A second call returns an error instead of
/// replacing the installed subscriber.
pub fn init_tracing(settings: &IdentitySettings) -> Result<(), TelemetryError> {
    let builder = fmt().with_env_filter(EnvFilter::from_default_env());
    let result = if settings.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|err| TelemetryError {
        message: err.to_string(),
    })
}
