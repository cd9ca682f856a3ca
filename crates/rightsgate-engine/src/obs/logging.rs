//! `tracing-subscriber` setup driven by the `log` config section.

use rightsgate_core::error::{Result, RightsGateError};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogSection};

/// Install the global subscriber. `RUST_LOG`, when set, overrides `log.filter`.
pub fn init(cfg: &LogSection) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&cfg.filter)
            .map_err(|e| RightsGateError::BadRequest(format!("invalid log.filter: {e}")))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match cfg.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.map_err(|e| RightsGateError::Internal(format!("logging init failed: {e}")))
}
