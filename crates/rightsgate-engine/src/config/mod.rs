//! Engine config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use rightsgate_core::error::{Result, RightsGateError};

pub use schema::{EngineSection, LogFormat, LogSection, RegexMode, RightsGateConfig, StoreSection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<RightsGateConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        RightsGateError::Internal(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RightsGateConfig> {
    let cfg: RightsGateConfig = serde_yaml::from_str(s)
        .map_err(|e| RightsGateError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
