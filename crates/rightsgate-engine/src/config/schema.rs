use std::time::Duration;

use serde::Deserialize;
use rightsgate_core::error::{Result, RightsGateError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RightsGateConfig {
    pub version: u32,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub log: LogSection,

    #[serde(default)]
    pub store: StoreSection,
}

impl Default for RightsGateConfig {
    fn default() -> Self {
        Self {
            version: 1,
            engine: EngineSection::default(),
            log: LogSection::default(),
            store: StoreSection::default(),
        }
    }
}

impl RightsGateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RightsGateError::UnsupportedVersion);
        }

        self.engine.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

/// How the `regex` condition operator behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexMode {
    /// Never matches. Stored policies written against the stub keep their meaning.
    #[default]
    Stub,
    /// Match the stored pattern against the rendered field value.
    Enabled,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// 0 disables the per-tenant policy cache.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    #[serde(default)]
    pub regex_operator: RegexMode,

    /// Emit one audit event per decision.
    #[serde(default)]
    pub audit: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            regex_operator: RegexMode::default(),
            audit: false,
        }
    }
}

impl EngineSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.store_timeout_ms) {
            return Err(RightsGateError::BadRequest(
                "engine.store_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        if self.cache_ttl_ms > 3_600_000 {
            return Err(RightsGateError::BadRequest(
                "engine.cache_ttl_ms must be at most 3600000".into(),
            ));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_ttl_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn default_store_timeout_ms() -> u64 {
    2000
}
fn default_cache_ttl_ms() -> u64 {
    30000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

impl LogSection {
    pub fn validate(&self) -> Result<()> {
        if self.filter.trim().is_empty() {
            return Err(RightsGateError::BadRequest("log.filter must not be empty".into()));
        }
        Ok(())
    }
}

fn default_log_filter() -> String {
    "info".into()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// JSON array of policy records served by the in-memory store.
    #[serde(default)]
    pub policies_file: Option<String>,
}
