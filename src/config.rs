//! TOML configuration for the dashboard client.
//!
//! Layered the usual way: an explicit path, then the `PULSEBOARD_CONFIG`
//! environment variable, then `./pulseboard.toml`, then compiled-in defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::render::DisplayZone;
use crate::report::card::TimeWindowStyle;
use crate::trigger::kind::{AnalysisKind, KindRegistry};

pub const CONFIG_ENV: &str = "PULSEBOARD_CONFIG";
pub const LOCAL_CONFIG: &str = "pulseboard.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Extra analysis kinds on top of the built-in ones.
    #[serde(default)]
    pub analysis: Vec<AnalysisKindConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded dashboard configuration");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration. An explicit path must load; the
    /// environment and local file fall back to defaults with a warning.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "PULSEBOARD_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        for kind in &self.analysis {
            let slug = kind.slug.trim();
            if slug.is_empty() || slug.contains('/') || slug.contains(char::is_whitespace) {
                anyhow::bail!("invalid analysis slug {:?}", kind.slug);
            }
        }
        Ok(())
    }

    /// Built-in kinds with the configured ones registered on top.
    pub fn kinds(&self) -> KindRegistry {
        let mut registry = KindRegistry::builtin();
        for kind in &self.analysis {
            registry.register(kind.to_kind());
        }
        registry
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Backend root; `/api/...` paths are appended to it.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Delay between an accepted trigger and the report refresh.
    pub delay_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            delay_secs: crate::trigger::DEFAULT_REFRESH_DELAY.as_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub time_window: TimeWindowStyle,
    /// Show times in UTC instead of the local time zone.
    pub utc: bool,
}

impl DisplayConfig {
    pub fn zone(&self) -> DisplayZone {
        if self.utc {
            DisplayZone::Utc
        } else {
            DisplayZone::Local
        }
    }
}

/// `[[analysis]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisKindConfig {
    pub slug: String,
    pub label: String,
    #[serde(default)]
    pub busy_label: Option<String>,
    #[serde(default)]
    pub started_message: Option<String>,
    #[serde(default)]
    pub failed_message: Option<String>,
}

impl AnalysisKindConfig {
    fn to_kind(&self) -> AnalysisKind {
        let mut kind = AnalysisKind::new(self.slug.trim(), &self.label);
        if let Some(busy) = &self.busy_label {
            kind.busy_label = busy.clone();
        }
        if let Some(msg) = &self.started_message {
            kind.started_message = msg.clone();
        }
        if let Some(msg) = &self.failed_message {
            kind.failed_message = msg.clone();
        }
        kind
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}
