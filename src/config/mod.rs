//! Configuration for linkgate

mod crawl;
mod logging;
mod policy;

pub use crawl::{CrawlSettings, DEFAULT_USER_AGENT, sanitize_fetch_concurrency};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use policy::{
    CrawlPolicy, DEFAULT_ALLOWED_DOMAINS, DEFAULT_NON_HTML_EXTENSIONS, DEFAULT_STOPWORDS,
    DEFAULT_TRAP_PATH_SUBSTRINGS, DEFAULT_TRAP_QUERY_KEYS,
};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: CrawlPolicy,
    pub crawl: CrawlSettings,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load, normalize and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(content).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.policy.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        self.policy.collect_errors(&mut errors);
        self.crawl.collect_errors(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}
