use std::path::PathBuf;

use thiserror::Error;

/// Why the page filter refused a candidate URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unparsable URL: {0}")]
    Malformed(String),
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("host '{0}' is outside the allowed domains")]
    DisallowedHost(String),
    #[error("previously failed permanently")]
    KnownBad,
    #[error("trap path")]
    TrapPath,
    #[error("trap query parameter")]
    TrapQuery,
    #[error("query variant budget exhausted for this path")]
    TooManyVariants,
    #[error("event calendar browsing path")]
    EventBrowsing,
    #[error("blocked wiki action")]
    WikiAction,
    #[error("non-HTML extension '{0}'")]
    NonHtmlExtension(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config{}: {source}", .path.as_ref().map(|p| format!(" file '{}'", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
