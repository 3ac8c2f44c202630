use std::path::PathBuf;

use thiserror::Error;

/// Startup-time failures. A malformed list or threshold is fatal before the
/// first validation ever runs; nothing here is produced per call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{origin}:{line}: '{value}' is not a valid domain")]
    InvalidDomainEntry {
        origin: String,
        line: usize,
        value: String,
    },
    #[error("{origin}:{line}: '{value}' is not a valid local part")]
    InvalidLocalEntry {
        origin: String,
        line: usize,
        value: String,
    },
    #[error("{origin} is empty")]
    EmptyList { origin: String },
    #[error("invalid blacklist pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("suggestion threshold must be in (0, 1], got {0}")]
    Threshold(f64),
    #[error("batch concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("SMTP throttle needs a positive probe count and window")]
    Throttle,
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[cfg(feature = "with-serde")]
    #[error("invalid config file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn pattern(pattern: &str, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Contract violations on the public entry points. Network trouble never
/// shows up here: it is folded into the returned result instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("batch is empty")]
    EmptyBatch,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
