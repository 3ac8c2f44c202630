//! Engine-wide, immutable configuration.
//!
//! An [`EngineConfig`] is built once at startup (defaults, list files, an
//! optional JSON config file), checked with [`EngineConfig::validate`] and then
//! shared read-only by every component. Nothing in the engine keeps global
//! mutable state.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use regex::Regex;

use crate::error::ConfigError;
use crate::heuristics::lists;
use crate::scoring::{ConfidenceWeights, RiskWeights};
use crate::smtp::SmtpProbeOptions;
use crate::validator::{ValidationMode, check_domain, normalize_domain};

/// Which upstream resolver the production [`DnsLookup`](crate::DnsLookup) talks to.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DnsProvider {
    /// `/etc/resolv.conf` (or the platform equivalent).
    #[default]
    System,
    Cloudflare,
    Google,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DnsSettings {
    pub provider: DnsProvider,
    /// Bound on each of the A/AAAA and MX lookups.
    pub lookup_timeout: Duration,
    /// Lifetime of conclusive answers (records found, NXDOMAIN, no records).
    pub cache_ttl: Duration,
    /// Lifetime of transient failures (timeouts, SERVFAIL).
    pub failure_ttl: Duration,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            provider: DnsProvider::System,
            lookup_timeout: Duration::from_secs(4),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            failure_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    /// Upper bound on addresses (and domains) processed at once.
    pub concurrency: usize,
    /// Deadline used by callers that do not pass one (the CLI).
    pub default_deadline: Duration,
    /// Premium-tier addresses skip SMTP probing unless this is set.
    pub probe_premium: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: 16,
            default_deadline: Duration::from_secs(120),
            probe_premium: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub syntax_mode: ValidationMode,
    pub disposable_domains: HashSet<String>,
    pub role_prefixes: HashSet<String>,
    /// Ordered list of well-known mailbox providers. Drives typo suggestions
    /// and the Premium tier.
    pub common_domains: Vec<String>,
    pub spam_trap_domains: HashSet<String>,
    pub blacklist_patterns: Vec<Regex>,
    pub suggestion_threshold: f64,
    pub confidence_weights: ConfidenceWeights,
    pub risk_weights: RiskWeights,
    pub dns: DnsSettings,
    pub smtp: SmtpProbeOptions,
    pub batch: BatchSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            syntax_mode: ValidationMode::Strict,
            disposable_domains: to_set(lists::DISPOSABLE_DOMAINS.iter()),
            role_prefixes: to_set(lists::ROLE_PREFIXES.iter()),
            common_domains: lists::COMMON_DOMAINS.iter().map(|d| d.to_string()).collect(),
            spam_trap_domains: to_set(lists::SPAM_TRAP_DOMAINS.iter()),
            blacklist_patterns: lists::BLACKLIST_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            suggestion_threshold: 0.85,
            confidence_weights: ConfidenceWeights::default(),
            risk_weights: RiskWeights::default(),
            dns: DnsSettings::default(),
            smtp: SmtpProbeOptions::default(),
            batch: BatchSettings::default(),
        }
    }
}

fn to_set<'a>(items: impl Iterator<Item = &'a &'static str>) -> HashSet<String> {
    items.map(|s| s.to_ascii_lowercase()).collect()
}

impl EngineConfig {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.suggestion_threshold > 0.0 && self.suggestion_threshold <= 1.0) {
            return Err(ConfigError::Threshold(self.suggestion_threshold));
        }
        if self.batch.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.smtp.probes_per_window == 0 || self.smtp.probe_window.is_zero() {
            return Err(ConfigError::Throttle);
        }
        if self.dns.lookup_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("dns lookup timeout"));
        }
        if self.smtp.step_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("smtp step timeout"));
        }
        if self.common_domains.is_empty() {
            return Err(ConfigError::EmptyList {
                origin: "common domain list".to_string(),
            });
        }
        Ok(())
    }

    /// Replaces the blacklist with freshly compiled patterns.
    pub fn with_blacklist_patterns<S: AsRef<str>>(
        mut self,
        patterns: &[S],
    ) -> Result<Self, ConfigError> {
        self.blacklist_patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()).map_err(|err| ConfigError::pattern(p.as_ref(), err)))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn with_disposable_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disposable_domains = domains
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()))
            .collect();
        self
    }

    pub fn with_role_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.role_prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    pub fn with_common_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.common_domains = dedup_ordered(domains.into_iter().map(|d| normalize_domain(d.as_ref())));
        self
    }

    pub fn with_spam_trap_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.spam_trap_domains = domains
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()))
            .collect();
        self
    }

    pub fn is_common_domain(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        self.common_domains.iter().any(|d| *d == domain)
    }

    pub fn is_spam_trap_domain(&self, domain: &str) -> bool {
        self.spam_trap_domains.contains(&domain.to_ascii_lowercase())
    }

    pub fn matches_blacklist(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.blacklist_patterns.iter().any(|re| re.is_match(&email))
    }
}

/// Reads a domain list: one entry per line, `#` starts a comment.
pub fn load_domain_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    parse_domain_list(&path.display().to_string(), &content)
}

/// Parses list content, keeping first-seen order. Every entry must be a
/// well-formed domain; the first bad line aborts with its line number.
pub fn parse_domain_list(origin: &str, content: &str) -> Result<Vec<String>, ConfigError> {
    let mut out = Vec::new();
    for (line, value) in list_entries(content) {
        let mut errors = Vec::new();
        let ascii = check_domain(value, &mut errors);
        match ascii {
            Some(domain) if errors.is_empty() => out.push(domain),
            _ => {
                return Err(ConfigError::InvalidDomainEntry {
                    origin: origin.to_string(),
                    line,
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(dedup_ordered(out.into_iter()))
}

pub fn load_role_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    parse_role_list(&path.display().to_string(), &content)
}

pub fn parse_role_list(origin: &str, content: &str) -> Result<Vec<String>, ConfigError> {
    let mut out = Vec::new();
    for (line, value) in list_entries(content) {
        let ok = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'));
        if !ok {
            return Err(ConfigError::InvalidLocalEntry {
                origin: origin.to_string(),
                line,
                value: value.to_string(),
            });
        }
        out.push(value.to_ascii_lowercase());
    }
    Ok(dedup_ordered(out.into_iter()))
}

fn list_entries(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content.lines().enumerate().filter_map(|(idx, raw)| {
        let value = raw.split('#').next().unwrap_or_default().trim();
        (!value.is_empty()).then_some((idx + 1, value))
    })
}

fn dedup_ordered(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(feature = "with-serde")]
pub use file::ConfigFile;

#[cfg(feature = "with-serde")]
mod file {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use serde::Deserialize;

    use super::{DnsProvider, EngineConfig, load_domain_list, load_role_list};
    use crate::error::ConfigError;
    use crate::validator::ValidationMode;

    /// On-disk overrides. Relative list paths are resolved against the
    /// directory holding the config file.
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub struct ConfigFile {
        pub syntax_mode: Option<ValidationMode>,
        pub disposable_list: Option<PathBuf>,
        pub role_list: Option<PathBuf>,
        pub common_list: Option<PathBuf>,
        pub spam_trap_list: Option<PathBuf>,
        pub blacklist_patterns: Option<Vec<String>>,
        pub suggestion_threshold: Option<f64>,
        pub dns_provider: Option<DnsProvider>,
        pub dns_timeout_ms: Option<u64>,
        pub cache_ttl_secs: Option<u64>,
        pub helo_domain: Option<String>,
        pub mail_from: Option<String>,
        pub smtp_port: Option<u16>,
        pub probes_per_window: Option<u32>,
        pub probe_window_secs: Option<u64>,
        pub batch_concurrency: Option<usize>,
        pub probe_premium: Option<bool>,
    }

    impl EngineConfig {
        pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
            let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
            let file: ConfigFile =
                serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            let config = Self::default().apply_file(file, base)?;
            config.validate()?;
            Ok(config)
        }

        pub fn apply_file(mut self, file: ConfigFile, base: &Path) -> Result<Self, ConfigError> {
            let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

            if let Some(mode) = file.syntax_mode {
                self.syntax_mode = mode;
            }
            if let Some(path) = file.disposable_list {
                self = self.with_disposable_domains(load_domain_list(&resolve(path))?);
            }
            if let Some(path) = file.role_list {
                self = self.with_role_prefixes(load_role_list(&resolve(path))?);
            }
            if let Some(path) = file.common_list {
                self = self.with_common_domains(load_domain_list(&resolve(path))?);
            }
            if let Some(path) = file.spam_trap_list {
                self = self.with_spam_trap_domains(load_domain_list(&resolve(path))?);
            }
            if let Some(patterns) = file.blacklist_patterns {
                self = self.with_blacklist_patterns(&patterns)?;
            }
            if let Some(threshold) = file.suggestion_threshold {
                self.suggestion_threshold = threshold;
            }
            if let Some(provider) = file.dns_provider {
                self.dns.provider = provider;
            }
            if let Some(ms) = file.dns_timeout_ms {
                self.dns.lookup_timeout = Duration::from_millis(ms);
            }
            if let Some(secs) = file.cache_ttl_secs {
                self.dns.cache_ttl = Duration::from_secs(secs);
            }
            if let Some(helo) = file.helo_domain {
                self.smtp.helo_domain = helo;
            }
            if let Some(from) = file.mail_from {
                self.smtp.mail_from = from;
            }
            if let Some(port) = file.smtp_port {
                self.smtp.port = port;
            }
            if let Some(count) = file.probes_per_window {
                self.smtp.probes_per_window = count;
            }
            if let Some(secs) = file.probe_window_secs {
                self.smtp.probe_window = Duration::from_secs(secs);
            }
            if let Some(concurrency) = file.batch_concurrency {
                self.batch.concurrency = concurrency;
            }
            if let Some(flag) = file.probe_premium {
                self.batch.probe_premium = flag;
            }
            Ok(self)
        }
    }
}
