use async_trait::async_trait;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

use super::{MxRecord, ResolutionError};
use crate::config::{DnsProvider, DnsSettings};
use crate::error::ConfigError;

/// Raw DNS access. Implementations answer a single query and leave caching,
/// ordering and timeouts to [`DomainResolver`](super::DomainResolver).
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// MX records of `domain`, in any order. No records is `Ok(vec![])`.
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolutionError>;

    /// Whether `domain` has at least one A or AAAA record.
    async fn has_address(&self, domain: &str) -> Result<bool, ResolutionError>;
}

/// [`DnsLookup`] over trust-dns' tokio resolver.
pub struct SystemLookup {
    resolver: TokioAsyncResolver,
}

impl SystemLookup {
    pub fn new(settings: &DnsSettings) -> Result<Self, ConfigError> {
        let resolver = match settings.provider {
            DnsProvider::System => TokioAsyncResolver::tokio_from_system_conf()
                .map_err(|source| ConfigError::ResolverInit { source })?,
            DnsProvider::Cloudflare => {
                TokioAsyncResolver::tokio(ResolverConfig::cloudflare(), opts(settings))
            }
            DnsProvider::Google => {
                TokioAsyncResolver::tokio(ResolverConfig::google(), opts(settings))
            }
        };
        Ok(Self { resolver })
    }

    pub fn from_resolver(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }
}

fn opts(settings: &DnsSettings) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = settings.lookup_timeout;
    opts.attempts = 1;
    // Our own cache sits in front of this one.
    opts.cache_size = 0;
    opts
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

fn classify(err: ResolveError) -> ResolutionError {
    match err.kind() {
        ResolveErrorKind::Timeout => ResolutionError::Timeout,
        _ => ResolutionError::lookup(err),
    }
}

#[async_trait]
impl DnsLookup for SystemLookup {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolutionError> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| MxRecord::new(mx.preference(), mx.exchange().to_utf8()))
                .collect()),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(classify(err)),
        }
    }

    async fn has_address(&self, domain: &str) -> Result<bool, ResolutionError> {
        match self.resolver.lookup_ip(domain).await {
            Ok(lookup) => Ok(lookup.iter().next().is_some()),
            Err(err) if is_no_records(&err) => Ok(false),
            Err(err) => Err(classify(err)),
        }
    }
}
