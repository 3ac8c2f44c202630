use thiserror::Error;

/// A lookup that could not produce an answer. Conclusive negatives
/// (NXDOMAIN, no records of the type) are not errors: they come back as
/// empty results.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("DNS lookup timed out")]
    Timeout,
    #[error("DNS lookup failed: {source}")]
    Lookup {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("DNS lookup failed: {0}")]
    Failed(String),
}

impl ResolutionError {
    pub(crate) fn lookup(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::Lookup { source }
    }
}
