use std::time::Duration;

use tokio::time::Instant;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// What DNS said about a domain, as held in the resolver cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub domain: String,
    /// The domain has an A/AAAA record or MX records.
    pub has_dns: bool,
    /// Mail exchangers in preference order.
    pub mx_hosts: Vec<String>,
    /// `mx_hosts` is the address-record fallback (`[domain]`), not real MX.
    pub implicit_mx: bool,
    /// A lookup failed (timeout, SERVFAIL); held for the failure TTL only.
    pub transient: bool,
    pub resolved_at: Instant,
    pub ttl: Duration,
    /// Why the lookup came back empty, when it did.
    pub diagnostic: Option<String>,
}

impl DomainRecord {
    /// At least one host would accept a connection for this domain.
    pub fn has_mail_host(&self) -> bool {
        !self.mx_hosts.is_empty()
    }

    /// Real MX records were published.
    pub fn has_mx(&self) -> bool {
        self.has_mail_host() && !self.implicit_mx
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.resolved_at) < self.ttl
    }
}
