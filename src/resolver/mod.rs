//! Domain resolution with a TTL cache.
//!
//! [`DomainResolver::resolve`] never fails: timeouts and server errors end up
//! in [`DomainRecord::diagnostic`] with `transient == true`, cached for the
//! short failure TTL so a batch does not keep hitting a dead resolver.

mod cache;
mod error;
mod lookup;
mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;
use tracing::{debug, instrument, warn};

pub use error::ResolutionError;
pub use lookup::{DnsLookup, SystemLookup};
pub use types::{DomainRecord, MxRecord};

use crate::config::DnsSettings;
use crate::context::CallContext;
use crate::validator::normalize_domain;
use cache::DomainCache;

pub struct DomainResolver {
    lookup: Arc<dyn DnsLookup>,
    settings: DnsSettings,
    cache: DomainCache,
    lookups: AtomicU64,
}

impl std::fmt::Debug for DomainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainResolver")
            .field("settings", &self.settings)
            .field("cached", &self.cache.len())
            .field("lookups", &self.lookups())
            .finish()
    }
}

impl DomainResolver {
    pub fn new(lookup: Arc<dyn DnsLookup>, settings: DnsSettings) -> Self {
        Self {
            lookup,
            settings,
            cache: DomainCache::default(),
            lookups: AtomicU64::new(0),
        }
    }

    /// Cached record for `domain`, resolving on a miss or after expiry.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn resolve(&self, domain: &str, ctx: &CallContext) -> DomainRecord {
        let key = normalize_domain(domain);
        if let Some(record) = self.cache.get(&key, Instant::now()) {
            debug!(domain = %key, "resolver cache hit");
            return record;
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let timeout = self.settings.lookup_timeout;
        let (mx, addr) = tokio::join!(
            ctx.run(timeout, self.lookup.lookup_mx(&key)),
            ctx.run(timeout, self.lookup.has_address(&key)),
        );
        let mx = mx.unwrap_or(Err(ResolutionError::Timeout));
        let addr = addr.unwrap_or(Err(ResolutionError::Timeout));

        let record = self.build_record(key, mx, addr);
        if record.transient && ctx.is_expired() {
            // Cut short by the caller, not by DNS: nothing worth remembering.
            return record;
        }
        self.cache.insert(record.clone());
        record
    }

    fn build_record(
        &self,
        domain: String,
        mx: Result<Vec<MxRecord>, ResolutionError>,
        addr: Result<bool, ResolutionError>,
    ) -> DomainRecord {
        let mut failure = None;
        let mut null_mx = false;

        let mx_hosts = match mx {
            Ok(records) => {
                null_mx = is_null_mx(&records);
                ordered_hosts(records)
            }
            Err(err) => {
                warn!(domain = %domain, error = %err, "MX lookup failed");
                failure = Some(err.to_string());
                Vec::new()
            }
        };
        let has_address = match addr {
            Ok(found) => found,
            Err(err) => {
                debug!(domain = %domain, error = %err, "address lookup failed");
                // Only matters when there is no MX host to fall back on.
                if failure.is_none() && mx_hosts.is_empty() && !null_mx {
                    failure = Some(err.to_string());
                }
                false
            }
        };

        // The address fallback needs a conclusive "no MX" answer.
        let implicit_mx = mx_hosts.is_empty() && has_address && failure.is_none() && !null_mx;
        let mx_hosts = if implicit_mx {
            vec![domain.clone()]
        } else {
            mx_hosts
        };
        let has_dns = has_address || null_mx || !mx_hosts.is_empty();
        let transient = failure.is_some();

        let (ttl, diagnostic) = match failure {
            Some(reason) => (self.settings.failure_ttl, Some(reason)),
            None if null_mx => (
                self.settings.cache_ttl,
                Some("domain accepts no mail (null MX)".to_string()),
            ),
            None if !has_dns => (
                self.settings.cache_ttl,
                Some("no MX or address records".to_string()),
            ),
            None => (self.settings.cache_ttl, None),
        };

        debug!(
            domain = %domain,
            has_dns,
            implicit_mx,
            transient,
            hosts = mx_hosts.len(),
            "domain resolved"
        );
        DomainRecord {
            domain,
            has_dns,
            mx_hosts,
            implicit_mx,
            transient,
            resolved_at: Instant::now(),
            ttl,
            diagnostic,
        }
    }

    /// Fresh cached record, without resolving.
    pub fn cached(&self, domain: &str) -> Option<DomainRecord> {
        self.cache.get(&normalize_domain(domain), Instant::now())
    }

    /// Forgets `domain`; the next [`resolve`](Self::resolve) goes to DNS.
    pub fn expire(&self, domain: &str) -> bool {
        self.cache.remove(&normalize_domain(domain))
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired(Instant::now())
    }

    /// Number of cache misses that went to DNS.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

fn normalize_exchange(exchange: &str) -> String {
    exchange.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// RFC 7505: the domain publishes only `.` exchangers and accepts no mail.
fn is_null_mx(records: &[MxRecord]) -> bool {
    !records.is_empty()
        && records
            .iter()
            .all(|r| normalize_exchange(&r.exchange).is_empty())
}

/// Preference order, one entry per host. Null MX (`.`) entries are dropped.
fn ordered_hosts(records: Vec<MxRecord>) -> Vec<String> {
    let mut records: Vec<MxRecord> = records
        .into_iter()
        .map(|r| MxRecord::new(r.preference, normalize_exchange(&r.exchange)))
        .filter(|r| !r.exchange.is_empty())
        .collect();
    records.sort();

    let mut hosts: Vec<String> = Vec::with_capacity(records.len());
    for record in records {
        if !hosts.contains(&record.exchange) {
            hosts.push(record.exchange);
        }
    }
    hosts
}
