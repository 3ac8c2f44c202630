use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::types::ValidationResult;

/// Processing depth assigned from the first-pass confidence estimate.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Strong first pass on a well-known provider: no SMTP needed.
    Premium,
    High,
    Medium,
    Basic,
    /// Syntax or DNS failed: nothing worth probing.
    Minimal,
}

impl Tier {
    /// Tier for a first-pass estimate. `failed` covers syntax or DNS failure.
    pub fn assign(estimate: u8, failed: bool, common_domain: bool) -> Self {
        if failed {
            Tier::Minimal
        } else if estimate >= 80 && common_domain {
            Tier::Premium
        } else if estimate >= 75 {
            Tier::High
        } else if estimate >= 60 {
            Tier::Medium
        } else {
            Tier::Basic
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Premium => "premium",
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Basic => "basic",
            Tier::Minimal => "minimal",
        })
    }
}

/// Lifecycle of a batch job, as logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Queued,
    TierAssigned,
    Processing,
    Done,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchPhase::Queued => "queued",
            BatchPhase::TierAssigned => "tier_assigned",
            BatchPhase::Processing => "processing",
            BatchPhase::Done => "done",
        })
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub premium: usize,
    pub high: usize,
    pub medium: usize,
    pub basic: usize,
    pub minimal: usize,
}

impl TierCounts {
    pub(crate) fn add(&mut self, tier: Tier) {
        match tier {
            Tier::Premium => self.premium += 1,
            Tier::High => self.high += 1,
            Tier::Medium => self.medium += 1,
            Tier::Basic => self.basic += 1,
            Tier::Minimal => self.minimal += 1,
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub unique_domains: usize,
    /// Resolver cache misses during this batch.
    pub dns_lookups: u64,
    pub tiers: TierCounts,
    pub smtp_probes: usize,
    /// Addresses returned with `partial == true`.
    pub timed_out: usize,
}

/// Results in input order plus run statistics.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub results: Vec<ValidationResult>,
    pub stats: BatchStats,
}
