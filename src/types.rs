use std::time::Duration;

use crate::batch::Tier;
use crate::scoring::RiskAssessment;
use crate::smtp::SmtpProbeResult;

/// Flat view of what the pipeline established about one address.
///
/// `smtp_verified` is `None` when no SMTP probe ran, `Some(true)` only when
/// the mailbox was accepted by a server that is not catch-all, and
/// `Some(false)` for every other probe outcome (absent, inconclusive,
/// catch-all).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationChecks {
    pub syntax: bool,
    pub dns_valid: bool,
    pub mx_records: bool,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub smtp_verified: Option<bool>,
    pub is_disposable: bool,
    pub is_role_based: bool,
    pub is_catch_all: bool,
}

/// Verdict for one address. A plain value: nothing in the engine mutates it
/// after it is returned.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub email: String,
    pub valid: bool,
    pub checks: ValidationChecks,
    pub confidence_score: u8,
    /// Best score reachable with the checks that actually ran (80 when SMTP
    /// probing was off, with the default weights).
    pub max_confidence: u8,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub suggestion: Option<String>,
    pub reason: String,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub risk: Option<RiskAssessment>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub smtp: Option<SmtpProbeResult>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub tier: Option<Tier>,
    /// Set when a batch deadline cut the pipeline short; `checks` then only
    /// reflects what completed.
    pub partial: bool,
}

/// Per-call switches.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    pub check_dns: bool,
    pub check_mx: bool,
    pub check_disposable: bool,
    pub check_typos: bool,
    pub check_role_based: bool,
    /// Opt-in: costs seconds per address and outbound IP reputation.
    pub enable_smtp: bool,
    pub smtp_timeout_seconds: u64,
    /// Attach a [`RiskAssessment`] computed with an empty bounce history.
    pub assess_risk: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            check_dns: true,
            check_mx: true,
            check_disposable: true,
            check_typos: true,
            check_role_based: true,
            enable_smtp: false,
            smtp_timeout_seconds: 10,
            assess_risk: false,
        }
    }
}

impl ValidateOptions {
    /// Only the offline checks: syntax and the list lookups.
    pub fn offline() -> Self {
        Self {
            check_dns: false,
            check_mx: false,
            ..Self::default()
        }
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_seconds.max(1))
    }

    pub(crate) fn needs_resolution(&self) -> bool {
        self.check_dns || self.check_mx || self.enable_smtp
    }
}
