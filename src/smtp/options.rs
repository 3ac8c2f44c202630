use std::borrow::Cow;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Configuration knobs for [`SmtpProber`](super::SmtpProber).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    pub helo_domain: String,
    /// Envelope sender. Empty means `postmaster@<target domain>`.
    pub mail_from: String,
    pub port: u16,
    /// Bound on connect and on each command/reply round trip. Clipped to
    /// what is left of the per-call budget.
    pub step_timeout: Duration,
    pub max_mx: usize,
    /// Process-wide throttle: at most this many probes per `probe_window`.
    pub probes_per_window: u32,
    pub probe_window: Duration,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            helo_domain: "localhost".to_string(),
            mail_from: String::new(),
            port: 25,
            step_timeout: Duration::from_secs(5),
            max_mx: 2,
            probes_per_window: 60,
            probe_window: Duration::from_secs(60),
        }
    }
}

impl SmtpProbeOptions {
    pub fn helo_name(&self) -> &str {
        let helo = self.helo_domain.trim();
        if helo.is_empty() { "localhost" } else { helo }
    }

    pub fn mail_from<'a>(&'a self, target_domain: &str) -> Cow<'a, str> {
        if self.mail_from.is_empty() {
            Cow::Owned(format!("postmaster@{target_domain}"))
        } else {
            Cow::Borrowed(self.mail_from.as_str())
        }
    }
}
