use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// What the probe could establish about the mailbox.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verification {
    /// RCPT TO accepted by a server that rejects unknown mailboxes.
    ConfirmedExists,
    /// RCPT TO rejected with 550, 551 or 553.
    ConfirmedAbsent,
    /// Anything else: catch-all acceptance, temporary failures, timeouts,
    /// refused connections, throttling.
    Inconclusive,
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConfirmedExists => "exists",
            Self::ConfirmedAbsent => "absent",
            Self::Inconclusive => "inconclusive",
        })
    }
}

/// Coarse reason an SMTP probe stayed inconclusive.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeErrorKind {
    Refused,
    Timeout,
    UnexpectedCode,
    Closed,
    RateLimited,
    NoHosts,
    Protocol,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Refused => "connection refused",
            Self::Timeout => "timeout",
            Self::UnexpectedCode => "unexpected reply",
            Self::Closed => "connection closed",
            Self::RateLimited => "rate limited",
            Self::NoHosts => "no mail host",
            Self::Protocol => "protocol error",
        })
    }
}

/// Outcome of one probe. Not cached.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeResult {
    pub verified: Verification,
    /// Reply code to the real RCPT TO (or the last code seen).
    pub smtp_code: Option<u16>,
    pub error: Option<ProbeErrorKind>,
    pub is_catch_all: bool,
    pub mx_host: Option<String>,
    pub transcript: Vec<String>,
}

impl SmtpProbeResult {
    pub(crate) fn inconclusive(error: ProbeErrorKind) -> Self {
        Self {
            verified: Verification::Inconclusive,
            smtp_code: None,
            error: Some(error),
            is_catch_all: false,
            mx_host: None,
            transcript: Vec::new(),
        }
    }

    /// The mailbox was accepted by a server that is not catch-all.
    pub fn is_deliverable(&self) -> bool {
        self.verified == Verification::ConfirmedExists && !self.is_catch_all
    }
}
