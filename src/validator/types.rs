use std::fmt;

use thiserror::Error;

/// Local-part rules applied by [`parse_email`](super::parse_email).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// RFC atext only, dots neither leading, trailing nor doubled.
    #[default]
    Strict,
    /// Strict rules, plus a simple quoted string (`"john doe"`).
    Relaxed,
}

/// Structural decomposition of a syntactically valid address.
///
/// The domain is stored in its ASCII (punycode) form, lower-cased, which is
/// the form every downstream lookup keys on.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    local_part: String,
    domain: String,
}

impl EmailAddress {
    pub(crate) fn new(local_part: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local_part: local_part.into(),
            domain: domain.into(),
        }
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

/// Why an address failed the structural check.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("empty address")]
    Empty,
    #[error("missing @")]
    MissingAt,
    #[error("multiple @")]
    MultipleAt,
    #[error("address too long ({0} > 254)")]
    TooLong(usize),
    #[error("missing local part")]
    EmptyLocal,
    #[error("local part too long ({0} > 64)")]
    LocalTooLong(usize),
    #[error("missing domain")]
    EmptyDomain,
    #[error("domain too long ({0} > 253)")]
    DomainTooLong(usize),
    #[error("whitespace or control character in address")]
    WhitespaceOrControl,
    #[error("invalid local part")]
    InvalidLocal,
    #[error("domain must contain at least one dot")]
    DomainWithoutDot,
    #[error("empty domain label")]
    EmptyLabel,
    #[error("domain label '{0}' longer than 63")]
    LabelTooLong(String),
    #[error("domain label '{0}' cannot start/end with '-'")]
    LabelHyphen(String),
    #[error("domain label '{0}' has invalid chars")]
    LabelChars(String),
    #[error("domain punycode conversion failed")]
    Idna,
}

impl SyntaxError {
    /// True when the failure concerns the domain part rather than the local part.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDomain
                | Self::DomainTooLong(_)
                | Self::DomainWithoutDot
                | Self::EmptyLabel
                | Self::LabelTooLong(_)
                | Self::LabelHyphen(_)
                | Self::LabelChars(_)
                | Self::Idna
        )
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxReport {
    pub valid: bool,
    pub errors: Vec<SyntaxError>,
    pub address: Option<EmailAddress>,
}

impl SyntaxReport {
    pub(crate) fn invalid(errors: Vec<SyntaxError>) -> Self {
        Self {
            valid: false,
            errors,
            address: None,
        }
    }

    /// First failure, rendered for humans ("missing @", "domain too long (300 > 253)", ...).
    pub fn failure_reason(&self) -> Option<String> {
        self.errors.first().map(ToString::to_string)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}
