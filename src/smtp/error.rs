use thiserror::Error;

use super::ProbeErrorKind;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timed out during {step}")]
    Timeout { step: &'static str },
    #[error("connection closed by server")]
    Closed,
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("{step} rejected with {code}")]
    Rejected { step: &'static str, code: u16 },
    #[error("probe throttled")]
    RateLimited,
}

impl ProbeError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match source.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io { source },
        }
    }

    pub fn kind(&self) -> ProbeErrorKind {
        match self {
            Self::Connect { .. } => ProbeErrorKind::Refused,
            Self::Timeout { .. } => ProbeErrorKind::Timeout,
            Self::Closed => ProbeErrorKind::Closed,
            Self::Io { .. } | Self::Protocol(_) => ProbeErrorKind::Protocol,
            Self::Rejected { .. } => ProbeErrorKind::UnexpectedCode,
            Self::RateLimited => ProbeErrorKind::RateLimited,
        }
    }

    /// The server went away between commands; worth one reconnect.
    pub(crate) fn is_disconnect(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
