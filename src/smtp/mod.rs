//! SMTP mailbox probing.
//!
//! [`SmtpProber::probe`] runs a minimal dialogue (banner, EHLO, MAIL FROM,
//! RCPT TO) against the domain's mail hosts and follows an accepted RCPT
//! with a second one for a random local part. A server that accepts both is
//! catch-all and its answer says nothing about the real mailbox.

mod error;
mod options;
mod probe;
mod session;
mod throttle;
mod types;
mod util;

pub use error::ProbeError;
pub use options::SmtpProbeOptions;
pub use probe::SmtpProber;
pub use throttle::ProbeThrottle;
pub use types::{ProbeErrorKind, SmtpProbeResult, Verification};
