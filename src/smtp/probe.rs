use tracing::{debug, info, instrument, warn};

use super::session::{SmtpReply, SmtpSession};
use super::throttle::ProbeThrottle;
use super::util::random_local_part;
use super::{ProbeError, ProbeErrorKind, SmtpProbeOptions, SmtpProbeResult, Verification};
use crate::context::CallContext;
use crate::error::ConfigError;
use crate::validator::EmailAddress;

/// RCPT TO based mailbox verification with catch-all detection.
#[derive(Debug)]
pub struct SmtpProber {
    options: SmtpProbeOptions,
    throttle: ProbeThrottle,
}

impl SmtpProber {
    pub fn new(options: SmtpProbeOptions) -> Result<Self, ConfigError> {
        let throttle = ProbeThrottle::new(options.probes_per_window, options.probe_window)?;
        Ok(Self { options, throttle })
    }

    pub fn options(&self) -> &SmtpProbeOptions {
        &self.options
    }

    /// Probes `address` against `mx_hosts` (preference order). Never fails:
    /// every problem ends as [`Verification::Inconclusive`] with an error
    /// kind.
    #[instrument(level = "debug", skip(self, address, mx_hosts, ctx), fields(address = %address))]
    pub async fn probe(
        &self,
        address: &EmailAddress,
        mx_hosts: &[String],
        ctx: &CallContext,
    ) -> SmtpProbeResult {
        if mx_hosts.is_empty() {
            return SmtpProbeResult::inconclusive(ProbeErrorKind::NoHosts);
        }
        if let Err(err) = self.throttle.acquire(ctx).await {
            warn!(error = %err, "SMTP probe skipped");
            return SmtpProbeResult::inconclusive(err.kind());
        }

        let mut transcript = Vec::new();
        let mut last = SmtpProbeResult::inconclusive(ProbeErrorKind::Timeout);

        for host in mx_hosts.iter().take(self.options.max_mx.max(1)) {
            if ctx.is_expired() {
                break;
            }
            match self.probe_host(host, address, ctx).await {
                Ok(mut outcome) => {
                    transcript.append(&mut outcome.transcript);
                    let conclusive =
                        outcome.verified != Verification::Inconclusive || outcome.is_catch_all;
                    last = outcome;
                    if conclusive {
                        break;
                    }
                }
                Err(err) => {
                    debug!(host = %host, error = %err, "SMTP host failed");
                    transcript.push(format!("[{host}] ! error: {err}"));
                    last = SmtpProbeResult {
                        mx_host: Some(host.clone()),
                        ..SmtpProbeResult::inconclusive(err.kind())
                    };
                }
            }
        }

        last.transcript = transcript;
        info!(
            verified = %last.verified,
            code = ?last.smtp_code,
            catch_all = last.is_catch_all,
            host = ?last.mx_host,
            "SMTP probe finished"
        );
        last
    }

    async fn probe_host(
        &self,
        host: &str,
        address: &EmailAddress,
        ctx: &CallContext,
    ) -> Result<SmtpProbeResult, ProbeError> {
        let domain = address.domain();
        let mail_from = self.options.mail_from(domain);

        let mut session = self.open(host, ctx, &mail_from).await?;

        let target = format!("RCPT TO:<{address}>");
        let reply = match session.send_command("RCPT TO", &target).await {
            Ok(reply) => reply,
            Err(err) => {
                session.quit().await;
                let mut transcript = session.take_transcript();
                transcript.push(format!("[{host}] ! error: {err}"));
                return Ok(SmtpProbeResult {
                    mx_host: Some(host.to_string()),
                    transcript,
                    ..SmtpProbeResult::inconclusive(err.kind())
                });
            }
        };

        let base = SmtpProbeResult {
            verified: Verification::Inconclusive,
            smtp_code: Some(reply.code),
            error: None,
            is_catch_all: false,
            mx_host: Some(host.to_string()),
            transcript: Vec::new(),
        };

        match classify_rcpt(&reply) {
            RcptAnswer::Absent => {
                session.quit().await;
                return Ok(SmtpProbeResult {
                    verified: Verification::ConfirmedAbsent,
                    transcript: session.take_transcript(),
                    ..base
                });
            }
            RcptAnswer::Other => {
                session.quit().await;
                return Ok(SmtpProbeResult {
                    error: Some(ProbeErrorKind::UnexpectedCode),
                    transcript: session.take_transcript(),
                    ..base
                });
            }
            RcptAnswer::Accepted => {}
        }

        let synthetic = format!("RCPT TO:<{}@{domain}>", random_local_part());
        let first = session.send_command("catch-all RCPT TO", &synthetic).await;
        let hung_up = match &first {
            Ok(reply) => reply.code == 421,
            Err(err) => err.is_disconnect(),
        };
        if hung_up {
            let mut transcript = session.take_transcript();
            let answer = self
                .retry_synthetic(host, ctx, &mail_from, &synthetic, &mut transcript)
                .await;
            return Ok(finish(base, answer, transcript));
        }
        let catch_all = match first {
            Ok(reply) => Some(classify_rcpt(&reply) == RcptAnswer::Accepted),
            Err(err) => {
                debug!(host, error = %err, "catch-all check abandoned");
                None
            }
        };

        session.quit().await;
        Ok(finish(base, catch_all, session.take_transcript()))
    }

    /// Connect, banner, EHLO (HELO fallback), MAIL FROM.
    async fn open(
        &self,
        host: &str,
        ctx: &CallContext,
        mail_from: &str,
    ) -> Result<SmtpSession, ProbeError> {
        let mut session =
            SmtpSession::connect(host, self.options.port, ctx, self.options.step_timeout).await?;

        let banner = session.read_banner().await?;
        if !banner.is_positive_completion() {
            session.quit().await;
            return Err(ProbeError::Rejected {
                step: "banner",
                code: banner.code,
            });
        }

        let helo = self.options.helo_name();
        let ehlo = session
            .send_command("EHLO", &format!("EHLO {helo}"))
            .await?;
        if !ehlo.is_positive_completion() {
            let fallback = session
                .send_command("HELO", &format!("HELO {helo}"))
                .await?;
            if !fallback.is_positive_completion() {
                session.quit().await;
                return Err(ProbeError::Rejected {
                    step: "HELO",
                    code: fallback.code,
                });
            }
        }

        let envelope = if mail_from.is_empty() {
            "MAIL FROM:<>".to_string()
        } else {
            format!("MAIL FROM:<{mail_from}>")
        };
        let reply = session.send_command("MAIL FROM", &envelope).await?;
        if !reply.is_positive_completion() {
            session.quit().await;
            return Err(ProbeError::Rejected {
                step: "MAIL FROM",
                code: reply.code,
            });
        }
        debug!(host = session.host(), "SMTP envelope open");
        Ok(session)
    }

    /// One reconnect for the synthetic RCPT after the server hung up.
    /// `None` when that fails too.
    async fn retry_synthetic(
        &self,
        host: &str,
        ctx: &CallContext,
        mail_from: &str,
        synthetic: &str,
        transcript: &mut Vec<String>,
    ) -> Option<bool> {
        debug!(host, "server closed before catch-all check, reconnecting");
        let mut session = match self.open(host, ctx, mail_from).await {
            Ok(session) => session,
            Err(err) => {
                transcript.push(format!("[{host}] ! reconnect failed: {err}"));
                return None;
            }
        };
        let answer = match session.send_command("catch-all RCPT TO", synthetic).await {
            Ok(reply) if reply.code != 421 => Some(classify_rcpt(&reply) == RcptAnswer::Accepted),
            Ok(_) => None,
            Err(err) => {
                session.transcript.push(format!("[{host}] ! error: {err}"));
                None
            }
        };
        session.quit().await;
        transcript.append(&mut session.take_transcript());
        answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RcptAnswer {
    Accepted,
    Absent,
    Other,
}

fn classify_rcpt(reply: &SmtpReply) -> RcptAnswer {
    match reply.code {
        250 | 251 => RcptAnswer::Accepted,
        550 | 551 | 553 => RcptAnswer::Absent,
        _ => RcptAnswer::Other,
    }
}

/// Verdict after the real address was accepted. `catch_all` is `None` when
/// the synthetic check could not complete; the real answer then stands.
fn finish(
    base: SmtpProbeResult,
    catch_all: Option<bool>,
    transcript: Vec<String>,
) -> SmtpProbeResult {
    let is_catch_all = catch_all.unwrap_or(false);
    SmtpProbeResult {
        verified: if is_catch_all {
            Verification::Inconclusive
        } else {
            Verification::ConfirmedExists
        },
        is_catch_all,
        transcript,
        ..base
    }
}
