use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::ProbeError;
use crate::context::CallContext;

#[derive(Debug, Clone)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Reply parser over a TCP connection. Multi-line replies (`250-...`) are
/// folded into one [`SmtpReply`].
#[derive(Debug)]
struct SmtpStream {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl SmtpStream {
    async fn write_line(&mut self, command: &str) -> Result<(), ProbeError> {
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.stream.write_all(&data).await.map_err(ProbeError::io)?;
        self.stream.flush().await.map_err(ProbeError::io)
    }

    async fn read_reply(&mut self) -> Result<SmtpReply, ProbeError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line().await?;
            if line.len() < 3 {
                return Err(ProbeError::Protocol(format!("invalid reply: {line}")));
            }
            let parsed_code = line
                .get(..3)
                .and_then(|c| c.parse::<u16>().ok())
                .ok_or_else(|| ProbeError::Protocol(format!("invalid code in line: {line}")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(ProbeError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if is_last {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or(0),
            lines,
        })
    }

    async fn read_line(&mut self) -> Result<String, ProbeError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                if line.ends_with(b"\r\n") {
                    line.truncate(line.len() - 2);
                } else {
                    line.truncate(line.len() - 1);
                }
                return String::from_utf8(line)
                    .map_err(|err| ProbeError::Protocol(format!("utf8 error: {err}")));
            }

            let mut buf = [0u8; 512];
            let read = self.stream.read(&mut buf).await.map_err(ProbeError::io)?;
            if read == 0 {
                return Err(ProbeError::Closed);
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

/// One SMTP connection. Every network step is bounded by the step timeout
/// and the caller's deadline.
#[derive(Debug)]
pub(crate) struct SmtpSession {
    host: String,
    stream: SmtpStream,
    ctx: CallContext,
    step_timeout: Duration,
    pub transcript: Vec<String>,
}

impl SmtpSession {
    pub(crate) async fn connect(
        host: &str,
        port: u16,
        ctx: &CallContext,
        step_timeout: Duration,
    ) -> Result<Self, ProbeError> {
        let stream = ctx
            .run(step_timeout, TcpStream::connect((host, port)))
            .await
            .ok_or(ProbeError::Timeout { step: "connect" })?
            .map_err(|source| ProbeError::Connect {
                host: host.to_string(),
                source,
            })?;
        Ok(Self {
            host: host.to_string(),
            stream: SmtpStream {
                stream,
                buffer: Vec::new(),
            },
            ctx: *ctx,
            step_timeout,
            transcript: Vec::new(),
        })
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    fn record(&mut self, direction: &str, message: &str) {
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            self.record("S", &reply.code.to_string());
        } else {
            for line in &reply.lines {
                self.record("S", &format!("{} {}", reply.code, line));
            }
        }
    }

    pub(crate) async fn read_banner(&mut self) -> Result<SmtpReply, ProbeError> {
        let reply = self
            .ctx
            .run(self.step_timeout, self.stream.read_reply())
            .await
            .ok_or(ProbeError::Timeout { step: "banner" })??;
        self.record_reply(&reply);
        Ok(reply)
    }

    pub(crate) async fn send_command(
        &mut self,
        step: &'static str,
        command: &str,
    ) -> Result<SmtpReply, ProbeError> {
        self.record("C", command);
        let stream = &mut self.stream;
        let reply = self
            .ctx
            .run(self.step_timeout, async {
                stream.write_line(command).await?;
                stream.read_reply().await
            })
            .await
            .ok_or(ProbeError::Timeout { step })??;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// Best effort: the verdict is already known when this runs.
    pub(crate) async fn quit(&mut self) {
        self.record("C", "QUIT");
        let stream = &mut self.stream;
        let reply = self
            .ctx
            .run(self.step_timeout, async {
                stream.write_line("QUIT").await?;
                stream.read_reply().await
            })
            .await;
        if let Some(Ok(reply)) = reply {
            self.record_reply(&reply);
        }
    }

    pub(crate) fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }
}
