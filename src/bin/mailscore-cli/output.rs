use anyhow::{Context, Result, bail};

use mailscore_lib::{SyntaxReport, ValidationMode, ValidationResult};

#[cfg(feature = "with-serde")]
pub trait Report: serde::Serialize {}
#[cfg(feature = "with-serde")]
impl<T: serde::Serialize> Report for T {}

#[cfg(not(feature = "with-serde"))]
pub trait Report {}
#[cfg(not(feature = "with-serde"))]
impl<T> Report for T {}

/// One line of CLI output, whatever the subcommand.
pub trait Row: Report {
    fn valid(&self) -> bool;
    fn human_lines(&self) -> Vec<String>;
    #[cfg_attr(not(feature = "with-csv"), allow(dead_code))]
    fn csv_header() -> &'static [&'static str];
    #[cfg_attr(not(feature = "with-csv"), allow(dead_code))]
    fn csv_record(&self) -> Vec<String>;
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
pub struct SyntaxRow {
    pub email: String,
    pub valid: bool,
    pub mode: ValidationMode,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub local: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub domain: Option<String>,
    pub reasons: Vec<String>,
}

impl SyntaxRow {
    pub fn new(email: &str, mode: ValidationMode, report: &SyntaxReport) -> Self {
        Self {
            email: email.to_string(),
            valid: report.valid,
            mode,
            local: report.address.as_ref().map(|a| a.local_part().to_string()),
            domain: report.address.as_ref().map(|a| a.domain().to_string()),
            reasons: report.reasons(),
        }
    }
}

impl Row for SyntaxRow {
    fn valid(&self) -> bool {
        self.valid
    }

    fn human_lines(&self) -> Vec<String> {
        if self.valid {
            vec![format!("[OK]    {}", self.email)]
        } else {
            vec![format!("[INVALID] {} :: {}", self.email, self.reasons.join("; "))]
        }
    }

    fn csv_header() -> &'static [&'static str] {
        &["email", "valid", "mode", "local", "domain", "reasons"]
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.email.clone(),
            self.valid.to_string(),
            match self.mode {
                ValidationMode::Strict => "strict",
                ValidationMode::Relaxed => "relaxed",
            }
            .to_string(),
            self.local.clone().unwrap_or_default(),
            self.domain.clone().unwrap_or_default(),
            self.reasons.join("|"),
        ]
    }
}

impl Row for ValidationResult {
    fn valid(&self) -> bool {
        self.valid
    }

    fn human_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.valid {
            lines.push(format!(
                "[OK]    {} (confidence {}/{})",
                self.email, self.confidence_score, self.max_confidence
            ));
        } else {
            lines.push(format!("[INVALID] {} :: {}", self.email, self.reason));
        }
        if self.valid {
            lines.push(format!("        reason: {}", self.reason));
        }
        if let Some(suggestion) = &self.suggestion {
            lines.push(format!("        did you mean: {suggestion}"));
        }
        if let Some(smtp) = &self.smtp {
            let mut line = format!("        smtp: {}", smtp.verified);
            if let Some(code) = smtp.smtp_code {
                line.push_str(&format!(" ({code})"));
            }
            if smtp.is_catch_all {
                line.push_str(" catch-all");
            }
            if let Some(host) = &smtp.mx_host {
                line.push_str(&format!(" via {host}"));
            }
            if let Some(error) = smtp.error {
                line.push_str(&format!(" :: {error}"));
            }
            lines.push(line);
        }
        if let Some(risk) = &self.risk {
            lines.push(format!(
                "        risk: {} ({}) :: {}",
                risk.risk_level,
                risk.risk_score,
                risk.recommendations.join("; ")
            ));
        }
        if let Some(tier) = self.tier {
            lines.push(format!("        tier: {tier}"));
        }
        lines
    }

    fn csv_header() -> &'static [&'static str] {
        &[
            "email",
            "valid",
            "confidence",
            "max_confidence",
            "syntax",
            "dns_valid",
            "mx_records",
            "smtp_verified",
            "disposable",
            "role_based",
            "catch_all",
            "suggestion",
            "tier",
            "partial",
            "risk_level",
            "risk_score",
            "reason",
        ]
    }

    fn csv_record(&self) -> Vec<String> {
        let checks = &self.checks;
        vec![
            self.email.clone(),
            self.valid.to_string(),
            self.confidence_score.to_string(),
            self.max_confidence.to_string(),
            checks.syntax.to_string(),
            checks.dns_valid.to_string(),
            checks.mx_records.to_string(),
            bool_opt_str(checks.smtp_verified).to_string(),
            checks.is_disposable.to_string(),
            checks.is_role_based.to_string(),
            checks.is_catch_all.to_string(),
            self.suggestion.clone().unwrap_or_default(),
            self.tier.map(|t| t.to_string()).unwrap_or_default(),
            self.partial.to_string(),
            self.risk
                .as_ref()
                .map(|r| r.risk_level.to_string())
                .unwrap_or_default(),
            self.risk
                .as_ref()
                .map(|r| r.risk_score.to_string())
                .unwrap_or_default(),
            self.reason.clone(),
        ]
    }
}

fn bool_opt_str(opt: Option<bool>) -> &'static str {
    match opt {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    }
}

pub fn any_invalid<R: Row>(rows: &[R]) -> bool {
    rows.iter().any(|row| !row.valid())
}

/// Renders `rows` in `format`, to `out` (atomically) or stdout.
pub fn write_reports<R: Row>(rows: &[R], format: &str, out: Option<&str>) -> Result<()> {
    let bytes = match format {
        "human" => render_human(rows),
        "json" => render_json(rows)?,
        "ndjson" => render_ndjson(rows)?,
        "csv" => render_csv(rows)?,
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    };
    match out {
        Some(path) => write_all_atomically(path, &bytes),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("write stdout")?;
            stdout.flush().context("flush stdout")
        }
    }
}

fn render_human<R: Row>(rows: &[R]) -> Vec<u8> {
    let mut buf = String::new();
    for row in rows {
        for line in row.human_lines() {
            buf.push_str(&line);
            buf.push('\n');
        }
    }
    buf.into_bytes()
}

#[cfg(feature = "with-serde")]
fn render_json<R: Row>(rows: &[R]) -> Result<Vec<u8>> {
    let mut buf = serde_json::to_vec_pretty(rows)?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(not(feature = "with-serde"))]
fn render_json<R: Row>(_: &[R]) -> Result<Vec<u8>> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn render_ndjson<R: Row>(rows: &[R]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut buf, row)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

#[cfg(not(feature = "with-serde"))]
fn render_ndjson<R: Row>(_: &[R]) -> Result<Vec<u8>> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn render_csv<R: Row>(rows: &[R]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(R::csv_header())?;
    for row in rows {
        wtr.write_record(row.csv_record())?;
    }
    Ok(wtr.into_inner()?)
}

#[cfg(not(feature = "with-csv"))]
fn render_csv<R: Row>(_: &[R]) -> Result<Vec<u8>> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailscore_lib::parse_email;

    #[test]
    fn syntax_row_lists_reasons() {
        let report = parse_email(" invalid@", ValidationMode::Strict);
        let row = SyntaxRow::new(" invalid@", ValidationMode::Strict, &report);
        assert!(!row.valid());
        assert_eq!(row.email, " invalid@");
        assert_eq!(row.csv_record()[0], " invalid@");
        assert!(row.human_lines()[0].starts_with("[INVALID]  invalid@ :: "));
        assert_eq!(row.csv_record().len(), SyntaxRow::csv_header().len());
    }

    #[test]
    fn atomic_write_replaces_target() {
        let path = std::env::temp_dir().join(format!("mailscore-out-{}.txt", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        write_all_atomically(&path, b"first").expect("write");
        write_all_atomically(&path, b"second").expect("rewrite");
        assert_eq!(std::fs::read(&path).expect("read"), b"second");
        assert!(!std::path::Path::new(&format!("{path}.tmp")).exists());
        std::fs::remove_file(&path).ok();
    }
}
