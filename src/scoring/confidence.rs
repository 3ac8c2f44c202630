use crate::smtp::{SmtpProbeResult, Verification};
use crate::types::ValidationChecks;
use crate::validator::SyntaxError;

/// Points awarded per passing check. With the defaults the table sums to
/// 100 when SMTP probing ran, and tops out at 80 without it.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceWeights {
    pub syntax: u8,
    pub dns: u8,
    pub mx: u8,
    pub smtp: u8,
    pub not_disposable: u8,
    pub not_role_based: u8,
    pub not_catch_all: u8,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            syntax: 30,
            dns: 15,
            mx: 15,
            smtp: 20,
            not_disposable: 10,
            not_role_based: 5,
            not_catch_all: 5,
        }
    }
}

impl ConfidenceWeights {
    pub fn total(&self) -> u32 {
        [
            self.syntax,
            self.dns,
            self.mx,
            self.smtp,
            self.not_disposable,
            self.not_role_based,
            self.not_catch_all,
        ]
        .iter()
        .map(|w| u32::from(*w))
        .sum()
    }
}

/// Which network-backed checks were attempted. A check that did not run
/// contributes neither points nor maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChecksRun {
    pub dns: bool,
    pub mx: bool,
    pub smtp: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub checks: &'a ValidationChecks,
    pub ran: ChecksRun,
    /// A mail host exists, explicitly (MX) or through the A/AAAA fallback.
    pub mail_host: bool,
    pub syntax_error: Option<&'a SyntaxError>,
    pub suggestion: Option<&'a str>,
    pub smtp: Option<&'a SmtpProbeResult>,
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceScore {
    pub valid: bool,
    pub score: u8,
    pub max_achievable: u8,
    pub reason: String,
}

pub fn score_confidence(input: &ScoreInput<'_>, weights: &ConfidenceWeights) -> ConfidenceScore {
    let checks = input.checks;
    let max_achievable = max_achievable(input.ran, weights);

    if !checks.syntax {
        let reason = match input.syntax_error {
            Some(err) if err.is_domain_error() => format!("Invalid domain part: {err}"),
            Some(err) => format!("Invalid email format: {err}"),
            None => "Invalid email format".to_string(),
        };
        return ConfidenceScore {
            valid: false,
            score: 0,
            max_achievable,
            reason: with_partial_note(reason, input.partial),
        };
    }

    let mut points = u32::from(weights.syntax);
    if input.ran.dns && checks.dns_valid {
        points += u32::from(weights.dns);
    }
    if input.ran.mx && checks.mx_records {
        points += u32::from(weights.mx);
    }
    if input.ran.smtp && checks.smtp_verified == Some(true) && !checks.is_catch_all {
        points += u32::from(weights.smtp);
    }
    if !checks.is_disposable {
        points += u32::from(weights.not_disposable);
    }
    if !checks.is_role_based {
        points += u32::from(weights.not_role_based);
    }
    if !checks.is_catch_all {
        points += u32::from(weights.not_catch_all);
    }
    let score = clamp_score(points);

    let smtp_absent = input
        .smtp
        .is_some_and(|probe| probe.verified == Verification::ConfirmedAbsent);
    let valid = (!input.ran.dns || checks.dns_valid)
        && (!input.ran.mx || input.mail_host)
        && !smtp_absent;

    let mut problems: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if input.ran.dns && !checks.dns_valid {
        problems.push("Domain does not exist".to_string());
    } else if input.ran.mx && !checks.mx_records {
        if input.mail_host {
            warnings.push("Warning: no MX records, using address record fallback".to_string());
        } else {
            problems.push("No MX records found".to_string());
        }
    }
    if let Some(suggestion) = input.suggestion {
        problems.push(format!("Did you mean {suggestion}?"));
    }
    if let Some(probe) = input.smtp {
        match probe.verified {
            Verification::ConfirmedAbsent => problems.push("Mailbox does not exist".to_string()),
            Verification::ConfirmedExists => {}
            Verification::Inconclusive if probe.is_catch_all => warnings.push(
                "Warning: catch-all domain, SMTP acceptance is non-diagnostic".to_string(),
            ),
            Verification::Inconclusive => {
                warnings.push("SMTP verification inconclusive".to_string())
            }
        }
    }
    if checks.is_disposable {
        warnings.push("Warning: disposable domain".to_string());
    }
    if checks.is_role_based {
        warnings.push("Warning: role-based address".to_string());
    }

    let mut parts = if valid {
        let mut head = vec!["Valid email".to_string()];
        head.append(&mut problems);
        head
    } else {
        problems
    };
    parts.append(&mut warnings);
    if parts.is_empty() {
        parts.push("Invalid email".to_string());
    }

    ConfidenceScore {
        valid,
        score,
        max_achievable,
        reason: with_partial_note(parts.join("; "), input.partial),
    }
}

fn max_achievable(ran: ChecksRun, weights: &ConfidenceWeights) -> u8 {
    let mut max = weights.total();
    if !ran.dns {
        max -= u32::from(weights.dns);
    }
    if !ran.mx {
        max -= u32::from(weights.mx);
    }
    if !ran.smtp {
        max -= u32::from(weights.smtp);
    }
    clamp_score(max)
}

fn with_partial_note(reason: String, partial: bool) -> String {
    if partial {
        format!("{reason}; Partial result: deadline exceeded")
    } else {
        reason
    }
}

pub(crate) fn clamp_score(points: u32) -> u8 {
    points.min(100) as u8
}
