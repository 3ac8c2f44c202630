use std::time::{Duration, SystemTime};

use insta::assert_snapshot;
use proptest::prelude::*;

use super::*;
use crate::config::EngineConfig;
use crate::smtp::{SmtpProbeResult, Verification};
use crate::types::{ValidationChecks, ValidationResult};
use crate::validator::SyntaxError;

fn all_ran() -> ChecksRun {
    ChecksRun {
        dns: true,
        mx: true,
        smtp: false,
    }
}

fn good_checks() -> ValidationChecks {
    ValidationChecks {
        syntax: true,
        dns_valid: true,
        mx_records: true,
        ..ValidationChecks::default()
    }
}

fn input(checks: &ValidationChecks) -> ScoreInput<'_> {
    ScoreInput {
        checks,
        ran: all_ran(),
        mail_host: checks.mx_records,
        syntax_error: None,
        suggestion: None,
        smtp: None,
        partial: false,
    }
}

fn probe(verified: Verification, is_catch_all: bool) -> SmtpProbeResult {
    SmtpProbeResult {
        verified,
        smtp_code: Some(250),
        error: None,
        is_catch_all,
        mx_host: Some("mx.example.com".into()),
        transcript: Vec::new(),
    }
}

fn result_for(email: &str, checks: ValidationChecks, confidence: u8) -> ValidationResult {
    ValidationResult {
        email: email.to_string(),
        valid: checks.syntax,
        checks,
        confidence_score: confidence,
        max_confidence: 80,
        suggestion: None,
        reason: String::new(),
        risk: None,
        smtp: None,
        tier: None,
        partial: false,
    }
}

#[test]
fn clean_address_without_smtp_scores_eighty() {
    let checks = good_checks();
    let score = score_confidence(&input(&checks), &ConfidenceWeights::default());
    assert!(score.valid);
    assert_eq!(score.score, 80);
    assert_eq!(score.max_achievable, 80);
    assert_snapshot!(score.reason, @"Valid email");
}

#[test]
fn confirmed_mailbox_reaches_full_score() {
    let checks = ValidationChecks {
        smtp_verified: Some(true),
        ..good_checks()
    };
    let smtp = probe(Verification::ConfirmedExists, false);
    let mut inp = input(&checks);
    inp.ran.smtp = true;
    inp.smtp = Some(&smtp);
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert_eq!(score.score, 100);
    assert_eq!(score.max_achievable, 100);
}

#[test]
fn syntax_failure_scores_zero() {
    let checks = ValidationChecks::default();
    let err = SyntaxError::MissingAt;
    let mut inp = input(&checks);
    inp.syntax_error = Some(&err);
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert!(!score.valid);
    assert_eq!(score.score, 0);
    assert_snapshot!(score.reason, @"Invalid email format: missing @");
}

#[test]
fn domain_syntax_failure_names_domain_part() {
    let checks = ValidationChecks::default();
    let err = SyntaxError::EmptyDomain;
    let mut inp = input(&checks);
    inp.syntax_error = Some(&err);
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert_snapshot!(score.reason, @"Invalid domain part: missing domain");
}

#[test]
fn dead_domain_with_suggestion() {
    let checks = ValidationChecks {
        syntax: true,
        ..ValidationChecks::default()
    };
    let mut inp = input(&checks);
    inp.suggestion = Some("gmail.com");
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert!(!score.valid);
    assert_eq!(score.score, 50);
    assert_snapshot!(score.reason, @"Domain does not exist; Did you mean gmail.com?");
}

#[test]
fn disposable_is_valid_with_warning() {
    let checks = ValidationChecks {
        is_disposable: true,
        ..good_checks()
    };
    let score = score_confidence(&input(&checks), &ConfidenceWeights::default());
    assert!(score.valid);
    assert_eq!(score.score, 70);
    assert_snapshot!(score.reason, @"Valid email; Warning: disposable domain");
}

#[test]
fn catch_all_withholds_smtp_points() {
    let checks = ValidationChecks {
        smtp_verified: Some(false),
        is_catch_all: true,
        ..good_checks()
    };
    let smtp = probe(Verification::Inconclusive, true);
    let mut inp = input(&checks);
    inp.ran.smtp = true;
    inp.smtp = Some(&smtp);
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert!(score.valid);
    assert_eq!(score.score, 75);
    assert_eq!(score.max_achievable, 100);
    assert_snapshot!(
        score.reason,
        @"Valid email; Warning: catch-all domain, SMTP acceptance is non-diagnostic"
    );
}

#[test]
fn absent_mailbox_is_invalid() {
    let checks = ValidationChecks {
        smtp_verified: Some(false),
        ..good_checks()
    };
    let smtp = probe(Verification::ConfirmedAbsent, false);
    let mut inp = input(&checks);
    inp.ran.smtp = true;
    inp.smtp = Some(&smtp);
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert!(!score.valid);
    assert_eq!(score.score, 80);
    assert_snapshot!(score.reason, @"Mailbox does not exist");
}

#[test]
fn partial_note_is_appended() {
    let checks = good_checks();
    let mut inp = input(&checks);
    inp.partial = true;
    let score = score_confidence(&inp, &ConfidenceWeights::default());
    assert_snapshot!(score.reason, @"Valid email; Partial result: deadline exceeded");
}

#[test]
fn spam_trap_with_bounces_is_high_risk() {
    let config = EngineConfig::default();
    let result = result_for("someone@spamtrap.io", good_checks(), 80);
    let history = BounceHistory {
        bounce_count: 5,
        last_bounce_at: None,
    };
    let risk = assess_risk(&result, &history, &config);
    assert!(risk.is_spam_trap);
    assert_eq!(risk.risk_level, RiskLevel::High);
    assert!(risk.recommendations[0].starts_with("DO NOT SEND"));
    assert_eq!(risk.recommendations[0], "DO NOT SEND - spam trap detected");
}

#[test]
fn clean_history_is_safe() {
    let config = EngineConfig::default();
    let result = result_for("alice@company.com", good_checks(), 100);
    let risk = assess_risk(&result, &BounceHistory::default(), &config);
    assert_eq!(risk.risk_score, 0);
    assert_eq!(risk.risk_level, RiskLevel::Low);
    assert_eq!(risk.recommendations, vec!["Safe to send".to_string()]);
    assert!(risk.risk_factors.is_empty());
}

#[test]
fn recent_bounce_adds_points() {
    let config = EngineConfig::default();
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100 * 24 * 3600);
    let result = result_for("alice@company.com", good_checks(), 100);
    let recent = BounceHistory {
        bounce_count: 1,
        last_bounce_at: Some(now - Duration::from_secs(2 * 24 * 3600)),
    };
    let old = BounceHistory {
        bounce_count: 1,
        last_bounce_at: Some(now - Duration::from_secs(90 * 24 * 3600)),
    };
    let recent = assess_risk_at(&result, &recent, &config, now);
    let old = assess_risk_at(&result, &old, &config, now);
    assert_eq!(recent.risk_score, 25);
    assert_eq!(old.risk_score, 10);
    assert_eq!(
        old.recommendations,
        vec!["Monitor - previous bounce recorded".to_string()]
    );
}

#[test]
fn blacklisted_local_part_is_flagged() {
    let config = EngineConfig::default();
    let result = result_for("honeypot@company.com", good_checks(), 100);
    let risk = assess_risk(&result, &BounceHistory::default(), &config);
    assert!(risk.is_blacklisted);
    assert_eq!(risk.risk_score, 25);
    assert_eq!(risk.risk_level, RiskLevel::Low);
    assert_eq!(risk.recommendations[0], "DO NOT SEND - address matches blacklist");
}

#[test]
fn full_marks_without_smtp_add_no_confidence_risk() {
    let config = EngineConfig::default();
    let result = result_for("alice@company.com", good_checks(), 80);
    let risk = assess_risk(&result, &BounceHistory::default(), &config);
    assert_eq!(risk.risk_score, 0);
    assert!(risk.risk_factors.is_empty());
    assert_eq!(risk.recommendations, vec!["Safe to send".to_string()]);
}

#[test]
fn confidence_shortfall_is_relative_to_max() {
    let config = EngineConfig::default();
    let checks = ValidationChecks {
        is_disposable: true,
        ..good_checks()
    };
    let result = result_for("someone@tempmail.com", checks, 70);
    let risk = assess_risk(&result, &BounceHistory::default(), &config);
    // 15 disposable + 10/80 of the 20-point ceiling
    assert_eq!(risk.risk_score, 17);
    assert_eq!(
        risk.risk_factors,
        vec![
            "Disposable domain".to_string(),
            "Low confidence score (70/80)".to_string()
        ]
    );
}

#[test]
fn risk_level_display_is_uppercase() {
    assert_snapshot!(RiskLevel::Medium.to_string(), @"MEDIUM");
}

fn arb_checks() -> impl Strategy<Value = ValidationChecks> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(any::<bool>()),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(syntax, dns_valid, mx_records, smtp_verified, disposable, role, catch_all)| {
                ValidationChecks {
                    syntax,
                    dns_valid,
                    mx_records,
                    smtp_verified,
                    is_disposable: disposable,
                    is_role_based: role,
                    is_catch_all: catch_all,
                }
            },
        )
}

proptest! {
    #[test]
    fn confidence_stays_in_bounds(
        checks in arb_checks(),
        dns in any::<bool>(),
        mx in any::<bool>(),
        smtp in any::<bool>(),
    ) {
        let inp = ScoreInput {
            checks: &checks,
            ran: ChecksRun { dns, mx, smtp },
            mail_host: checks.mx_records,
            syntax_error: None,
            suggestion: None,
            smtp: None,
            partial: false,
        };
        let score = score_confidence(&inp, &ConfidenceWeights::default());
        prop_assert!(score.score <= 100);
        prop_assert!(score.score <= score.max_achievable);
    }

    #[test]
    fn failing_check_never_raises_confidence(checks in arb_checks()) {
        let weights = ConfidenceWeights::default();
        let base = score_confidence(&input(&checks), &weights).score;
        let worse = [
            ValidationChecks { dns_valid: false, ..checks },
            ValidationChecks { mx_records: false, ..checks },
            ValidationChecks { is_disposable: true, ..checks },
            ValidationChecks { is_role_based: true, ..checks },
            ValidationChecks { is_catch_all: true, ..checks },
        ];
        for w in &worse {
            prop_assert!(score_confidence(&input(w), &weights).score <= base);
        }
    }

    #[test]
    fn risk_stays_in_bounds(
        checks in arb_checks(),
        confidence in 0u8..=100,
        bounces in 0u32..1000,
        local in "[a-z]{1,10}",
    ) {
        let config = EngineConfig::default();
        let result = result_for(&format!("{local}@spamtrap.io"), checks, confidence);
        let history = BounceHistory { bounce_count: bounces, last_bounce_at: Some(SystemTime::now()) };
        let risk = assess_risk(&result, &history, &config);
        prop_assert!(risk.risk_score <= 100);
        prop_assert!(!risk.recommendations.is_empty());
    }
}
