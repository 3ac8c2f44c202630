use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mailscore_lib::{
    BounceHistory, DnsLookup, Engine, EngineConfig, MxRecord, ResolutionError, RiskLevel,
    ValidateOptions, validate_syntax,
};

/// Domains with an MX host; everything else does not exist.
#[derive(Default)]
struct FixedDns {
    mx: HashMap<&'static str, &'static str>,
    queries: AtomicUsize,
}

impl FixedDns {
    fn new(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            mx: entries.iter().copied().collect(),
            queries: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DnsLookup for FixedDns {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolutionError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .mx
            .get(domain)
            .map(|host| vec![MxRecord::new(10, *host)])
            .unwrap_or_default())
    }

    async fn has_address(&self, domain: &str) -> Result<bool, ResolutionError> {
        Ok(self.mx.contains_key(domain))
    }
}

fn engine(entries: &[(&'static str, &'static str)]) -> (Arc<FixedDns>, Engine) {
    let dns = Arc::new(FixedDns::new(entries));
    let engine = Engine::with_lookup(EngineConfig::default(), dns.clone()).expect("engine");
    (dns, engine)
}

#[test]
fn syntax_gate() {
    assert!(validate_syntax("user@example.com"));
    assert!(!validate_syntax("invalid@"));
    assert!(!validate_syntax("no-at-sign"));
    assert!(!validate_syntax("a@@b.com"));
}

#[tokio::test]
async fn mistyped_provider_gets_suggestion() {
    let (_, engine) = engine(&[("gmail.com", "gmail-smtp-in.l.google.com")]);
    let result = engine
        .validate("user@gmial.com", &ValidateOptions::default())
        .await;
    assert!(!result.valid);
    assert!(!result.checks.dns_valid);
    assert_eq!(result.suggestion.as_deref(), Some("gmail.com"));
    assert!(result.reason.contains("Did you mean gmail.com?"));
}

#[tokio::test]
async fn disposable_address_is_valid_with_reduced_confidence() {
    let (_, engine) = engine(&[("tempmail.com", "mx.tempmail.com")]);
    let result = engine
        .validate("test@tempmail.com", &ValidateOptions::default())
        .await;
    assert!(result.valid);
    assert!(result.checks.is_disposable);
    assert_eq!(result.confidence_score, 70);
    assert_eq!(result.max_confidence, 80);
    assert!(result.reason.contains("disposable"));
}

#[tokio::test]
async fn role_account_is_flagged() {
    let (_, engine) = engine(&[("company.com", "mx.company.com")]);
    let result = engine
        .validate("info@company.com", &ValidateOptions::default())
        .await;
    assert!(result.valid);
    assert!(result.checks.is_role_based);
    assert!(result.reason.contains("role-based"));
}

#[tokio::test]
async fn repeated_validation_is_idempotent_and_cached() {
    let (dns, engine) = engine(&[("example.org", "mx.example.org")]);
    let options = ValidateOptions::default();
    let first = engine.validate("jane@example.org", &options).await;
    let second = engine.validate("jane@example.org", &options).await;
    assert_eq!(first, second);
    assert_eq!(dns.queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batch_preserves_order() {
    let (dns, engine) = engine(&[
        ("example.org", "mx.example.org"),
        ("gmail.com", "gmail-smtp-in.l.google.com"),
    ]);
    let emails = vec![
        "z@example.org".to_string(),
        "broken".to_string(),
        "a@gmail.com".to_string(),
        "m@example.org".to_string(),
    ];
    let results = engine
        .validate_batch(&emails, &ValidateOptions::default(), Duration::from_secs(10))
        .await
        .expect("batch");
    let order: Vec<&str> = results.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(order, ["z@example.org", "broken", "a@gmail.com", "m@example.org"]);
    assert_eq!(
        results.iter().map(|r| r.valid).collect::<Vec<_>>(),
        [true, false, true, true]
    );
    assert_eq!(dns.queries.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn spam_trap_with_bounces_is_high_risk() {
    let (_, engine) = engine(&[("spamtrap.io", "mx.spamtrap.io")]);
    let history = BounceHistory {
        bounce_count: 5,
        last_bounce_at: None,
    };
    let result = engine
        .validate_with_history("someone@spamtrap.io", &ValidateOptions::default(), &history)
        .await;
    let risk = result.risk.expect("risk attached");
    assert_eq!(risk.risk_level, RiskLevel::High);
    assert!(risk.is_spam_trap);
    assert_eq!(risk.recommendations[0], "DO NOT SEND - spam trap detected");
}

#[tokio::test]
async fn offline_options_skip_dns() {
    let (dns, engine) = engine(&[]);
    let result = engine
        .validate("someone@nowhere.example", &ValidateOptions::offline())
        .await;
    assert!(result.valid);
    assert_eq!(result.max_confidence, 50);
    assert_eq!(dns.queries.load(Ordering::SeqCst), 0);
}
