use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::batch::Tier;
use crate::config::EngineConfig;
use crate::context::CallContext;
use crate::error::EngineError;
use crate::heuristics::{self, DomainSuggester, SimilaritySuggester};
use crate::resolver::{DnsLookup, DomainRecord, DomainResolver, SystemLookup};
use crate::scoring::{
    self, BounceHistory, ChecksRun, ConfidenceScore, RiskAssessment, ScoreInput,
};
use crate::smtp::{SmtpProbeResult, SmtpProber};
use crate::types::{ValidateOptions, ValidationChecks, ValidationResult};
use crate::validator::{self, SyntaxReport};

/// Validation engine. Cheap to clone: clones share the resolver cache and
/// the SMTP throttle.
#[derive(Clone)]
pub struct Engine {
    pub(crate) inner: Arc<Inner>,
}

#[derive(Clone)]
pub(crate) struct Inner {
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) resolver: Arc<DomainResolver>,
    pub(crate) prober: Arc<SmtpProber>,
    pub(crate) suggester: Arc<dyn DomainSuggester>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("resolver", &self.inner.resolver)
            .field("prober", &self.inner.prober)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine backed by trust-dns, configured from `config.dns`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let lookup = SystemLookup::new(&config.dns)?;
        Self::with_lookup(config, Arc::new(lookup))
    }

    /// Engine over a caller-supplied DNS backend.
    pub fn with_lookup(config: EngineConfig, lookup: Arc<dyn DnsLookup>) -> Result<Self, EngineError> {
        config.validate()?;
        let resolver = DomainResolver::new(lookup, config.dns.clone());
        let prober = SmtpProber::new(config.smtp.clone())?;
        let suggester = SimilaritySuggester::from_config(&config);
        Ok(Self {
            inner: Arc::new(Inner {
                config: Arc::new(config),
                resolver: Arc::new(resolver),
                prober: Arc::new(prober),
                suggester: Arc::new(suggester),
            }),
        })
    }

    /// Replaces the typo suggester.
    pub fn with_suggester<S>(mut self, suggester: S) -> Self
    where
        S: DomainSuggester + 'static,
    {
        Arc::make_mut(&mut self.inner).suggester = Arc::new(suggester);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.inner.resolver
    }

    /// Runs the pipeline for one address. Network trouble never fails the
    /// call; it shows up in the result instead.
    pub async fn validate(&self, email: &str, options: &ValidateOptions) -> ValidationResult {
        self.validate_with_context(email, options, &CallContext::unbounded())
            .await
    }

    #[instrument(level = "debug", skip(self, options, ctx))]
    pub async fn validate_with_context(
        &self,
        email: &str,
        options: &ValidateOptions,
        ctx: &CallContext,
    ) -> ValidationResult {
        let inner = &self.inner;
        let mut eval = inner.first_pass(email, options);

        if eval.wants_resolution(options) {
            if ctx.is_expired() {
                eval.partial = true;
            } else {
                let record = inner.resolver.resolve(eval.domain(), ctx).await;
                eval.record = Some(record);
            }
        }
        inner.suggest(&mut eval, options);

        if eval.wants_smtp(options) {
            if ctx.is_expired() {
                eval.partial = true;
            } else {
                eval.smtp = Some(inner.probe(&eval, options, ctx).await);
            }
        }

        let result = inner.finish(eval, options);
        info!(
            email = %result.email,
            valid = result.valid,
            confidence = result.confidence_score,
            "address validated"
        );
        result
    }

    /// [`validate`](Self::validate) plus a risk assessment against `history`.
    pub async fn validate_with_history(
        &self,
        email: &str,
        options: &ValidateOptions,
        history: &BounceHistory,
    ) -> ValidationResult {
        let mut result = self.validate(email, options).await;
        result.risk = Some(self.assess_risk(&result, history));
        result
    }

    pub fn assess_risk(&self, result: &ValidationResult, history: &BounceHistory) -> RiskAssessment {
        scoring::assess_risk(result, history, &self.inner.config)
    }
}

/// Work in progress for one address.
#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    pub(crate) email: String,
    pub(crate) report: SyntaxReport,
    pub(crate) record: Option<DomainRecord>,
    pub(crate) is_disposable: bool,
    pub(crate) is_role_based: bool,
    pub(crate) suggestion: Option<String>,
    pub(crate) smtp: Option<SmtpProbeResult>,
    pub(crate) tier: Option<Tier>,
    pub(crate) partial: bool,
}

impl Evaluation {
    pub(crate) fn domain(&self) -> &str {
        self.report
            .address
            .as_ref()
            .map(|a| a.domain())
            .unwrap_or_default()
    }

    pub(crate) fn wants_resolution(&self, options: &ValidateOptions) -> bool {
        self.report.valid && options.needs_resolution()
    }

    /// Resolution ran and found nothing to deliver to.
    pub(crate) fn dns_failed(&self) -> bool {
        self.record
            .as_ref()
            .is_some_and(|r| !r.has_dns || !r.has_mail_host())
    }

    pub(crate) fn wants_smtp(&self, options: &ValidateOptions) -> bool {
        options.enable_smtp
            && self.report.valid
            && self.record.as_ref().is_some_and(DomainRecord::has_mail_host)
    }

    fn ran(&self, options: &ValidateOptions) -> ChecksRun {
        let resolved = self.record.is_some();
        ChecksRun {
            dns: options.check_dns && resolved,
            mx: options.check_mx && resolved,
            smtp: self.smtp.is_some(),
        }
    }

    fn checks(&self) -> ValidationChecks {
        let record = self.record.as_ref();
        ValidationChecks {
            syntax: self.report.valid,
            dns_valid: record.is_some_and(|r| r.has_dns),
            mx_records: record.is_some_and(DomainRecord::has_mx),
            smtp_verified: self.smtp.as_ref().map(SmtpProbeResult::is_deliverable),
            is_disposable: self.is_disposable,
            is_role_based: self.is_role_based,
            is_catch_all: self.smtp.as_ref().is_some_and(|p| p.is_catch_all),
        }
    }

    /// Confidence with whatever has been established so far.
    pub(crate) fn score(&self, options: &ValidateOptions, inner: &Inner) -> (ValidationChecks, ConfidenceScore) {
        let checks = self.checks();
        let input = ScoreInput {
            checks: &checks,
            ran: self.ran(options),
            mail_host: self.record.as_ref().is_some_and(DomainRecord::has_mail_host),
            syntax_error: self.report.errors.first(),
            suggestion: self.suggestion.as_deref(),
            smtp: self.smtp.as_ref(),
            partial: self.partial,
        };
        let score = scoring::score_confidence(&input, &inner.config.confidence_weights);
        (checks, score)
    }
}

impl Inner {
    /// Syntax and the offline classifiers.
    pub(crate) fn first_pass(&self, email: &str, options: &ValidateOptions) -> Evaluation {
        let report = validator::parse_email(email, self.config.syntax_mode);
        let (is_disposable, is_role_based) = match &report.address {
            Some(address) => (
                options.check_disposable
                    && heuristics::is_disposable(address.domain(), &self.config.disposable_domains),
                options.check_role_based
                    && heuristics::is_role_based(address.local_part(), &self.config.role_prefixes),
            ),
            None => (false, false),
        };
        Evaluation {
            email: email.to_string(),
            report,
            record: None,
            is_disposable,
            is_role_based,
            suggestion: None,
            smtp: None,
            tier: None,
            partial: false,
        }
    }

    pub(crate) fn suggest(&self, eval: &mut Evaluation, options: &ValidateOptions) {
        if options.check_typos && eval.dns_failed() {
            eval.suggestion = self.suggester.suggest(eval.domain());
            if let Some(suggestion) = &eval.suggestion {
                debug!(email = %eval.email, suggestion = %suggestion, "domain looks mistyped");
            }
        }
    }

    pub(crate) async fn probe(
        &self,
        eval: &Evaluation,
        options: &ValidateOptions,
        ctx: &CallContext,
    ) -> SmtpProbeResult {
        let hosts = eval
            .record
            .as_ref()
            .map(|r| r.mx_hosts.as_slice())
            .unwrap_or_default();
        match &eval.report.address {
            Some(address) => {
                let ctx = ctx.child(options.smtp_timeout());
                self.prober.probe(address, hosts, &ctx).await
            }
            None => SmtpProbeResult::inconclusive(crate::smtp::ProbeErrorKind::NoHosts),
        }
    }

    pub(crate) fn finish(&self, eval: Evaluation, options: &ValidateOptions) -> ValidationResult {
        let (checks, score) = eval.score(options, self);
        let mut result = ValidationResult {
            email: eval.email,
            valid: score.valid,
            checks,
            confidence_score: score.score,
            max_confidence: score.max_achievable,
            suggestion: eval.suggestion,
            reason: score.reason,
            risk: None,
            smtp: eval.smtp,
            tier: eval.tier,
            partial: eval.partial,
        };
        if options.assess_risk {
            result.risk = Some(scoring::assess_risk(
                &result,
                &BounceHistory::default(),
                &self.config,
            ));
        }
        result
    }
}
