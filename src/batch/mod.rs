//! Tiered batch validation.
//!
//! A batch runs in three passes: syntax and offline classifiers for every
//! address, one resolution per unique domain, then per-tier finishing work
//! (typo suggestions, SMTP probing) for the addresses that warrant it. Every
//! task runs under the batch deadline; whatever misses it comes back with
//! `partial == true` instead of being dropped.

mod types;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

pub use types::{BatchPhase, BatchReport, BatchStats, Tier, TierCounts};

use crate::context::CallContext;
use crate::engine::{Engine, Evaluation};
use crate::error::EngineError;
use crate::resolver::DomainRecord;
use crate::smtp::{ProbeErrorKind, SmtpProbeResult};
use crate::types::{ValidateOptions, ValidationResult};

impl Engine {
    /// Validates `emails` within `overall_deadline`, preserving input order.
    /// Fails only for an empty batch.
    pub async fn validate_batch<S: AsRef<str>>(
        &self,
        emails: &[S],
        options: &ValidateOptions,
        overall_deadline: Duration,
    ) -> Result<Vec<ValidationResult>, EngineError> {
        Ok(self
            .validate_batch_report(emails, options, overall_deadline)
            .await?
            .results)
    }

    /// [`validate_batch`](Self::validate_batch) with run statistics.
    #[instrument(level = "info", skip_all, fields(total = emails.len()))]
    pub async fn validate_batch_report<S: AsRef<str>>(
        &self,
        emails: &[S],
        options: &ValidateOptions,
        overall_deadline: Duration,
    ) -> Result<BatchReport, EngineError> {
        if emails.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        let inner = &self.inner;
        let deadline = Instant::now() + overall_deadline;
        let lookups_before = inner.resolver.lookups();
        let mut stats = BatchStats {
            total: emails.len(),
            ..BatchStats::default()
        };
        info!(phase = %BatchPhase::Queued, total = emails.len(), "batch started");

        let mut evals: Vec<Evaluation> = emails
            .iter()
            .map(|email| inner.first_pass(email.as_ref(), options))
            .collect();

        let mut seen = HashSet::new();
        let domains: Vec<String> = evals
            .iter()
            .filter(|eval| eval.wants_resolution(options))
            .map(|eval| eval.domain().to_string())
            .filter(|domain| seen.insert(domain.clone()))
            .collect();
        stats.unique_domains = domains.len();

        let records = self.resolve_all(domains, deadline).await;
        for eval in &mut evals {
            if !eval.wants_resolution(options) {
                continue;
            }
            match records.get(eval.domain()) {
                Some(record) => eval.record = Some(record.clone()),
                None => eval.partial = true,
            }
        }

        for eval in &mut evals {
            let (_, estimate) = eval.score(options, inner);
            let failed = !eval.report.valid || eval.dns_failed() || eval.partial;
            let common = inner.config.is_common_domain(eval.domain());
            let tier = Tier::assign(estimate.score, failed, common);
            debug!(email = %eval.email, estimate = estimate.score, tier = %tier, "tier assigned");
            eval.tier = Some(tier);
            stats.tiers.add(tier);
        }
        info!(
            phase = %BatchPhase::TierAssigned,
            premium = stats.tiers.premium,
            minimal = stats.tiers.minimal,
            "tiers assigned"
        );

        let mut to_probe = Vec::new();
        for (index, eval) in evals.iter_mut().enumerate() {
            match eval.tier {
                Some(Tier::Minimal) => inner.suggest(eval, options),
                Some(Tier::Premium) if !inner.config.batch.probe_premium => {}
                _ => {
                    inner.suggest(eval, options);
                    if eval.wants_smtp(options) {
                        to_probe.push(index);
                    }
                }
            }
        }
        info!(
            phase = %BatchPhase::Processing,
            smtp = to_probe.len(),
            "finishing tiers"
        );
        self.probe_all(&mut evals, to_probe, options, deadline).await;

        stats.smtp_probes = evals.iter().filter(|e| e.smtp.is_some()).count();
        stats.timed_out = evals.iter().filter(|e| e.partial).count();
        stats.dns_lookups = inner.resolver.lookups().saturating_sub(lookups_before);

        let results: Vec<ValidationResult> = evals
            .into_iter()
            .map(|eval| inner.finish(eval, options))
            .collect();
        info!(
            phase = %BatchPhase::Done,
            total = stats.total,
            unique_domains = stats.unique_domains,
            dns_lookups = stats.dns_lookups,
            timed_out = stats.timed_out,
            "batch finished"
        );
        Ok(BatchReport { results, stats })
    }

    /// One resolution per domain. Domains still unresolved at `deadline`
    /// are missing from the map.
    async fn resolve_all(
        &self,
        domains: Vec<String>,
        deadline: Instant,
    ) -> HashMap<String, DomainRecord> {
        let semaphore = Arc::new(Semaphore::new(self.inner.config.batch.concurrency));
        let ctx = CallContext::with_deadline(deadline);
        let mut set = JoinSet::new();

        for domain in domains {
            let resolver = self.inner.resolver.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let work = async {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    Some(resolver.resolve(&domain, &ctx).await)
                };
                let record = timeout_at(deadline, work).await.ok().flatten()?;
                // Cut short by the deadline rather than answered by DNS.
                if record.transient && ctx.is_expired() {
                    return None;
                }
                Some(record)
            });
        }

        let mut records = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Some(record)) => {
                    records.insert(record.domain.clone(), record);
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "resolution task failed"),
            }
        }
        records
    }

    async fn probe_all(
        &self,
        evals: &mut [Evaluation],
        indices: Vec<usize>,
        options: &ValidateOptions,
        deadline: Instant,
    ) {
        if indices.is_empty() {
            return;
        }
        let semaphore = Arc::new(Semaphore::new(self.inner.config.batch.concurrency));
        let ctx = CallContext::with_deadline(deadline);
        let mut outstanding: HashSet<usize> = indices.iter().copied().collect();
        let mut set = JoinSet::new();

        for index in indices {
            let inner = self.inner.clone();
            let semaphore = semaphore.clone();
            let eval = evals[index].clone();
            let options = options.clone();
            set.spawn(async move {
                let work = async {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    Some(inner.probe(&eval, &options, &ctx).await)
                };
                (index, timeout_at(deadline, work).await.ok().flatten())
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Some(result))) => {
                    outstanding.remove(&index);
                    if cut_short(&result, &ctx) {
                        evals[index].partial = true;
                    } else {
                        evals[index].smtp = Some(result);
                    }
                }
                Ok((index, None)) => {
                    outstanding.remove(&index);
                    evals[index].partial = true;
                }
                Err(err) => warn!(error = %err, "probe task failed"),
            }
        }
        for index in outstanding {
            evals[index].partial = true;
        }
    }
}

fn cut_short(result: &SmtpProbeResult, ctx: &CallContext) -> bool {
    result.error == Some(ProbeErrorKind::Timeout) && ctx.is_expired()
}
