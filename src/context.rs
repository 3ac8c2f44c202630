use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Deadline carried through one validation call. DNS lookups and SMTP steps
/// clip their own timeouts to what is left here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A context that ends at `timeout` from now or at this context's
    /// deadline, whichever comes first.
    pub fn child(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(own) if own < candidate => own,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
        }
    }

    /// `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// `step` clipped to the remaining time.
    pub fn step_budget(&self, step: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => remaining.min(step),
            None => step,
        }
    }

    /// Runs `fut` bounded by `step` and the deadline. `None` on timeout.
    pub async fn run<F: Future>(&self, step: Duration, fut: F) -> Option<F::Output> {
        let budget = self.step_budget(step);
        if budget.is_zero() {
            return None;
        }
        tokio::time::timeout(budget, fut).await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn child_never_outlives_parent() {
        let parent = CallContext::with_timeout(Duration::from_secs(2));
        let child = parent.child(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let short = parent.child(Duration::from_millis(500));
        assert!(short.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn step_budget_is_clipped() {
        let ctx = CallContext::with_timeout(Duration::from_secs(3));
        assert_eq!(ctx.step_budget(Duration::from_secs(5)), Duration::from_secs(3));
        assert_eq!(ctx.step_budget(Duration::from_secs(1)), Duration::from_secs(1));
        assert_eq!(
            CallContext::unbounded().step_budget(Duration::from_secs(5)),
            Duration::from_secs(5)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_context_runs_nothing() {
        let ctx = CallContext::with_timeout(Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(ctx.is_expired());
        assert_eq!(ctx.run(Duration::from_secs(5), async { 1 }).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_step_times_out() {
        let ctx = CallContext::unbounded();
        let out = ctx
            .run(Duration::from_millis(100), tokio::time::sleep(Duration::from_secs(1)))
            .await;
        assert!(out.is_none());
    }
}
