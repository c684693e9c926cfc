//! Worst-case latency of a retried lookup
//!
//! Every attempt may probe each candidate for its full timeout before the
//! retry loop sleeps, so the bound grows with both list length and attempts.

use std::fmt;
use std::time::Duration;

use action_locator::ResolveOptions;
use action_retry::RetryPolicy;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencyBudget {
    pub max_attempts: u32,
    pub candidates: usize,
    /// Longest single resolution: every candidate timing out
    pub per_attempt_ms: u64,
    /// Sleeps between attempts, in order
    pub schedule_ms: Vec<u64>,
    pub total_backoff_ms: u64,
    /// `max_attempts × per_attempt + total_backoff`
    pub worst_case_ms: u64,
}

impl LatencyBudget {
    pub fn for_lookup(policy: &RetryPolicy, options: &ResolveOptions, candidates: usize) -> Self {
        let per_attempt = options
            .per_candidate_timeout
            .saturating_mul(u32::try_from(candidates).unwrap_or(u32::MAX));
        let schedule: Vec<Duration> = policy.schedule();
        let total_backoff = policy.total_backoff();
        let worst_case = per_attempt
            .saturating_mul(policy.max_attempts)
            .saturating_add(total_backoff);

        Self {
            max_attempts: policy.max_attempts,
            candidates,
            per_attempt_ms: millis(per_attempt),
            schedule_ms: schedule.into_iter().map(millis).collect(),
            total_backoff_ms: millis(total_backoff),
            worst_case_ms: millis(worst_case),
        }
    }

    pub fn worst_case(&self) -> Duration {
        Duration::from_millis(self.worst_case_ms)
    }

    /// Whether a flow deadline could cut this lookup short.
    pub fn exceeds(&self, deadline: Duration) -> bool {
        self.worst_case() > deadline
    }
}

impl fmt::Display for LatencyBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} candidate(s) x {} attempt(s)",
            self.candidates, self.max_attempts
        )?;
        writeln!(
            f,
            "  per attempt:   {}",
            humantime::format_duration(Duration::from_millis(self.per_attempt_ms))
        )?;
        let schedule = self
            .schedule_ms
            .iter()
            .map(|ms| humantime::format_duration(Duration::from_millis(*ms)).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "  backoff:       [{}]", schedule)?;
        write!(
            f,
            "  worst case:    {}",
            humantime::format_duration(self.worst_case())
        )
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_for_default_style_lookup() {
        let policy = RetryPolicy::new("click")
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(500))
            .with_backoff_multiplier(2.0);
        let options = ResolveOptions::default().with_timeout(Duration::from_millis(1000));

        let budget = LatencyBudget::for_lookup(&policy, &options, 3);

        assert_eq!(budget.per_attempt_ms, 3000);
        assert_eq!(budget.schedule_ms, vec![500, 1000]);
        assert_eq!(budget.total_backoff_ms, 1500);
        assert_eq!(budget.worst_case_ms, 10_500);
        assert!(budget.exceeds(Duration::from_secs(10)));
        assert!(!budget.exceeds(Duration::from_secs(11)));
    }

    #[test]
    fn test_display_is_human_readable() {
        let policy = RetryPolicy::new("click").with_max_attempts(2);
        let options = ResolveOptions::default();
        let text = LatencyBudget::for_lookup(&policy, &options, 1).to_string();
        assert!(text.contains("1 candidate(s) x 2 attempt(s)"));
        assert!(text.contains("worst case:    6s 500ms"));
    }
}
