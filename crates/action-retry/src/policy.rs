use std::time::Duration;

use e2e_core_types::{Classify, ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{classify::RetryMatcher, errors::PolicyError};

/// Immutable retry configuration for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total invocations allowed, first one included
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay_ms: u64,

    /// Geometric growth factor of the delay
    pub backoff_multiplier: f64,

    /// Upper bound on any single delay; `None` leaves growth unbounded
    pub max_delay_ms: Option<u64>,

    /// Full jitter: each delay is drawn uniformly from `0..=delay`
    pub jitter: bool,

    /// Errors matching any rule are retried
    pub retryable: Vec<RetryMatcher>,

    /// Human-readable name used in events and error messages
    pub action_label: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: Some(60_000),
            jitter: false,
            retryable: ErrorKind::ALL
                .into_iter()
                .filter(ErrorKind::is_transient)
                .map(RetryMatcher::Kind)
                .collect(),
            action_label: "action".to_string(),
        }
    }
}

impl RetryPolicy {
    /// Default policy under a new label
    pub fn new(action_label: impl Into<String>) -> Self {
        Self {
            action_label: action_label.into(),
            ..Self::default()
        }
    }

    /// Copy of this policy under another label
    pub fn labeled(&self, action_label: impl Into<String>) -> Self {
        Self {
            action_label: action_label.into(),
            ..self.clone()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = duration_ms(delay);
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Option<Duration>) -> Self {
        self.max_delay_ms = max_delay.map(duration_ms);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the retryable rules
    pub fn with_matchers(mut self, matchers: Vec<RetryMatcher>) -> Self {
        self.retryable = matchers;
        self
    }

    /// Add one retryable rule
    pub fn retry_on(mut self, matcher: RetryMatcher) -> Self {
        if !self.retryable.contains(&matcher) {
            self.retryable.push(matcher);
        }
        self
    }

    /// Replace the rules with message substrings
    pub fn retry_on_messages<I, S>(mut self, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable = needles
            .into_iter()
            .map(|needle| RetryMatcher::Message(needle.into()))
            .collect();
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(self.backoff_multiplier));
        }
        Ok(())
    }

    pub fn is_retryable<E: Classify>(&self, error: &E) -> bool {
        self.retryable.iter().any(|matcher| matcher.matches(error))
    }

    /// Delay after failed attempt `attempt` (1-based), before jitter.
    ///
    /// `initial_delay × multiplier^(attempt-1)`, clamped to `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let raw = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let mut millis = if raw.is_finite() && raw < u64::MAX as f64 {
            raw.round() as u64
        } else {
            u64::MAX
        };
        if let Some(cap) = self.max_delay_ms {
            millis = millis.min(cap);
        }
        Duration::from_millis(millis)
    }

    /// Delays between consecutive attempts, `max_attempts - 1` entries.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for(attempt))
            .collect()
    }

    /// Sum of the schedule; the longest time spent sleeping.
    pub fn total_backoff(&self) -> Duration {
        self.schedule()
            .into_iter()
            .fold(Duration::ZERO, |acc, delay| acc.saturating_add(delay))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use e2e_core_types::DriverError;

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::new("t")
            .with_max_attempts(4)
            .with_initial_delay(Duration::from_millis(100))
            .with_backoff_multiplier(2.0);

        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
        assert_eq!(policy.total_backoff(), Duration::from_millis(700));
    }

    #[test]
    fn test_delay_capped() {
        let policy = RetryPolicy::new("t")
            .with_initial_delay(Duration::from_millis(1000))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Some(Duration::from_secs(60)));

        assert_eq!(policy.delay_for(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(10), Duration::from_secs(60));
        assert_eq!(policy.delay_for(500), Duration::from_secs(60));
    }

    #[test]
    fn test_uncapped_growth_saturates() {
        let policy = RetryPolicy::new("t")
            .with_initial_delay(Duration::from_millis(1000))
            .with_backoff_multiplier(10.0)
            .with_max_delay(None);

        assert_eq!(policy.delay_for(3), Duration::from_millis(100_000));
        assert_eq!(policy.delay_for(400), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_multiplier_one_is_constant() {
        let policy = RetryPolicy::new("t")
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(250))
            .with_backoff_multiplier(1.0);
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_millis(250), Duration::from_millis(250)]
        );
    }

    #[test]
    fn test_single_attempt_has_no_schedule() {
        let policy = RetryPolicy::new("t").with_max_attempts(1);
        assert!(policy.schedule().is_empty());
        assert_eq!(policy.total_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_default_retries_exactly_transient_kinds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retryable.len(), 3);
        for kind in ErrorKind::ALL {
            let err = DriverError::new(kind, "boom");
            assert_eq!(policy.is_retryable(&err), kind.is_transient(), "{kind:?}");
        }
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert_eq!(
            RetryPolicy::default().with_max_attempts(0).validate(),
            Err(PolicyError::ZeroAttempts)
        );
        assert_eq!(
            RetryPolicy::default()
                .with_backoff_multiplier(0.5)
                .validate(),
            Err(PolicyError::InvalidMultiplier(0.5))
        );
        assert!(RetryPolicy::default()
            .with_backoff_multiplier(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let policy: RetryPolicy =
            serde_yaml::from_str("max_attempts: 5\naction_label: checkout\n").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay_ms, 500);
        assert_eq!(policy.action_label, "checkout");
        assert_eq!(policy.retryable.len(), 3);
    }

    #[test]
    fn test_retry_on_deduplicates() {
        let policy = RetryPolicy::new("t")
            .with_matchers(Vec::new())
            .retry_on(RetryMatcher::Kind(ErrorKind::Timeout))
            .retry_on(RetryMatcher::Kind(ErrorKind::Timeout));
        assert_eq!(policy.retryable.len(), 1);
    }
}
