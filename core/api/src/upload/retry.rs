//! Retry schedule for resumable transfers.

use std::time::Duration;

use crate::config::ClientConfig;

/// Fixed list of delays, one per retry attempt.
///
/// Attempt `n` waits `delays[n]`; once the list is used up the transfer
/// gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Create a policy from explicit delays.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Maximum number of retries.
    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(ClientConfig::default().retry_delays())
    }
}

/// Tracks retries across one transfer.
///
/// The attempt counter starts over whenever the transfer got further
/// than it did before the previous failure.
#[derive(Debug)]
pub(crate) struct RetryState<'a> {
    policy: &'a RetryPolicy,
    attempt: usize,
    failures: usize,
    offset_at_failure: Option<u64>,
}

impl<'a> RetryState<'a> {
    pub(crate) fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            failures: 0,
            offset_at_failure: None,
        }
    }

    /// Record a failure at `offset` and return how long to wait, or
    /// `None` once retries are exhausted.
    pub(crate) fn next_delay(&mut self, offset: u64) -> Option<Duration> {
        self.failures += 1;
        if self.offset_at_failure.is_some_and(|prev| offset > prev) {
            self.attempt = 0;
        }
        self.offset_at_failure = Some(offset);

        let delay = self.policy.delay_for_attempt(self.attempt)?;
        self.attempt += 1;
        Some(delay)
    }

    /// Failures seen so far.
    pub(crate) fn failures(&self) -> usize {
        self.failures
    }
}
