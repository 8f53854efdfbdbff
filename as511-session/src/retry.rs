//! Per-command retry budget

use std::time::Duration;

/// Retry budget of one command
///
/// Created fresh for every command. The first transmission is free; each
/// retryable failure consumes one retry, and a failure with no retries left
/// ends the command. A budget of `n` retries therefore allows at most `n + 1`
/// transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
    attempts: u32,
    timeout: Duration,
}

impl RetryBudget {
    /// Create a budget allowing `retries` retransmissions
    pub fn new(retries: u32, timeout: Duration) -> Self {
        Self {
            remaining: retries,
            attempts: 1,
            timeout,
        }
    }

    /// Create a budget that allows the first transmission only
    pub fn single(timeout: Duration) -> Self {
        Self::new(0, timeout)
    }

    /// Consume one retry
    ///
    /// # Returns
    /// `true` if the command may be transmitted again, `false` if the budget
    /// is exhausted
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.attempts += 1;
        true
    }

    /// Retries left
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Transmissions made or granted so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether no retries are left
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_allows_retries_plus_one_attempts() {
        let mut budget = RetryBudget::new(3, Duration::from_millis(500));
        let mut transmissions = 1;
        while budget.consume() {
            transmissions += 1;
        }
        assert_eq!(transmissions, 4);
        assert_eq!(budget.attempts(), 4);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_single_budget() {
        let mut budget = RetryBudget::single(Duration::from_secs(1));
        assert!(budget.is_exhausted());
        assert!(!budget.consume());
        assert_eq!(budget.attempts(), 1);
        assert_eq!(budget.timeout(), Duration::from_secs(1));
    }
}
