//! Session statistics collection

/// Protocol session statistics
///
/// Counters are updated by the session during every exchange and can be read
/// at any time to judge the health of the serial line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    /// Total number of command frames written (including retransmissions)
    pub frames_sent: u64,
    /// Total number of data frames decoded successfully
    pub frames_received: u64,
    /// Number of commands that completed successfully
    pub exchanges_completed: u64,
    /// Number of commands that failed
    pub exchanges_failed: u64,
    /// Number of read timeouts
    pub timeouts: u64,
    /// Number of LRC mismatches
    pub checksum_errors: u64,
    /// Number of malformed frames or unexpected control bytes
    pub framing_errors: u64,
    /// Number of NAKs received
    pub naks: u64,
    /// Number of retransmitted command frames
    pub retransmissions: u64,
}

impl SessionStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Total number of failed attempts of any kind
    pub fn attempt_failures(&self) -> u64 {
        self.timeouts + self.checksum_errors + self.framing_errors + self.naks
    }

    /// Get error rate as a percentage of transmitted frames
    ///
    /// Returns 0.0 if no frames have been sent.
    pub fn error_rate(&self) -> f64 {
        if self.frames_sent == 0 {
            0.0
        } else {
            (self.attempt_failures() as f64 / self.frames_sent as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rate() {
        let mut stats = SessionStatistics::new();
        assert_eq!(stats.error_rate(), 0.0);
        stats.frames_sent = 4;
        stats.timeouts = 1;
        assert_eq!(stats.error_rate(), 25.0);
        stats.clear();
        assert_eq!(stats, SessionStatistics::default());
    }
}
