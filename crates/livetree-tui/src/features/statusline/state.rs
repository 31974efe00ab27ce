//! Status line state types.

use std::time::{Duration, Instant};

use livetree_core::feed::Connectivity;

/// Public, immutable snapshot read by the renderer each frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub connectivity: Connectivity,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    /// Time since the last successful poll, if any.
    pub since_success: Option<Duration>,
    pub successes: u64,
}

/// Mutable accumulator fed by poll results.
#[derive(Debug, Default)]
pub struct PollStats {
    connectivity: Connectivity,
    consecutive_failures: u32,
    last_error: Option<String>,
    last_success: Option<Instant>,
    successes: u64,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.connectivity = Connectivity::Online;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_success = Some(Instant::now());
        self.successes += 1;
    }

    pub fn record_failure(&mut self, error: &str) {
        self.connectivity = Connectivity::Offline;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.to_string());
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Get snapshot for rendering.
    pub fn snapshot(&self) -> StatusLine {
        StatusLine {
            connectivity: self.connectivity,
            consecutive_failures: self.consecutive_failures,
            last_error: self.last_error.clone(),
            since_success: self.last_success.map(|at| at.elapsed()),
            successes: self.successes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_streak_resets_on_success() {
        let mut stats = PollStats::new();
        stats.record_failure("boom");
        stats.record_failure("boom");
        assert_eq!(stats.consecutive_failures(), 2);
        assert_eq!(stats.connectivity(), Connectivity::Offline);

        stats.record_success();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.connectivity, Connectivity::Online);
        assert_eq!(snapshot.last_error, None);
        assert!(snapshot.since_success.is_some());
    }
}
