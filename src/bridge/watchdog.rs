//! Liveness watchdog for the inbound MQTT feed
//!
//! A stalled feed leaves every exposed property stale. Once the silence
//! exceeds the configured timeout the watchdog reports [`WatchdogState::Dead`]
//! and the bridge shuts the process down so a supervisor can restart it.

use std::time::Duration;
use tokio::time::Instant;

/// Liveness state; `Dead` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Alive,
    Dead { silence: Duration },
}

#[derive(Debug, Clone)]
pub struct LivenessWatchdog {
    timeout: Option<Duration>,
    last_seen: Instant,
    dead: Option<Duration>,
}

impl LivenessWatchdog {
    /// `timeout` of zero disables the silence check
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout: (!timeout.is_zero()).then_some(timeout),
            last_seen: now,
            dead: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Record an accepted inbound message
    pub fn touch(&mut self, now: Instant) {
        if self.dead.is_none() {
            self.last_seen = now;
        }
    }

    /// Evaluate liveness at `now`
    pub fn check(&mut self, now: Instant) -> WatchdogState {
        if let Some(silence) = self.dead {
            return WatchdogState::Dead { silence };
        }
        let Some(timeout) = self.timeout else {
            return WatchdogState::Alive;
        };

        let silence = now.saturating_duration_since(self.last_seen);
        if silence > timeout {
            self.dead = Some(silence);
            WatchdogState::Dead { silence }
        } else {
            WatchdogState::Alive
        }
    }
}
