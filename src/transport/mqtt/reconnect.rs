//! Reconnection supervisor
//!
//! After the broker connection drops, the supervisor retries with a fixed
//! delay between attempts until one succeeds. There is no attempt limit: the
//! liveness watchdog is what gives up on a broker that never comes back.

use super::connection::{ConnectionState, MqttError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Default delay between reconnection attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(15);

/// Something that can try to re-establish a broker connection
#[async_trait]
pub trait Reconnect: Send {
    /// One connection attempt; `Ok` once the broker acknowledged it
    async fn reconnect(&mut self) -> Result<(), MqttError>;
}

/// Outcome of one supervised reconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectReport {
    /// Attempts that failed before the successful one
    pub failed_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct ReconnectSupervisor {
    delay: Duration,
}

impl Default for ReconnectSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectSupervisor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Retry `connection` until it succeeds, sleeping `delay` after each failure.
    ///
    /// Blocks only the calling transport task; the bridge event loop keeps
    /// ticking meanwhile.
    pub async fn run<R: Reconnect + ?Sized>(
        &self,
        connection: &mut R,
        state_tx: &watch::Sender<ConnectionState>,
    ) -> ReconnectReport {
        let mut failed_attempts = 0u32;
        loop {
            let _ = state_tx.send(ConnectionState::Reconnecting(failed_attempts + 1));
            match connection.reconnect().await {
                Ok(()) => {
                    info!(failed_attempts, "MQTT reconnected");
                    let _ = state_tx.send(ConnectionState::Connected);
                    return ReconnectReport { failed_attempts };
                }
                Err(e) => {
                    failed_attempts += 1;
                    warn!(
                        attempt = failed_attempts,
                        "Reconnect failed: {}, retry in {}s",
                        e,
                        self.delay.as_secs()
                    );
                    let _ = state_tx.send(ConnectionState::Disconnected(e.to_string()));
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyBroker {
        failures_left: u32,
        attempts: u32,
    }

    #[async_trait]
    impl Reconnect for FlakyBroker {
        async fn reconnect(&mut self) -> Result<(), MqttError> {
            self.attempts += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                Err(MqttError::ConnectionFailedStr("refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected("x".into()));
        let mut broker = FlakyBroker {
            failures_left: 0,
            attempts: 0,
        };
        let start = tokio::time::Instant::now();

        let report = ReconnectSupervisor::default()
            .run(&mut broker, &state_tx)
            .await;

        assert_eq!(report.failed_attempts, 0);
        assert_eq!(broker.attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(*state_rx.borrow(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_wait_one_delay_each() {
        let (state_tx, _state_rx) = watch::channel(ConnectionState::Connected);
        let mut broker = FlakyBroker {
            failures_left: 3,
            attempts: 0,
        };
        let start = tokio::time::Instant::now();

        let report = ReconnectSupervisor::default()
            .run(&mut broker, &state_tx)
            .await;

        assert_eq!(report.failed_attempts, 3);
        assert_eq!(broker.attempts, 4);
        assert_eq!(start.elapsed(), DEFAULT_RECONNECT_DELAY * 3);
    }
}
