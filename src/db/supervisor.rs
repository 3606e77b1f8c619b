use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::backoff::ReconnectPolicy;
use super::monitor::DatabaseMonitor;
use super::state::{ConnectionState, ReadyState};
use crate::error::{Result, SubforgeError};

/// A database handle the supervisor can open, probe and close.
#[async_trait]
pub trait Link: Send + Sync {
    fn state(&self) -> &ConnectionState;

    /// Establish (or re-validate) the connection.
    async fn open(&self) -> Result<()>;

    /// Cheap liveness check; an error means the connection was lost.
    async fn probe(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Keeps a [`Link`] connected: retries failed connects with bounded
/// exponential backoff and watches for disconnects with a periodic probe.
#[derive(Debug, Clone)]
pub struct Supervisor {
    pub policy: ReconnectPolicy,
    pub heartbeat: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            heartbeat: Duration::from_secs(10),
        }
    }
}

/// Resolves once shutdown was signalled or the sender went away.
pub async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

impl Supervisor {
    pub fn new(policy: ReconnectPolicy, heartbeat: Duration) -> Self {
        Self { policy, heartbeat }
    }

    /// Connect now; on failure retry until the policy is exhausted.
    pub async fn connect_with_retry(&self, link: &dyn Link) -> Result<()> {
        self.establish(link, true).await
    }

    /// Wait out the next backoff slot before every attempt, as after a disconnect.
    pub async fn reconnect(&self, link: &dyn Link) -> Result<()> {
        self.establish(link, false).await
    }

    async fn establish(&self, link: &dyn Link, mut immediate: bool) -> Result<()> {
        let state = link.state();
        loop {
            if !immediate {
                match self.policy.next_retry(state.attempts()) {
                    Some((attempt, delay)) => {
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            "Attempting to reconnect ({}/{})...",
                            attempt,
                            self.policy.max_retries
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!("Max reconnection attempts reached");
                        return Err(SubforgeError::RetriesExhausted {
                            attempts: state.attempt_count(),
                        });
                    }
                }
            }
            immediate = false;

            state.set_ready_state(ReadyState::Connecting);
            match link.open().await {
                Ok(()) => {
                    state.mark_connected();
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "MongoDB connection error");
                    state.mark_failed(&e.to_string());
                }
            }
        }
    }

    /// Connect, then probe every `heartbeat` until shutdown. A failed probe
    /// is treated as a disconnect and goes through [`Supervisor::reconnect`].
    ///
    /// Returns `Err(RetriesExhausted)` when the connection cannot be
    /// (re)established; the caller is expected to terminate.
    pub async fn supervise(
        &self,
        link: Arc<dyn Link>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        tokio::select! {
            res = self.connect_with_retry(link.as_ref()) => res?,
            _ = shutdown_requested(&mut shutdown) => return Ok(()),
        }

        let mut interval = tokio::time::interval(self.heartbeat);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown_requested(&mut shutdown) => return Ok(()),
            }

            if let Err(e) = link.probe().await {
                tracing::warn!(error = %e, "MongoDB disconnected");
                link.state().mark_failed(&e.to_string());

                tokio::select! {
                    res = self.reconnect(link.as_ref()) => res?,
                    _ = shutdown_requested(&mut shutdown) => return Ok(()),
                }
                tracing::info!("MongoDB connection reestablished");
                interval.reset();
            }
        }
    }
}

/// Close the link if it is open. Safe to call more than once.
pub async fn close_gracefully(link: &dyn Link) -> Result<()> {
    let state = link.state();
    if !state.is_connected() {
        return Ok(());
    }

    tracing::info!("Initiating graceful shutdown of MongoDB connection...");
    state.set_ready_state(ReadyState::Disconnecting);
    let result = link.close().await;
    state.set_ready_state(ReadyState::Disconnected);

    match &result {
        Ok(()) => tracing::info!("MongoDB connection closed successfully"),
        Err(e) => tracing::error!(error = %e, "Error during MongoDB graceful shutdown"),
    }
    result
}

/// Periodically log pool usage until shutdown.
pub async fn run_metrics_loop(
    monitor: Arc<dyn DatabaseMonitor>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown_requested(&mut shutdown) => return,
        }

        let pool = monitor.pool();
        tracing::info!(
            ready_state = %monitor.ready_state(),
            active = pool.active,
            available = pool.available,
            total = pool.total,
            waiting = pool.waiting,
            "MongoDB connection metrics (pool size {}-{})",
            pool.min_pool_size,
            pool.max_pool_size
        );
    }
}
