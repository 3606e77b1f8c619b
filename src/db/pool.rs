use mongodb::event::cmap::CmapEvent;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Connection pool counters fed by driver CMAP events.
#[derive(Debug)]
pub struct PoolStats {
    min_pool_size: u32,
    max_pool_size: u32,
    total: AtomicU64,
    checked_out: AtomicU64,
    waiting: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    #[serde(rename = "totalConnectionCount")]
    pub total: u64,
    #[serde(rename = "availableConnectionCount")]
    pub available: u64,
    #[serde(rename = "activeConnectionCount")]
    pub active: u64,
    #[serde(rename = "waitingRequestCount")]
    pub waiting: u64,
    #[serde(rename = "maxPoolSize")]
    pub max_pool_size: u32,
    #[serde(rename = "minPoolSize")]
    pub min_pool_size: u32,
}

fn saturating_dec(counter: &AtomicU64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
}

impl PoolStats {
    pub fn new(min_pool_size: u32, max_pool_size: u32) -> Self {
        Self {
            min_pool_size,
            max_pool_size,
            total: AtomicU64::new(0),
            checked_out: AtomicU64::new(0),
            waiting: AtomicU64::new(0),
        }
    }

    pub fn connection_created(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        saturating_dec(&self.total);
    }

    pub fn checkout_started(&self) {
        self.waiting.fetch_add(1, Ordering::Relaxed);
    }

    pub fn checkout_failed(&self) {
        saturating_dec(&self.waiting);
    }

    pub fn checked_out(&self) {
        saturating_dec(&self.waiting);
        self.checked_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn checked_in(&self) {
        saturating_dec(&self.checked_out);
    }

    /// Forget every connection, e.g. after the client was dropped.
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.checked_out.store(0, Ordering::Relaxed);
        self.waiting.store(0, Ordering::Relaxed);
    }

    pub fn handle_event(&self, event: &CmapEvent) {
        match event {
            CmapEvent::ConnectionCreated(_) => self.connection_created(),
            CmapEvent::ConnectionClosed(_) => self.connection_closed(),
            CmapEvent::ConnectionCheckoutStarted(_) => self.checkout_started(),
            CmapEvent::ConnectionCheckoutFailed(_) => self.checkout_failed(),
            CmapEvent::ConnectionCheckedOut(_) => self.checked_out(),
            CmapEvent::ConnectionCheckedIn(_) => self.checked_in(),
            CmapEvent::PoolCleared(ev) => {
                tracing::warn!(address = %ev.address, "MongoDB connection pool cleared");
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let active = self.checked_out.load(Ordering::Relaxed).min(total);
        PoolSnapshot {
            total,
            available: total - active,
            active,
            waiting: self.waiting.load(Ordering::Relaxed),
            max_pool_size: self.max_pool_size,
            min_pool_size: self.min_pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_lifecycle() {
        let pool = PoolStats::new(2, 10);
        pool.connection_created();
        pool.connection_created();

        pool.checkout_started();
        assert_eq!(pool.snapshot().waiting, 1);

        pool.checked_out();
        let snap = pool.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.active, 1);
        assert_eq!(snap.available, 1);
        assert_eq!(snap.waiting, 0);

        pool.checked_in();
        assert_eq!(pool.snapshot().available, 2);
    }

    #[test]
    fn test_counters_never_underflow() {
        let pool = PoolStats::new(0, 5);
        pool.connection_closed();
        pool.checked_in();
        pool.checkout_failed();
        let snap = pool.snapshot();
        assert_eq!(snap.total, 0);
        assert_eq!(snap.active, 0);
        assert_eq!(snap.waiting, 0);
    }

    #[test]
    fn test_reset_clears_counts_but_keeps_bounds() {
        let pool = PoolStats::new(10, 50);
        pool.connection_created();
        pool.checkout_started();
        pool.reset();
        let snap = pool.snapshot();
        assert_eq!(snap.total, 0);
        assert_eq!(snap.waiting, 0);
        assert_eq!(snap.min_pool_size, 10);
        assert_eq!(snap.max_pool_size, 50);
    }
}
