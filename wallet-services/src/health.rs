//! Node connection health
//!
//! Updated by the poller after every request; read by the health route.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// If no request has succeeded for this long, the connection is stale
pub const STALE_THRESHOLD_SECS: u64 = 60;

/// Health status of the node connection
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionHealth {
    pub connected: bool,
    pub last_success_time: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub failure_count: u64,
    pub is_stale: bool,
}

/// Health metrics for the node connection (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    connected: AtomicBool,
    last_success_epoch_ms: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl ConnectionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.connected.store(true, Ordering::SeqCst);
        self.last_success_epoch_ms
            .store(now_epoch_ms(), Ordering::SeqCst);
        self.success_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.failure_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn health(&self) -> ConnectionHealth {
        self.health_at(now_epoch_ms())
    }

    fn health_at(&self, now_ms: u64) -> ConnectionHealth {
        let connected = self.connected.load(Ordering::SeqCst);
        let last_ms = self.last_success_epoch_ms.load(Ordering::SeqCst);

        let last_success_time = if last_ms > 0 {
            DateTime::from_timestamp(
                (last_ms / 1000) as i64,
                ((last_ms % 1000) * 1_000_000) as u32,
            )
        } else {
            None
        };

        let is_stale = if connected && last_ms > 0 {
            now_ms.saturating_sub(last_ms) > STALE_THRESHOLD_SECS * 1000
        } else {
            !connected
        };

        ConnectionHealth {
            connected,
            last_success_time,
            success_count: self.success_count.load(Ordering::SeqCst),
            failure_count: self.failure_count.load(Ordering::SeqCst),
            is_stale,
        }
    }
}
