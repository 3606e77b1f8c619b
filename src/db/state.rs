use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::RwLock;

/// Driver-level connection state, numbered the way MongoDB drivers report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Disconnected = 0,
    Connected = 1,
    Connecting = 2,
    Disconnecting = 3,
}

impl ReadyState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ReadyState::Connected,
            2 => ReadyState::Connecting,
            3 => ReadyState::Disconnecting,
            _ => ReadyState::Disconnected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Disconnected => "disconnected",
            ReadyState::Connected => "connected",
            ReadyState::Connecting => "connecting",
            ReadyState::Disconnecting => "disconnecting",
        }
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared lifecycle bookkeeping for one database handle.
#[derive(Debug)]
pub struct ConnectionState {
    ready: AtomicU8,
    attempts: AtomicU32,
    has_opened: AtomicBool,
    connected_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            ready: AtomicU8::new(ReadyState::Disconnected.code()),
            attempts: AtomicU32::new(0),
            has_opened: AtomicBool::new(false),
            connected_at: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from_code(self.ready.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Connected
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.ready.store(state.code(), Ordering::SeqCst);
    }

    /// Retry counter consumed by [`super::ReconnectPolicy::next_retry`].
    pub fn attempts(&self) -> &AtomicU32 {
        &self.attempts
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn has_opened(&self) -> bool {
        self.has_opened.load(Ordering::SeqCst)
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at.read().ok().and_then(|t| *t)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|e| e.clone())
    }

    pub fn mark_connected(&self) {
        self.attempts.store(0, Ordering::SeqCst);
        self.has_opened.store(true, Ordering::SeqCst);
        self.set_ready_state(ReadyState::Connected);
        if let Ok(mut t) = self.connected_at.write() {
            *t = Some(Utc::now());
        }
        if let Ok(mut e) = self.last_error.write() {
            *e = None;
        }
    }

    pub fn mark_failed(&self, error: &str) {
        self.set_ready_state(ReadyState::Disconnected);
        if let Ok(mut e) = self.last_error.write() {
            *e = Some(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_codes_round_trip() {
        for state in [
            ReadyState::Disconnected,
            ReadyState::Connected,
            ReadyState::Connecting,
            ReadyState::Disconnecting,
        ] {
            assert_eq!(ReadyState::from_code(state.code()), state);
        }
        assert_eq!(ReadyState::from_code(42), ReadyState::Disconnected);
    }

    #[test]
    fn test_mark_connected_resets_attempts() {
        let state = ConnectionState::new();
        state.attempts().store(3, Ordering::SeqCst);
        state.mark_failed("connection refused");
        assert_eq!(state.ready_state(), ReadyState::Disconnected);
        assert_eq!(state.last_error().as_deref(), Some("connection refused"));
        assert!(!state.has_opened());

        state.mark_connected();
        assert!(state.is_connected());
        assert!(state.has_opened());
        assert_eq!(state.attempt_count(), 0);
        assert!(state.connected_at().is_some());
        assert!(state.last_error().is_none());
    }
}
