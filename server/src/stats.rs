//! Usage counters reported by the periodic statistics log line.

use crate::utils::format_uptime;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Lock-free gauge remembering its maximum and the number of increments.
#[derive(Debug, Default)]
pub struct Counter {
    current: AtomicUsize,
    max: AtomicUsize,
    total: AtomicUsize,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(current, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrements the gauge, never below zero.
    pub fn decrement(&self) {
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1));
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Counters shared by the transport and the play service.
#[derive(Debug)]
pub struct ServerStats {
    pub users: Counter,
    pub declared_games: Counter,
    pub running_games: Counter,
    started_at: Instant,
}

impl ServerStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            users: Counter::new(),
            declared_games: Counter::new(),
            running_games: Counter::new(),
            started_at: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn describe(&self) -> String {
        format!(
            "users={}/{}/{}, declared={}/{}/{}, running={}/{}/{}, uptime={}",
            self.users.current(),
            self.users.max(),
            self.users.total(),
            self.declared_games.current(),
            self.declared_games.max(),
            self.declared_games.total(),
            self.running_games.current(),
            self.running_games.max(),
            self.running_games.total(),
            format_uptime(self.uptime_seconds())
        )
    }
}
