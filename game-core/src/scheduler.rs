use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Deferred actions the session asks its host to run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    RevealHint { round_id: u64 },
    ExpireRound { round_id: u64 },
    StartNextRound,
}

/// Host-provided timer service.
///
/// A fired timer is handed back through `GameSession::on_timer`. Cancellation
/// may race with delivery; the session ignores timers that no longer apply.
pub trait Scheduler: Send {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
