// Cancelable one-shot timers.
//
// Expiry is delivered back to the owner as an event carrying the timer id, so
// the owner can drop expiries for timers it already cancelled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Redial countdown expired
    Redial,
    /// Countdown progress sample
    RedialProgress,
}

pub trait Scheduler: Send {
    fn after(&mut self, delay: Duration, kind: TimerKind) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

pub type TimerCallback = Arc<dyn Fn(TimerId, TimerKind) + Send + Sync>;

/// Tokio-backed scheduler. Must be used from within a tokio runtime.
pub struct TokioScheduler {
    next_id: u64,
    pending: HashMap<TimerId, JoinHandle<()>>,
    on_fire: TimerCallback,
}

impl TokioScheduler {
    pub fn new(on_fire: TimerCallback) -> Self {
        Self {
            next_id: 1,
            pending: HashMap::new(),
            on_fire,
        }
    }
}

impl Scheduler for TokioScheduler {
    fn after(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        self.pending.retain(|_, handle| !handle.is_finished());

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let on_fire = Arc::clone(&self.on_fire);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(id, kind);
        });
        self.pending.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.pending.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
