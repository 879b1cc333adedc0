// Call session monitor - turns the raw call-state stream into call-end events.
//
// Evaluation happens once per OffHook -> Idle edge; `evaluated` is only reset
// when a fresh call goes off hook. Events must arrive in order.

use std::time::{Duration, Instant};

use super::model::{CallEnded, CallState};

#[derive(Debug)]
pub struct CallSessionMonitor {
    previous_state: CallState,
    current_state: CallState,
    call_started_at: Option<Instant>,
    evaluated: bool,
}

impl CallSessionMonitor {
    pub fn new() -> Self {
        Self {
            previous_state: CallState::Idle,
            current_state: CallState::Idle,
            call_started_at: None,
            evaluated: false,
        }
    }

    pub fn on_event(&mut self, state: CallState, now: Instant) -> Option<CallEnded> {
        self.previous_state = self.current_state;
        self.current_state = state;
        log::debug!("Call state {:?} -> {:?}", self.previous_state, state);

        match (self.previous_state, state) {
            (previous, CallState::OffHook) if previous != CallState::OffHook => {
                self.evaluated = false;
                self.call_started_at = Some(now);
                None
            }
            (CallState::OffHook, CallState::Idle) if !self.evaluated => {
                self.evaluated = true;
                let duration = self
                    .call_started_at
                    .map(|started| now.saturating_duration_since(started))
                    .unwrap_or(Duration::ZERO);
                log::info!("Call ended after {} ms", duration.as_millis());
                Some(CallEnded { duration })
            }
            _ => None,
        }
    }

    pub fn previous_state(&self) -> CallState {
        self.previous_state
    }

    pub fn current_state(&self) -> CallState {
        self.current_state
    }

    pub fn evaluated(&self) -> bool {
        self.evaluated
    }
}

impl Default for CallSessionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_call_end_emitted_once() {
        let mut monitor = CallSessionMonitor::new();
        let t0 = Instant::now();

        assert_eq!(monitor.on_event(CallState::Idle, t0), None);
        assert_eq!(monitor.on_event(CallState::OffHook, t0), None);
        assert!(!monitor.evaluated());

        let ended = monitor.on_event(CallState::Idle, t0 + Duration::from_millis(3000));
        assert_eq!(
            ended,
            Some(CallEnded {
                duration: Duration::from_millis(3000)
            })
        );
        assert!(monitor.evaluated());

        assert_eq!(monitor.on_event(CallState::Idle, t0 + Duration::from_millis(3100)), None);
        assert_eq!(monitor.previous_state(), CallState::Idle);
        assert_eq!(monitor.current_state(), CallState::Idle);
    }

    #[test]
    fn test_duplicate_offhook_keeps_start_time() {
        let mut monitor = CallSessionMonitor::new();
        let t0 = Instant::now();

        monitor.on_event(CallState::OffHook, t0);
        monitor.on_event(CallState::OffHook, t0 + Duration::from_millis(2000));
        let ended = monitor
            .on_event(CallState::Idle, t0 + Duration::from_millis(9000))
            .unwrap();
        assert_eq!(ended.duration, Duration::from_millis(9000));
    }

    #[test]
    fn test_new_call_resets_guard() {
        let mut monitor = CallSessionMonitor::new();
        let t0 = Instant::now();

        monitor.on_event(CallState::OffHook, t0);
        assert!(monitor.on_event(CallState::Idle, t0 + Duration::from_millis(1000)).is_some());

        monitor.on_event(CallState::Ringing, t0 + Duration::from_millis(2000));
        monitor.on_event(CallState::OffHook, t0 + Duration::from_millis(3000));
        assert!(!monitor.evaluated());

        let ended = monitor
            .on_event(CallState::Idle, t0 + Duration::from_millis(11000))
            .unwrap();
        assert_eq!(ended.duration, Duration::from_millis(8000));
    }

    #[test]
    fn test_ringing_to_idle_is_not_a_call_end() {
        let mut monitor = CallSessionMonitor::new();
        let t0 = Instant::now();

        monitor.on_event(CallState::Ringing, t0);
        assert_eq!(monitor.on_event(CallState::Idle, t0), None);
    }
}
