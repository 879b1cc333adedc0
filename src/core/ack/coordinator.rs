// Acknowledgment coordinator - places the acknowledgment call and redials
// until a call lasts at least the minimum call time.
//
// Idle -> CallPlaced -> (Connected -> Idle | Busy -> RedialCountdown -> CallPlaced)
//
// Redial has no attempt cap; it runs until a call connects or the user aborts.
// Placement failures end the attempt without retry.

use chrono::{DateTime, Utc};

use crate::core::error::AckError;
use crate::core::scheduler::{Scheduler, TimerId, TimerKind};

use super::dialer::{CallStartHook, Dialer, NoopHook};
use super::model::{AckNotice, AckOutcome, AckSettings, AckState, AcknowledgmentAttempt, CallEnded};

struct Countdown {
    redial_timer: TimerId,
    progress_timer: Option<TimerId>,
    ticks: u32,
}

pub struct AcknowledgmentCoordinator<P: Dialer, S: Scheduler> {
    dialer: P,
    scheduler: S,
    hook: Box<dyn CallStartHook>,
    settings: AckSettings,
    state: AckState,
    current: Option<AcknowledgmentAttempt>,
    countdown: Option<Countdown>,
    history: Vec<AcknowledgmentAttempt>,
}

impl<P: Dialer, S: Scheduler> AcknowledgmentCoordinator<P, S> {
    pub fn new(dialer: P, scheduler: S, settings: AckSettings) -> Self {
        Self {
            dialer,
            scheduler,
            hook: Box::new(NoopHook),
            settings,
            state: AckState::Idle,
            current: None,
            countdown: None,
            history: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Box<dyn CallStartHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn update_settings(&mut self, settings: AckSettings) {
        self.settings = settings;
    }

    pub fn state(&self) -> AckState {
        self.state
    }

    pub fn current_attempt(&self) -> Option<&AcknowledgmentAttempt> {
        self.current.as_ref()
    }

    /// Resolved attempts, oldest first.
    pub fn history(&self) -> &[AcknowledgmentAttempt] {
        &self.history
    }

    pub fn dialer(&self) -> &P {
        &self.dialer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Start acknowledging by calling `phone_number`.
    pub fn place_acknowledgment_call(
        &mut self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<AcknowledgmentAttempt, AckError> {
        if self.state != AckState::Idle {
            return Err(AckError::AlreadyActive);
        }
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(AckError::NoPhoneNumber);
        }
        self.dial(phone_number.to_string(), 1, now)
    }

    fn dial(
        &mut self,
        phone_number: String,
        attempt: u32,
        now: DateTime<Utc>,
    ) -> Result<AcknowledgmentAttempt, AckError> {
        let mut record = AcknowledgmentAttempt {
            phone_number,
            attempt,
            attempt_started_at: now,
            outcome: AckOutcome::Pending,
        };

        self.hook.before_call(&record.phone_number);
        match self.dialer.place_call(&record.phone_number) {
            Ok(()) => {
                log::info!(
                    "Acknowledgment call #{} placed to {}",
                    record.attempt,
                    record.phone_number
                );
                self.state = AckState::CallPlaced;
                self.current = Some(record.clone());
                Ok(record)
            }
            Err(e) => {
                log::error!("Could not place acknowledgment call to {}: {}", record.phone_number, e);
                record.outcome = AckOutcome::PlacementFailed;
                self.history.push(record);
                self.state = AckState::Idle;
                self.current = None;
                Err(AckError::Placement(e))
            }
        }
    }

    /// Resolve the pending attempt from a finished call. Ignored unless a
    /// call was placed.
    pub fn on_call_ended(&mut self, ended: CallEnded) -> Option<AckNotice> {
        if self.state != AckState::CallPlaced {
            log::debug!("Call end ignored, no acknowledgment call in progress");
            return None;
        }
        let mut record = self.current.take()?;

        if ended.duration < self.settings.min_call_time() {
            record.outcome = AckOutcome::Busy;
            log::info!(
                "Acknowledgment call lasted {} ms, redialing in {} ms",
                ended.duration.as_millis(),
                self.settings.redial_countdown_ms
            );
            self.start_countdown();
            self.current = Some(record.clone());
            self.history.push(record.clone());
            Some(AckNotice::Busy(record))
        } else {
            record.outcome = AckOutcome::Connected;
            log::info!(
                "Acknowledgment connected after {} ms",
                ended.duration.as_millis()
            );
            self.state = AckState::Idle;
            self.history.push(record.clone());
            Some(AckNotice::Connected(record))
        }
    }

    fn start_countdown(&mut self) {
        let redial_timer = self
            .scheduler
            .after(self.settings.redial_countdown(), TimerKind::Redial);
        let progress_timer = self.schedule_progress();
        self.countdown = Some(Countdown {
            redial_timer,
            progress_timer,
            ticks: 0,
        });
        self.state = AckState::RedialCountdown;
    }

    fn schedule_progress(&mut self) -> Option<TimerId> {
        let interval = self.settings.redial_interval();
        if interval.is_zero() || interval >= self.settings.redial_countdown() {
            return None;
        }
        Some(self.scheduler.after(interval, TimerKind::RedialProgress))
    }

    /// Handle a timer expiry. Expiries for cancelled or replaced timers are dropped.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        kind: TimerKind,
        now: DateTime<Utc>,
    ) -> Option<Result<AckNotice, AckError>> {
        let countdown = self.countdown.as_mut()?;
        match kind {
            TimerKind::RedialProgress if countdown.progress_timer == Some(id) => {
                countdown.ticks += 1;
                let elapsed = self.settings.redial_interval() * countdown.ticks;
                let remaining = self.settings.redial_countdown().saturating_sub(elapsed);
                countdown.progress_timer = None;
                if remaining > self.settings.redial_interval() {
                    let next = self.schedule_progress();
                    if let Some(countdown) = self.countdown.as_mut() {
                        countdown.progress_timer = next;
                    }
                }
                Some(Ok(AckNotice::RedialProgress { remaining }))
            }
            TimerKind::Redial if countdown.redial_timer == id => {
                if let Some(progress) = countdown.progress_timer {
                    self.scheduler.cancel(progress);
                }
                self.countdown = None;
                self.state = AckState::Idle;

                let previous = self.current.take()?;
                log::info!("Redial countdown expired, calling {} again", previous.phone_number);
                Some(
                    self.dial(previous.phone_number, previous.attempt + 1, now)
                        .map(AckNotice::CallPlaced),
                )
            }
            _ => {
                log::debug!("Ignoring stale timer {:?} ({:?})", id, kind);
                None
            }
        }
    }

    /// User abort: cancel any countdown and forget the current attempt.
    pub fn abort(&mut self) -> Option<AckNotice> {
        if self.state == AckState::Idle {
            return None;
        }
        if let Some(countdown) = self.countdown.take() {
            self.scheduler.cancel(countdown.redial_timer);
            if let Some(progress) = countdown.progress_timer {
                self.scheduler.cancel(progress);
            }
        }
        self.current = None;
        self.state = AckState::Idle;
        log::info!("Acknowledgment aborted");
        Some(AckNotice::Aborted)
    }
}
