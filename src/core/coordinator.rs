use std::time::Instant;

use chrono::Utc;

use super::ack::coordinator::AcknowledgmentCoordinator;
use super::ack::dialer::Dialer;
use super::ack::model::{AckNotice, AckSettings, CallState};
use super::ack::monitor::CallSessionMonitor;
use super::alerts::engine::AlertEngine;
use super::alerts::model::AlertRecord;
use super::config::Settings;
use super::error::AckError;
use super::playback::controller::SignalPlaybackController;
use super::playback::device::AudioDevice;
use super::playback::model::{PlaybackPolicy, PlaybackSession, PlaybackState, SignalConfig};
use super::scheduler::{Scheduler, TimerId, TimerKind};

/// Every entry point into the relay. All of them are handled by one owner,
/// in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Message { sender: String, body: String },
    /// A call-state change, stamped when it was observed
    CallState(CallState, Instant),
    PlaybackCompleted(u64),
    Timer(TimerId, TimerKind),
    /// User asked to acknowledge the pending primary alert
    Acknowledge,
    /// User silenced the alarm
    StopSignal,
    /// User cancelled the acknowledgment protocol
    AbortAcknowledgment,
    /// Settings re-read from disk
    ReloadSettings(Box<Settings>),
    Shutdown,
}

#[derive(Debug, Default)]
pub struct RelayOutput {
    pub alert: Option<AlertRecord>,
    pub playback: Option<PlaybackSession>,
    pub playback_state: Option<PlaybackState>,
    pub ack: Vec<AckNotice>,
    pub errors: Vec<AckError>,
}

pub struct RelayCoordinator<D: AudioDevice, P: Dialer, S: Scheduler> {
    alerts: AlertEngine,
    playback: SignalPlaybackController<D>,
    monitor: CallSessionMonitor,
    ack: AcknowledgmentCoordinator<P, S>,
    signals: SignalConfig,
    policy: PlaybackPolicy,
    ack_settings: AckSettings,
}

impl<D: AudioDevice, P: Dialer, S: Scheduler> RelayCoordinator<D, P, S> {
    pub fn new(settings: &Settings, device: D, dialer: P, scheduler: S) -> Self {
        Self {
            alerts: AlertEngine::new(settings.triggers.clone()),
            playback: SignalPlaybackController::new(device),
            monitor: CallSessionMonitor::new(),
            ack: AcknowledgmentCoordinator::new(
                dialer,
                scheduler,
                settings.acknowledgment.clone(),
            ),
            signals: settings.signals.clone(),
            policy: settings.playback.clone(),
            ack_settings: settings.acknowledgment.clone(),
        }
    }

    /// Apply new settings without dropping in-flight sessions.
    pub fn update_settings(&mut self, settings: &Settings) {
        self.alerts.update_config(settings.triggers.clone());
        self.ack.update_settings(settings.acknowledgment.clone());
        self.signals = settings.signals.clone();
        self.policy = settings.playback.clone();
        self.ack_settings = settings.acknowledgment.clone();
    }

    pub fn playback(&self) -> &SignalPlaybackController<D> {
        &self.playback
    }

    pub fn acknowledgment(&self) -> &AcknowledgmentCoordinator<P, S> {
        &self.ack
    }

    pub fn alerts(&self) -> &AlertEngine {
        &self.alerts
    }

    pub fn handle(&mut self, event: RelayEvent) -> RelayOutput {
        let mut output = RelayOutput::default();

        match event {
            RelayEvent::Message { sender, body } => {
                let record = self.alerts.process(&sender, &body, Utc::now());
                if record.result.is_alert() {
                    output.playback = self.playback.play(&record.result, &self.signals, &self.policy);
                }
                output.alert = Some(record);
            }
            RelayEvent::CallState(state, observed_at) => {
                if let Some(ended) = self.monitor.on_event(state, observed_at) {
                    output.ack.extend(self.ack.on_call_ended(ended));
                }
            }
            RelayEvent::PlaybackCompleted(session_id) => {
                output.playback_state = self.playback.on_playback_completed(session_id);
            }
            RelayEvent::Timer(id, kind) => match self.ack.on_timer(id, kind, Utc::now()) {
                Some(Ok(notice)) => output.ack.push(notice),
                Some(Err(e)) => self.push_error(&mut output, e),
                None => {}
            },
            RelayEvent::Acknowledge => match self.acknowledge() {
                Ok(notice) => output.ack.push(notice),
                Err(e) => {
                    log::warn!("Cannot acknowledge: {}", e);
                    self.push_error(&mut output, e);
                }
            },
            RelayEvent::StopSignal => {
                self.playback.stop();
                output.playback_state = self.playback.last_session().map(|s| s.state);
            }
            RelayEvent::AbortAcknowledgment => {
                output.ack.extend(self.ack.abort());
            }
            RelayEvent::ReloadSettings(settings) => {
                self.update_settings(&settings);
                log::info!("Settings reloaded");
            }
            RelayEvent::Shutdown => {
                self.playback.stop();
                output.ack.extend(self.ack.abort());
            }
        }

        output
    }

    fn push_error(&self, output: &mut RelayOutput, error: AckError) {
        if matches!(error, AckError::Placement(_)) {
            if let Some(failed) = self.ack.history().last() {
                output.ack.push(AckNotice::PlacementFailed(failed.clone()));
            }
        }
        output.errors.push(error);
    }

    /// The user action that starts acknowledgment of the pending primary alert.
    pub fn acknowledge(&mut self) -> Result<AckNotice, AckError> {
        if !self.ack_settings.enabled {
            return Err(AckError::Disabled);
        }
        if self.alerts.pending_primary().is_none() {
            return Err(AckError::NothingToAcknowledge);
        }
        let number = self
            .ack_settings
            .phone_number()
            .ok_or(AckError::NoPhoneNumber)?
            .to_string();

        self.playback.stop();
        let attempt = self.ack.place_acknowledgment_call(&number, Utc::now())?;
        self.alerts.take_pending_primary();
        Ok(AckNotice::CallPlaced(attempt))
    }
}
