// Signal playback controller - drives audio and vibration for a classified alert.
//
// At most one session is live. `play` tears the previous session down
// (audio halted, vibration cancelled, media volume restored) before starting
// the next one. Every exit path goes through `teardown`, which always ends in
// `Stopped` even if the volume restore fails.

use crate::core::alerts::model::ClassificationResult;

use super::device::AudioDevice;
use super::model::{
    PlaybackPolicy, PlaybackSession, PlaybackState, RepeatPolicy, RingerMode, SignalConfig,
    SignalHandle, SignalSpec,
};
use super::volume::compute_target_volume;

pub struct SignalPlaybackController<D: AudioDevice> {
    device: D,
    session: Option<PlaybackSession>,
    next_session_id: u64,
}

impl<D: AudioDevice> SignalPlaybackController<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            session: None,
            next_session_id: 1,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// The live session, if any. Stopped sessions are not reported.
    pub fn active_session(&self) -> Option<&PlaybackSession> {
        self.session
            .as_ref()
            .filter(|s| s.state != PlaybackState::Stopped)
    }

    /// The most recent session, stopped or not.
    pub fn last_session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Start notifying for `classification`.
    ///
    /// Returns a snapshot of the new session, or `None` when the message is
    /// not an alert.
    pub fn play(
        &mut self,
        classification: &ClassificationResult,
        signals: &SignalConfig,
        policy: &PlaybackPolicy,
    ) -> Option<PlaybackSession> {
        // Non-alerts leave a running session alone
        let spec = signals.spec_for(classification.severity)?;
        self.stop();

        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let mut session = PlaybackSession {
            session_id,
            severity: classification.severity,
            signal: None,
            vibration_pattern: None,
            repeat_policy: spec.repeat,
            state: PlaybackState::Preparing,
            cycles_completed: 0,
            restore_volume: None,
        };
        log::debug!("Playback session {} preparing", session_id);

        let ringer = self.device.ringer_mode();
        let audio_allowed = !(policy.honor_sound_settings && ringer == RingerMode::Silent);
        if audio_allowed {
            self.start_audio(&mut session, spec, signals, policy);
        } else {
            log::info!("Ringer is silent, audio suppressed for session {}", session_id);
        }

        if spec.vibrate {
            let repeat = spec.repeat == RepeatPolicy::UntilStopped;
            self.device.vibrate(&spec.vibration, repeat);
            session.vibration_pattern = Some(spec.vibration.clone());
        }

        if session.signal.is_none() && spec.repeat != RepeatPolicy::UntilStopped {
            // Nothing will report completion; the vibration plays out on its own.
            Self::restore_volume(&mut self.device, &mut session);
            session.state = PlaybackState::Stopped;
            log::info!("Playback session {} finished without audio", session_id);
        } else {
            session.state = PlaybackState::Playing;
            log::info!(
                "Playback session {} playing ({:?})",
                session_id,
                session.repeat_policy
            );
        }

        let snapshot = session.clone();
        self.session = Some(session);
        Some(snapshot)
    }

    /// Halt the live session and restore the device. No-op when idle.
    pub fn stop(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state == PlaybackState::Stopped {
            return;
        }
        log::info!("Stopping playback session {}", session.session_id);
        Self::teardown(&mut self.device, session);
    }

    /// One playback cycle of `session_id` ended. Loops or finishes per the
    /// repeat policy and returns the resulting state. Stale ids are ignored.
    pub fn on_playback_completed(&mut self, session_id: u64) -> Option<PlaybackState> {
        let session = match self.session.as_mut() {
            Some(s) if s.session_id == session_id && s.state == PlaybackState::Playing => s,
            _ => {
                log::debug!("Ignoring completion for inactive session {}", session_id);
                return None;
            }
        };

        session.cycles_completed += 1;
        let finished = session
            .repeat_policy
            .cycles()
            .is_some_and(|n| session.cycles_completed >= n);
        if finished {
            log::info!(
                "Playback session {} completed after {} cycle(s)",
                session_id,
                session.cycles_completed
            );
            Self::teardown(&mut self.device, session);
            return Some(session.state);
        }

        let replay = session
            .signal
            .clone()
            .map(|signal| self.device.play_asset(session_id, &signal));
        if let Some(Err(e)) = replay {
            log::error!("Replay failed for session {}: {}", session_id, e);
            Self::teardown(&mut self.device, session);
        }
        Some(session.state)
    }

    fn start_audio(
        &mut self,
        session: &mut PlaybackSession,
        spec: &SignalSpec,
        signals: &SignalConfig,
        policy: &PlaybackPolicy,
    ) {
        let max_media = self.device.max_media_volume();
        let target = if policy.honor_sound_settings {
            compute_target_volume(
                self.device.ring_volume(),
                self.device.max_ring_volume(),
                max_media,
            )
        } else {
            policy.override_volume.unwrap_or(max_media).min(max_media)
        };

        let original = self.device.media_volume();
        match self.device.set_media_volume(target) {
            Ok(()) => {
                session.restore_volume = Some(original);
                log::debug!("Media volume {} -> {} (max {})", original, target, max_media);
            }
            Err(e) => log::warn!("Could not set media volume: {}", e),
        }

        let default_signal = SignalHandle::new(signals.default_signal.clone());
        let chosen = self.resolve_signal(spec, &default_signal);
        let started = match self.device.play_asset(session.session_id, &chosen) {
            Ok(()) => Some(chosen),
            Err(e) if chosen != default_signal => {
                log::warn!("{}; falling back to default signal", e);
                match self.device.play_asset(session.session_id, &default_signal) {
                    Ok(()) => Some(default_signal),
                    Err(e) => {
                        log::error!("Default signal failed: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                log::error!("Default signal failed: {}", e);
                None
            }
        };

        if started.is_none() {
            Self::restore_volume(&mut self.device, session);
        }
        session.signal = started;
    }

    fn resolve_signal(&self, spec: &SignalSpec, default_signal: &SignalHandle) -> SignalHandle {
        match &spec.signal {
            Some(path) => {
                let handle = SignalHandle::new(path.clone());
                if self.device.is_playable(&handle) {
                    handle
                } else {
                    log::warn!("Signal {:?} is missing or unreadable, using default", path);
                    default_signal.clone()
                }
            }
            None => default_signal.clone(),
        }
    }

    fn teardown(device: &mut D, session: &mut PlaybackSession) {
        session.state = PlaybackState::Restoring;
        device.stop_audio();
        device.cancel_vibration();
        Self::restore_volume(device, session);
        session.state = PlaybackState::Stopped;
        log::debug!("Playback session {} stopped", session.session_id);
    }

    fn restore_volume(device: &mut D, session: &mut PlaybackSession) {
        if let Some(level) = session.restore_volume.take() {
            if let Err(e) = device.set_media_volume(level) {
                log::error!("Failed to restore media volume to {}: {}", level, e);
            }
        }
    }
}

impl<D: AudioDevice> Drop for SignalPlaybackController<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::alerts::model::Severity;
    use crate::core::error::DeviceError;
    use crate::core::playback::model::VibrationPattern;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[derive(Debug, Clone, PartialEq)]
    pub enum DeviceCall {
        SetVolume(u32),
        Play(u64, PathBuf),
        StopAudio,
        Vibrate(bool),
        CancelVibration,
    }

    /// Records every device call; volume changes are applied to `media`.
    pub struct FakeDevice {
        pub ringer: RingerMode,
        pub ring: u32,
        pub max_ring: u32,
        pub media: u32,
        pub max_media: u32,
        pub unplayable: HashSet<PathBuf>,
        pub fail_volume: bool,
        pub calls: Vec<DeviceCall>,
    }

    impl Default for FakeDevice {
        fn default() -> Self {
            Self {
                ringer: RingerMode::Normal,
                ring: 7,
                max_ring: 7,
                media: 4,
                max_media: 15,
                unplayable: HashSet::new(),
                fail_volume: false,
                calls: Vec::new(),
            }
        }
    }

    impl AudioDevice for FakeDevice {
        fn ringer_mode(&self) -> RingerMode {
            self.ringer
        }
        fn ring_volume(&self) -> u32 {
            self.ring
        }
        fn max_ring_volume(&self) -> u32 {
            self.max_ring
        }
        fn media_volume(&self) -> u32 {
            self.media
        }
        fn max_media_volume(&self) -> u32 {
            self.max_media
        }
        fn set_media_volume(&mut self, level: u32) -> Result<(), DeviceError> {
            if self.fail_volume {
                return Err(DeviceError::Volume("mixer busy".to_string()));
            }
            self.media = level;
            self.calls.push(DeviceCall::SetVolume(level));
            Ok(())
        }
        fn is_playable(&self, signal: &SignalHandle) -> bool {
            !self.unplayable.contains(&signal.0)
        }
        fn play_asset(&mut self, session_id: u64, signal: &SignalHandle) -> Result<(), DeviceError> {
            if self.unplayable.contains(&signal.0) {
                return Err(DeviceError::AssetUnreadable {
                    path: signal.0.clone(),
                    reason: "not found".to_string(),
                });
            }
            self.calls.push(DeviceCall::Play(session_id, signal.0.clone()));
            Ok(())
        }
        fn stop_audio(&mut self) {
            self.calls.push(DeviceCall::StopAudio);
        }
        fn vibrate(&mut self, _pattern: &VibrationPattern, repeat: bool) {
            self.calls.push(DeviceCall::Vibrate(repeat));
        }
        fn cancel_vibration(&mut self) {
            self.calls.push(DeviceCall::CancelVibration);
        }
    }

    fn alert(severity: Severity) -> ClassificationResult {
        ClassificationResult {
            severity,
            matched_phrases: Vec::new(),
            sender: "555".to_string(),
            body: "fire".to_string(),
        }
    }

    fn signals() -> SignalConfig {
        let mut config = SignalConfig::default();
        config.default_signal = PathBuf::from("default.wav");
        config.primary.signal = Some(PathBuf::from("primary.wav"));
        config.secondary.signal = Some(PathBuf::from("secondary.wav"));
        config
    }

    fn plays(device: &FakeDevice) -> Vec<DeviceCall> {
        device
            .calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::Play(..)))
            .cloned()
            .collect()
    }

    #[test]
    fn test_non_alert_has_no_session() {
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        let session = controller.play(&alert(Severity::None), &signals(), &PlaybackPolicy::default());
        assert!(session.is_none());
        assert!(controller.device().calls.is_empty());
    }

    #[test]
    fn test_non_alert_keeps_running_session() {
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        let primary = controller
            .play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default())
            .unwrap();
        let calls = controller.device().calls.len();

        assert!(controller
            .play(&alert(Severity::None), &signals(), &PlaybackPolicy::default())
            .is_none());
        assert_eq!(controller.active_session().unwrap().session_id, primary.session_id);
        assert_eq!(controller.device().calls.len(), calls);
        assert_eq!(controller.device().media, 15);
    }

    #[test]
    fn test_play_sets_volume_from_ring_and_restores_on_stop() {
        let mut device = FakeDevice::default();
        device.ring = 3;
        let mut controller = SignalPlaybackController::new(device);

        let session = controller
            .play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default())
            .unwrap();
        assert_eq!(session.state, PlaybackState::Playing);
        assert_eq!(session.signal, Some(SignalHandle::new("primary.wav")));
        assert_eq!(controller.device().media, 6);

        controller.stop();
        assert_eq!(controller.device().media, 4);
        assert!(controller.active_session().is_none());
        assert_eq!(controller.last_session().unwrap().state, PlaybackState::Stopped);
    }

    #[test]
    fn test_second_play_tears_down_first() {
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        let first = controller
            .play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default())
            .unwrap();
        let second = controller
            .play(&alert(Severity::Secondary), &signals(), &PlaybackPolicy::default())
            .unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_eq!(controller.active_session().unwrap().session_id, second.session_id);

        let calls = &controller.device().calls;
        let stop_idx = calls.iter().position(|c| *c == DeviceCall::StopAudio).unwrap();
        let restore_idx = calls.iter().position(|c| *c == DeviceCall::SetVolume(4)).unwrap();
        let second_play = calls
            .iter()
            .position(|c| *c == DeviceCall::Play(second.session_id, PathBuf::from("secondary.wav")))
            .unwrap();
        assert!(stop_idx < second_play);
        assert!(restore_idx < second_play);

        // Completion of the torn-down session is ignored
        assert!(controller.on_playback_completed(first.session_id).is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        controller.stop();
        assert!(controller.device().calls.is_empty());

        controller.play(&alert(Severity::Secondary), &signals(), &PlaybackPolicy::default());
        controller.stop();
        let count = controller.device().calls.len();
        controller.stop();
        assert_eq!(controller.device().calls.len(), count);
    }

    #[test]
    fn test_repeat_twice_then_restore() {
        let mut config = signals();
        config.secondary.repeat = RepeatPolicy::Twice;
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        let id = controller
            .play(&alert(Severity::Secondary), &config, &PlaybackPolicy::default())
            .unwrap()
            .session_id;

        assert_eq!(controller.on_playback_completed(id), Some(PlaybackState::Playing));
        assert_eq!(controller.on_playback_completed(id), Some(PlaybackState::Stopped));
        assert_eq!(plays(controller.device()).len(), 2);
        assert_eq!(controller.device().media, 4);
        assert!(controller.on_playback_completed(id).is_none());
    }

    #[test]
    fn test_once_finishes_after_first_cycle() {
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        let id = controller
            .play(&alert(Severity::Secondary), &signals(), &PlaybackPolicy::default())
            .unwrap()
            .session_id;
        assert_eq!(controller.on_playback_completed(id), Some(PlaybackState::Stopped));
        assert_eq!(plays(controller.device()).len(), 1);
    }

    #[test]
    fn test_until_stopped_keeps_looping() {
        let mut controller = SignalPlaybackController::new(FakeDevice::default());
        let id = controller
            .play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default())
            .unwrap()
            .session_id;
        for _ in 0..5 {
            assert_eq!(controller.on_playback_completed(id), Some(PlaybackState::Playing));
        }
        assert_eq!(plays(controller.device()).len(), 6);
        assert!(controller.device().calls.contains(&DeviceCall::Vibrate(true)));

        controller.stop();
        assert_eq!(controller.device().media, 4);
    }

    #[test]
    fn test_silent_ringer_suppresses_audio_not_vibration() {
        let mut device = FakeDevice::default();
        device.ringer = RingerMode::Silent;
        let mut controller = SignalPlaybackController::new(device);

        let session = controller
            .play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default())
            .unwrap();
        assert!(session.signal.is_none());
        assert_eq!(session.state, PlaybackState::Playing);
        assert!(plays(controller.device()).is_empty());
        assert!(controller.device().calls.contains(&DeviceCall::Vibrate(true)));
        assert_eq!(controller.device().media, 4);

        // Secondary with a finite repeat has nothing left to wait for
        let session = controller
            .play(&alert(Severity::Secondary), &signals(), &PlaybackPolicy::default())
            .unwrap();
        assert_eq!(session.state, PlaybackState::Stopped);
    }

    #[test]
    fn test_ignoring_sound_settings_uses_override() {
        let mut device = FakeDevice::default();
        device.ringer = RingerMode::Silent;
        device.ring = 0;
        let mut controller = SignalPlaybackController::new(device);
        let policy = PlaybackPolicy {
            honor_sound_settings: false,
            override_volume: Some(10),
        };

        let session = controller.play(&alert(Severity::Primary), &signals(), &policy).unwrap();
        assert!(session.signal.is_some());
        assert_eq!(controller.device().media, 10);

        let policy = PlaybackPolicy {
            honor_sound_settings: false,
            override_volume: None,
        };
        controller.play(&alert(Severity::Primary), &signals(), &policy);
        assert_eq!(controller.device().media, 15);
    }

    #[test]
    fn test_unreadable_signal_falls_back_to_default() {
        let mut device = FakeDevice::default();
        device.unplayable.insert(PathBuf::from("primary.wav"));
        let mut controller = SignalPlaybackController::new(device);

        let session = controller
            .play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default())
            .unwrap();
        assert_eq!(session.signal, Some(SignalHandle::new("default.wav")));
    }

    #[test]
    fn test_failed_default_restores_volume() {
        let mut device = FakeDevice::default();
        device.unplayable.insert(PathBuf::from("default.wav"));
        let mut config = signals();
        config.secondary.signal = None;
        let mut controller = SignalPlaybackController::new(device);

        let session = controller
            .play(&alert(Severity::Secondary), &config, &PlaybackPolicy::default())
            .unwrap();
        assert!(session.signal.is_none());
        assert_eq!(session.state, PlaybackState::Stopped);
        assert_eq!(controller.device().media, 4);
    }

    #[test]
    fn test_volume_failure_still_stops() {
        let mut device = FakeDevice::default();
        device.fail_volume = true;
        let mut controller = SignalPlaybackController::new(device);

        controller.play(&alert(Severity::Primary), &signals(), &PlaybackPolicy::default());
        controller.stop();
        assert!(controller.active_session().is_none());
    }
}
