// Playback model types: signal selection, vibration, repeat policy and session state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::alerts::model::Severity;

/// Opaque reference to an audio asset the device can play.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalHandle(pub PathBuf);

impl SignalHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

/// Sequence of (silence, buzz) millisecond pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationPattern(pub Vec<(u64, u64)>);

impl VibrationPattern {
    /// Total pattern length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.0.iter().map(|(silence, buzz)| silence + buzz).sum()
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self(vec![(0, 500), (500, 500), (500, 500)])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepeatPolicy {
    #[default]
    Once,
    Twice,
    UntilStopped,
}

impl RepeatPolicy {
    /// Number of cycles to play, `None` for unbounded.
    pub fn cycles(&self) -> Option<u32> {
        match self {
            Self::Once => Some(1),
            Self::Twice => Some(2),
            Self::UntilStopped => None,
        }
    }
}

/// Device-wide audio policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RingerMode {
    Silent,
    Vibrate,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Playing,
    Restoring,
    Stopped,
}

/// Signal settings for one severity class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// User-chosen asset; the default signal is used when unset or unreadable
    #[serde(default)]
    pub signal: Option<PathBuf>,
    #[serde(default)]
    pub vibration: VibrationPattern,
    #[serde(default = "default_vibrate")]
    pub vibrate: bool,
    #[serde(default)]
    pub repeat: RepeatPolicy,
}

fn default_vibrate() -> bool {
    true
}

impl Default for SignalSpec {
    fn default() -> Self {
        Self {
            signal: None,
            vibration: VibrationPattern::default(),
            vibrate: true,
            repeat: RepeatPolicy::Once,
        }
    }
}

/// Per-severity signal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_primary_spec")]
    pub primary: SignalSpec,
    #[serde(default)]
    pub secondary: SignalSpec,
    #[serde(default = "default_signal_path")]
    pub default_signal: PathBuf,
}

fn default_primary_spec() -> SignalSpec {
    SignalSpec {
        repeat: RepeatPolicy::UntilStopped,
        ..SignalSpec::default()
    }
}

fn default_signal_path() -> PathBuf {
    PathBuf::from("sounds/alarm.wav")
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_spec(),
            secondary: SignalSpec::default(),
            default_signal: default_signal_path(),
        }
    }
}

impl SignalConfig {
    /// Get the signal settings for a severity, `None` for non-alerts
    pub fn spec_for(&self, severity: Severity) -> Option<&SignalSpec> {
        match severity {
            Severity::Primary => Some(&self.primary),
            Severity::Secondary => Some(&self.secondary),
            Severity::None => None,
        }
    }
}

/// How device sound settings affect playback volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPolicy {
    /// Follow the ringer mode and ring volume when true
    #[serde(default = "default_honor")]
    pub honor_sound_settings: bool,
    /// Media volume to use when sound settings are ignored; max volume if unset
    #[serde(default)]
    pub override_volume: Option<u32>,
}

fn default_honor() -> bool {
    true
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            honor_sound_settings: true,
            override_volume: None,
        }
    }
}

/// One notification run. Owned by the playback controller.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub session_id: u64,
    pub severity: Severity,
    /// `None` when audio is suppressed by the ringer mode
    pub signal: Option<SignalHandle>,
    pub vibration_pattern: Option<VibrationPattern>,
    pub repeat_policy: RepeatPolicy,
    pub state: PlaybackState,
    pub cycles_completed: u32,
    /// Media volume to put back when the session ends
    pub(crate) restore_volume: Option<u32>,
}
