// Acknowledgment model types: call states, attempts and settings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telephony call state as reported by the call-state event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CallState {
    #[default]
    Idle,
    Ringing,
    OffHook,
}

/// Emitted once per OffHook -> Idle edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEnded {
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckOutcome {
    Pending,
    Connected,
    Busy,
    PlacementFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgmentAttempt {
    pub phone_number: String,
    /// 1 for the first call, incremented on each redial
    pub attempt: u32,
    pub attempt_started_at: DateTime<Utc>,
    pub outcome: AckOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    Idle,
    CallPlaced,
    RedialCountdown,
}

/// Acknowledgment progress reported to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckNotice {
    CallPlaced(AcknowledgmentAttempt),
    /// The call ended too quickly; a redial countdown started
    Busy(AcknowledgmentAttempt),
    Connected(AcknowledgmentAttempt),
    RedialProgress { remaining: Duration },
    PlacementFailed(AcknowledgmentAttempt),
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckSettings {
    /// Offer acknowledgment by call for primary alerts
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Calls shorter than this count as busy/unanswered
    #[serde(default = "default_min_call_time")]
    pub min_call_time_ms: u64,
    #[serde(default = "default_redial_countdown")]
    pub redial_countdown_ms: u64,
    #[serde(default = "default_redial_interval")]
    pub redial_countdown_interval_ms: u64,
}

fn default_min_call_time() -> u64 {
    7000
}

fn default_redial_countdown() -> u64 {
    6000
}

fn default_redial_interval() -> u64 {
    100
}

impl Default for AckSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            phone_number: None,
            min_call_time_ms: default_min_call_time(),
            redial_countdown_ms: default_redial_countdown(),
            redial_countdown_interval_ms: default_redial_interval(),
        }
    }
}

impl AckSettings {
    pub fn min_call_time(&self) -> Duration {
        Duration::from_millis(self.min_call_time_ms)
    }

    pub fn redial_countdown(&self) -> Duration {
        Duration::from_millis(self.redial_countdown_ms)
    }

    pub fn redial_interval(&self) -> Duration {
        Duration::from_millis(self.redial_countdown_interval_ms)
    }

    /// Configured number, ignoring blank entries
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
