// Error taxonomy for the relay core.
//
// Pure functions (classification, volume policy) never fail. Stateful
// components surface failures through these types or explicit outcome values.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by the audio/vibration sink.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("signal asset unreadable: {path:?}: {reason}")]
    AssetUnreadable { path: PathBuf, reason: String },
    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),
    #[error("volume control failed: {0}")]
    Volume(String),
}

/// The call capability could not initiate a call.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("no dial command configured")]
    NotConfigured,
    #[error("dialer failed to start: {0}")]
    Spawn(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum AckError {
    #[error("no acknowledgment phone number configured")]
    NoPhoneNumber,
    #[error("acknowledgment by call is disabled")]
    Disabled,
    #[error("no primary alert is waiting for acknowledgment")]
    NothingToAcknowledge,
    #[error("an acknowledgment attempt is already in progress")]
    AlreadyActive,
    #[error("call placement failed: {0}")]
    Placement(#[from] PlacementError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("settings could not be serialized: {0}")]
    Json(#[from] serde_json::Error),
}
