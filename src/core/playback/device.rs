// Device audio/vibration sink contract.
//
// Playback completion is not returned from `play_asset`; the device reports
// it later through `RelayEvent::PlaybackCompleted`.

use crate::core::error::DeviceError;

use super::model::{RingerMode, SignalHandle, VibrationPattern};

pub trait AudioDevice: Send {
    fn ringer_mode(&self) -> RingerMode;
    fn ring_volume(&self) -> u32;
    fn max_ring_volume(&self) -> u32;

    fn media_volume(&self) -> u32;
    fn max_media_volume(&self) -> u32;
    fn set_media_volume(&mut self, level: u32) -> Result<(), DeviceError>;

    /// Whether the asset exists and can be decoded.
    fn is_playable(&self, signal: &SignalHandle) -> bool;
    /// Start one playback cycle of `signal` for `session_id`.
    fn play_asset(&mut self, session_id: u64, signal: &SignalHandle) -> Result<(), DeviceError>;
    fn stop_audio(&mut self);

    fn vibrate(&mut self, pattern: &VibrationPattern, repeat: bool);
    fn cancel_vibration(&mut self);
}
