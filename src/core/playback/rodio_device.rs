//! Desktop audio sink backed by rodio.
//!
//! The output stream lives on a dedicated player thread; this handle talks to
//! it over a channel. Ringer mode and ring volume come from the configured
//! [`DeviceProfile`] since desktops have no ringer. Vibration is logged only.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::DeviceError;

use super::device::AudioDevice;
use super::model::{RingerMode, SignalHandle, VibrationPattern};

const COMPLETION_POLL: Duration = Duration::from_millis(50);

/// Simulated phone audio settings for the desktop harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default)]
    pub ringer_mode: RingerMode,
    #[serde(default = "default_ring_volume")]
    pub ring_volume: u32,
    #[serde(default = "default_ring_volume")]
    pub max_ring_volume: u32,
    #[serde(default = "default_max_media")]
    pub max_media_volume: u32,
    #[serde(default = "default_media_volume")]
    pub media_volume: u32,
}

fn default_ring_volume() -> u32 {
    7
}

fn default_max_media() -> u32 {
    15
}

fn default_media_volume() -> u32 {
    8
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            ringer_mode: RingerMode::Normal,
            ring_volume: default_ring_volume(),
            max_ring_volume: default_ring_volume(),
            max_media_volume: default_max_media(),
            media_volume: default_media_volume(),
        }
    }
}

enum PlayerCommand {
    Play { session_id: u64, path: PathBuf },
    Stop,
    Volume(f32),
    Shutdown,
}

pub type CompletionCallback = Box<dyn Fn(u64) + Send>;

pub struct RodioDevice {
    profile: DeviceProfile,
    media_volume: u32,
    vibrating: bool,
    commands: Sender<PlayerCommand>,
    player: Option<thread::JoinHandle<()>>,
}

impl RodioDevice {
    /// Open the default output device. `on_complete` is called from the player
    /// thread with the session id whenever one playback cycle finishes.
    pub fn open(profile: DeviceProfile, on_complete: CompletionCallback) -> Result<Self, DeviceError> {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let player = thread::Builder::new()
            .name("alarm-player".to_string())
            .spawn(move || player_loop(rx, ready_tx, on_complete))
            .map_err(|e| DeviceError::AudioUnavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(DeviceError::AudioUnavailable(reason)),
            Err(_) => {
                return Err(DeviceError::AudioUnavailable(
                    "player thread exited during startup".to_string(),
                ))
            }
        }

        let media_volume = profile.media_volume.min(profile.max_media_volume);
        let device = Self {
            profile,
            media_volume,
            vibrating: false,
            commands: tx,
            player: Some(player),
        };
        device.send(PlayerCommand::Volume(device.gain()))?;
        Ok(device)
    }

    fn gain(&self) -> f32 {
        if self.profile.max_media_volume == 0 {
            return 0.0;
        }
        self.media_volume as f32 / self.profile.max_media_volume as f32
    }

    fn send(&self, command: PlayerCommand) -> Result<(), DeviceError> {
        self.commands
            .send(command)
            .map_err(|_| DeviceError::AudioUnavailable("player thread stopped".to_string()))
    }
}

fn open_decoder(path: &Path) -> Result<rodio::Decoder<BufReader<File>>, DeviceError> {
    let file = File::open(path).map_err(|e| DeviceError::AssetUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    rodio::Decoder::new(BufReader::new(file)).map_err(|e| DeviceError::AssetUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn player_loop(
    commands: Receiver<PlayerCommand>,
    ready: Sender<Result<(), String>>,
    on_complete: CompletionCallback,
) {
    let stream = match rodio::OutputStreamBuilder::open_default_stream() {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    let mut sink: Option<rodio::Sink> = None;
    let mut playing: Option<u64> = None;
    let mut gain = 1.0f32;

    loop {
        match commands.recv_timeout(COMPLETION_POLL) {
            Ok(PlayerCommand::Play { session_id, path }) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                match open_decoder(&path) {
                    Ok(source) => {
                        let new_sink = rodio::Sink::connect_new(stream.mixer());
                        new_sink.set_volume(gain);
                        new_sink.append(source);
                        sink = Some(new_sink);
                        playing = Some(session_id);
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        // Report the cycle as done so the controller can move on
                        on_complete(session_id);
                    }
                }
            }
            Ok(PlayerCommand::Stop) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                playing = None;
            }
            Ok(PlayerCommand::Volume(level)) => {
                gain = level;
                if let Some(current) = &sink {
                    current.set_volume(gain);
                }
            }
            Ok(PlayerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if let (Some(session_id), Some(current)) = (playing, &sink) {
            if current.empty() {
                playing = None;
                on_complete(session_id);
            }
        }
    }
}

impl AudioDevice for RodioDevice {
    fn ringer_mode(&self) -> RingerMode {
        self.profile.ringer_mode
    }

    fn ring_volume(&self) -> u32 {
        self.profile.ring_volume
    }

    fn max_ring_volume(&self) -> u32 {
        self.profile.max_ring_volume
    }

    fn media_volume(&self) -> u32 {
        self.media_volume
    }

    fn max_media_volume(&self) -> u32 {
        self.profile.max_media_volume
    }

    fn set_media_volume(&mut self, level: u32) -> Result<(), DeviceError> {
        self.media_volume = level.min(self.profile.max_media_volume);
        self.send(PlayerCommand::Volume(self.gain()))
            .map_err(|e| DeviceError::Volume(e.to_string()))
    }

    fn is_playable(&self, signal: &SignalHandle) -> bool {
        open_decoder(&signal.0).is_ok()
    }

    fn play_asset(&mut self, session_id: u64, signal: &SignalHandle) -> Result<(), DeviceError> {
        // Decode up front so an unreadable asset is reported to the caller
        open_decoder(&signal.0)?;
        self.send(PlayerCommand::Play {
            session_id,
            path: signal.0.clone(),
        })
    }

    fn stop_audio(&mut self) {
        if self.send(PlayerCommand::Stop).is_err() {
            log::warn!("Audio stop ignored: player thread is gone");
        }
    }

    fn vibrate(&mut self, pattern: &VibrationPattern, repeat: bool) {
        self.vibrating = true;
        log::info!(
            "Vibrate {:?} ({} ms per cycle, repeat: {})",
            pattern.0,
            pattern.duration_ms(),
            repeat
        );
    }

    fn cancel_vibration(&mut self) {
        if self.vibrating {
            self.vibrating = false;
            log::info!("Vibration cancelled");
        }
    }
}

impl Drop for RodioDevice {
    fn drop(&mut self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
        if let Some(player) = self.player.take() {
            let _ = player.join();
        }
    }
}
