use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::core::{
    ack::dialer::CommandDialer,
    ack::model::AckNotice,
    config::{ConfigManager, Settings},
    coordinator::{RelayCoordinator, RelayEvent, RelayOutput},
    feed::{parse_feed_line, FeedCommand},
    playback::rodio_device::RodioDevice,
    scheduler::TokioScheduler,
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Also bridges `log` records from the core
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn config_dir() -> PathBuf {
    std::env::var_os("ALARM_RELAY_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn run() -> anyhow::Result<()> {
    init_logging();

    let config_manager = ConfigManager::new(config_dir());
    let settings = config_manager.load();
    log::info!("Loaded settings from {:?}", config_manager.path());

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(relay_loop(config_manager, settings));
    // A pending stdin read would otherwise hold shutdown open
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

/// Single owner of all relay state. Feed lines, playback completions and
/// timer expiries all arrive over one channel and are handled in order.
async fn relay_loop(config_manager: ConfigManager, settings: Settings) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayEvent>();

    let completion_tx = tx.clone();
    let device = RodioDevice::open(
        settings.device.clone(),
        Box::new(move |session_id| {
            let _ = completion_tx.send(RelayEvent::PlaybackCompleted(session_id));
        }),
    )
    .context("failed to open audio output")?;

    let timer_tx = tx.clone();
    let scheduler = TokioScheduler::new(Arc::new(move |id, kind| {
        let _ = timer_tx.send(RelayEvent::Timer(id, kind));
    }));

    let dialer = CommandDialer::new(settings.dial_command.clone());
    let mut relay = RelayCoordinator::new(&settings, device, dialer, scheduler);

    let feed_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                // Stamped on read so call durations don't depend on queueing delay
                Ok(Some(line)) => match parse_feed_line(&line, Instant::now()) {
                    Some(command) => {
                        let event = match command {
                            FeedCommand::Event(event) => event,
                            FeedCommand::Reload => {
                                log::info!("Reloading settings from {:?}", config_manager.path());
                                RelayEvent::ReloadSettings(Box::new(config_manager.load()))
                            }
                        };
                        if feed_tx.send(event).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => log::warn!("Unrecognized feed line: {}", line),
                },
                Ok(None) => {
                    let _ = feed_tx.send(RelayEvent::Shutdown);
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read feed: {}", e);
                    let _ = feed_tx.send(RelayEvent::Shutdown);
                    break;
                }
            }
        }
    });

    let signal_tx = tx;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_tx.send(RelayEvent::Shutdown);
        }
    });

    log::info!("Relay running; reading events from stdin");
    while let Some(event) = rx.recv().await {
        let shutdown = event == RelayEvent::Shutdown;
        let output = relay.handle(event);
        report(&output);
        if shutdown {
            break;
        }
    }

    log::info!("Relay stopped");
    Ok(())
}

/// Emit core outputs for downstream consumers (here: stdout as JSON lines).
fn report(output: &RelayOutput) {
    if let Some(record) = output.alert.as_ref().filter(|r| r.result.is_alert()) {
        match serde_json::to_string(record) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize alert: {}", e),
        }
    }
    for notice in &output.ack {
        match notice {
            AckNotice::RedialProgress { remaining } => {
                log::debug!("Redial in {} ms", remaining.as_millis())
            }
            AckNotice::CallPlaced(attempt)
            | AckNotice::Busy(attempt)
            | AckNotice::Connected(attempt)
            | AckNotice::PlacementFailed(attempt) => match serde_json::to_string(attempt) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Failed to serialize attempt: {}", e),
            },
            AckNotice::Aborted => println!(r#"{{"acknowledgment":"aborted"}}"#),
        }
    }
    for error in &output.errors {
        log::warn!("{}", error);
    }
}
