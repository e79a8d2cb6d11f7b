//! Application entry point — headless speech coach.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Wire the microphone, HTTP analyzer, settings store, and log notifier.
//! 4. `speech-coach calibrate` — run one ambient calibration and exit.
//!    `speech-coach` — run a coaching session until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;

use speech_coach::{
    analyze::{HttpAnalyzer, MetricAnalyzer},
    calibration::CalibrationManager,
    capture::{shared_device, MicCapture, SharedDevice},
    config::{AppConfig, AppPaths, SettingsStore, TomlSettingsStore},
    feedback::LogNotifier,
    session::{new_shared_status, SessionCommand, SessionRunner},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("speech coach starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    let device = shared_device(Arc::new(MicCapture::new()));
    let analyzer: Arc<dyn MetricAnalyzer> = Arc::new(HttpAnalyzer::from_config(&config.service));
    let store: Arc<dyn SettingsStore> = Arc::new(TomlSettingsStore::new(paths.users_dir));

    match std::env::args().nth(1).as_deref() {
        Some("calibrate") => run_calibration(device, analyzer, store, &config).await,
        Some(other) => anyhow::bail!("unknown command {other:?} (expected: calibrate)"),
        None => run_session(device, analyzer, store, &config).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run_calibration(
    device: SharedDevice,
    analyzer: Arc<dyn MetricAnalyzer>,
    store: Arc<dyn SettingsStore>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let manager = CalibrationManager::new(device, analyzer, store);
    let window = Duration::from_secs_f64(config.capture.calibration_secs);

    println!(
        "Calibrating: stay silent for {:.0} seconds…",
        window.as_secs_f64()
    );
    let outcome = manager
        .calibrate(&config.user_id, window)
        .await
        .context("calibration failed")?;

    println!("Calibrated: zero point {:.1} dB", outcome.zero_point_db);
    Ok(())
}

async fn run_session(
    device: SharedDevice,
    analyzer: Arc<dyn MetricAnalyzer>,
    store: Arc<dyn SettingsStore>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let status = new_shared_status();
    let runner = SessionRunner::new(
        device,
        analyzer,
        store,
        Arc::new(LogNotifier),
        Arc::clone(&status),
        config.user_id.clone(),
        Duration::from_secs_f64(config.capture.window_secs),
    );

    let (stop_tx, stop_rx) = mpsc::channel(4);
    let mut session = tokio::spawn(runner.run(stop_rx));

    // Wait for Ctrl-C, but surface an early abnormal end (no metric
    // enabled, microphone lost) instead of blocking on the signal.
    let outcome = tokio::select! {
        res = &mut session => res,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            log::info!("stop requested");
            let _ = stop_tx.send(SessionCommand::Stop).await;
            session.await
        }
    };
    outcome
        .context("session task failed")?
        .context("session ended abnormally")?;

    if let Ok(st) = status.lock() {
        log::info!("session summary: {} cycles completed", st.cycles_completed);
    }
    Ok(())
}
