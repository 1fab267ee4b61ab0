//! SmartShower host entry point.
//!
//! Wires the application core to the simulated bathroom and runs a
//! scripted session through the command channel.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedHardware   EventBus(LogEventSink)   LogAudioPlayer   │
//! │  (Sensor+Actuator)   (EventSink)              (AudioPort)      │
//! │  JsonConfig (ConfigPort)                                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ShowerService (pure logic)                  │    │
//! │  │  Safety · Flow · Temperature · Session                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Runtime: safety · water · telemetry · command loops           │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use anyhow::{Result, bail};
use log::{info, warn};

use smartshower::adapters::audio::LogAudioPlayer;
use smartshower::adapters::config_json::JsonConfig;
use smartshower::adapters::log_sink::LogEventSink;
use smartshower::adapters::sim::SimulatedHardware;
use smartshower::app::bus::EventBus;
use smartshower::app::commands::{CommandReply, ShowerCommand};
use smartshower::app::ports::ConfigPort;
use smartshower::app::service::ShowerService;
use smartshower::config::SystemConfig;
use smartshower::error::reason;
use smartshower::runtime::{Runtime, ShowerHandle};
use smartshower::sensors::DoorState;

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  SmartShower v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (optional JSON path as first argument) ──────
    let source = match std::env::args().nth(1) {
        Some(path) => JsonConfig::new(path),
        None => JsonConfig::defaults(),
    };
    let config = match source.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Adapters + core ────────────────────────────────────
    let mut bus = EventBus::new();
    bus.subscribe(Box::new(LogEventSink::new()));

    let runtime = Runtime::new(
        ShowerService::new(config),
        SimulatedHardware::new(),
        LogAudioPlayer::new(),
        bus,
    );
    let handle = runtime.handle();

    info!("System ready. Running scripted session.");

    // ── 4. Scripted session ───────────────────────────────────
    runtime.run_until(async {
        let settle = || async_io_mini::Timer::after(Duration::from_millis(500));

        runtime.with_hardware(|hw| hw.simulate_door(DoorState::Closed));
        settle().await;

        handle
            .request(ShowerCommand::StartShower {
                temperature: Some(40.0),
                audio_source: Some(reason("spotify:playlist:morning")),
            })
            .await?;
        settle().await;

        handle.request(ShowerCommand::SetTemperature(39.0)).await?;
        handle.request(ShowerCommand::SetFlowRate(6.0)).await?;
        settle().await;
        print_status(&handle).await?;

        info!("Scenario: water on the floor");
        runtime.with_hardware(|hw| hw.simulate_leak(true));
        settle().await;
        print_status(&handle).await?;

        info!("Scenario: floor dried, clearing emergency");
        runtime.with_hardware(|hw| hw.simulate_leak(false));
        settle().await;
        handle.request(ShowerCommand::ClearEmergency).await?;

        if let CommandReply::SafetyLog(entries) = handle.request(ShowerCommand::GetSafetyLog).await? {
            for entry in entries {
                info!("JOURNAL | #{} {:?} {}", entry.tick, entry.kind, entry.message);
            }
        }
        if let CommandReply::Usage(stats) = handle.request(ShowerCommand::GetUsageStats).await? {
            info!("USAGE  | {}", serde_json::to_string(&stats)?);
        }
        Ok::<(), anyhow::Error>(())
    })
}

async fn print_status(handle: &ShowerHandle) -> Result<()> {
    let CommandReply::Water(water) = handle.request(ShowerCommand::GetWaterStatus).await? else {
        bail!("unexpected reply to GetWaterStatus");
    };
    let CommandReply::Safety(safety) = handle.request(ShowerCommand::GetSafetyStatus).await? else {
        bail!("unexpected reply to GetSafetyStatus");
    };
    info!("WATER  | {}", serde_json::to_string(&water)?);
    info!("SAFETY | {}", serde_json::to_string(&safety)?);
    Ok(())
}
