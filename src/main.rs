//! Halo Lamp Firmware — Main Entry Point
//!
//! Dual-core split:
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │  Render task (core 0)        │   │  Network task (core 1)       │
//! │                              │   │                              │
//! │  touch classify              │   │  sleep(sync period)          │
//! │  → mode machine              │   │  → GET fc=…  or  id=…        │
//! │  → one-shot animations       │   │  → ack outbound / publish    │
//! │  → per-mode render, ~50 ms   │   │    inbound                   │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                │            Arc<SyncChannel>      │
//!                └───────────────┬──────────────────┘
//! ```
//!
//! The render task never blocks on the network task; an unreachable
//! coordination service only ever means the lamp stops reflecting remote
//! changes.

#![deny(unused_must_use)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use halolamp::adapters::device_id;
use halolamp::adapters::log_sink::LogEventSink;
use halolamp::adapters::portal;
use halolamp::adapters::time::Esp32TimeAdapter;
use halolamp::adapters::wifi::{ConnectivityPort, WifiAdapter};
use halolamp::app::service::LampService;
use halolamp::config::LampConfig;
use halolamp::drivers::hw_init;
use halolamp::drivers::led_strip::LedStrip;
use halolamp::drivers::touch::TouchSensor;
use halolamp::sync::{SyncChannel, SyncWorker};

/// WiFi reconnect poll cadence, in render ticks (~2 s at 50 ms).
const WIFI_POLL_TICKS: u32 = 40;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("Halo Lamp v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is the one fatal path — log and halt.
        // In production the watchdog resets the board after timeout.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    let time = Esp32TimeAdapter::new();

    // ── 3. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    info!(
        "Device ID: {} (hostname: {})",
        dev_id,
        device_id::hostname(&mac)
    );

    // ── 4. Configuration ──────────────────────────────────────
    let mut config = LampConfig::default();
    if let Some(url) = option_env!("HALO_SERVICE_URL") {
        config.service_url = url.to_owned();
    }
    if let Some(ssid) = option_env!("HALO_WIFI_SSID") {
        config.wifi_ssid = ssid.to_owned();
    }
    if let Some(pass) = option_env!("HALO_WIFI_PASS") {
        config.wifi_password = pass.to_owned();
    }

    // ── 5. Provisioning gate + WiFi station ───────────────────
    let mut wifi = WifiAdapter::new();
    if !config.wifi_ssid.is_empty() {
        if let Err(e) = wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
            warn!("stored credentials rejected: {e}");
        }
    }

    let boot_touch = TouchSensor::new(config.touch_threshold);
    if portal::provisioning_requested(&boot_touch) {
        info!("touch held at power-on — entering provisioning");
        portal::run_blocking(&mut wifi);
    }
    drop(boot_touch);

    if let Err(e) = wifi.connect() {
        warn!("WiFi not up yet ({e}); reconnect continues in the background");
    }

    // ── 6. Sync channel + network task ────────────────────────
    let channel = Arc::new(SyncChannel::new());
    spawn_sync_task(&config, &dev_id, channel.clone())?;

    // ── 7. Render task ────────────────────────────────────────
    let mut strip = LedStrip::new();
    let mut sink = LogEventSink::new();
    let seed = (time.uptime_us() as u32) | 1;
    let mut service = LampService::new(config.clone(), dev_id.as_str(), channel, seed);
    service.start(&mut sink);

    let mut pause = |ms: u32| thread::sleep(Duration::from_millis(u64::from(ms)));
    let mut tick: u32 = 0;

    info!("System ready. Entering render loop.");
    loop {
        let now_ms = time.uptime_ms();
        service.tick(now_ms, &mut strip, &mut sink, &mut pause);

        tick = tick.wrapping_add(1);
        if tick % WIFI_POLL_TICKS == 0 {
            wifi.poll();
        }

        thread::sleep(Duration::from_millis(u64::from(config.render_tick_ms)));
    }
}

/// Spawn the network task on the second core.  It owns the other side of
/// the sync channel and runs forever on its fixed period.
fn spawn_sync_task(config: &LampConfig, dev_id: &str, channel: Arc<SyncChannel>) -> Result<()> {
    let period = Duration::from_millis(u64::from(config.sync_period_ms));
    let service_url = config.service_url.clone();
    let device_id = dev_id.to_owned();

    #[cfg(target_os = "espidf")]
    {
        use esp_idf_svc::hal::cpu::Core;
        use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
        ThreadSpawnConfiguration {
            name: Some(&b"halo-sync\0"[..]),
            stack_size: 8192,
            pin_to_core: Some(Core::Core1),
            ..Default::default()
        }
        .set()?;
    }

    thread::Builder::new()
        .name("halo-sync".into())
        .stack_size(8192)
        .spawn(move || {
            #[cfg(target_os = "espidf")]
            let transport = halolamp::sync::remote::EspHttpTransport::new(10);
            #[cfg(not(target_os = "espidf"))]
            let transport = halolamp::sync::remote::SimTransport;

            let mut worker = SyncWorker::new(transport, channel, &device_id, &service_url);
            loop {
                thread::sleep(period);
                worker.poll_once();
            }
        })?;

    #[cfg(target_os = "espidf")]
    {
        use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
        // Subsequent threads (none today) spawn with defaults again.
        ThreadSpawnConfiguration::default().set()?;
    }

    Ok(())
}
