//! Mock adapters and a scripted test rig for integration tests.
//!
//! Records every presented frame and emitted event so tests can assert
//! on the full history without touching real GPIO/RMT registers.  The
//! rig drives the service the same way the firmware's render loop does:
//! one tick every 50 simulated milliseconds, with the touch level
//! injected through the driver's simulation hook.

use std::sync::Arc;
use std::sync::MutexGuard;

use halolamp::animation::PixelFrame;
use halolamp::app::events::AppEvent;
use halolamp::app::ports::{EventSink, PixelPort};
use halolamp::app::service::LampService;
use halolamp::config::LampConfig;
use halolamp::drivers::touch::{sim_set_touch_raw, sim_touch_guard};
use halolamp::sync::SyncChannel;
use halolamp::CommsError;

/// A raw reading comfortably below the default threshold.
pub const RAW_TOUCHED: u16 = 10;
/// A raw reading comfortably above the default threshold.
pub const RAW_UNTOUCHED: u16 = u16::MAX;

// ── Mock pixel port ───────────────────────────────────────────

pub struct MockPixels {
    pub frames: Vec<PixelFrame>,
}

impl MockPixels {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn last_frame(&self) -> &PixelFrame {
        self.frames.last().expect("no frame presented yet")
    }
}

impl PixelPort for MockPixels {
    fn show(&mut self, frame: &PixelFrame) {
        self.frames.push(*frame);
    }
}

// ── Recording event sink ──────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn adopted_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::RemoteAdopted(_)))
            .count()
    }

    pub fn committed_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::ColorCommitted(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Scripted sync transport ───────────────────────────────────

/// Pops the next scripted result per exchange and records every URL.
pub struct ScriptedTransport {
    script: Vec<Result<String, CommsError>>,
    pub requests: Vec<String>,
}

impl ScriptedTransport {
    pub fn new(mut script: Vec<Result<String, CommsError>>) -> Self {
        script.reverse();
        Self {
            script,
            requests: Vec::new(),
        }
    }

    pub fn ok_body(fc: &str) -> Result<String, CommsError> {
        Ok(format!("{{\"fc\": \"{fc}\"}}"))
    }
}

impl halolamp::sync::SyncTransport for ScriptedTransport {
    fn exchange(&mut self, url: &str) -> Result<String, CommsError> {
        self.requests.push(url.to_owned());
        self.script.pop().expect("transport script exhausted")
    }
}

// ── Test rig ──────────────────────────────────────────────────

pub const TICK_MS: u32 = 50;
pub const DEVICE_ID: &str = "HL-EFCAFE";

pub struct Rig {
    pub service: LampService,
    pub pixels: MockPixels,
    pub sink: RecordingSink,
    pub channel: Arc<SyncChannel>,
    pub now_ms: u32,
    _guard: MutexGuard<'static, ()>,
}

impl Rig {
    pub fn new() -> Self {
        let guard = sim_touch_guard();
        sim_set_touch_raw(RAW_UNTOUCHED);

        let channel = Arc::new(SyncChannel::new());
        let mut service =
            LampService::new(LampConfig::default(), DEVICE_ID, channel.clone(), 7);
        let mut sink = RecordingSink::new();
        service.start(&mut sink);

        Self {
            service,
            pixels: MockPixels::new(),
            sink,
            channel,
            now_ms: 0,
            _guard: guard,
        }
    }

    pub fn config(&self) -> LampConfig {
        LampConfig::default()
    }

    /// One render tick, 50 simulated milliseconds later.
    pub fn tick(&mut self) {
        self.now_ms += TICK_MS;
        self.service.tick(
            self.now_ms,
            &mut self.pixels,
            &mut self.sink,
            &mut |_ms| {},
        );
    }

    /// Tick repeatedly until `ms` simulated milliseconds have passed.
    pub fn tick_for(&mut self, ms: u32) {
        for _ in 0..ms.div_ceil(TICK_MS) {
            self.tick();
        }
    }

    pub fn press(&mut self) {
        sim_set_touch_raw(RAW_TOUCHED);
    }

    pub fn release(&mut self) {
        sim_set_touch_raw(RAW_UNTOUCHED);
    }

    /// A quick tap: press for one tick, release for one tick.
    pub fn tap(&mut self) {
        self.press();
        self.tick();
        self.release();
        self.tick();
    }

    /// Press and keep holding for `ms` simulated milliseconds.
    pub fn hold_for(&mut self, ms: u32) {
        self.press();
        self.tick_for(ms);
    }
}
