//! Application service — the domain core of the render task.
//!
//! [`LampService`] owns the touch sensor, the mode machine, the animation
//! engine, and the render side of the sync channel.  Once per render tick
//! it classifies the touch input, advances the FSM, applies the side
//! effects the mode handlers requested, folds in any inbound remote
//! token, and renders the frame for the current mode.
//!
//! ```text
//!  TouchSensor ──▶ ┌────────────────────────┐ ──▶ PixelPort
//!                  │      LampService        │ ──▶ EventSink
//!  SyncChannel ◀──▶│  FSM · Animation        │
//!                  └────────────────────────┘
//! ```

use std::sync::Arc;

use log::info;

use crate::animation::{AnimationEngine, OneShot, PixelFrame};
use crate::config::LampConfig;
use crate::drivers::touch::TouchSensor;
use crate::fsm::context::{FsmContext, TouchSnapshot};
use crate::fsm::states::build_mode_table;
use crate::fsm::{Fsm, ModeId};
use crate::pins::N_PIXELS;
use crate::sync::{ColorToken, SyncChannel};

use super::events::AppEvent;
use super::ports::{EventSink, PixelPort};

// ───────────────────────────────────────────────────────────────
// LampService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all render-task domain logic.
pub struct LampService {
    fsm: Fsm,
    ctx: FsmContext,
    touch: TouchSensor,
    engine: AnimationEngine,
    channel: Arc<SyncChannel>,
    /// The last token this lamp sent or adopted; inbound tokens equal to
    /// it are not re-adopted, so a receipt plays exactly once per change.
    held_token: Option<ColorToken>,
    /// Previous tick's timestamp, for the animation phase delta.
    last_now_ms: u32,
}

impl LampService {
    /// Construct the service.  `seed` randomises the animation flashes;
    /// pass something time-derived in production and a constant in tests.
    pub fn new(
        config: LampConfig,
        device_id: &str,
        channel: Arc<SyncChannel>,
        seed: u32,
    ) -> Self {
        let touch = TouchSensor::new(config.touch_threshold);
        let ctx = FsmContext::new(config, device_id);
        let fsm = Fsm::new(build_mode_table(), ModeId::Idle);

        Self {
            fsm,
            ctx,
            touch,
            engine: AnimationEngine::new(seed),
            channel,
            held_token: None,
            last_now_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial mode entry.  Call once before the first `tick()`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_mode()));
        info!("LampService started in {:?}", self.fsm.current_mode());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full render cycle: classify touch → FSM → side effects →
    /// inbound adoption → per-mode render.
    ///
    /// `pause` is how one-shot animations block between frames; the main
    /// loop passes a real sleep, tests a no-op.
    pub fn tick(
        &mut self,
        now_ms: u32,
        pixels: &mut impl PixelPort,
        sink: &mut impl EventSink,
        pause: &mut impl FnMut(u32),
    ) {
        let delta_ms = now_ms.wrapping_sub(self.last_now_ms);
        self.last_now_ms = now_ms;

        // 1. Classify this tick's touch input.
        let event = self.touch.classify(now_ms, self.ctx.config.hold_threshold_ms);
        self.ctx.touch = TouchSnapshot {
            event,
            now_ms,
            last_push_ms: self.touch.last_push_ms(),
            last_lift_ms: self.touch.last_lift_ms(),
        };

        // 2. Mode machine tick (pure state logic).
        let prev_mode = self.fsm.current_mode();
        self.fsm.tick(&mut self.ctx);

        // 3. Apply the side effects the handlers requested.
        let cmds = self.ctx.commands.take();
        if let Some(token) = cmds.submit {
            self.channel.submit_outbound(token.clone());
            self.held_token = Some(token.clone());
            sink.emit(&AppEvent::ColorCommitted(token));
        }
        if cmds.blank {
            pixels.show(&[(0, 0, 0); N_PIXELS]);
        }
        if let Some(shot) = cmds.one_shot {
            self.engine.run_one_shot(
                shot,
                self.ctx.lamp.base_brightness,
                self.ctx.config.n_colors,
                pixels,
                pause,
            );
        }
        if let Some(color_index) = cmds.fill {
            pixels.show(&self.solid_frame(color_index));
        }

        // 4. Remote adoption — only while Idle with nothing pending, so a
        //    network update can never collide with an in-progress gesture.
        self.adopt_inbound_if_due(now_ms, pixels, sink, pause);

        // 5. Per-mode render.
        let elapsed_ms = now_ms.wrapping_sub(self.ctx.lamp.mode_start_ms);
        let (frame, live) = self.engine.render(
            self.fsm.current_mode(),
            delta_ms,
            elapsed_ms,
            &self.ctx.lamp,
            &self.ctx.config,
        );
        self.ctx.lamp.current_brightness = live;
        pixels.show(&frame);

        // 6. Emit a mode change if the FSM moved.
        let new_mode = self.fsm.current_mode();
        if new_mode != prev_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: prev_mode,
                to: new_mode,
            });
        }
    }

    fn adopt_inbound_if_due(
        &mut self,
        now_ms: u32,
        pixels: &mut impl PixelPort,
        sink: &mut impl EventSink,
        pause: &mut impl FnMut(u32),
    ) {
        if self.fsm.current_mode() != ModeId::Idle || self.channel.has_pending_outbound() {
            return;
        }
        let Some(inbound) = self.channel.poll_inbound() else {
            return;
        };
        if self.held_token.as_ref() == Some(&inbound) {
            return;
        }

        // Foreign palettes may be larger than ours; reduce into range.
        let target = inbound.color_index % self.ctx.config.n_colors;
        info!("adopting remote color token {} -> index {}", inbound, target);
        self.ctx.lamp.color_index = target;
        self.ctx.lamp.mode_start_ms = now_ms;
        self.held_token = Some(inbound.clone());

        self.engine.run_one_shot(
            OneShot::Receipt { target },
            self.ctx.lamp.base_brightness,
            self.ctx.config.n_colors,
            pixels,
            pause,
        );
        sink.emit(&AppEvent::RemoteAdopted(inbound));
    }

    fn solid_frame(&self, color_index: u8) -> PixelFrame {
        let hue = crate::animation::palette_hue(color_index, self.ctx.config.n_colors);
        [crate::animation::hsv_to_rgb(hue, 255, self.ctx.lamp.base_brightness); N_PIXELS]
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current mode.
    pub fn mode(&self) -> ModeId {
        self.fsm.current_mode()
    }

    /// Current palette index.
    pub fn color_index(&self) -> u8 {
        self.ctx.lamp.color_index
    }

    /// Settled brightness.
    pub fn base_brightness(&self) -> u8 {
        self.ctx.lamp.base_brightness
    }

    /// Live rendered brightness.
    pub fn current_brightness(&self) -> u8 {
        self.ctx.lamp.current_brightness
    }

    /// Whether a Click advanced the color since ColorSelect was entered.
    pub fn color_changed_in_session(&self) -> bool {
        self.ctx.lamp.color_changed_in_session
    }

    /// Whether the touch sensor is currently held down.
    pub fn is_touched(&self) -> bool {
        self.touch.is_held()
    }
}
