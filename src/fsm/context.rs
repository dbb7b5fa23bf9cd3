//! Shared mutable context threaded through every mode handler.
//!
//! `FsmContext` is the single struct that mode handlers read from and
//! write to.  It contains this tick's touch snapshot, the lamp's owned
//! state, the render/side-effect commands the handlers request, and the
//! configuration.  Think of it as the "blackboard" in a blackboard
//! architecture.

use crate::animation::OneShot;
use crate::config::LampConfig;
use crate::drivers::touch::TouchEvent;
use crate::sync::ColorToken;

// ---------------------------------------------------------------------------
// Touch snapshot (read-only to mode handlers; written by the service)
// ---------------------------------------------------------------------------

/// This tick's classified touch input plus the timing the hold-promotion
/// guard needs.  Refreshed by the service before every FSM tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchSnapshot {
    /// The classification of this tick's sample.
    pub event: TouchEvent,
    /// Monotonic time of this tick (ms).
    pub now_ms: u32,
    /// Timestamp of the last untouched→touched edge.
    pub last_push_ms: u32,
    /// Timestamp of the last touched→untouched edge.
    pub last_lift_ms: u32,
}

// ---------------------------------------------------------------------------
// Lamp state (owned by the mode machine)
// ---------------------------------------------------------------------------

/// The lamp's durable state.  Mutated only by mode handlers (and by the
/// service when adopting an inbound remote token while Idle).
#[derive(Debug, Clone, Copy)]
pub struct LampState {
    /// Monotonic timestamp at which the current mode was entered.
    pub mode_start_ms: u32,
    /// Index into the palette, always in `[0, n_colors)`.
    pub color_index: u8,
    /// Brightness the lamp settles at (0-255).
    pub base_brightness: u8,
    /// Live brightness currently rendered; committed into
    /// `base_brightness` when leaving BrightnessSelect via a release.
    pub current_brightness: u8,
    /// Whether at least one Click advanced the color since ColorSelect
    /// was entered.  Reset on every ColorSelect entry, read only when
    /// leaving it.
    pub color_changed_in_session: bool,
}

// ---------------------------------------------------------------------------
// Commands (written by mode handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Side effects a mode handler requests for this tick.  The service
/// drains these after the FSM tick and translates them into pixel writes
/// and sync-channel submissions.
#[derive(Debug, Clone, Default)]
pub struct ModeCommands {
    /// Re-fill the whole ring with this palette color at base brightness.
    pub fill: Option<u8>,
    /// Blank the ring immediately (not via animation).
    pub blank: bool,
    /// Run a blocking one-shot animation before normal rendering resumes.
    pub one_shot: Option<OneShot>,
    /// Hand a confirmed local color change to the sync channel.
    pub submit: Option<ColorToken>,
}

impl ModeCommands {
    /// Take this tick's commands, leaving the defaults behind.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every mode handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current mode was entered.
    pub ticks_in_mode: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Input --
    /// This tick's touch snapshot.  Updated before each FSM tick.
    pub touch: TouchSnapshot,

    // -- Lamp state --
    pub lamp: LampState,

    // -- Outputs --
    /// Side effects requested by handlers, applied after the FSM tick.
    pub commands: ModeCommands,

    // -- Configuration --
    pub config: LampConfig,
    /// This device's identity, used when constructing outbound tokens.
    pub device_id: String,
}

impl FsmContext {
    /// Create a new context with the given configuration and identity.
    pub fn new(config: LampConfig, device_id: &str) -> Self {
        let lamp = LampState {
            mode_start_ms: 0,
            color_index: 0,
            base_brightness: config.default_brightness,
            current_brightness: config.default_brightness,
            color_changed_in_session: false,
        };
        Self {
            ticks_in_mode: 0,
            total_ticks: 0,
            touch: TouchSnapshot::default(),
            lamp,
            commands: ModeCommands::default(),
            config,
            device_id: device_id.to_owned(),
        }
    }

    /// Milliseconds elapsed since the current mode was entered.
    pub fn ms_in_mode(&self) -> u32 {
        self.touch.now_ms.wrapping_sub(self.lamp.mode_start_ms)
    }
}
