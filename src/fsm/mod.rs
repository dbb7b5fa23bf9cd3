//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern: a fixed table with one row per mode,
//! each row carrying plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  ModeTable                                                     │
//! │  ┌──────────────────┬───────────┬──────────┬─────────────────┐ │
//! │  │ ModeId           │ on_enter  │ on_exit  │ on_update       │ │
//! │  ├──────────────────┼───────────┼──────────┼─────────────────┤ │
//! │  │ Sleep            │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option │ │
//! │  │ Idle             │ fn(ctx)   │ —        │ fn(ctx)->Option │ │
//! │  │ ColorSelect      │ fn(ctx)   │ —        │ fn(ctx)->Option │ │
//! │  │ BrightnessSelect │ fn(ctx)   │ —        │ fn(ctx)->Option │ │
//! │  └──────────────────┴───────────┴──────────┴─────────────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each render tick the engine calls `on_update` for the **current** mode
//! with the tick's touch snapshot already placed in the context.  If it
//! returns `Some(next)`, the engine runs `on_exit` for the current mode,
//! re-anchors `mode_start_ms`, then runs `on_enter` for the next.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Enumeration of the lamp's high-level behaviour modes.
/// Must stay in sync with the table built in [`states::build_mode_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModeId {
    Sleep = 0,
    Idle = 1,
    ColorSelect = 2,
    BrightnessSelect = 3,
}

impl ModeId {
    /// Total number of modes — used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `ModeId`.  Panics on out-of-range in
    /// debug builds; returns `Sleep` in release (dark lamp, safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Sleep,
            1 => Self::Idle,
            2 => Self::ColorSelect,
            3 => Self::BrightnessSelect,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Sleep
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each mode transition.
pub type ModeActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type ModeUpdateFn = fn(&mut FsmContext) -> Option<ModeId>;

// ---------------------------------------------------------------------------
// Mode descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single mode.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct ModeDescriptor {
    pub id: ModeId,
    pub name: &'static str,
    pub on_enter: Option<ModeActionFn>,
    pub on_exit: Option<ModeActionFn>,
    pub on_update: ModeUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the mode table (array of [`ModeDescriptor`]) and is driven with a
/// mutable [`FsmContext`] that is threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `ModeId as usize`.
    table: [ModeDescriptor; ModeId::COUNT],
    /// Index of the currently active mode.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current mode was entered.
    mode_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given table, starting in `initial`.
    pub fn new(table: [ModeDescriptor; ModeId::COUNT], initial: ModeId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            mode_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting mode.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in mode: {}", self.table[self.current].name);
        ctx.lamp.mode_start_ms = ctx.touch.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current mode.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;
        ctx.ticks_in_mode = self.tick_count - self.mode_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current mode's identity.
    pub fn current_mode(&self) -> ModeId {
        ModeId::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current mode.
    pub fn ticks_in_current_mode(&self) -> u64 {
        self.tick_count - self.mode_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ModeId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current mode
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.mode_entry_tick = self.tick_count;
        ctx.ticks_in_mode = 0;
        ctx.lamp.mode_start_ms = ctx.touch.now_ms;

        // Enter new mode
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
