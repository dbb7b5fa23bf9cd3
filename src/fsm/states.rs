//! Concrete mode handler functions and table builder.
//!
//! Each mode is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  SLEEP ──[click]──▶ IDLE ──[click]──▶ COLOR SELECT ──[click]──┐
//!    ▲                 ▲                   ▲     │ (advance color)
//!    │                 │                   └─────┘
//!    │                 ├──[release, settle]───────┘
//!    │                 │
//!    │                 └──[release]── BRIGHTNESS SELECT
//!    │                                     ▲
//!    │                  [fresh hold] ──────┘
//!    └──[hold kept past the wait]── (from BRIGHTNESS SELECT)
//! ```
//!
//! A Hold only promotes ColorSelect to BrightnessSelect when the press it
//! belongs to started *after* the mode was entered: the most recent lift
//! must postdate mode entry.  Otherwise the long physical press that
//! clicked the lamp into ColorSelect would immediately qualify.

use log::{info, warn};

use crate::animation::OneShot;
use crate::drivers::touch::TouchEvent;
use crate::sync::ColorToken;

use super::context::FsmContext;
use super::{ModeDescriptor, ModeId};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_mode_table() -> [ModeDescriptor; ModeId::COUNT] {
    [
        // Index 0 — Sleep
        ModeDescriptor {
            id: ModeId::Sleep,
            name: "Sleep",
            on_enter: Some(sleep_enter),
            on_exit: Some(sleep_exit),
            on_update: sleep_update,
        },
        // Index 1 — Idle
        ModeDescriptor {
            id: ModeId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 2 — ColorSelect
        ModeDescriptor {
            id: ModeId::ColorSelect,
            name: "ColorSelect",
            on_enter: Some(color_select_enter),
            on_exit: None,
            on_update: color_select_update,
        },
        // Index 3 — BrightnessSelect
        ModeDescriptor {
            id: ModeId::BrightnessSelect,
            name: "BrightnessSelect",
            on_enter: Some(brightness_select_enter),
            on_exit: None,
            on_update: brightness_select_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEP — display dark, waiting for a wake tap
// ═══════════════════════════════════════════════════════════════════════════

fn sleep_enter(ctx: &mut FsmContext) {
    ctx.lamp.base_brightness = 0;
    ctx.lamp.current_brightness = 0;
    // Immediate blackout, not an animation.
    ctx.commands.blank = true;
    info!("SLEEP: display blanked");
}

fn sleep_exit(ctx: &mut FsmContext) {
    // Waking restores the stock brightness, not whatever the user had
    // dimmed to before sleeping.
    ctx.lamp.base_brightness = ctx.config.default_brightness;
    ctx.lamp.current_brightness = ctx.config.default_brightness;
    info!("SLEEP: waking at default brightness");
}

fn sleep_update(ctx: &mut FsmContext) -> Option<ModeId> {
    if ctx.touch.event == TouchEvent::Click {
        return Some(ModeId::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — breathing at the settled color
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.lamp.current_brightness = ctx.lamp.base_brightness;
    ctx.commands.fill = Some(ctx.lamp.color_index);
}

fn idle_update(ctx: &mut FsmContext) -> Option<ModeId> {
    if ctx.touch.event == TouchEvent::Click {
        return Some(ModeId::ColorSelect);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COLOR SELECT — taps cycle the palette; settling commits
// ═══════════════════════════════════════════════════════════════════════════

fn color_select_enter(ctx: &mut FsmContext) {
    ctx.lamp.current_brightness = ctx.lamp.base_brightness;
    ctx.lamp.color_changed_in_session = false;
}

fn color_select_update(ctx: &mut FsmContext) -> Option<ModeId> {
    match ctx.touch.event {
        // Self-loop: advance the palette.  The mode anchor is untouched
        // (hold timing since entry is preserved); the hold-promotion
        // reference is the sensor's push timestamp, which this very Click
        // just refreshed.
        TouchEvent::Click => {
            let from = ctx.lamp.color_index;
            ctx.lamp.color_index = (from + 1) % ctx.config.n_colors;
            ctx.lamp.color_changed_in_session = true;
            ctx.commands.one_shot = Some(OneShot::Wipe {
                from,
                to: ctx.lamp.color_index,
            });
            None
        }

        // Promote to brightness selection only for a press that started
        // after mode entry (see module docs).
        TouchEvent::Hold if ctx.touch.last_lift_ms >= ctx.lamp.mode_start_ms => {
            Some(ModeId::BrightnessSelect)
        }

        // The user has settled: left untouched past the commit delay.
        TouchEvent::Unhold
            if ctx.touch.now_ms.wrapping_sub(ctx.touch.last_lift_ms)
                > ctx.config.color_change_wait_ms =>
        {
            if ctx.lamp.color_changed_in_session {
                let nonce = ColorToken::nonce_from_ms(ctx.touch.now_ms);
                match ColorToken::new(ctx.lamp.color_index, nonce, &ctx.device_id) {
                    Ok(token) => {
                        info!("color committed: {}", token);
                        ctx.commands.submit = Some(token);
                    }
                    Err(e) => warn!("color commit dropped: {e}"),
                }
                ctx.commands.one_shot = Some(OneShot::Converge {
                    target: ctx.lamp.color_index,
                });
            } else {
                // Nothing changed: replay the pre-change hue, no network
                // effect.
                ctx.commands.fill = Some(ctx.lamp.color_index);
            }
            Some(ModeId::Idle)
        }

        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  BRIGHTNESS SELECT — breathing sweep; release commits, holding on sleeps
// ═══════════════════════════════════════════════════════════════════════════

fn brightness_select_enter(ctx: &mut FsmContext) {
    // The breathing sweep starts from full scale.
    ctx.lamp.base_brightness = u8::MAX;
}

fn brightness_select_update(ctx: &mut FsmContext) -> Option<ModeId> {
    match ctx.touch.event {
        // Release commits whatever level the sweep had reached.
        TouchEvent::Unclick => {
            ctx.lamp.base_brightness = ctx.lamp.current_brightness;
            info!(
                "brightness committed: {}",
                ctx.lamp.base_brightness
            );
            Some(ModeId::Idle)
        }

        // Keeping the hold past the wait puts the lamp to sleep.
        TouchEvent::Hold if ctx.ms_in_mode() > ctx.config.brightness_change_wait_ms => {
            Some(ModeId::Sleep)
        }

        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LampConfig;
    use crate::fsm::Fsm;

    fn rig() -> (Fsm, FsmContext) {
        let mut fsm = Fsm::new(build_mode_table(), ModeId::Idle);
        let mut ctx = FsmContext::new(LampConfig::default(), "HL-TEST01");
        fsm.start(&mut ctx);
        (fsm, ctx)
    }

    /// Feed one classified event at the given time, mirroring how the
    /// service stamps the snapshot from the touch sensor.
    fn feed(fsm: &mut Fsm, ctx: &mut FsmContext, event: TouchEvent, now_ms: u32) {
        ctx.touch.event = event;
        ctx.touch.now_ms = now_ms;
        match event {
            TouchEvent::Click => ctx.touch.last_push_ms = now_ms,
            TouchEvent::Unclick => ctx.touch.last_lift_ms = now_ms,
            _ => {}
        }
        fsm.tick(ctx);
    }

    #[test]
    fn click_in_idle_enters_color_select() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        assert_eq!(fsm.current_mode(), ModeId::ColorSelect);
        assert_eq!(ctx.lamp.current_brightness, ctx.lamp.base_brightness);
        assert!(!ctx.lamp.color_changed_in_session);
    }

    #[test]
    fn click_in_color_select_advances_color_and_stays() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100); // → ColorSelect
        let start = ctx.lamp.mode_start_ms;

        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 400);
        assert_eq!(fsm.current_mode(), ModeId::ColorSelect);
        assert_eq!(ctx.lamp.color_index, 1);
        assert!(ctx.lamp.color_changed_in_session);
        assert_eq!(ctx.lamp.mode_start_ms, start, "self-loop keeps the anchor");
        assert!(matches!(
            ctx.commands.take().one_shot,
            Some(OneShot::Wipe { from: 0, to: 1 })
        ));
    }

    #[test]
    fn color_index_wraps_at_palette_end() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        ctx.lamp.color_index = ctx.config.n_colors - 1;
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 200);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 300);
        assert_eq!(ctx.lamp.color_index, 0);
    }

    #[test]
    fn spanning_hold_does_not_promote() {
        let (mut fsm, mut ctx) = rig();
        // One long physical press: Click enters ColorSelect, the hold
        // matures without any lift after entry.
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        for now in [900, 1000, 1100] {
            feed(&mut fsm, &mut ctx, TouchEvent::Hold, now);
            assert_eq!(fsm.current_mode(), ModeId::ColorSelect);
        }
    }

    #[test]
    fn fresh_hold_promotes_to_brightness_select() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100); // → ColorSelect
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300); // lift after entry
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 400); // fresh press
        feed(&mut fsm, &mut ctx, TouchEvent::Hold, 1200); // matured
        assert_eq!(fsm.current_mode(), ModeId::BrightnessSelect);
        assert_eq!(ctx.lamp.base_brightness, u8::MAX);
    }

    #[test]
    fn settle_without_change_returns_to_idle_quietly() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        let settle = 300 + ctx.config.color_change_wait_ms + 1;
        feed(&mut fsm, &mut ctx, TouchEvent::Unhold, settle);

        assert_eq!(fsm.current_mode(), ModeId::Idle);
        let cmds = ctx.commands.take();
        assert!(cmds.submit.is_none(), "unchanged color must not hit the network");
        assert!(cmds.one_shot.is_none());
        assert_eq!(cmds.fill, Some(0));
    }

    #[test]
    fn settle_after_change_commits_exactly_one_token() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 400); // advance → 1
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 600);
        ctx.commands.take();

        let settle = 600 + ctx.config.color_change_wait_ms + 1;
        feed(&mut fsm, &mut ctx, TouchEvent::Unhold, settle);

        assert_eq!(fsm.current_mode(), ModeId::Idle);
        let cmds = ctx.commands.take();
        let token = cmds.submit.expect("a changed color must queue a token");
        assert_eq!(token.color_index, 1);
        assert_eq!(token.device_id.as_str(), "HL-TEST01");
        assert!(matches!(cmds.one_shot, Some(OneShot::Converge { target: 1 })));
    }

    #[test]
    fn unhold_before_the_wait_stays_in_color_select() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        let early = 300 + ctx.config.color_change_wait_ms; // not strictly past
        feed(&mut fsm, &mut ctx, TouchEvent::Unhold, early);
        assert_eq!(fsm.current_mode(), ModeId::ColorSelect);
    }

    #[test]
    fn release_in_brightness_select_commits_current_level() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 400);
        feed(&mut fsm, &mut ctx, TouchEvent::Hold, 1200); // → BrightnessSelect

        // The breathing sweep has reached some level.
        ctx.lamp.current_brightness = 77;
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 1500);
        assert_eq!(fsm.current_mode(), ModeId::Idle);
        assert_eq!(ctx.lamp.base_brightness, 77);
    }

    #[test]
    fn holding_through_brightness_select_sleeps() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 400);
        feed(&mut fsm, &mut ctx, TouchEvent::Hold, 1200); // → BrightnessSelect
        let entry = ctx.lamp.mode_start_ms;

        let past = entry + ctx.config.brightness_change_wait_ms + 1;
        feed(&mut fsm, &mut ctx, TouchEvent::Hold, past);
        assert_eq!(fsm.current_mode(), ModeId::Sleep);
        assert_eq!(ctx.lamp.base_brightness, 0);
        assert_eq!(ctx.lamp.current_brightness, 0);
        assert!(ctx.commands.take().blank, "sleep blanks immediately");
    }

    #[test]
    fn click_in_sleep_wakes_at_default_brightness() {
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 400);
        feed(&mut fsm, &mut ctx, TouchEvent::Hold, 1200);
        let sleep_at = ctx.lamp.mode_start_ms + ctx.config.brightness_change_wait_ms + 1;
        feed(&mut fsm, &mut ctx, TouchEvent::Hold, sleep_at); // → Sleep
        ctx.commands.take();

        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, sleep_at + 100);
        assert_eq!(fsm.current_mode(), ModeId::Sleep, "release does not wake");

        feed(&mut fsm, &mut ctx, TouchEvent::Click, sleep_at + 500);
        assert_eq!(fsm.current_mode(), ModeId::Idle);
        assert_eq!(ctx.lamp.base_brightness, ctx.config.default_brightness);
        assert_eq!(ctx.lamp.current_brightness, ctx.config.default_brightness);
        assert_eq!(ctx.commands.take().fill, Some(ctx.lamp.color_index));
    }

    #[test]
    fn unclick_is_a_no_op_everywhere_but_brightness_select() {
        // Idle
        let (mut fsm, mut ctx) = rig();
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 100);
        assert_eq!(fsm.current_mode(), ModeId::Idle);

        // ColorSelect
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 200);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 300);
        assert_eq!(fsm.current_mode(), ModeId::ColorSelect);
    }

    #[test]
    fn color_changed_iff_click_happened_in_session() {
        let (mut fsm, mut ctx) = rig();
        // Session 1: no click inside ColorSelect.
        feed(&mut fsm, &mut ctx, TouchEvent::Click, 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, 200);
        let settle = 200 + ctx.config.color_change_wait_ms + 1;
        feed(&mut fsm, &mut ctx, TouchEvent::Unhold, settle);
        assert!(!ctx.lamp.color_changed_in_session);

        // Session 2: one click inside.
        let base = settle + 100;
        feed(&mut fsm, &mut ctx, TouchEvent::Click, base);
        feed(&mut fsm, &mut ctx, TouchEvent::Unclick, base + 100);
        feed(&mut fsm, &mut ctx, TouchEvent::Click, base + 200);
        assert!(ctx.lamp.color_changed_in_session);
    }
}
