//! Integration tests: touch gestures → mode machine → pixels/sync.
//!
//! These walk the full service the way the render loop does, with the
//! touch level injected at the driver's simulation hook — nothing below
//! `LampService` is mocked except the pixel strip.

use halolamp::app::events::AppEvent;
use halolamp::fsm::ModeId;

use crate::mock_ports::Rig;

// ── Scenario: boot untouched, sit idle ────────────────────────

#[test]
fn idle_lamp_breathes_and_never_touches_the_network() {
    let mut rig = Rig::new();

    // Ten minutes of untouched uptime.
    rig.tick_for(10 * 60 * 1000);

    assert_eq!(rig.service.mode(), ModeId::Idle);
    assert!(!rig.channel.has_pending_outbound(), "no send may ever queue");
    assert_eq!(rig.sink.committed_count(), 0);

    // Brightness oscillates: the recent frames are not all equal.
    let recent: Vec<_> = rig.pixels.frames.iter().rev().take(60).collect();
    assert!(
        recent.windows(2).any(|w| w[0] != w[1]),
        "idle breathing must vary the output"
    );
}

// ── Scenario: tap into ColorSelect, tap to advance ────────────

#[test]
fn tap_enters_color_select_and_second_tap_advances() {
    let mut rig = Rig::new();

    rig.tap();
    assert_eq!(rig.service.mode(), ModeId::ColorSelect);
    assert_eq!(
        rig.service.current_brightness(),
        rig.service.base_brightness()
    );
    assert!(!rig.service.color_changed_in_session());

    let n_colors = rig.config().n_colors;
    rig.tap();
    assert_eq!(rig.service.mode(), ModeId::ColorSelect);
    assert_eq!(rig.service.color_index(), 1 % n_colors);
    assert!(rig.service.color_changed_in_session());
}

// ── Scenario: fresh hold promotes to BrightnessSelect ─────────

#[test]
fn fresh_hold_in_color_select_reaches_brightness_select() {
    let mut rig = Rig::new();
    let hold_ms = rig.config().hold_threshold_ms;

    rig.tap(); // → ColorSelect (and the lift after entry)
    rig.hold_for(hold_ms + 200);

    assert_eq!(rig.service.mode(), ModeId::BrightnessSelect);
    assert_eq!(rig.service.base_brightness(), u8::MAX);
}

#[test]
fn hold_spanning_entry_does_not_promote() {
    let mut rig = Rig::new();
    let hold_ms = rig.config().hold_threshold_ms;

    // One continuous press: enters ColorSelect and keeps holding well
    // past the threshold without ever lifting.
    rig.hold_for(hold_ms * 3);
    assert_eq!(rig.service.mode(), ModeId::ColorSelect);
}

// ── Scenario: settle commits exactly one token ────────────────

#[test]
fn settling_a_changed_color_queues_exactly_one_token() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap(); // → ColorSelect
    rig.tap(); // advance to 1
    rig.tick_for(wait_ms + 200);

    assert_eq!(rig.service.mode(), ModeId::Idle);
    assert_eq!(rig.sink.committed_count(), 1);
    assert!(rig.channel.has_pending_outbound());

    let ticket = rig.channel.pending_outbound().expect("one token queued");
    assert_eq!(ticket.token().color_index, 1);
    assert_eq!(ticket.token().device_id.as_str(), crate::mock_ports::DEVICE_ID);
}

#[test]
fn settling_without_a_change_stays_off_the_network() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap(); // → ColorSelect, no color change
    rig.tick_for(wait_ms + 200);

    assert_eq!(rig.service.mode(), ModeId::Idle);
    assert_eq!(rig.service.color_index(), 0);
    assert!(!rig.channel.has_pending_outbound());
    assert_eq!(rig.sink.committed_count(), 0);
}

#[test]
fn two_settles_before_a_drain_leave_only_the_latest_token() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap();
    rig.tap(); // color 1
    rig.tick_for(wait_ms + 200); // commit #1

    rig.tap();
    rig.tap(); // color 2
    rig.tick_for(wait_ms + 200); // commit #2, overwrites the pending token

    assert_eq!(rig.sink.committed_count(), 2);
    let ticket = rig.channel.pending_outbound().expect("still pending");
    assert_eq!(ticket.token().color_index, 2, "only the latest color matters");
    rig.channel.ack_outbound(&ticket);
    assert!(!rig.channel.has_pending_outbound(), "exactly one send owed");
}

// ── Scenario: brightness commit and sleep ─────────────────────

#[test]
fn releasing_in_brightness_select_commits_the_live_level() {
    let mut rig = Rig::new();
    let hold_ms = rig.config().hold_threshold_ms;

    rig.tap();
    rig.hold_for(hold_ms + 200); // → BrightnessSelect
    assert_eq!(rig.service.mode(), ModeId::BrightnessSelect);

    // Let the sweep run away from full scale, then release.
    rig.tick_for(rig.config().select_breath_period_ms / 2);
    let live = rig.service.current_brightness();
    rig.release();
    rig.tick();

    assert_eq!(rig.service.mode(), ModeId::Idle);
    let committed = rig.service.base_brightness();
    assert!(
        committed != u8::MAX,
        "commit must capture the swept level, not the entry value"
    );
    // The committed level is whatever the user saw most recently.
    assert!(committed.abs_diff(live) < 64);
}

#[test]
fn holding_through_brightness_select_sleeps_and_tap_wakes() {
    let mut rig = Rig::new();
    let hold_ms = rig.config().hold_threshold_ms;
    let sleep_wait = rig.config().brightness_change_wait_ms;

    rig.tap();
    rig.hold_for(hold_ms + 200); // → BrightnessSelect
    rig.tick_for(sleep_wait + 200); // still holding

    assert_eq!(rig.service.mode(), ModeId::Sleep);
    assert_eq!(rig.service.base_brightness(), 0);
    assert!(
        rig.pixels.last_frame().iter().all(|&p| p == (0, 0, 0)),
        "sleep blanks the strip"
    );

    rig.release();
    rig.tick_for(500);
    rig.tap();
    assert_eq!(rig.service.mode(), ModeId::Idle);
    assert_eq!(
        rig.service.base_brightness(),
        rig.config().default_brightness,
        "waking restores the default brightness"
    );
}

// ── Mode-change event stream ──────────────────────────────────

#[test]
fn mode_changes_are_reported_in_order() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap();
    rig.tick_for(wait_ms + 200);

    let changes: Vec<(ModeId, ModeId)> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ModeChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (ModeId::Idle, ModeId::ColorSelect),
            (ModeId::ColorSelect, ModeId::Idle),
        ]
    );
}
