//! Integration tests: network task ↔ sync channel ↔ render task.
//!
//! The worker runs with a scripted transport; the service runs exactly as
//! in the firmware.  Together they cover the full propagation paths:
//! local change → outbound report, remote change → inbound adoption, and
//! every fetch-failure mode leaving state untouched.

use std::sync::Arc;

use halolamp::fsm::ModeId;
use halolamp::sync::{ColorToken, SyncWorker};
use halolamp::CommsError;

use crate::mock_ports::{Rig, ScriptedTransport};

fn remote_token(color: u8, nonce: u16) -> ColorToken {
    ColorToken::new(color, nonce, "HL-OTHER1").unwrap()
}

// ── Scenario: inbound adoption ────────────────────────────────

#[test]
fn idle_lamp_adopts_a_remote_token_exactly_once() {
    let mut rig = Rig::new();
    rig.tick_for(500);

    // The network task publishes a well-formed remote token.
    rig.channel.set_inbound(remote_token(4, 1234));
    rig.tick();

    assert_eq!(rig.service.color_index(), 4);
    assert_eq!(rig.sink.adopted_count(), 1, "receipt plays exactly once");

    // Further ticks with the same inbound token change nothing.
    rig.tick_for(1000);
    assert_eq!(rig.sink.adopted_count(), 1);
    assert_eq!(rig.service.mode(), ModeId::Idle);
}

#[test]
fn same_color_new_nonce_is_a_fresh_update() {
    let mut rig = Rig::new();
    rig.channel.set_inbound(remote_token(4, 1111));
    rig.tick();
    assert_eq!(rig.sink.adopted_count(), 1);

    // Another lamp re-claimed the same color: different nonce, same index.
    rig.channel.set_inbound(remote_token(4, 2222));
    rig.tick();
    assert_eq!(rig.sink.adopted_count(), 2);
    assert_eq!(rig.service.color_index(), 4);
}

#[test]
fn out_of_range_remote_index_is_reduced_into_the_palette() {
    let mut rig = Rig::new();
    let n_colors = rig.config().n_colors;
    rig.channel.set_inbound(remote_token(37, 1234));
    rig.tick();
    assert_eq!(rig.service.color_index(), 37 % n_colors);
}

// ── Scenario: local gesture wins over inbound ─────────────────

#[test]
fn inbound_is_ignored_while_a_gesture_is_in_progress() {
    let mut rig = Rig::new();

    rig.tap(); // → ColorSelect
    rig.channel.set_inbound(remote_token(4, 1234));
    rig.tick_for(500);
    assert_eq!(rig.service.mode(), ModeId::ColorSelect);
    assert_eq!(rig.sink.adopted_count(), 0, "non-Idle modes ignore inbound");

    // Settle back to Idle with no local change: adoption then happens.
    rig.tick_for(rig.config().color_change_wait_ms + 200);
    assert_eq!(rig.service.mode(), ModeId::Idle);
    assert_eq!(rig.sink.adopted_count(), 1);
}

#[test]
fn inbound_is_ignored_while_an_outbound_is_pending() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap();
    rig.tap(); // color 1
    rig.tick_for(wait_ms + 200); // commit → outbound pending
    assert!(rig.channel.has_pending_outbound());

    rig.channel.set_inbound(remote_token(4, 1234));
    rig.tick_for(500);
    assert_eq!(
        rig.sink.adopted_count(),
        0,
        "the in-progress local change wins until it has been sent"
    );
    assert_eq!(rig.service.color_index(), 1);

    // The network task drains the outbound; adoption resumes.
    let ticket = rig.channel.pending_outbound().unwrap();
    rig.channel.ack_outbound(&ticket);
    rig.tick();
    assert_eq!(rig.sink.adopted_count(), 1);
    assert_eq!(rig.service.color_index(), 4);
}

// ── Scenario: full local→network→local round trip ─────────────

#[test]
fn committed_color_travels_out_through_the_worker() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap();
    rig.tap(); // color 1
    rig.tick_for(wait_ms + 200);
    assert!(rig.channel.has_pending_outbound());

    let reported = rig.channel.pending_outbound().unwrap().token().encode();
    let mut worker = SyncWorker::new(
        ScriptedTransport::new(vec![ScriptedTransport::ok_body(reported.as_str())]),
        rig.channel.clone(),
        crate::mock_ports::DEVICE_ID,
        "https://sync.example/exec",
    );
    worker.poll_once();

    assert!(!rig.channel.has_pending_outbound(), "drained after success");
    // The echoed token equals what this lamp already holds, so no
    // self-adoption happens.
    rig.tick_for(500);
    assert_eq!(rig.sink.adopted_count(), 0);
    assert_eq!(rig.service.color_index(), 1);
}

// ── Scenario: HTTP 500 and malformed bodies ───────────────────

#[test]
fn http_500_leaves_everything_untouched_and_retries_identically() {
    let mut rig = Rig::new();
    let wait_ms = rig.config().color_change_wait_ms;

    rig.tap();
    rig.tap();
    rig.tick_for(wait_ms + 200);
    let before = rig.channel.pending_outbound().unwrap().token().clone();

    let mut worker = SyncWorker::new(
        ScriptedTransport::new(vec![
            Err(CommsError::HttpStatus(500)),
            Err(CommsError::HttpStatus(500)),
        ]),
        rig.channel.clone(),
        crate::mock_ports::DEVICE_ID,
        "https://sync.example/exec",
    );
    worker.poll_once();
    worker.poll_once();

    assert!(rig.channel.has_pending_outbound());
    assert_eq!(rig.channel.pending_outbound().unwrap().token(), &before);
    assert_eq!(worker.transport().requests[0], worker.transport().requests[1]);

    rig.tick_for(500);
    assert_eq!(rig.service.color_index(), 1, "render state untouched by failures");
}

#[test]
fn malformed_inbound_tokens_never_reach_the_lamp() {
    let mut rig = Rig::new();

    let mut worker = SyncWorker::new(
        ScriptedTransport::new(vec![
            Ok("{\"fc\": \"7.12345.HL-OTHER1\"}".to_owned()), // nonce too long
            Ok("{\"fc\": \"7.1234\"}".to_owned()),            // missing field
            Ok("{\"wrong\": 1}".to_owned()),                  // no fc field
            Ok(String::new()),                                // empty body
        ]),
        rig.channel.clone(),
        crate::mock_ports::DEVICE_ID,
        "https://sync.example/exec",
    );
    for _ in 0..4 {
        worker.poll_once();
        rig.tick();
    }

    assert_eq!(rig.sink.adopted_count(), 0);
    assert_eq!(rig.service.color_index(), 0);
    assert!(rig.channel.poll_inbound().is_none());
}
