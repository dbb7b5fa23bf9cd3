//! Dual-buffered handshake between the render task and the network task.
//!
//! Every field has exactly one writing side:
//!
//! | Field       | Writer       | Reader       |
//! |-------------|--------------|--------------|
//! | `requested` | render task  | network task |
//! | `fulfilled` | network task | render task  |
//! | `outbound`  | render task  | network task |
//! | `inbound`   | network task | render task  |
//!
//! Outbound-pending state is the *inequality* of the two toggle flags:
//! equal flags mean "no outbound work owed".  The submitter flips
//! `requested` only on the transition into pending; a second submission
//! before a drain just overwrites the payload (only the latest local color
//! matters).  The drainer acknowledges by storing the `requested` value it
//! observed when it picked the token up — and only if the slot still holds
//! that exact token, so a submission that lands while a round trip is in
//! flight stays pending and is retried next period.
//!
//! Flag flips happen inside the same critical section that guards the
//! token slot, so a token can never be observed half-written and the
//! flip/overwrite decision can never interleave with an acknowledgement.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::token::ColorToken;

type TokenSlot = Mutex<CriticalSectionRawMutex, RefCell<Option<ColorToken>>>;

pub struct SyncChannel {
    /// Toggled by the render task when a submission opens new work.
    requested: AtomicBool,
    /// Toggled (to match) by the network task when the work is done.
    fulfilled: AtomicBool,
    /// Latest locally confirmed color change, awaiting transmission.
    outbound: TokenSlot,
    /// Latest token received from the coordination service.
    inbound: TokenSlot,
}

/// Proof that the network task picked up a specific pending token.
/// Produced by [`SyncChannel::pending_outbound`], consumed by
/// [`SyncChannel::ack_outbound`] after a successful round trip.
#[derive(Debug, Clone)]
pub struct DrainTicket {
    requested: bool,
    token: ColorToken,
}

impl DrainTicket {
    /// The token this ticket covers.
    pub fn token(&self) -> &ColorToken {
        &self.token
    }
}

impl SyncChannel {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            fulfilled: AtomicBool::new(false),
            outbound: Mutex::new(RefCell::new(None)),
            inbound: Mutex::new(RefCell::new(None)),
        }
    }

    // ── Render-task side ──────────────────────────────────────

    /// Queue a locally confirmed color change for transmission.
    /// Fire-and-forget and idempotent: a second call before the network
    /// task drains overwrites the payload without opening a second unit
    /// of work.
    pub fn submit_outbound(&self, token: ColorToken) {
        self.outbound.lock(|slot| {
            *slot.borrow_mut() = Some(token);
            let requested = self.requested.load(Ordering::Relaxed);
            if requested == self.fulfilled.load(Ordering::Relaxed) {
                self.requested.store(!requested, Ordering::Release);
            }
        });
    }

    /// Latest token known from the coordination service, possibly
    /// unchanged since the last poll.  `None` until the first successful
    /// fetch.
    pub fn poll_inbound(&self) -> Option<ColorToken> {
        self.inbound.lock(|slot| slot.borrow().clone())
    }

    // ── Shared ────────────────────────────────────────────────

    /// Whether an unsent local change is owed to the network.
    pub fn has_pending_outbound(&self) -> bool {
        self.requested.load(Ordering::Acquire) != self.fulfilled.load(Ordering::Acquire)
    }

    // ── Network-task side ─────────────────────────────────────

    /// Pick up the pending token, if any, together with the ticket needed
    /// to acknowledge it once it has actually been transmitted.
    pub fn pending_outbound(&self) -> Option<DrainTicket> {
        self.outbound.lock(|slot| {
            let requested = self.requested.load(Ordering::Relaxed);
            if requested == self.fulfilled.load(Ordering::Relaxed) {
                return None;
            }
            slot.borrow()
                .clone()
                .map(|token| DrainTicket { requested, token })
        })
    }

    /// Mark the ticket's token as sent.  If the slot no longer holds that
    /// token, a newer submission raced the round trip and the pending
    /// state is deliberately left open.
    pub fn ack_outbound(&self, ticket: &DrainTicket) {
        self.outbound.lock(|slot| {
            if slot.borrow().as_ref() == Some(&ticket.token) {
                self.fulfilled.store(ticket.requested, Ordering::Release);
            }
        });
    }

    /// Publish a token received from the coordination service.  Only
    /// called after a fully successful round trip, so the slot always
    /// holds the last known-good value.
    pub fn set_inbound(&self, token: ColorToken) {
        self.inbound.lock(|slot| *slot.borrow_mut() = Some(token));
    }
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new()
    }
}
