//! Port traits — the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LampService (domain)
//! ```
//!
//! Driven adapters (the pixel strip, event sinks) implement these traits.
//! The [`LampService`](super::service::LampService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::animation::PixelFrame;

// ───────────────────────────────────────────────────────────────
// Pixel port (driven adapter: domain → LED strip)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain hands over complete frames; the adapter
/// serialises and latches them.  There is no read-back — the strip is a
/// pure output.
pub trait PixelPort {
    /// Present a full frame.
    fn show(&mut self, frame: &PixelFrame);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, a
/// future telemetry uplink, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
