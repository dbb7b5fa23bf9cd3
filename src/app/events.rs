//! Outbound application events.
//!
//! The [`LampService`](super::service::LampService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them — log to serial, feed a debug
//! console, etc.

use crate::fsm::ModeId;
use crate::sync::ColorToken;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(ModeId),

    /// The mode machine transitioned.
    ModeChanged { from: ModeId, to: ModeId },

    /// A locally confirmed color change was handed to the sync channel.
    ColorCommitted(ColorToken),

    /// A remote token was adopted while idle.
    RemoteAdopted(ColorToken),
}
