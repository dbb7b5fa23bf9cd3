//! Cross-core color synchronization.
//!
//! The render core and the network core run asynchronously and only ever
//! meet in this module:
//!
//! ```text
//! render task ──submit_outbound──▶ ┌─────────────┐ ──pending/ack──▶ network task
//!             ◀──poll_inbound──── │ SyncChannel  │ ◀──set_inbound──   (HTTP GET,
//!                                 └─────────────┘                    5 s period)
//! ```
//!
//! [`token`] defines the immutable [`ColorToken`](token::ColorToken) value
//! object and its wire codec, [`channel`] the flag-pair handshake between
//! the two tasks, and [`remote`] the periodic round trip against the
//! coordination service.

pub mod channel;
pub mod remote;
pub mod token;

pub use channel::SyncChannel;
pub use remote::{SyncTransport, SyncWorker};
pub use token::ColorToken;
