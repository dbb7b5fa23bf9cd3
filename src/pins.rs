//! GPIO / peripheral assignments for the Halo Lamp main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Touch sensor
// ---------------------------------------------------------------------------

/// Capacitive touch sensor — ESP32 touch pad 0 (GPIO 4).
pub const TOUCH_PAD: u32 = 0;
/// GPIO backing touch pad 0, for documentation and schematic cross-reference.
pub const TOUCH_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// LED ring (WS2812B)
// ---------------------------------------------------------------------------

/// Data line for the WS2812B pixel ring.
pub const LED_DATA_GPIO: i32 = 13;
/// RMT channel driving the pixel data line.
pub const LED_RMT_CHANNEL: u32 = 0;
/// Number of pixels on the ring.
pub const N_PIXELS: usize = 24;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 1;
pub const UART_RX_GPIO: i32 = 3;
