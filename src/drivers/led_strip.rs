//! WS2812B pixel ring driver.
//!
//! The render layer hands over a complete [`PixelFrame`]; this driver
//! serialises it to the WS2812 one-wire protocol over RMT and latches it.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: converts each GRB bit to an RMT pulse pair and writes the
//! item buffer through the channel configured by `hw_init`.
//! On host/test: keeps the last presented frame in memory for inspection.

use crate::animation::PixelFrame;
use crate::app::ports::PixelPort;
use crate::pins;

// WS2812 bit timings in 25 ns RMT ticks (clk_div = 2 at 80 MHz):
// 0-bit: 350 ns high, 900 ns low; 1-bit: 900 ns high, 350 ns low.
#[cfg(target_os = "espidf")]
const T0H_TICKS: u32 = 14;
#[cfg(target_os = "espidf")]
const T0L_TICKS: u32 = 36;
#[cfg(target_os = "espidf")]
const T1H_TICKS: u32 = 36;
#[cfg(target_os = "espidf")]
const T1L_TICKS: u32 = 14;

pub struct LedStrip {
    current: PixelFrame,
}

impl LedStrip {
    pub fn new() -> Self {
        Self {
            current: [(0, 0, 0); pins::N_PIXELS],
        }
    }

    /// Serialise and latch a full frame.
    pub fn write(&mut self, frame: &PixelFrame) {
        self.present(frame);
        self.current = *frame;
    }

    /// All pixels off, latched immediately.
    pub fn off(&mut self) {
        self.write(&[(0, 0, 0); pins::N_PIXELS]);
    }

    /// The most recently latched frame.
    pub fn current_frame(&self) -> &PixelFrame {
        &self.current
    }

    #[cfg(target_os = "espidf")]
    fn present(&mut self, frame: &PixelFrame) {
        use esp_idf_svc::sys::*;

        // 24 bits per pixel, one RMT item per bit.
        let mut items: Vec<rmt_item32_t> = Vec::with_capacity(pins::N_PIXELS * 24);
        for &(r, g, b) in frame.iter() {
            // WS2812 byte order is GRB, MSB first.
            for byte in [g, r, b] {
                for bit in (0..8).rev() {
                    let one = (byte >> bit) & 1 == 1;
                    let (high, low) = if one {
                        (T1H_TICKS, T1L_TICKS)
                    } else {
                        (T0H_TICKS, T0L_TICKS)
                    };
                    let mut item = rmt_item32_t::default();
                    item.__bindgen_anon_1.__bindgen_anon_1.set_duration0(high);
                    item.__bindgen_anon_1.__bindgen_anon_1.set_level0(1);
                    item.__bindgen_anon_1.__bindgen_anon_1.set_duration1(low);
                    item.__bindgen_anon_1.__bindgen_anon_1.set_level1(0);
                    items.push(item);
                }
            }
        }

        // SAFETY: channel was installed by hw_init::init_peripherals();
        // wait_tx_done=true so the item buffer outlives the transfer.
        unsafe {
            rmt_write_items(
                pins::LED_RMT_CHANNEL as rmt_channel_t,
                items.as_ptr(),
                items.len() as i32,
                true,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn present(&mut self, _frame: &PixelFrame) {}
}

impl PixelPort for LedStrip {
    fn show(&mut self, frame: &PixelFrame) {
        self.write(frame);
    }
}
