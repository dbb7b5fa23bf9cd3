//! One-shot hardware peripheral initialization.
//!
//! Configures the capacitive touch peripheral and the RMT channel that
//! drives the WS2812 data line, using raw ESP-IDF sys calls.  Called once
//! from `main()` before the render loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    TouchInitFailed(i32),
    RmtInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TouchInitFailed(rc) => write!(f, "touch pad init failed (rc={})", rc),
            Self::RmtInitFailed(rc) => write!(f, "RMT channel init failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the render loop; single-threaded.
    unsafe {
        init_touch()?;
        init_rmt()?;
    }
    log::info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── Touch pad ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_touch() -> Result<(), HwInitError> {
    let rc = unsafe { touch_pad_init() };
    if rc != ESP_OK {
        return Err(HwInitError::TouchInitFailed(rc));
    }
    // Threshold 0: the driver layer applies its own software threshold.
    let rc = unsafe { touch_pad_config(pins::TOUCH_PAD as touch_pad_t, 0) };
    if rc != ESP_OK {
        return Err(HwInitError::TouchInitFailed(rc));
    }
    Ok(())
}

/// Raw touch reading from the given pad.  Lower values mean touched.
#[cfg(target_os = "espidf")]
pub fn touch_read(pad: u32) -> u16 {
    let mut raw: u16 = 0;
    // SAFETY: pad is a valid touch_pad_t; the peripheral was configured
    // in init_touch().
    let rc = unsafe { touch_pad_read(pad as touch_pad_t, &mut raw) };
    if rc != ESP_OK {
        // A failed read counts as untouched; out-of-range values are
        // accepted as-is by the driver layer above.
        return u16::MAX;
    }
    raw
}

// ── RMT (WS2812 data line) ────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_rmt() -> Result<(), HwInitError> {
    let config = rmt_config_t {
        rmt_mode: rmt_mode_t_RMT_MODE_TX,
        channel: pins::LED_RMT_CHANNEL as rmt_channel_t,
        gpio_num: pins::LED_DATA_GPIO,
        clk_div: 2, // 80 MHz / 2 = 40 MHz -> 25 ns per RMT tick
        mem_block_num: 1,
        flags: 0,
        __bindgen_anon_1: rmt_config_t__bindgen_ty_1 {
            tx_config: rmt_tx_config_t {
                carrier_freq_hz: 0,
                carrier_level: rmt_carrier_level_t_RMT_CARRIER_LEVEL_LOW,
                idle_level: rmt_idle_level_t_RMT_IDLE_LEVEL_LOW,
                carrier_duty_percent: 0,
                loop_count: 0,
                carrier_en: false,
                loop_en: false,
                idle_output_en: true,
            },
        },
    };
    let rc = unsafe { rmt_config(&config) };
    if rc != ESP_OK {
        return Err(HwInitError::RmtInitFailed(rc));
    }
    let rc = unsafe { rmt_driver_install(pins::LED_RMT_CHANNEL as rmt_channel_t, 0, 0) };
    if rc != ESP_OK {
        return Err(HwInitError::RmtInitFailed(rc));
    }
    Ok(())
}
