//! System configuration parameters
//!
//! All tunable parameters for the Halo Lamp firmware.  Defaults are the
//! production constants; the WiFi credentials and coordination-service URL
//! are filled in at provisioning time.

use serde::{Deserialize, Serialize};

/// Core lamp configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LampConfig {
    // --- Palette ---
    /// Number of selectable colors, evenly spaced on the hue wheel.
    pub n_colors: u8,
    /// Brightness restored when waking from Sleep (0-255).
    pub default_brightness: u8,

    // --- Touch ---
    /// Raw readings below this value count as a positive touch.
    pub touch_threshold: u16,
    /// Continuous touch duration (ms) before a Hold is reported.
    pub hold_threshold_ms: u32,

    // --- Mode timing ---
    /// Release-to-commit delay in ColorSelect (ms).
    pub color_change_wait_ms: u32,
    /// Hold duration in BrightnessSelect before dropping to Sleep (ms).
    pub brightness_change_wait_ms: u32,

    // --- Animation ---
    /// Idle breathing period (ms).
    pub idle_breath_period_ms: u32,
    /// Idle breathing floor as a fraction of base brightness.
    pub idle_breath_floor: f32,
    /// BrightnessSelect breathing period (ms).
    pub select_breath_period_ms: u32,
    /// Time per chase-pixel step in the select modes (ms).
    pub chase_step_ms: u32,

    // --- Timing ---
    /// Render loop tick interval (ms).
    pub render_tick_ms: u32,
    /// Network sync poll period (ms).
    pub sync_period_ms: u32,

    // --- Network ---
    /// Coordination service endpoint.
    pub service_url: String,
    pub wifi_ssid: String,
    pub wifi_password: String,
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            // Palette
            n_colors: 10,
            default_brightness: 191,

            // Touch
            touch_threshold: 35,
            hold_threshold_ms: 700,

            // Mode timing
            color_change_wait_ms: 3000,
            brightness_change_wait_ms: 5000,

            // Animation
            idle_breath_period_ms: 6000,
            idle_breath_floor: 0.25,
            select_breath_period_ms: 2000,
            chase_step_ms: 120,

            // Timing
            render_tick_ms: 50,    // ~20 Hz
            sync_period_ms: 5000,  // 0.2 Hz

            // Network
            service_url: String::new(),
            wifi_ssid: String::new(),
            wifi_password: String::new(),
        }
    }
}
