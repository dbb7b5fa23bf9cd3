//! Debounced capacitive touch sensor driver.
//!
//! The ESP32 touch peripheral reports *lower* raw values when the pad is
//! touched, so a reading below the calibrated threshold is a positive.
//! Raw samples are noisy; each classification takes up to three consecutive
//! samples and uses the majority, with an early exit when the first two
//! agree — no fixed latency when the signal is stable.
//!
//! ## Event classification
//!
//! `classify()` is called once per render tick and reports the edge/level
//! for that tick:
//!
//! | Previous | Now      | Event   |
//! |----------|----------|---------|
//! | untouched| touched  | Click   |
//! | touched  | touched  | Hold (once past the hold threshold) or None |
//! | touched  | untouched| Unclick |
//! | untouched| untouched| Unhold (re-emitted every tick) |
//!
//! Invariant: `last_push > last_lift` exactly while the pad is held down.
//! The held bit is always derived from the two timestamps, never stored.

use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Simulated raw touch reading for host-target tests.
static SIM_TOUCH_RAW: AtomicU16 = AtomicU16::new(u16::MAX);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_touch_raw(raw: u16) {
    SIM_TOUCH_RAW.store(raw, Ordering::Relaxed);
}

/// Serialises tests that drive the simulated reading — the backing value
/// is process-global, so concurrent test threads would interleave.
#[cfg(not(target_os = "espidf"))]
pub fn sim_touch_guard() -> std::sync::MutexGuard<'static, ()> {
    static GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());
    GUARD.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Per-tick classification of the touch signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchEvent {
    /// No edge and no sustained condition to report.
    #[default]
    None,
    /// The pad just went from untouched to touched.
    Click,
    /// The pad just went from touched to untouched.
    Unclick,
    /// The pad has been continuously touched past the hold threshold.
    /// Re-emitted every tick while that remains true.
    Hold,
    /// The pad is continuously untouched.  Re-emitted every tick.
    Unhold,
}

/// Majority vote over up to three boolean samples.
///
/// The third sampler is only invoked when the first two disagree, so a
/// stable signal costs two reads and a single flipped sample can never
/// change the outcome.
pub fn majority_of_three(first: bool, second: bool, third: impl FnOnce() -> bool) -> bool {
    if first == second {
        second
    } else {
        third()
    }
}

pub struct TouchSensor {
    threshold: u16,
    /// ms timestamp of the last untouched→touched edge.
    last_push: u32,
    /// ms timestamp of the last touched→untouched edge.
    last_lift: u32,
    /// ms timestamp of the last positive sample.
    last_touch: u32,
    /// ms timestamp of the last negative sample.
    last_untouch: u32,
    /// Duration of the most recent completed hold (ms).
    last_hold_ms: u32,
    /// Duration of the most recent completed unhold (ms).
    last_unhold_ms: u32,
}

impl TouchSensor {
    /// All timestamps start at zero, so a device that boots untouched
    /// reports Unhold on the first call — never a spurious Click.
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            last_push: 0,
            last_lift: 0,
            last_touch: 0,
            last_untouch: 0,
            last_hold_ms: 0,
            last_unhold_ms: 0,
        }
    }

    /// One raw sample, thresholded.
    fn sample_once(&self) -> bool {
        self.read_raw() < self.threshold
    }

    /// Debounced level: majority of up to three consecutive samples.
    pub fn sample_debounced(&self) -> bool {
        majority_of_three(self.sample_once(), self.sample_once(), || self.sample_once())
    }

    /// Sample the pad and classify this tick's event.  Call once per
    /// render tick with the current monotonic time.
    pub fn classify(&mut self, now_ms: u32, hold_threshold_ms: u32) -> TouchEvent {
        let touched = self.sample_debounced();
        self.classify_level(touched, now_ms, hold_threshold_ms)
    }

    /// Classification state machine, split from sampling so host tests can
    /// drive it with an explicit level sequence.
    pub fn classify_level(
        &mut self,
        touched: bool,
        now_ms: u32,
        hold_threshold_ms: u32,
    ) -> TouchEvent {
        if touched {
            let event = if self.last_touch <= self.last_untouch {
                // Was untouched, now touched.
                self.last_push = now_ms;
                TouchEvent::Click
            } else if now_ms.wrapping_sub(self.last_push) >= hold_threshold_ms {
                TouchEvent::Hold
            } else {
                TouchEvent::None
            };
            self.last_hold_ms = now_ms.wrapping_sub(self.last_untouch);
            self.last_touch = now_ms;
            event
        } else {
            let event = if self.last_touch > self.last_untouch {
                // Was touched, now untouched.
                self.last_lift = now_ms;
                TouchEvent::Unclick
            } else {
                TouchEvent::Unhold
            };
            self.last_unhold_ms = now_ms.wrapping_sub(self.last_touch);
            self.last_untouch = now_ms;
            event
        }
    }

    /// Whether the pad is currently in a held-down state.  Derived from the
    /// push/lift timestamps, never stored redundantly.
    pub fn is_held(&self) -> bool {
        self.last_push > self.last_lift
    }

    /// Timestamp of the last untouched→touched edge.
    pub fn last_push_ms(&self) -> u32 {
        self.last_push
    }

    /// Timestamp of the last touched→untouched edge.
    pub fn last_lift_ms(&self) -> u32 {
        self.last_lift
    }

    /// Duration of the current hold, or zero while untouched.
    pub fn hold_duration_ms(&self) -> u32 {
        if self.is_held() {
            self.last_touch.wrapping_sub(self.last_push)
        } else {
            0
        }
    }

    /// Duration of the current unhold, or zero while touched.
    pub fn unhold_duration_ms(&self) -> u32 {
        if self.is_held() {
            0
        } else {
            self.last_untouch.wrapping_sub(self.last_lift)
        }
    }

    /// Duration of the most recent completed hold.
    pub fn last_hold_duration_ms(&self) -> u32 {
        self.last_hold_ms
    }

    /// Duration of the most recent completed unhold.
    pub fn last_unhold_duration_ms(&self) -> u32 {
        self.last_unhold_ms
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&self) -> u16 {
        hw_init::touch_read(crate::pins::TOUCH_PAD)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&self) -> u16 {
        SIM_TOUCH_RAW.load(Ordering::Relaxed)
    }
}
