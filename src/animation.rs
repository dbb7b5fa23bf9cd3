//! Animation engine: per-tick rendering plus one-shot sequences.
//!
//! The per-tick path is a function of `(mode, time-in-mode, color index,
//! base brightness)` — it holds no mode logic of its own.  The engine's
//! only internal state is the chase-pixel phase (so the circling pixel
//! looks continuous across ColorSelect → BrightnessSelect) and a small
//! PRNG for the randomized hue flashes.
//!
//! One-shot sequences (color wipe, commit convergence, network receipt)
//! run to completion before normal per-mode rendering resumes.  They
//! intentionally own the render loop for their fixed duration; frame
//! timing assumes nothing else touches the strip meanwhile.  Frame
//! *computation* is pure per index, so tests can step through a sequence
//! without sleeping.

use crate::config::LampConfig;
use crate::fsm::context::LampState;
use crate::fsm::ModeId;
use crate::pins::N_PIXELS;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

/// One full strip update, recomputed every tick.  Never read back.
pub type PixelFrame = [Rgb; N_PIXELS];

/// Delay between one-shot animation frames (ms).
pub const ONE_SHOT_FRAME_MS: u32 = 30;

const WIPE_FRAMES: usize = N_PIXELS;
const CONVERGE_FRAMES: usize = 32;
const RECEIPT_FLASH_FRAMES: usize = 12;

/// Blocking multi-frame sequences requested by the mode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    /// Click transition between adjacent palette colors.
    Wipe { from: u8, to: u8 },
    /// Ripple convergence toward a committed color, with decaying random
    /// perturbation.
    Converge { target: u8 },
    /// Randomized flash then ripple — a remote token was adopted.
    Receipt { target: u8 },
}

/// Hue of a palette slot: indices evenly spaced on the hue wheel.
pub fn palette_hue(color_index: u8, n_colors: u8) -> u8 {
    if n_colors == 0 {
        return 0;
    }
    ((u16::from(color_index % n_colors) * 256) / u16::from(n_colors)) as u8
}

/// Integer HSV→RGB (sextant conversion), full-saturation hue wheel in a
/// single byte.
pub fn hsv_to_rgb(h: u8, s: u8, v: u8) -> Rgb {
    if s == 0 {
        return (v, v, v);
    }
    let region = h / 43;
    let remainder = u16::from((h - region * 43) * 6);

    let v16 = u16::from(v);
    let s16 = u16::from(s);
    let p = (v16 * (255 - s16) / 255) as u8;
    let q = (v16 * (255 - (s16 * remainder) / 255) / 255) as u8;
    let t = (v16 * (255 - (s16 * (255 - remainder)) / 255) / 255) as u8;

    match region {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

pub struct AnimationEngine {
    /// xorshift32 state for the randomized hue flashes.
    rng: u32,
    /// Accumulated chase phase, carried across the two select modes.
    chase_ms: u32,
}

impl AnimationEngine {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: seed | 1, // xorshift must not start at zero
            chase_ms: 0,
        }
    }

    fn next_rand(&mut self) -> u32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }

    // ── Per-tick rendering ────────────────────────────────────

    /// Render one frame for the current mode.
    ///
    /// Returns the frame and the live brightness it was rendered at; the
    /// service writes the latter back into `current_brightness` so a
    /// BrightnessSelect release commits the level the user saw.
    pub fn render(
        &mut self,
        mode: ModeId,
        delta_ms: u32,
        elapsed_ms: u32,
        lamp: &LampState,
        config: &LampConfig,
    ) -> (PixelFrame, u8) {
        match mode {
            ModeId::Sleep => {
                self.chase_ms = 0;
                ([(0, 0, 0); N_PIXELS], 0)
            }

            ModeId::Idle => {
                self.chase_ms = 0;
                let phase = breath_phase(elapsed_ms, config.idle_breath_period_ms);
                let floor = config.idle_breath_floor;
                let level = floor + (1.0 - floor) * phase;
                let v = (level * f32::from(lamp.base_brightness)) as u8;
                let hue = palette_hue(lamp.color_index, config.n_colors);
                ([hsv_to_rgb(hue, 255, v); N_PIXELS], v)
            }

            ModeId::ColorSelect => {
                self.chase_ms = self.chase_ms.wrapping_add(delta_ms);
                let frame =
                    self.chase_frame(lamp.color_index, lamp.base_brightness, config);
                (frame, lamp.base_brightness)
            }

            ModeId::BrightnessSelect => {
                self.chase_ms = self.chase_ms.wrapping_add(delta_ms);
                let phase = breath_phase(elapsed_ms, config.select_breath_period_ms);
                let v = (255.0 * (0.10 + 0.90 * phase)) as u8;
                let frame = self.chase_frame(lamp.color_index, v, config);
                (frame, v)
            }
        }
    }

    /// Base frame for the select modes: solid palette hue with one
    /// circling pixel flashing a random hue.
    fn chase_frame(&mut self, color_index: u8, brightness: u8, config: &LampConfig) -> PixelFrame {
        let hue = palette_hue(color_index, config.n_colors);
        let mut frame = [hsv_to_rgb(hue, 255, brightness); N_PIXELS];
        let step_ms = config.chase_step_ms.max(1);
        let pos = (self.chase_ms / step_ms) as usize % N_PIXELS;
        let flash_hue = (self.next_rand() & 0xFF) as u8;
        frame[pos] = hsv_to_rgb(flash_hue, 255, brightness.max(64));
        frame
    }

    /// Chase pixel position for the current phase (test hook).
    pub fn chase_position(&self, config: &LampConfig) -> usize {
        (self.chase_ms / config.chase_step_ms.max(1)) as usize % N_PIXELS
    }

    // ── One-shot sequences ────────────────────────────────────

    /// Total frame count of a one-shot sequence.
    pub fn one_shot_frames(shot: &OneShot) -> usize {
        match shot {
            OneShot::Wipe { .. } => WIPE_FRAMES,
            OneShot::Converge { .. } => CONVERGE_FRAMES,
            OneShot::Receipt { .. } => RECEIPT_FLASH_FRAMES + CONVERGE_FRAMES,
        }
    }

    /// Compute frame `idx` of a one-shot sequence.
    pub fn one_shot_frame(
        &mut self,
        shot: &OneShot,
        idx: usize,
        brightness: u8,
        n_colors: u8,
    ) -> PixelFrame {
        match *shot {
            OneShot::Wipe { from, to } => {
                let from_hue = palette_hue(from, n_colors);
                let to_hue = palette_hue(to, n_colors);
                let mut frame = [hsv_to_rgb(from_hue, 255, brightness); N_PIXELS];
                for px in frame.iter_mut().take(idx + 1) {
                    *px = hsv_to_rgb(to_hue, 255, brightness);
                }
                frame
            }

            OneShot::Converge { target } => self.converge_frame(target, idx, brightness, n_colors),

            OneShot::Receipt { target } => {
                if idx < RECEIPT_FLASH_FRAMES {
                    let mut frame = [(0, 0, 0); N_PIXELS];
                    for px in frame.iter_mut() {
                        let hue = (self.next_rand() & 0xFF) as u8;
                        *px = hsv_to_rgb(hue, 255, brightness);
                    }
                    frame
                } else {
                    self.converge_frame(target, idx - RECEIPT_FLASH_FRAMES, brightness, n_colors)
                }
            }
        }
    }

    /// Ripple toward the target hue: every pixel is perturbed by a random
    /// offset whose amplitude decays to zero over the sequence, so the
    /// final frame is exactly the target color.
    fn converge_frame(
        &mut self,
        target: u8,
        idx: usize,
        brightness: u8,
        n_colors: u8,
    ) -> PixelFrame {
        let target_hue = palette_hue(target, n_colors);
        let amplitude = (CONVERGE_FRAMES - 1).saturating_sub(idx) as u32 * 6;
        let mut frame = [(0, 0, 0); N_PIXELS];
        for px in frame.iter_mut() {
            let offset = if amplitude == 0 {
                0
            } else {
                (self.next_rand() % (2 * amplitude + 1)) as i32 - amplitude as i32
            };
            let hue = (i32::from(target_hue) + offset).rem_euclid(256) as u8;
            *px = hsv_to_rgb(hue, 255, brightness);
        }
        frame
    }

    /// Run a one-shot sequence to completion, frame by frame.  Blocks the
    /// caller (the render loop) for the whole duration via `pause`.
    pub fn run_one_shot(
        &mut self,
        shot: OneShot,
        brightness: u8,
        n_colors: u8,
        pixels: &mut impl crate::app::ports::PixelPort,
        pause: &mut impl FnMut(u32),
    ) {
        for idx in 0..Self::one_shot_frames(&shot) {
            let frame = self.one_shot_frame(&shot, idx, brightness, n_colors);
            pixels.show(&frame);
            pause(ONE_SHOT_FRAME_MS);
        }
    }
}

/// Cosine breathing phase in `[0, 1]`, starting at 1 (full) when
/// `elapsed_ms == 0` so mode entry is seamless.
fn breath_phase(elapsed_ms: u32, period_ms: u32) -> f32 {
    let period = period_ms.max(1);
    let t = (elapsed_ms % period) as f32 / period as f32;
    0.5 + 0.5 * (t * core::f32::consts::TAU).cos()
}
