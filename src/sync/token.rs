//! Color token value object and wire codec.
//!
//! A token identifies "this device's claimed color as of this change":
//! `<colorIndex>.<nonce>.<deviceId>`, exactly three dot-separated fields.
//! Tokens are immutable once constructed and compared only by structural
//! equality — the nonce exists purely to make two changes to the same
//! color distinguishable, and carries no ordering semantics.

use core::fmt;

/// Device field capacity: long enough for foreign ids such as the admin
/// tool's colon-separated MAC, which also travel through the service.
pub type TokenDeviceId = heapless::String<24>;

/// Encoded wire form of a token.
pub type TokenString = heapless::String<48>;

/// Smallest nonce the clock derivation produces.
const NONCE_MIN: u16 = 1000;
/// Nonces are at most four decimal digits on the wire.
const NONCE_MAX: u16 = 9999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorToken {
    pub color_index: u8,
    pub nonce: u16,
    pub device_id: TokenDeviceId,
}

/// Why a wire string failed to parse as a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenParseError {
    /// Not exactly three dot-separated fields.
    FieldCount,
    /// Color field is not a decimal integer in range.
    ColorIndex,
    /// Nonce field is not a decimal integer of at most four digits.
    Nonce,
    /// Device field is empty or too long.
    DeviceId,
}

impl fmt::Display for TokenParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount => write!(f, "expected three dot-separated fields"),
            Self::ColorIndex => write!(f, "bad color index field"),
            Self::Nonce => write!(f, "bad nonce field"),
            Self::DeviceId => write!(f, "bad device id field"),
        }
    }
}

impl ColorToken {
    pub fn new(color_index: u8, nonce: u16, device_id: &str) -> Result<Self, TokenParseError> {
        if device_id.is_empty() || device_id.contains('.') {
            return Err(TokenParseError::DeviceId);
        }
        let device_id = TokenDeviceId::try_from(device_id).map_err(|()| TokenParseError::DeviceId)?;
        Ok(Self {
            color_index,
            nonce,
            device_id,
        })
    }

    /// Derive a fresh nonce from the millisecond clock: four decimal
    /// digits, 1000–9999.  Equality-only; never compared numerically.
    pub fn nonce_from_ms(now_ms: u32) -> u16 {
        NONCE_MIN + (now_ms % u32::from(NONCE_MAX - NONCE_MIN + 1)) as u16
    }

    /// Wire encoding: `<colorIndex>.<nonce>.<deviceId>`.
    pub fn encode(&self) -> TokenString {
        let mut out = TokenString::new();
        use core::fmt::Write;
        // Capacity holds the worst case (3 + 1 + 4 + 1 + 24 bytes).
        let _ = write!(out, "{}.{}.{}", self.color_index, self.nonce, self.device_id);
        out
    }

    /// Parse a wire string.  Fails closed: wrong field count, non-numeric
    /// color/nonce, an over-long nonce, or a bad device field all reject
    /// the token rather than guessing.
    pub fn parse(s: &str) -> Result<Self, TokenParseError> {
        let mut parts = s.split('.');
        let color = parts.next().ok_or(TokenParseError::FieldCount)?;
        let nonce = parts.next().ok_or(TokenParseError::FieldCount)?;
        let device = parts.next().ok_or(TokenParseError::FieldCount)?;
        if parts.next().is_some() {
            return Err(TokenParseError::FieldCount);
        }

        let color_index: u8 = color.parse().map_err(|_| TokenParseError::ColorIndex)?;
        if nonce.is_empty() || nonce.len() > 4 {
            return Err(TokenParseError::Nonce);
        }
        let nonce: u16 = nonce.parse().map_err(|_| TokenParseError::Nonce)?;

        if device.is_empty() {
            return Err(TokenParseError::DeviceId);
        }
        let device_id = TokenDeviceId::try_from(device).map_err(|()| TokenParseError::DeviceId)?;

        Ok(Self {
            color_index,
            nonce,
            device_id,
        })
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}
