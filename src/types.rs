//! Types making up the AC250Kxxx data model.

use core::fmt;

use fugit::{HertzU32, MillisDurationU32};

use crate::{codec::MAX_FRAME_LEN, error::FrameError};

/// A decoded reply payload.
pub type Message = heapless::String<MAX_FRAME_LEN>;

/// Address of one power source on the line.
///
/// The address can be displayed on the device by holding the red 'Clear' button for several seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Highest addressable unit.
    pub const MAX_UNIT: u8 = 31;

    /// Every device accepts a broadcast, none of them replies.
    pub const BROADCAST: Self = Self(0xFF);

    pub const fn new(raw: u8) -> Result<Self, FrameError> {
        if raw <= Self::MAX_UNIT || raw == Self::BROADCAST.0 {
            Ok(Self(raw))
        } else {
            Err(FrameError::InvalidAddress(raw))
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::BROADCAST.0
    }

    /// The two digit address field used on the wire.
    pub const fn hex(self) -> HexDigits {
        HexDigits::from_byte(self.0)
    }
}

impl Default for DeviceAddress {
    fn default() -> Self {
        Self::BROADCAST
    }
}

impl TryFrom<u8> for DeviceAddress {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            write!(f, "{} (broadcast)", self.hex())
        } else {
            write!(f, "{}", self.hex())
        }
    }
}

/// Two bytes of a hex field as found in a frame.
///
/// Built by the codec these are always uppercase hex digits, but a field lifted out of a
/// corrupted reply can hold anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexDigits([u8; 2]);

impl HexDigits {
    const DIGITS: &'static [u8; 16] = b"0123456789ABCDEF";

    pub const fn from_byte(value: u8) -> Self {
        Self([
            Self::DIGITS[(value >> 4) as usize],
            Self::DIGITS[(value & 0x0F) as usize],
        ])
    }

    pub const fn from_raw(raw: [u8; 2]) -> Self {
        Self(raw)
    }

    pub const fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl fmt::Display for HexDigits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// End of frame marker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// A single CR byte (0x0D).
    #[default]
    CarriageReturn,
    /// The three characters `$0D`, as some protocol revisions spell it.
    HexText,
}

impl Terminator {
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Terminator::CarriageReturn => b"\r",
            Terminator::HexText => b"$0D",
        }
    }
}

/// Protocol variant spoken on the line. Chosen once, never per message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Replies carry a trailing checksum field.
    pub reply_checksum: bool,
    pub terminator: Terminator,
}

/// Used to be less ambiguous about whether something is on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    Off,
    /// Enabled.
    On,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Serial line parameters the AC250Kxxx devices require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: HertzU32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: bool,
    pub flow_control: bool,
    /// How long a single read may block before the transport reports a timeout.
    pub read_timeout: MillisDurationU32,
}

/// 9600 baud, 8N1, no flow control.
pub const LINE_SETTINGS: LineSettings = LineSettings {
    baud_rate: HertzU32::from_raw(9600),
    data_bits: 8,
    stop_bits: 1,
    parity: false,
    flow_control: false,
    read_timeout: MillisDurationU32::from_ticks(1000),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_range() {
        for raw in 0..=31u8 {
            assert_eq!(DeviceAddress::new(raw).unwrap().raw(), raw);
        }
        assert!(DeviceAddress::new(255).unwrap().is_broadcast());
        assert_eq!(DeviceAddress::new(32), Err(FrameError::InvalidAddress(32)));
        assert_eq!(DeviceAddress::try_from(200u8), Err(FrameError::InvalidAddress(200)));
    }

    #[test]
    fn address_field_is_zero_padded() {
        assert_eq!(DeviceAddress::new(10).unwrap().hex().as_bytes(), b"0A");
        assert_eq!(DeviceAddress::new(0).unwrap().hex().as_bytes(), b"00");
        assert_eq!(DeviceAddress::BROADCAST.hex().as_bytes(), b"FF");
        assert_eq!(DeviceAddress::default(), DeviceAddress::BROADCAST);
    }

    #[test]
    fn hex_digits_display_escapes_garbage() {
        assert_eq!(HexDigits::from_byte(0x1F).to_string(), "1F");
        assert_eq!(HexDigits::from_raw([b'0', 0x0D]).to_string(), "0\\r");
    }

    #[test]
    fn state_conversions() {
        assert_eq!(State::from(true), State::On);
        assert!(!bool::from(State::Off));
    }

    #[test]
    fn line_settings() {
        assert_eq!(LINE_SETTINGS.baud_rate.raw(), 9600);
        assert_eq!(LINE_SETTINGS.read_timeout.to_millis(), 1000);
        assert_eq!((LINE_SETTINGS.data_bits, LINE_SETTINGS.stop_bits), (8, 1));
    }
}
