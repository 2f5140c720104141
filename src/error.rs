//! Our error types for the AC250Kxxx protocol.

use thiserror::Error;

use crate::types::{HexDigits, Message};

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// The ways a received byte sequence can fail to be a reply frame at all.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingFault {
    #[error("missing '#' start marker")]
    MissingStartMarker,
    #[error("missing terminator")]
    MissingTerminator,
    #[error("frame too short")]
    Truncated,
    #[error("payload is not ASCII")]
    NonAscii,
    #[error("checksum field is not hex")]
    MalformedChecksum,
    #[error("frame longer than the receive buffer")]
    Overflow,
}

/// Errors raised by the pure frame codec.
///
/// `Range`, `Format`, `InvalidAddress` and `BufferOverflow` are caller mistakes.
/// The rest describe a bad reply and are worth asking the device again for,
/// see [`FrameError::is_retryable`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("Value {value} is outside 0..={max}")]
    Range { value: u16, max: u16 },
    #[error("Not a two digit hex field")]
    Format,
    #[error("Invalid device address {0}, expected 0..=31 or 255")]
    InvalidAddress(u8),
    #[error("Frame does not fit in the frame buffer")]
    BufferOverflow,
    #[error("Malformed reply frame: {0}")]
    Framing(FramingFault),
    #[error("Received reply from address '{actual}', but our device has address '{expected}'")]
    AddressMismatch {
        expected: HexDigits,
        actual: HexDigits,
    },
    #[error("Reply checksum {received:02X} does not match computed {computed:02X}")]
    Checksum { received: u8, computed: u16 },
}

impl FrameError {
    /// Whether the fault lies with the received reply rather than with the request.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            FrameError::Framing(_)
                | FrameError::AddressMismatch { .. }
                | FrameError::Checksum { .. }
        )
    }
}

/// Custom error type for AC250Kxxx communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial port failure")]
    SerialError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Frame error: {0}")]
    FrameError(FrameError),
    #[error("Device did not respond")]
    Communication,
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(Message),
    #[error("No device replies to the broadcast address")]
    BroadcastQuery,
}

impl<I: embedded_io::Error> From<FrameError> for Error<I> {
    fn from(err: FrameError) -> Self {
        Error::FrameError(err)
    }
}
