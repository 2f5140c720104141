//! Encoding of command frames and decoding of reply frames.
//!
//! A command frame is an ANSI string of uppercase letters and a few special characters:
//!
//! ```text
//! @ <address:2 hex> <payload> <checksum:2 hex> <terminator>
//! ```
//!
//! A reply frame looks the same but starts with `#` and, depending on the
//! [`FrameFormat`], may leave out the checksum.
//!
//! Example: `@0ANAP100E1\r` sends `NAP100` to address 10 (0x0A). `E1` is the checksum of `0ANAP100`.

use core::fmt;

use crate::{
    error::{FrameError, FramingFault},
    types::{DeviceAddress, FrameFormat, HexDigits},
};

/// Initial byte of every command frame.
pub const COMMAND_START: u8 = b'@';
/// Initial byte of every reply frame.
pub const REPLY_START: u8 = b'#';
/// Capacity of a single frame in either direction.
pub const MAX_FRAME_LEN: usize = 64;

/// One complete frame, from initial byte to terminator.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Render `value` as two uppercase hex digits.
pub fn hexify_byte(value: u16) -> Result<HexDigits, FrameError> {
    let byte = u8::try_from(value).map_err(|_| FrameError::Range { value, max: 0xFF })?;
    Ok(HexDigits::from_byte(byte))
}

/// Parse exactly two hex digits.
pub fn unhexify(digits: &[u8]) -> Result<u8, FrameError> {
    let [high, low] = digits else {
        return Err(FrameError::Format);
    };
    Ok(nibble(*high)? << 4 | nibble(*low)?)
}

fn nibble(digit: u8) -> Result<u8, FrameError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        _ => Err(FrameError::Format),
    }
}

/// The AC250Kxxx control sum of `bytes`.
///
/// The byte values are summed, then 256 is subtracted while the sum is greater than 256.
/// A sum of exactly 256 is therefore left as is; the hardware expects this.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = bytes.iter().map(|&b| u32::from(b)).sum();
    while sum > 256 {
        sum -= 256;
    }
    sum as u16
}

/// Build the command frame carrying `payload` to `address`.
///
/// The checksum covers the address field and the payload, not the leading `@`.
pub fn encode_command(
    address: DeviceAddress,
    payload: &str,
    format: &FrameFormat,
) -> Result<Frame, FrameError> {
    let mut frame = Frame::new();
    frame
        .push(COMMAND_START)
        .map_err(|_| FrameError::BufferOverflow)?;
    extend(&mut frame, address.hex().as_bytes())?;
    extend(&mut frame, payload.as_bytes())?;

    let sum = checksum(&frame[1..]);
    if sum > 0xFF {
        // An unreduced 256 goes out as "100".
        extend(&mut frame, b"1")?;
    }
    extend(&mut frame, HexDigits::from_byte(sum as u8).as_bytes())?;
    extend(&mut frame, format.terminator.as_bytes())?;
    Ok(frame)
}

fn extend(frame: &mut Frame, bytes: &[u8]) -> Result<(), FrameError> {
    frame
        .extend_from_slice(bytes)
        .map_err(|_| FrameError::BufferOverflow)
}

/// Validate a reply frame from `expected` and return its payload.
///
/// `raw` is the whole frame including the start marker and terminator.
pub fn decode_reply<'a>(
    raw: &'a [u8],
    expected: DeviceAddress,
    format: &FrameFormat,
) -> Result<&'a str, FrameError> {
    let body = raw
        .strip_prefix(&[REPLY_START])
        .ok_or(FrameError::Framing(FramingFault::MissingStartMarker))?;
    let body = body
        .strip_suffix(format.terminator.as_bytes())
        .ok_or(FrameError::Framing(FramingFault::MissingTerminator))?;

    let [a, b, rest @ ..] = body else {
        return Err(FrameError::Framing(FramingFault::Truncated));
    };
    let actual = HexDigits::from_raw([*a, *b]);
    let expected = expected.hex();
    if actual != expected {
        return Err(FrameError::AddressMismatch { expected, actual });
    }

    let payload = if format.reply_checksum {
        strip_checksum(body, rest)?
    } else {
        rest
    };

    if !payload.is_ascii() {
        return Err(FrameError::Framing(FramingFault::NonAscii));
    }
    core::str::from_utf8(payload).map_err(|_| FrameError::Framing(FramingFault::NonAscii))
}

/// Split the checksum field off the end of `rest` and check it against `body`.
///
/// `body` is the address field followed by `rest`.
fn strip_checksum<'a>(body: &[u8], rest: &'a [u8]) -> Result<&'a [u8], FrameError> {
    let Some(split) = rest.len().checked_sub(2) else {
        return Err(FrameError::Framing(FramingFault::Truncated));
    };
    let (payload, field) = rest.split_at(split);
    let checked = unhexify(field)
        .map_err(|_| FrameError::Framing(FramingFault::MalformedChecksum))
        .and_then(|received| {
            let computed = checksum(&body[..body.len() - 2]);
            if u16::from(received) == computed {
                Ok(payload)
            } else {
                Err(FrameError::Checksum { received, computed })
            }
        });

    // An unreduced sum of 256 travels as the three digits "100".
    checked.or_else(|err| match rest.strip_suffix(b"100") {
        Some(payload) if checksum(&body[..body.len() - 3]) == 256 => Ok(payload),
        _ => Err(err),
    })
}

/// Escaped rendering of a frame for trace output.
pub struct Printable<'a>(pub &'a [u8]);

impl fmt::Debug for Printable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.escape_ascii())
    }
}
