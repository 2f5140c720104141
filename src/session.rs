use embedded_io::Error as _;
use tracing::{debug, trace, warn};

use crate::{
    codec::{self, Frame, Printable, REPLY_START},
    command::Command,
    error::{Error, FrameError, FramingFault, Result},
    types::{DeviceAddress, FrameFormat, Message, Terminator},
};

/// Retries after the first attempt unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: u8 = 3;

/// Literal reply acknowledging a command.
pub const ACK: &str = "OK";
/// Literal reply refusing a command.
pub const NAK: &str = "Err";

/// Settings fixed for the lifetime of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub format: FrameFormat,
    /// Additional attempts after the first one.
    pub max_retries: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub const fn new() -> Self {
        Self {
            format: FrameFormat {
                reply_checksum: false,
                terminator: Terminator::CarriageReturn,
            },
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub const fn with_reply_checksum(mut self, enabled: bool) -> Self {
        self.format.reply_checksum = enabled;
        self
    }

    pub const fn with_terminator(mut self, terminator: Terminator) -> Self {
        self.format.terminator = terminator;
        self
    }

    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Outcome of one request/response round trip that did not hit a fatal error.
enum Attempt {
    Reply(Message),
    Rejected(FrameError),
}

/// An addressed, half-duplex conversation with one device.
///
/// You can create a Session using any interface which implements [embedded_io::Read] & [embedded_io::Write].
/// Reads are expected to block for at most the transport's own timeout and then fail with
/// [`embedded_io::ErrorKind::TimedOut`]; see [`LINE_SETTINGS`](crate::types::LINE_SETTINGS).
pub struct Session<S: embedded_io::Read + embedded_io::Write> {
    interface: S,
    address: DeviceAddress,
    config: SessionConfig,
    last_rejection: Option<FrameError>,
}

impl<S: embedded_io::Read + embedded_io::Write> Session<S> {
    /// Create a new session with the default protocol variant.
    pub fn new(interface: S, address: DeviceAddress) -> Self {
        Self::with_config(interface, address, SessionConfig::default())
    }

    pub fn with_config(interface: S, address: DeviceAddress, config: SessionConfig) -> Self {
        Self {
            interface,
            address,
            config,
            last_rejection: None,
        }
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Why the last reply of the most recent [`Self::query_with_retry`] call was rejected, if it was.
    pub fn last_rejection(&self) -> Option<FrameError> {
        self.last_rejection
    }

    /// Give back the underlying interface.
    pub fn into_inner(self) -> S {
        self.interface
    }

    /// Encode `payload` into a command frame and write it out.
    pub fn send(&mut self, payload: &str) -> Result<(), S::Error> {
        let frame = codec::encode_command(self.address, payload, &self.config.format)?;
        debug!(address = %self.address, frame = ?Printable(&frame), "sending command frame");

        self.interface
            .write_all(&frame)
            .map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)?;
        Ok(())
    }

    /// Wait for one reply frame and return its payload.
    ///
    /// Anything received before the `#` start marker is treated as line noise and dropped.
    pub fn receive(&mut self) -> Result<Message, S::Error> {
        let frame = self.read_frame()?;
        debug!(address = %self.address, frame = ?Printable(&frame), "received reply frame");

        let payload = codec::decode_reply(&frame, self.address, &self.config.format)?;
        let message = Message::try_from(payload)
            .map_err(|_| FrameError::Framing(FramingFault::Overflow))?;
        Ok(message)
    }

    /// Send `payload` and wait for the reply, once.
    pub fn query(&mut self, payload: &str) -> Result<Message, S::Error> {
        self.expect_reply()?;
        self.send(payload)?;
        self.receive()
    }

    /// Send `payload` and wait for a valid reply, asking again after a malformed,
    /// misaddressed or corrupted one.
    ///
    /// Returns `Ok(None)` once all `max_retries + 1` attempts were rejected. That means the
    /// device could not be understood, not that it had nothing to say. Serial failures and
    /// timeouts are returned straight away.
    pub fn query_with_retry(&mut self, payload: &str) -> Result<Option<Message>, S::Error> {
        self.expect_reply()?;
        self.last_rejection = None;

        let attempts = u16::from(self.config.max_retries) + 1;
        let mut failures: u16 = 0;
        while failures < attempts {
            match self.attempt(payload)? {
                Attempt::Reply(message) => return Ok(Some(message)),
                Attempt::Rejected(reason) => {
                    failures += 1;
                    warn!(address = %self.address, attempt = failures, %reason, "reply rejected");
                    self.last_rejection = Some(reason);
                }
            }
        }

        warn!(address = %self.address, attempts, "no valid reply, giving up");
        Ok(None)
    }

    /// Send a command and wait for acknowledgment.
    ///
    /// `true` if the device replied `OK`, `false` if it replied `Err`.
    pub fn command(&mut self, mnemonic: &str, args: &str) -> Result<bool, S::Error> {
        let payload = Command::new(mnemonic, args).payload()?;
        match self.query_with_retry(&payload)? {
            Some(reply) if reply.as_str() == ACK => Ok(true),
            Some(reply) if reply.as_str() == NAK => Ok(false),
            Some(reply) => Err(Error::UnexpectedReply(reply)),
            None => Err(Error::Communication),
        }
    }

    fn expect_reply(&self) -> Result<(), S::Error> {
        if self.address.is_broadcast() {
            return Err(Error::BroadcastQuery);
        }
        Ok(())
    }

    fn attempt(&mut self, payload: &str) -> Result<Attempt, S::Error> {
        self.send(payload)?;
        match self.receive() {
            Ok(message) => Ok(Attempt::Reply(message)),
            Err(Error::FrameError(reason)) if reason.is_retryable() => {
                Ok(Attempt::Rejected(reason))
            }
            Err(err) => Err(err),
        }
    }

    fn read_frame(&mut self) -> Result<Frame, S::Error> {
        let mut discarded: usize = 0;
        while self.read_byte()? != REPLY_START {
            discarded += 1;
        }
        if discarded > 0 {
            trace!(discarded, "dropped bytes before reply start");
        }

        let mut frame = Frame::new();
        let overflow = |_| FrameError::Framing(FramingFault::Overflow);
        frame.push(REPLY_START).map_err(overflow)?;

        let terminator = self.config.format.terminator.as_bytes();
        while !frame.ends_with(terminator) {
            let byte = self.read_byte()?;
            frame.push(byte).map_err(overflow)?;
        }
        Ok(frame)
    }

    fn read_byte(&mut self) -> Result<u8, S::Error> {
        let mut byte = [0u8; 1];
        match self.interface.read(&mut byte) {
            // Nothing arrived within the transport's timeout.
            Ok(0) => Err(Error::Timeout),
            Ok(_) => Ok(byte[0]),
            Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => Err(Error::Timeout),
            Err(e) => Err(Error::SerialError(e)),
        }
    }
}
