use core::fmt::Write as _;

use crate::{
    command::{Command, Mnemonic},
    error::{Error, FrameError, Result},
    session::{Session, SessionConfig},
    types::{DeviceAddress, Message, State},
};

/// Highest voltage the `NAP` command can carry.
pub const MAX_VOLTAGE: u16 = 999;

/// You can create an Ac250k using any interface which implements [embedded_io::Read] & [embedded_io::Write].
///
/// For its methods, "set" means to write a setting and "get" means to read it back.
/// Setters return whether the device acknowledged the command.
pub struct Ac250k<S: embedded_io::Read + embedded_io::Write> {
    session: Session<S>,
}

impl<S: embedded_io::Read + embedded_io::Write> Ac250k<S> {
    /// Create a new Ac250k instance with the given interface and device address.
    pub fn new(interface: S, address: DeviceAddress) -> Self {
        Self::from_session(Session::new(interface, address))
    }

    pub fn with_config(interface: S, address: DeviceAddress, config: SessionConfig) -> Self {
        Self::from_session(Session::with_config(interface, address, config))
    }

    pub fn from_session(session: Session<S>) -> Self {
        Self { session }
    }

    /// Access the underlying session, e.g. to send commands not covered here.
    pub fn session(&mut self) -> &mut Session<S> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }

    /// Return the current set voltage in volts.
    pub fn get_voltage(&mut self) -> Result<u16, S::Error> {
        // Reply is 'NAPxxx'.
        let reply = self.query(Command::query(Mnemonic::Nap))?;
        let volts = reply
            .strip_prefix(Mnemonic::Nap.as_str())
            .and_then(|digits| digits.parse::<u16>().ok());
        match volts {
            Some(volts) => Ok(volts),
            None => Err(Error::UnexpectedReply(reply)),
        }
    }

    /// Set the output voltage in volts.
    ///
    /// It takes some time for the voltage to change after the device acknowledges.
    pub fn set_voltage(&mut self, volts: u16) -> Result<bool, S::Error> {
        if volts > MAX_VOLTAGE {
            return Err(FrameError::Range {
                value: volts,
                max: MAX_VOLTAGE,
            }
            .into());
        }
        let mut args: heapless::String<3> = heapless::String::new();
        write!(args, "{:03}", volts).map_err(|_| FrameError::BufferOverflow)?;
        self.session.command(Mnemonic::Nap.as_str(), &args)
    }

    /// Read whether the output is activated.
    pub fn get_output_state(&mut self) -> Result<State, S::Error> {
        let reply = self.query(Command::query(Mnemonic::Out))?;
        match reply.as_str() {
            "OUT1" => Ok(State::On),
            "OUT0" => Ok(State::Off),
            _ => Err(Error::UnexpectedReply(reply)),
        }
    }

    /// Activate or deactivate the output.
    pub fn set_output_state(&mut self, state: impl Into<State>) -> Result<bool, S::Error> {
        let args = match state.into() {
            State::On => "1",
            State::Off => "0",
        };
        self.session.command(Mnemonic::Out.as_str(), args)
    }

    /// Return the identification of the device: name, model and revision.
    pub fn get_identification(&mut self) -> Result<Message, S::Error> {
        self.query(Command::query(Mnemonic::Id))
    }

    fn query(&mut self, command: Command<'_>) -> Result<Message, S::Error> {
        let payload = command.payload()?;
        self.session
            .query_with_retry(&payload)?
            .ok_or(Error::Communication)
    }
}
