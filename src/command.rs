//! Command payloads understood by the AC250Kxxx power sources.

use core::fmt::Write as _;

use strum_macros::{EnumIter, IntoStaticStr};

use crate::{error::FrameError, types::Message};

/// Known command mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum Mnemonic {
    /// Output voltage. `NAP???` queries, `NAP###` sets (whole volts, zero padded to 3 digits).
    #[strum(serialize = "NAP")]
    Nap,
    /// Output switch. `OUT?` queries, `OUT0`/`OUT1` sets.
    #[strum(serialize = "OUT")]
    Out,
    /// Identification: name of the device, model and revision.
    #[strum(serialize = "ID")]
    Id,
}

impl Mnemonic {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Parameter string turning this mnemonic into a query.
    pub const fn query_suffix(self) -> &'static str {
        match self {
            Mnemonic::Nap => "???",
            Mnemonic::Out | Mnemonic::Id => "?",
        }
    }
}

/// A mnemonic plus its parameter string, together forming a frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub mnemonic: &'a str,
    pub args: &'a str,
}

impl<'a> Command<'a> {
    pub const fn new(mnemonic: &'a str, args: &'a str) -> Self {
        Self { mnemonic, args }
    }

    /// The query form of `mnemonic`, e.g. `NAP???`.
    pub fn query(mnemonic: Mnemonic) -> Command<'static> {
        Command::new(mnemonic.as_str(), mnemonic.query_suffix())
    }

    pub fn payload(&self) -> Result<Message, FrameError> {
        let mut payload = Message::new();
        write!(payload, "{}{}", self.mnemonic, self.args).map_err(|_| FrameError::BufferOverflow)?;
        Ok(payload)
    }
}
