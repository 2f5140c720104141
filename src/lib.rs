//! This crate provides an interface for communicating with and controlling the Diametral AC250Kxxx series of
//! programmable power sources.
//!
//! It supports `no-std` environments by use of the `no-std` feature flag.
//!
//! The protocol is half-duplex ASCII over a serial line. Each command frame is addressed to one device
//! (0..=31) or to everyone (broadcast, 255) and carries a control sum. The addressed device answers with a
//! reply frame which [`session::Session`] validates, asking again a bounded number of times if the reply was
//! garbled or came from the wrong device.
//!
//! The serial port used for PSU comms should be configured like so, see [`types::LINE_SETTINGS`]:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//! * Flow control: None
//!
//! Only one session may own the line at a time. To talk to several devices on one line, serialise access to
//! the port yourself.

#![cfg_attr(feature = "no-std", no_std)]

pub mod codec;
pub mod command;
pub mod error;
pub mod psu;
pub mod session;
pub mod types;

#[cfg(test)]
mod mock_serial;

pub use error::{Error, FrameError, Result};
pub use psu::Ac250k;
pub use session::{Session, SessionConfig};
pub use types::{DeviceAddress, FrameFormat, Message, State, Terminator};
