//! **r502-protocol** is the packet protocol engine for the HZ Grow R502 (and likely similar)
//! fingerprint module.
//!
//! It frames commands, checks every acknowledgement (checksum, then header), decodes the
//! results into typed replies and streams the fingerprint image out of the module. Any serial
//! port works: implement [`Transport`] directly, or wrap `embedded-hal` serial halves and a
//! timer in a [`SerialTransport`].
//!
//! The module's own verdicts (wrong password, no finger, ...) come back as the
//! [`ConfirmationCode`] of a successful call; `Err` is reserved for transport, integrity,
//! protocol and input errors, see [`Error`].
//!
//! ## Example
//!
//! To authenticate with the R502:
//! ```
//! # use core::time::Duration;
//! # use embedded_hal::serial::{Read, Write};
//! # use embedded_hal::timer::CountDown;
//! use r502_protocol::{ConfirmationCode, SerialTransport, R502};
//! # struct TestTx;
//! # struct TestRx(usize);
//! # struct TestTimer;
//! #
//! # impl Write<u8> for TestTx {
//! #     type Error = ();
//! #     fn write(&mut self, _word: u8) -> nb::Result<(), Self::Error> {
//! #         return Ok(());
//! #     }
//! #     fn flush(&mut self) -> nb::Result<(), Self::Error> {
//! #         return Ok(());
//! #     }
//! # }
//! #
//! # const res_data: &[u8] = &[ 0xef, 0x01, 0xff, 0xff, 0xff, 0xff, 0x07, 0x00, 0x03, 0x00, 0x00, 0x0a ];
//! #
//! # impl Read<u8> for TestRx {
//! #     type Error = ();
//! #     fn read(&mut self) -> nb::Result<u8, Self::Error> {
//! #         if self.0 == res_data.len() {
//! #             return Err(nb::Error::WouldBlock);
//! #         }
//! #         let word = res_data[self.0];
//! #         self.0 += 1;
//! #         return Ok(word);
//! #     }
//! # }
//! #
//! # impl CountDown for TestTimer {
//! #     type Time = Duration;
//! #     fn start<T: Into<Duration>>(&mut self, _count: T) {}
//! #     fn wait(&mut self) -> nb::Result<(), void::Void> {
//! #         return Ok(());
//! #     }
//! # }
//! # let rx = TestRx(0);
//! # let tx = TestTx;
//! # let timer = TestTimer;
//!
//! // Obtain tx, rx and a timer from some serial port implementation
//! let transport = SerialTransport::new(tx, rx, timer);
//! let mut r502 = R502::new(transport, 0xffffffff);
//! match r502.verify_password(0x00000000) {
//!     Ok(ConfirmationCode::Success) => println!("Password accepted"),
//!     Ok(code) => println!("Module says: {:?}", code),
//!     Err(error) => panic!("Error: {}", error),
//! }
//! ```
//!
//! For complete programs, see the `demos` directory.
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![no_std]

#[cfg(test)]
extern crate std;

mod commands;
mod config;
mod driver;
mod error;
pub mod header;
mod irq;
pub mod packet;
mod responses;
mod transport;
mod upload;
mod utils;

pub use crate::commands::{Command, Descriptor, LedColour, LedControl, SysParaSetting};
pub use crate::config::{BaudRate, Config, PacketSize, SecurityLevel, Timeout, BAUD_UNIT};
pub use crate::driver::R502;
pub use crate::error::{Error, ErrorCategory, InvalidInput};
pub use crate::header::HeaderError;
pub use crate::irq::EdgeCounter;
pub use crate::packet::{Packet, PacketKind};
pub use crate::responses::{
    AckResult, ConfirmationCode, MatchResult, NotepadResult, RandomCodeResult,
    ReadSysParaResult, Reply, SearchResult, SystemParameters, TemplateNumResult,
    SYSTEM_IDENTIFIER_CODE,
};
pub use crate::transport::{BaudControl, FixedBaud, SerialError, SerialTransport, Transport};
pub use crate::upload::{expand_nibbles, UpImageResult};
