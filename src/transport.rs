//! The byte link to the module.
//!
//! [`Transport`] is all the protocol engine needs from a serial port. [`SerialTransport`]
//! provides it on top of any `embedded-hal` serial port and count-down timer.
use core::fmt::Debug;
use core::time::Duration;

use embedded_hal::serial::{Read, Write};
use embedded_hal::timer::CountDown;
use log::error;
use nb::block;

use crate::config::BAUD_UNIT;

/// A blocking, byte-oriented link to one module.
pub trait Transport {
    type Error: Debug;

    /// Sends `bytes`, returning how many were written.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;

    /// Reads until `buf` is full or `timeout` has passed, returning the number of bytes read.
    /// `Ok(0)` means nothing arrived in time.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Self::Error>;

    /// Switches the link to `multiplier` × 9600 baud.
    fn set_baud_rate(&mut self, multiplier: u8) -> Result<(), Self::Error>;

    /// Discards any bytes that arrived but were not read.
    ///
    /// Only input already received is dropped. Packets the module is still sending, e.g. the
    /// rest of an aborted image upload, can arrive afterwards and are seen by the next read.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        (**self).write(bytes)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Self::Error> {
        (**self).read(buf, timeout)
    }

    fn set_baud_rate(&mut self, multiplier: u8) -> Result<(), Self::Error> {
        (**self).set_baud_rate(multiplier)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// Changes the speed of a serial peripheral. `embedded-hal` has no trait for this, so
/// whoever owns the UART configuration implements it.
pub trait BaudControl {
    type Error: Debug;

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error>;
}

/// For links whose speed cannot be changed. Every change request fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedBaud;

impl BaudControl for FixedBaud {
    type Error = ();

    fn set_baud_rate(&mut self, _baud: u32) -> Result<(), Self::Error> {
        Err(())
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SerialError<E> {
    #[error("serial error: {0:?}")]
    Serial(E),

    #[error("the serial port refused the new baud rate")]
    BaudRate,
}

/// [`Transport`] over `embedded-hal` serial halves, with a [`CountDown`] timer bounding reads.
#[derive(Debug)]
pub struct SerialTransport<TX, RX, T, B = FixedBaud> {
    tx: TX,
    rx: RX,
    timer: T,
    baud: B,
}

impl<TX, RX, T> SerialTransport<TX, RX, T, FixedBaud> {
    pub fn new(tx: TX, rx: RX, timer: T) -> Self {
        Self::with_baud_control(tx, rx, timer, FixedBaud)
    }
}

impl<TX, RX, T, B> SerialTransport<TX, RX, T, B> {
    pub fn with_baud_control(tx: TX, rx: RX, timer: T, baud: B) -> Self {
        Self { tx, rx, timer, baud }
    }

    /// Gives the peripherals back.
    pub fn release(self) -> (TX, RX, T, B) {
        (self.tx, self.rx, self.timer, self.baud)
    }
}

impl<TX, RX, T, B, E> Transport for SerialTransport<TX, RX, T, B>
where
    TX: Write<u8, Error = E>,
    RX: Read<u8, Error = E>,
    T: CountDown,
    T::Time: From<Duration>,
    B: BaudControl,
    E: Debug,
{
    type Error = SerialError<E>;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        for byte in bytes {
            block!(self.tx.write(*byte)).map_err(SerialError::Serial)?;
        }
        block!(self.tx.flush()).map_err(SerialError::Serial)?;
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Self::Error> {
        self.timer.start(T::Time::from(timeout));

        let mut received = 0;
        while received < buf.len() {
            match self.rx.read() {
                Ok(byte) => {
                    buf[received] = byte;
                    received += 1;
                }
                Err(nb::Error::WouldBlock) => {
                    if self.timer.wait().is_ok() {
                        break;
                    }
                }
                Err(nb::Error::Other(e)) => return Err(SerialError::Serial(e)),
            }
        }
        Ok(received)
    }

    fn set_baud_rate(&mut self, multiplier: u8) -> Result<(), Self::Error> {
        let baud = u32::from(multiplier) * BAUD_UNIT;
        self.baud.set_baud_rate(baud).map_err(|e| {
            error!("could not switch the serial port to {} baud: {:?}", baud, e);
            SerialError::BaudRate
        })
    }

    /// Drains the receiver until it reports `WouldBlock`, without waiting for the line to go
    /// quiet.
    fn flush(&mut self) -> Result<(), Self::Error> {
        loop {
            match self.rx.read() {
                Ok(_) => continue,
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(SerialError::Serial(e)),
            }
        }
    }
}
