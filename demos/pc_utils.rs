use embedded_hal::serial::{Read, Write};
use embedded_hal::timer::CountDown;
use r502_protocol::BaudControl;
use serialport::prelude::*;
use std::cell::RefCell;
use std::time::{Duration, Instant};

// We're cheating here and will use the host OS's serial port
// as our UART, and for that we have to implement the read/write
// interfaces from embedded-hal.

pub struct SerialReader<'a>(pub &'a RefCell<Box<dyn SerialPort>>);
pub struct SerialWriter<'a>(pub &'a RefCell<Box<dyn SerialPort>>);

impl Read<u8> for SerialReader<'_> {
    type Error = std::io::Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let mut buf: [u8; 1] = [0u8];
        match self.0.borrow_mut().read(&mut buf) {
            Ok(1) => Ok(buf[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            // the port's own timeout is short, the engine's timer decides when to give up
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }
}

impl Write<u8> for SerialWriter<'_> {
    type Error = std::io::Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        let buf: [u8; 1] = [word];
        match self.0.borrow_mut().write(&buf) {
            Ok(1) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        match self.0.borrow_mut().flush() {
            Ok(_) => Ok(()),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }
}

/// Wall-clock count-down timer.
pub struct StdTimer(Option<Instant>);

impl StdTimer {
    pub fn new() -> Self {
        StdTimer(None)
    }
}

impl CountDown for StdTimer {
    type Time = Duration;

    fn start<T: Into<Duration>>(&mut self, count: T) {
        self.0 = Some(Instant::now() + count.into());
    }

    fn wait(&mut self) -> nb::Result<(), void::Void> {
        match self.0 {
            Some(deadline) if Instant::now() < deadline => Err(nb::Error::WouldBlock),
            _ => Ok(()),
        }
    }
}

/// Lets the engine follow a `SetSysPara` baud change on the host port.
pub struct PortBaud<'a>(pub &'a RefCell<Box<dyn SerialPort>>);

impl BaudControl for PortBaud<'_> {
    type Error = serialport::Error;

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_baud_rate(baud)
    }
}

pub fn print_ports() {
    let ports = serialport::available_ports().unwrap();
    for port in ports {
        println!("Available port: {} ({:#?})", port.port_name, port.port_type);
    }
}

pub fn open_port(port_name: &str, baud_rate: u32) -> RefCell<Box<dyn SerialPort>> {
    println!("Using port {}", port_name);
    let mut port = serialport::open(port_name).unwrap();
    port.set_baud_rate(baud_rate).unwrap();
    port.set_timeout(Duration::from_millis(10)).unwrap();
    RefCell::new(port)
}

#[allow(dead_code)]
// This allows us to share code between different PC-based demos.
fn main() {}
