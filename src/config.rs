//! Link settings: module address, password, the module's packet size and baud rate settings,
//! and how long to wait for answers.
use core::convert::TryFrom;
use core::time::Duration;

use crate::error::InvalidInput;
use crate::packet::BROADCAST_ADDRESS;

/// The R502's baud rate is configured as a multiple of this.
pub const BAUD_UNIT: u32 = 9600;

/// Data packet length used by the module for bulk transfers (*PacketSize* in the datasheet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PacketSize {
    Bytes32,
    Bytes64,
    /// Factory default.
    Bytes128,
    Bytes256,
}

impl PacketSize {
    /// Size code as used by `SetSysPara` and reported by `ReadSysPara`.
    pub fn selector(self) -> u8 {
        match self {
            Self::Bytes32 => 0,
            Self::Bytes64 => 1,
            Self::Bytes128 => 2,
            Self::Bytes256 => 3,
        }
    }

    /// Payload bytes per data packet.
    pub fn len(self) -> usize {
        32 << self.selector()
    }
}

impl TryFrom<u8> for PacketSize {
    type Error = InvalidInput;

    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(Self::Bytes32),
            1 => Ok(Self::Bytes64),
            2 => Ok(Self::Bytes128),
            3 => Ok(Self::Bytes256),
            _ => Err(InvalidInput::PacketSize(selector)),
        }
    }
}

impl Default for PacketSize {
    fn default() -> Self {
        Self::Bytes128
    }
}

/// Serial speed. The datasheet allows multipliers of [`BAUD_UNIT`] from this set only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaudRate {
    Baud9600,
    Baud19200,
    Baud38400,
    /// Factory default.
    Baud57600,
    Baud115200,
}

impl BaudRate {
    pub fn multiplier(self) -> u8 {
        match self {
            Self::Baud9600 => 1,
            Self::Baud19200 => 2,
            Self::Baud38400 => 4,
            Self::Baud57600 => 6,
            Self::Baud115200 => 12,
        }
    }

    pub fn bits_per_second(self) -> u32 {
        u32::from(self.multiplier()) * BAUD_UNIT
    }
}

impl TryFrom<u8> for BaudRate {
    type Error = InvalidInput;

    fn try_from(multiplier: u8) -> Result<Self, Self::Error> {
        match multiplier {
            1 => Ok(Self::Baud9600),
            2 => Ok(Self::Baud19200),
            4 => Ok(Self::Baud38400),
            6 => Ok(Self::Baud57600),
            12 => Ok(Self::Baud115200),
            _ => Err(InvalidInput::BaudRate(multiplier)),
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::Baud57600
    }
}

/// Matching strictness, 1 (most lenient) to 5 (strictest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecurityLevel(u8);

impl SecurityLevel {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = InvalidInput;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&level) {
            Ok(Self(level))
        } else {
            Err(InvalidInput::SecurityLevel(level))
        }
    }
}

/// How long a command may take before its acknowledgement is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Register and parameter commands that answer straight away.
    Short,
    /// Commands that wait for the sensor or write flash.
    Long,
}

/// Settings for one [`R502`](crate::R502) session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Address the module answers to.
    pub address: u32,
    /// Handshake password used by [`R502::verify_configured_password`](crate::R502::verify_configured_password).
    pub password: u32,
    /// The module's data packet length; bulk transfers are framed with it.
    pub packet_size: PacketSize,
    /// The module's current serial speed.
    pub baud_rate: BaudRate,
    pub short_timeout: Duration,
    pub long_timeout: Duration,
    /// Wait for each data packet of a bulk transfer.
    pub frame_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: BROADCAST_ADDRESS,
            password: 0x0000_0000,
            packet_size: PacketSize::default(),
            baud_rate: BaudRate::default(),
            short_timeout: Duration::from_millis(50),
            long_timeout: Duration::from_secs(1),
            frame_timeout: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    pub fn with_packet_size(mut self, packet_size: PacketSize) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: BaudRate) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeouts(mut self, short: Duration, long: Duration, frame: Duration) -> Self {
        self.short_timeout = short;
        self.long_timeout = long;
        self.frame_timeout = frame;
        self
    }

    pub fn timeout(&self, timeout: Timeout) -> Duration {
        match timeout {
            Timeout::Short => self.short_timeout,
            Timeout::Long => self.long_timeout,
        }
    }
}
