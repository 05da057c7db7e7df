//! Packet framing for the R502 serial protocol.
//!
//! Every exchange with the module, in both directions, uses the same layout:
//!
//! ```text
//! headr  | 0xEF 0x01 [2]
//! addr   | module address [4]
//! ident  | packet kind [1]
//! length | payload length + 2, big endian [2]
//! data   | payload [length - 2]
//! chksum | checksum, big endian [2]
//! ```
//!
//! The checksum is the sum of the kind byte, both length bytes and every payload byte, with
//! overflowing bits dropped.
use arrayvec::ArrayVec;
use byteorder::{BigEndian, ByteOrder};

/// Start marker that opens every packet.
pub const START: [u8; 2] = [0xEF, 0x01];

/// Address every module answers to until it is given a specific one.
pub const BROADCAST_ADDRESS: u32 = 0xFFFF_FFFF;

/// Start marker, address, kind and length.
pub const HEADER_LEN: usize = 9;

pub const CHECKSUM_LEN: usize = 2;

/// Largest payload the module accepts or sends in one packet.
pub const MAX_PAYLOAD_LEN: usize = 256;

pub const MAX_PACKET_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CHECKSUM_LEN;

/// Room for one complete packet. Sized up to an `arrayvec` array size.
pub type PacketBuffer = ArrayVec<[u8; 384]>;

/// The packet identifier (*PID* in the datasheet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Command,
    Data,
    Acknowledge,
    EndOfData,
}

impl PacketKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Command),
            0x02 => Some(Self::Data),
            0x07 => Some(Self::Acknowledge),
            0x08 => Some(Self::EndOfData),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Command => 0x01,
            Self::Data => 0x02,
            Self::Acknowledge => 0x07,
            Self::EndOfData => 0x08,
        }
    }
}

/// Computes the packet checksum over the kind byte, the two length bytes and the payload
/// (which must not include the checksum itself).
pub fn checksum(kind: u8, length: [u8; 2], payload: &[u8]) -> u16 {
    let header_sum = u16::from(kind)
        .wrapping_add(u16::from(length[0]))
        .wrapping_add(u16::from(length[1]));
    payload
        .iter()
        .fold(header_sum, |sum, byte| sum.wrapping_add(u16::from(*byte)))
}

/// Builds a complete packet of the given kind around `payload`.
///
/// # Panics
///
/// If `payload` is longer than [`MAX_PAYLOAD_LEN`]. Every command this crate builds is far
/// below that.
pub fn encode(kind: PacketKind, payload: &[u8], address: u32) -> PacketBuffer {
    assert!(
        payload.len() <= MAX_PAYLOAD_LEN,
        "payload of {} bytes does not fit in one packet",
        payload.len()
    );

    let mut raw = [0u8; 384];
    let end = HEADER_LEN + payload.len();

    raw[0..2].copy_from_slice(&START);
    BigEndian::write_u32(&mut raw[2..6], address);
    raw[6] = kind.to_byte();
    BigEndian::write_u16(&mut raw[7..9], (payload.len() + CHECKSUM_LEN) as u16);
    raw[HEADER_LEN..end].copy_from_slice(payload);

    let sum = checksum(raw[6], [raw[7], raw[8]], payload);
    BigEndian::write_u16(&mut raw[end..end + CHECKSUM_LEN], sum);

    let mut packet = PacketBuffer::from(raw);
    packet.truncate(end + CHECKSUM_LEN);
    packet
}

/// Recomputes the checksum of a received packet and compares it with its trailing two bytes.
///
/// The covered range is taken from the size of `frame`, not from its length field, so a
/// corrupted length still fails here rather than reading out of bounds.
pub fn verify_checksum(frame: &[u8]) -> bool {
    match Packet::parse(frame) {
        Some(packet) => packet.computed_checksum() == packet.checksum,
        None => false,
    }
}

/// A borrowed view of one received packet, split into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub start: [u8; 2],
    pub address: u32,
    /// Raw kind byte, kept as-is so unknown kinds can be reported.
    pub kind: u8,
    /// The length field as received.
    pub length: u16,
    /// Everything between the header and the checksum.
    pub payload: &'a [u8],
    pub checksum: u16,
}

impl<'a> Packet<'a> {
    /// Splits `bytes` into packet fields. Returns `None` if there is not even room for a
    /// header and a checksum.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return None;
        }
        let checksum_at = bytes.len() - CHECKSUM_LEN;

        Some(Packet {
            start: [bytes[0], bytes[1]],
            address: BigEndian::read_u32(&bytes[2..6]),
            kind: bytes[6],
            length: BigEndian::read_u16(&bytes[7..9]),
            payload: &bytes[HEADER_LEN..checksum_at],
            checksum: BigEndian::read_u16(&bytes[checksum_at..]),
        })
    }

    pub fn kind(&self) -> Option<PacketKind> {
        PacketKind::from_byte(self.kind)
    }

    pub fn computed_checksum(&self) -> u16 {
        checksum(self.kind, self.length.to_be_bytes(), self.payload)
    }
}
