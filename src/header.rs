use crate::packet::{Packet, PacketKind, START};

/// The first header field of a received packet that did not match expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("invalid start marker {found:02x?}")]
    Start { found: [u8; 2] },

    #[error("packet is from address {found:#010x}, expected {expected:#010x}")]
    Address { expected: u32, found: u32 },

    #[error("unexpected packet kind {found:#04x}")]
    Kind { found: u8 },

    #[error("length field is {found}, expected {expected}")]
    Length { expected: u16, found: u16 },
}

/// Checks the static header fields of a received packet: start marker, then address, then
/// kind, then length. The first mismatch is reported.
///
/// `expected_length` is the value of the length field, i.e. payload plus checksum.
pub fn validate(
    packet: &Packet<'_>,
    address: u32,
    accepted_kinds: &[PacketKind],
    expected_length: u16,
) -> Result<(), HeaderError> {
    if packet.start != START {
        return Err(HeaderError::Start { found: packet.start });
    }

    if packet.address != address {
        return Err(HeaderError::Address {
            expected: address,
            found: packet.address,
        });
    }

    match packet.kind() {
        Some(kind) if accepted_kinds.contains(&kind) => {}
        _ => return Err(HeaderError::Kind { found: packet.kind }),
    }

    if packet.length != expected_length {
        return Err(HeaderError::Length {
            expected: expected_length,
            found: packet.length,
        });
    }

    Ok(())
}
