#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use r502_protocol::packet::{encode, BROADCAST_ADDRESS};
use r502_protocol::{Packet, PacketKind, Transport};

/// A damaged response, applied to the next packet the module sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip a payload bit.
    Checksum,
    /// Answer from another address.
    Address(u32),
    /// Answer with this packet kind instead.
    Kind(PacketKind),
    /// Cut the response short by this many bytes.
    Truncate(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    BaudRejected,
    WriteFailed,
    ReadFailed,
}

/// An R502 on the other end of the wire: decodes command packets and queues the answers a
/// real module would send.
#[derive(Debug)]
pub struct SimulatedModule {
    pub address: u32,
    pub password: u32,
    pub packet_size_selector: u8,
    pub baud_multiplier: u8,
    pub security_level: u8,
    pub templates: u16,
    pub finger_present: bool,
    /// Packed image, two pixels per byte. Empty means no valid image.
    pub image: Vec<u8>,
    pub notepad: HashMap<u8, [u8; 32]>,
    /// Nothing is connected: writes vanish, reads time out.
    pub disconnected: bool,
    pub reject_baud_change: bool,
    /// The serial port itself fails.
    pub fail_writes: bool,
    pub fail_reads: bool,
    /// Writes report one byte less than they were given.
    pub short_writes: bool,
    /// Damage for the next packet sent, or for a specific upload data packet.
    pub fault: Option<Fault>,
    pub fault_in_data_packet: Option<(usize, Fault)>,
    /// Drop the upload stream after this many data packets.
    pub stop_stream_after: Option<usize>,

    pub pending: VecDeque<u8>,
    pub writes: usize,
    pub reads: usize,
    pub flushes: usize,
    pub baud_changes: Vec<u8>,
    pub received_commands: Vec<u8>,
}

impl Default for SimulatedModule {
    fn default() -> Self {
        SimulatedModule {
            address: BROADCAST_ADDRESS,
            password: 0,
            packet_size_selector: 2,
            baud_multiplier: 6,
            security_level: 3,
            templates: 0,
            finger_present: true,
            image: Vec::new(),
            notepad: HashMap::new(),
            disconnected: false,
            reject_baud_change: false,
            fail_writes: false,
            fail_reads: false,
            short_writes: false,
            fault: None,
            fault_in_data_packet: None,
            stop_stream_after: None,
            pending: VecDeque::new(),
            writes: 0,
            reads: 0,
            flushes: 0,
            baud_changes: Vec::new(),
            received_commands: Vec::new(),
        }
    }
}

impl SimulatedModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any transport I/O at all.
    pub fn io_calls(&self) -> usize {
        self.writes + self.reads + self.flushes + self.baud_changes.len()
    }

    pub fn packet_len(&self) -> usize {
        32 << self.packet_size_selector
    }

    fn send(&mut self, kind: PacketKind, payload: &[u8], fault: Option<Fault>) {
        let address = match fault {
            Some(Fault::Address(address)) => address,
            _ => self.address,
        };
        let mut frame = encode(kind, payload, address).to_vec();
        match fault {
            Some(Fault::Checksum) => frame[9] ^= 0x01,
            Some(Fault::Kind(kind)) => {
                // keep the checksum valid so only the kind is wrong
                let payload = frame[9..frame.len() - 2].to_vec();
                frame = encode(kind, &payload, address).to_vec();
            }
            Some(Fault::Truncate(by)) => {
                let len = frame.len() - by;
                frame.truncate(len);
            }
            _ => {}
        }
        self.pending.extend(frame);
    }

    fn ack(&mut self, code: u8, body: &[u8]) {
        let mut payload = vec![code];
        payload.extend_from_slice(body);
        let fault = self.fault.take();
        self.send(PacketKind::Acknowledge, &payload, fault);
    }

    fn handle(&mut self, command: &[u8]) {
        let instruction = command[0];
        self.received_commands.push(instruction);

        match instruction {
            // GenImg
            0x01 => {
                if self.finger_present {
                    self.ack(0x00, &[]);
                } else {
                    self.ack(0x02, &[]);
                }
            }
            // Match
            0x03 => self.ack(0x00, &[0x00, 0x64]),
            // Search
            0x04 => self.ack(0x00, &[0x00, 0x05, 0x00, 0xC8]),
            // UpImage
            0x0A => self.stream_image(),
            // SetSysPara
            0x0E => {
                let (parameter, value) = (command[1], command[2]);
                match parameter {
                    4 => self.baud_multiplier = value,
                    5 => self.security_level = value,
                    6 => self.packet_size_selector = value,
                    _ => return self.ack(0x1A, &[]),
                }
                self.ack(0x00, &[]);
            }
            // ReadSysPara
            0x0F => {
                let mut body = Vec::new();
                body.extend_from_slice(&0x0004u16.to_be_bytes()); // password ok
                body.extend_from_slice(&0x0009u16.to_be_bytes());
                body.extend_from_slice(&200u16.to_be_bytes());
                body.extend_from_slice(&u16::from(self.security_level).to_be_bytes());
                body.extend_from_slice(&self.address.to_be_bytes());
                body.extend_from_slice(&u16::from(self.packet_size_selector).to_be_bytes());
                body.extend_from_slice(&u16::from(self.baud_multiplier).to_be_bytes());
                self.ack(0x00, &body);
            }
            // SetPwd
            0x12 => {
                self.password = u32::from_be_bytes([command[1], command[2], command[3], command[4]]);
                self.ack(0x00, &[]);
            }
            // VfyPwd
            0x13 => {
                let given = u32::from_be_bytes([command[1], command[2], command[3], command[4]]);
                if given == self.password {
                    self.ack(0x00, &[]);
                } else {
                    self.ack(0x13, &[]);
                }
            }
            // GetRandomCode
            0x14 => self.ack(0x00, &0xDEAD_BEEFu32.to_be_bytes()),
            // SetAdder
            0x15 => {
                self.address = u32::from_be_bytes([command[1], command[2], command[3], command[4]]);
                self.ack(0x00, &[]);
            }
            // WriteNotepad
            0x18 => {
                let mut page = [0u8; 32];
                page.copy_from_slice(&command[2..34]);
                self.notepad.insert(command[1], page);
                self.ack(0x00, &[]);
            }
            // ReadNotepad
            0x19 => {
                let page = self.notepad.get(&command[1]).copied().unwrap_or([0u8; 32]);
                self.ack(0x00, &page);
            }
            // TemplateNum
            0x1D => {
                let count = self.templates.to_be_bytes();
                self.ack(0x00, &count);
            }
            _ => self.ack(0x00, &[]),
        }
    }

    fn stream_image(&mut self) {
        if self.image.is_empty() {
            return self.ack(0x0F, &[]);
        }
        self.ack(0x00, &[]);

        let image = self.image.clone();
        let chunks: Vec<&[u8]> = image.chunks(self.packet_len()).collect();
        for (index, chunk) in chunks.iter().enumerate() {
            if Some(index) == self.stop_stream_after {
                return;
            }
            let kind = if index + 1 == chunks.len() {
                PacketKind::EndOfData
            } else {
                PacketKind::Data
            };
            let fault = match self.fault_in_data_packet {
                Some((at, fault)) if at == index => Some(fault),
                _ => None,
            };
            self.send(kind, chunk, fault);
        }
    }
}

impl Transport for SimulatedModule {
    type Error = SimError;

    fn write(&mut self, bytes: &[u8]) -> Result<usize, SimError> {
        self.writes += 1;
        if self.fail_writes {
            return Err(SimError::WriteFailed);
        }
        if self.short_writes {
            return Ok(bytes.len() - 1);
        }
        if self.disconnected {
            return Ok(bytes.len());
        }

        let packet = Packet::parse(bytes).expect("engine sent a malformed packet");
        assert_eq!(packet.kind(), Some(PacketKind::Command));
        assert_eq!(usize::from(packet.length), packet.payload.len() + 2);
        assert_eq!(packet.computed_checksum(), packet.checksum);
        // a module ignores packets addressed to someone else
        if packet.address == self.address {
            let payload = packet.payload.to_vec();
            self.handle(&payload);
        }
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, SimError> {
        self.reads += 1;
        if self.fail_reads {
            return Err(SimError::ReadFailed);
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn set_baud_rate(&mut self, multiplier: u8) -> Result<(), SimError> {
        self.baud_changes.push(multiplier);
        if self.reject_baud_change {
            Err(SimError::BaudRejected)
        } else {
            Ok(())
        }
    }

    fn flush(&mut self) -> Result<(), SimError> {
        self.flushes += 1;
        self.pending.clear();
        Ok(())
    }
}

/// A packed test image of `packets` full data packets whose bytes count up.
pub fn test_image(packet_len: usize, packets: usize) -> Vec<u8> {
    (0..packet_len * packets).map(|i| i as u8).collect()
}
