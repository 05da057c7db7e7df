//! Image upload (`UpImage`): one acknowledgement followed by a stream of data packets.
//!
//! The sensor packs two 4-bit pixels into every byte. Each packet is expanded to one byte per
//! pixel before it is handed to the caller's frame consumer, so a consumer sees twice as many
//! bytes as travelled over the wire.
use log::{debug, trace};

use crate::commands::Command;
use crate::driver::R502;
use crate::error::Error;
use crate::packet::{PacketKind, MAX_PAYLOAD_LEN};
use crate::responses::ConfirmationCode;
use crate::transport::Transport;

/// Kinds a data stream may consist of.
const STREAM_KINDS: [PacketKind; 2] = [PacketKind::Data, PacketKind::EndOfData];

/// Splits every packed byte into two 8-bit samples: the high nibble stays in place, the low
/// nibble is shifted up into its position. Returns the number of bytes written to `out`.
///
/// # Panics
///
/// If `out` is shorter than twice `raw`.
pub fn expand_nibbles(raw: &[u8], out: &mut [u8]) -> usize {
    let pixels = &mut out[..raw.len() * 2];
    for (byte, pair) in raw.iter().zip(pixels.chunks_exact_mut(2)) {
        pair[0] = byte & 0xF0;
        pair[1] = (byte & 0x0F) << 4;
    }
    raw.len() * 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferState {
    Idle,
    AwaitingAck,
    Streaming,
}

impl TransferState {
    fn can_enter(self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Idle, AwaitingAck) | (AwaitingAck, Streaming) | (AwaitingAck, Idle) | (Streaming, Idle)
        )
    }
}

/// Outcome of an image upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpImageResult {
    /// What the module answered to `UpImage`. No data follows unless this is a success.
    pub confirmation_code: ConfirmationCode,
    /// Data packets delivered to the consumer.
    pub frames: usize,
    /// Raw bytes received over the wire, before expansion.
    pub bytes_received: usize,
}

/// Per-call upload state. Nothing outlives the call.
struct TransferSession<'c> {
    state: TransferState,
    frame_len: usize,
    frames: usize,
    bytes_received: usize,
    consumer: &'c mut dyn FnMut(&[u8]),
    pixels: [u8; 2 * MAX_PAYLOAD_LEN],
}

impl<'c> TransferSession<'c> {
    fn new(frame_len: usize, consumer: &'c mut dyn FnMut(&[u8])) -> Self {
        TransferSession {
            state: TransferState::Idle,
            frame_len,
            frames: 0,
            bytes_received: 0,
            consumer,
            pixels: [0u8; 2 * MAX_PAYLOAD_LEN],
        }
    }

    fn enter(&mut self, state: TransferState) {
        debug_assert!(
            self.state.can_enter(state),
            "upload cannot go from {:?} to {:?}",
            self.state,
            state
        );
        trace!("upload: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Expands one packet and hands it to the consumer. The pixel buffer is reused for the
    /// next packet.
    fn deliver(&mut self, payload: &[u8]) {
        let len = expand_nibbles(payload, &mut self.pixels);
        self.frames += 1;
        self.bytes_received += payload.len();
        (self.consumer)(&self.pixels[..len]);
    }

    fn finish(mut self, confirmation_code: ConfirmationCode) -> UpImageResult {
        self.enter(TransferState::Idle);
        UpImageResult {
            confirmation_code,
            frames: self.frames,
            bytes_received: self.bytes_received,
        }
    }
}

impl<T> R502<T>
where
    T: Transport,
{
    /// Uploads the module's image buffer, calling `consumer` once per data packet with the
    /// expanded pixels. The slice is only valid during the call.
    ///
    /// Packets are expected to be as long as the session's [packet size](crate::Config::packet_size),
    /// so it must match the module's setting (see [`sync_settings`](Self::sync_settings)).
    ///
    /// Fails with [`Error::NotReady`] before sending anything if `consumer` is `None`. If the
    /// module refuses the upload, its confirmation code is returned and the consumer is never
    /// called. Any error while streaming aborts the upload.
    pub fn up_image(
        &mut self,
        consumer: Option<&mut dyn FnMut(&[u8])>,
    ) -> Result<UpImageResult, Error<T::Error>> {
        let consumer = consumer.ok_or(Error::NotReady)?;
        let mut session = TransferSession::new(self.config.packet_size.len(), consumer);

        session.enter(TransferState::AwaitingAck);
        let ack = self.exchange(&Command::UpImage)?;
        if !ack.confirmation_code.is_success() {
            debug!("upload refused: {:?}", ack.confirmation_code);
            return Ok(session.finish(ack.confirmation_code));
        }

        session.enter(TransferState::Streaming);
        let address = self.config.address;
        let timeout = self.config.frame_timeout;
        loop {
            let kind = self.receive_packet(address, &STREAM_KINDS, session.frame_len, timeout)?;
            session.deliver(self.received_payload());
            trace!("upload: packet {} ({:?})", session.frames, kind);

            if kind == PacketKind::EndOfData {
                break;
            }
        }

        debug!(
            "upload complete: {} packets, {} bytes",
            session.frames, session.bytes_received
        );
        Ok(session.finish(ack.confirmation_code))
    }
}
