use arrayvec::ArrayVec;

/// Payload of one outgoing command. The largest, `WriteNotepad`, is 34 bytes.
pub type PayloadBuffer = ArrayVec<[u8; 64]>;

pub trait FromPayload {
    fn from_payload(payload: &[u8]) -> Self;
}

pub trait CommandWriter {
    fn write_cmd_bytes(&mut self, bytes: &[u8]);
}

pub trait ToPayload {
    fn to_payload(&self, writer: &mut dyn CommandWriter);
}

impl CommandWriter for PayloadBuffer {
    fn write_cmd_bytes(&mut self, bytes: &[u8]) {
        let written = self.try_extend_from_slice(bytes);
        debug_assert!(written.is_ok(), "command payload overflow");
    }
}
