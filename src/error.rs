use crate::header::HeaderError;

/// A caller-supplied setting outside the range the module accepts. Nothing is sent when this
/// is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("baud multiplier {0} is not one of 1, 2, 4, 6 or 12")]
    BaudRate(u8),

    #[error("security level {0} is outside 1..=5")]
    SecurityLevel(u8),

    #[error("packet size selector {0} is outside 0..=3")]
    PacketSize(u8),

    #[error("notepad page {0} is outside 0..=15")]
    NotepadPage(u8),
}

/// Coarse grouping of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Writing or reading the serial link failed, or the module did not answer in full.
    Transport,
    /// A packet arrived with a bad checksum.
    Integrity,
    /// A packet arrived intact but did not fit the protocol.
    Protocol,
    /// The request was rejected before anything was sent.
    InvalidInput,
    /// The call cannot start in the current state.
    State,
}

/// Everything that can make an exchange with the R502 fail, with `E` being the transport's
/// own error type.
///
/// A well-formed acknowledgement carrying a failure confirmation code (wrong password, no
/// finger, ...) is *not* an error; it is returned in the reply.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error<E> {
    #[error("invalid input: {0}")]
    InvalidInput(InvalidInput),

    #[error("transport write failed: {0:?}")]
    Write(E),

    #[error("only {written} of {expected} bytes were written")]
    ShortWrite { expected: usize, written: usize },

    #[error("transport read failed: {0:?}")]
    Read(E),

    #[error("R502 not found: no response within the timeout")]
    NotFound,

    #[error("only {received} of {expected} bytes were received")]
    ShortRead { expected: usize, received: usize },

    #[error("failed to change the transport speed: {0:?}")]
    SpeedChange(E),

    #[error("checksum mismatch: computed {computed:#06x}, received {received:#06x}")]
    Checksum { computed: u16, received: u16 },

    #[error("invalid response header: {0}")]
    Header(HeaderError),

    #[error("unknown confirmation code {0:#04x}")]
    UnknownConfirmationCode(u8),

    #[error("no frame consumer was given for the transfer")]
    NotReady,
}

impl<E> Error<E> {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) => ErrorCategory::InvalidInput,
            Self::Write(_)
            | Self::ShortWrite { .. }
            | Self::Read(_)
            | Self::NotFound
            | Self::ShortRead { .. }
            | Self::SpeedChange(_) => ErrorCategory::Transport,
            Self::Checksum { .. } => ErrorCategory::Integrity,
            Self::Header(_) | Self::UnknownConfirmationCode(_) => ErrorCategory::Protocol,
            Self::NotReady => ErrorCategory::State,
        }
    }
}

impl<E> From<InvalidInput> for Error<E> {
    fn from(error: InvalidInput) -> Self {
        Self::InvalidInput(error)
    }
}

impl<E> From<HeaderError> for Error<E> {
    fn from(error: HeaderError) -> Self {
        Self::Header(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn categories_separate_transport_integrity_and_protocol() {
        assert_eq!(Error::<()>::NotFound.category(), ErrorCategory::Transport);
        assert_eq!(
            Error::<()>::Checksum { computed: 1, received: 2 }.category(),
            ErrorCategory::Integrity
        );
        assert_eq!(
            Error::<()>::from(HeaderError::Kind { found: 0x02 }).category(),
            ErrorCategory::Protocol
        );
        assert_eq!(
            Error::<()>::from(InvalidInput::SecurityLevel(6)).category(),
            ErrorCategory::InvalidInput
        );
    }

    #[test]
    fn messages_name_the_offending_values() {
        let error = Error::<()>::Checksum { computed: 0x000a, received: 0x000b };
        assert_eq!(error.to_string(), "checksum mismatch: computed 0x000a, received 0x000b");
        assert_eq!(
            InvalidInput::BaudRate(3).to_string(),
            "baud multiplier 3 is not one of 1, 2, 4, 6 or 12"
        );
    }
}
