use byteorder::{BigEndian, ByteOrder};
use log::warn;

use crate::utils::FromPayload;

/// `ReadSysPara` always reports this as the system identifier code.
pub const SYSTEM_IDENTIFIER_CODE: u16 = 0x0009;

/// Status byte that opens every acknowledgement. Names follow the datasheet's descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmationCode {
    /// Command executed.
    Success,
    /// Error when receiving the command packet.
    PacketError,
    FingerNotDetected,
    /// Failed to collect the finger image.
    ImageNotCaptured,
    /// Image too disorderly to generate a character file.
    DisorderlyImage,
    /// Too few character points or too small an image to generate a character file.
    TooFewFeatures,
    /// The fingers do not match.
    NoMatch,
    /// No matching finger in the library.
    NotFound,
    /// Failed to combine the character files.
    CombineFailed,
    /// Page id beyond the finger library.
    PageOutOfRange,
    ReadTemplateFailed,
    UploadTemplateFailed,
    /// The module could not receive the following data packets.
    ReceiveDataFailed,
    UploadImageFailed,
    DeleteTemplateFailed,
    ClearLibraryFailed,
    WrongPassword,
    /// No valid primary image in the image buffer.
    NoValidPrimaryImage,
    FlashWriteFailed,
    NoDefinition,
    InvalidRegister,
    /// Incorrect register configuration.
    WrongRegisterConfig,
    WrongNotepadPage,
    CommPortFailed,
    SensorAbnormal,
}

impl ConfirmationCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let code = match byte {
            0x00 => Self::Success,
            0x01 => Self::PacketError,
            0x02 => Self::FingerNotDetected,
            0x03 => Self::ImageNotCaptured,
            0x06 => Self::DisorderlyImage,
            0x07 => Self::TooFewFeatures,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::CombineFailed,
            0x0B => Self::PageOutOfRange,
            0x0C => Self::ReadTemplateFailed,
            0x0D => Self::UploadTemplateFailed,
            0x0E => Self::ReceiveDataFailed,
            0x0F => Self::UploadImageFailed,
            0x10 => Self::DeleteTemplateFailed,
            0x11 => Self::ClearLibraryFailed,
            0x13 => Self::WrongPassword,
            0x15 => Self::NoValidPrimaryImage,
            0x18 => Self::FlashWriteFailed,
            0x19 => Self::NoDefinition,
            0x1A => Self::InvalidRegister,
            0x1B => Self::WrongRegisterConfig,
            0x1C => Self::WrongNotepadPage,
            0x1D => Self::CommPortFailed,
            0x29 => Self::SensorAbnormal,
            _ => return None,
        };
        Some(code)
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Responses to commands returned by the R502. Names are the same as commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    GenImg(AckResult),
    Img2Tz(AckResult),
    Match(MatchResult),
    Search(SearchResult),
    RegModel(AckResult),
    Store(AckResult),
    LoadChar(AckResult),
    /// Acknowledges the start of an image upload; use [`R502::up_image`](crate::R502::up_image)
    /// to receive the image itself.
    UpImage(AckResult),
    DeletChar(AckResult),
    Empty(AckResult),
    SetSysPara(AckResult),
    /// Contains system status and configuration information
    ReadSysPara(ReadSysParaResult),
    SetPwd(AckResult),
    VfyPwd(AckResult),
    GetRandomCode(RandomCodeResult),
    SetAdder(AckResult),
    WriteNotepad(AckResult),
    ReadNotepad(NotepadResult),
    TemplateNum(TemplateNumResult),
    AuraLedConfig(AckResult),
}

impl Reply {
    pub fn confirmation_code(&self) -> ConfirmationCode {
        self.ack().confirmation_code
    }

    /// The fields every acknowledgement carries.
    pub fn ack(&self) -> &AckResult {
        match self {
            Self::GenImg(ack)
            | Self::Img2Tz(ack)
            | Self::RegModel(ack)
            | Self::Store(ack)
            | Self::LoadChar(ack)
            | Self::UpImage(ack)
            | Self::DeletChar(ack)
            | Self::Empty(ack)
            | Self::SetSysPara(ack)
            | Self::SetPwd(ack)
            | Self::VfyPwd(ack)
            | Self::SetAdder(ack)
            | Self::WriteNotepad(ack)
            | Self::AuraLedConfig(ack) => ack,
            Self::Match(result) => &result.ack,
            Self::Search(result) => &result.ack,
            Self::ReadSysPara(result) => &result.ack,
            Self::GetRandomCode(result) => &result.ack,
            Self::ReadNotepad(result) => &result.ack,
            Self::TemplateNum(result) => &result.ack,
        }
    }
}

/// Acknowledgement with nothing but a confirmation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckResult {
    pub address: u32,
    pub confirmation_code: ConfirmationCode,
    pub checksum: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub ack: AckResult,
    /// Confidence of the match between the two character buffers.
    pub match_score: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub ack: AckResult,
    /// Library index of the matching template.
    pub match_id: u16,
    pub match_score: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSysParaResult {
    pub ack: AckResult,
    pub system_parameters: SystemParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomCodeResult {
    pub ack: AckResult,
    pub random_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotepadResult {
    pub ack: AckResult,
    pub content: [u8; 32],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateNumResult {
    pub ack: AckResult,
    /// Number of valid templates in the library.
    pub template_num: u16,
}

// The decoders below receive the acknowledgement body after the confirmation code. Its
// length has already been checked against the command's descriptor.

pub(crate) fn decode_match(ack: AckResult, body: &[u8]) -> MatchResult {
    MatchResult {
        ack,
        match_score: BigEndian::read_u16(&body[0..2]),
    }
}

pub(crate) fn decode_search(ack: AckResult, body: &[u8]) -> SearchResult {
    SearchResult {
        ack,
        match_id: BigEndian::read_u16(&body[0..2]),
        match_score: BigEndian::read_u16(&body[2..4]),
    }
}

pub(crate) fn decode_read_sys_para(ack: AckResult, body: &[u8]) -> ReadSysParaResult {
    let system_parameters = SystemParameters::from_payload(body);
    if system_parameters.system_identifier_code != SYSTEM_IDENTIFIER_CODE {
        warn!(
            "system identifier is {:#06x}, not {:#06x}",
            system_parameters.system_identifier_code, SYSTEM_IDENTIFIER_CODE
        );
    }
    ReadSysParaResult {
        ack,
        system_parameters,
    }
}

pub(crate) fn decode_random_code(ack: AckResult, body: &[u8]) -> RandomCodeResult {
    RandomCodeResult {
        ack,
        random_number: BigEndian::read_u32(&body[0..4]),
    }
}

pub(crate) fn decode_notepad(ack: AckResult, body: &[u8]) -> NotepadResult {
    let mut content = [0u8; 32];
    content.copy_from_slice(&body[0..32]);
    NotepadResult { ack, content }
}

pub(crate) fn decode_template_num(ack: AckResult, body: &[u8]) -> TemplateNumResult {
    TemplateNumResult {
        ack,
        template_num: BigEndian::read_u16(&body[0..2]),
    }
}

/// System status and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemParameters {
    /// Status information. Use instance methods of SystemParameters to get to individual bits.
    pub status_register: u16,

    /// System identifier code, whatever that means - datasheet says this has a constant value of
    /// 0x0009
    pub system_identifier_code: u16,

    /// Finger library size.
    pub finger_library_size: u16,

    /// Security level [1-5]
    pub security_level: u16,

    /// Device address, in case you forgot, but then you'd need the device address to send it the
    /// `ReadSysPara` command... 🤔
    pub device_address: u32,

    /// Packet size. Actually a size code [0-3]:\
    /// 0 = 32 bytes\
    /// 1 = 64 bytes\
    /// 2 = 128 bytes (the default)\
    /// 3 = 256 bytes
    pub packet_size: u16,

    /// Baud setting. To get actual baud value, multiply by 9600.
    ///
    /// Note, the datasheet contradicts itself as to what's the maximum baud rate supported by
    /// the device, and consequently what's the maximum here. In one place, it says the range is
    /// [1-6], in another it states the max baud rate is 115,200 giving [1-12].
    /// The default value is 6 for 57,600 baud.
    pub baud_setting: u16,
}

impl SystemParameters {
    /// True if the R502 is busy executing another command.
    ///
    /// *Busy* in the datasheet.
    pub fn busy(self) -> bool {
        self.status_register & (1u16 << 0) != 0
    }

    /// True if the module found a matching finger - however you should
    /// always check the response to the actual matching request.
    ///
    /// *Pass* in the datasheet.
    pub fn has_finger_match(self) -> bool {
        self.status_register & (1u16 << 1) != 0
    }

    /// True if the password given in the handshake is correct.
    ///
    /// *PWD* in the datasheet.
    pub fn password_ok(self) -> bool {
        self.status_register & (1u16 << 2) != 0
    }

    /// True if the image buffer contains a valid image.
    ///
    /// *ImgBufStat* in the datasheet.
    pub fn has_valid_image(self) -> bool {
        self.status_register & (1u16 << 3) != 0
    }
}

impl FromPayload for SystemParameters {
    fn from_payload(payload: &[u8]) -> Self {
        // HZ R502's datasheet is a little inconsistent - sometimes the sizes are given in bytes
        // and sometimes in words; words are 16 bit (2 byte).
        // Pick a flipping unit and stick with it!
        SystemParameters {
            status_register: BigEndian::read_u16(&payload[0..2]),
            system_identifier_code: BigEndian::read_u16(&payload[2..4]),
            finger_library_size: BigEndian::read_u16(&payload[4..6]),
            security_level: BigEndian::read_u16(&payload[6..8]),
            device_address: BigEndian::read_u32(&payload[8..12]),
            packet_size: BigEndian::read_u16(&payload[12..14]),
            baud_setting: BigEndian::read_u16(&payload[14..16]),
        }
    }
}
