//# Naming conventions etc follow the R502 datasheet, see:
//# https://www.dropbox.com/sh/epucei8lmoz7xpp/AAAmon04b1DiSOeh1q4nAhzAa?dl=0&preview=R502+fingerprint+module+user+manual-V1.2.pdf
use core::convert::TryFrom;
use core::fmt;

use crate::config::{BaudRate, PacketSize, SecurityLevel, Timeout};
use crate::error::InvalidInput;
use crate::responses::{self, AckResult, Reply};
use crate::utils::{CommandWriter, ToPayload};

/// Enum for commands one can send to the R502. Names match the datasheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Captures an image of the fingerprint
    GenImg,

    /// Processes an image into a _character buffer_
    Img2Tz {
        /// Which buffer to store the processed fingerprint data into (there are 2).
        ///
        /// **Note:** The buffers are named **1** and **2**. Any other value defaults to 2.
        buffer: u8,
    },

    /// Compares the two character buffers.
    Match,

    /// Matches the captured fingerprint against a number of stored templates.
    Search {
        /// Which character buffer to search with.
        buffer: u8,

        /// Library index the search starts at.
        start_index: u16,

        /// Number of library entries to search.
        page_count: u16,
    },

    /// Combines both character buffers into a template.
    RegModel,

    /// Stores the template of a character buffer into the library.
    Store { buffer: u8, index: u16 },

    /// Loads a template from the library into a character buffer.
    LoadChar { buffer: u8, index: u16 },

    /// Uploads the image buffer. The acknowledgement is followed by data packets.
    UpImage,

    /// Deletes `num_to_delete` templates starting at `start_index`.
    DeletChar { start_index: u16, num_to_delete: u16 },

    /// Deletes every template in the library.
    Empty,

    /// Writes one system parameter.
    SetSysPara(SysParaSetting),

    /// Reads system status and basic configuration
    ReadSysPara,

    /// Sets the handshake password.
    SetPwd { password: u32 },

    /// Performs a handshake with the device to verify the password.
    /// The default password on the R502 is 0x00000000.
    VfyPwd {
        /// The device password.
        password: u32,
    },

    /// Asks the module for a random number.
    GetRandomCode,

    /// Gives the module a new address. The acknowledgement already comes from it.
    SetAdder { address: u32 },

    /// Writes 32 bytes of user data into a notepad page [0-15].
    WriteNotepad { page: u8, content: [u8; 32] },

    /// Reads a notepad page [0-15].
    ReadNotepad { page: u8 },

    /// Reads the number of valid templates.
    TemplateNum,

    /// Controls the ring LED.
    AuraLedConfig {
        control: LedControl,
        /// Breathing/flashing period, 0x00 (fast) to 0xFF (slow).
        speed: u8,
        colour: LedColour,
        /// Number of breathing/flashing cycles, 0 for infinite.
        cycles: u8,
    },
}

/// A system parameter for `SetSysPara`, carrying the raw value as the caller supplied it.
/// The value is checked before the command is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysParaSetting {
    /// Baud multiplier, one of 1, 2, 4, 6, 12.
    BaudRate(u8),
    /// Security level, 1 to 5.
    SecurityLevel(u8),
    /// Packet size selector, 0 to 3.
    PacketSize(u8),
}

impl SysParaSetting {
    /// Parameter number in the datasheet.
    pub fn number(self) -> u8 {
        match self {
            Self::BaudRate(_) => 4,
            Self::SecurityLevel(_) => 5,
            Self::PacketSize(_) => 6,
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Self::BaudRate(value) | Self::SecurityLevel(value) | Self::PacketSize(value) => value,
        }
    }

    fn validate(self) -> Result<(), InvalidInput> {
        match self {
            Self::BaudRate(multiplier) => BaudRate::try_from(multiplier).map(drop),
            Self::SecurityLevel(level) => SecurityLevel::try_from(level).map(drop),
            Self::PacketSize(selector) => PacketSize::try_from(selector).map(drop),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedControl {
    Breathing,
    Flashing,
    AlwaysOn,
    AlwaysOff,
    GraduallyOn,
    GraduallyOff,
}

impl LedControl {
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Breathing => 0x01,
            Self::Flashing => 0x02,
            Self::AlwaysOn => 0x03,
            Self::AlwaysOff => 0x04,
            Self::GraduallyOn => 0x05,
            Self::GraduallyOff => 0x06,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColour {
    Red,
    Blue,
    Purple,
}

impl LedColour {
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Red => 0x01,
            Self::Blue => 0x02,
            Self::Purple => 0x03,
        }
    }
}

/// Fixed protocol facts about one command.
#[derive(Clone, Copy)]
pub struct Descriptor {
    /// Instruction code, the first payload byte of the command packet.
    pub instruction: u8,
    /// Acknowledgement payload length, confirmation code included.
    pub ack_len: usize,
    pub timeout: Timeout,
    pub(crate) decode: fn(AckResult, &[u8]) -> Reply,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("instruction", &self.instruction)
            .field("ack_len", &self.ack_len)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Descriptor {
    fn new(
        instruction: u8,
        ack_len: usize,
        timeout: Timeout,
        decode: fn(AckResult, &[u8]) -> Reply,
    ) -> Self {
        Descriptor {
            instruction,
            ack_len,
            timeout,
            decode,
        }
    }
}

impl Command {
    pub fn descriptor(&self) -> Descriptor {
        use responses::*;
        use Timeout::{Long, Short};

        match self {
            Self::GenImg => Descriptor::new(0x01, 1, Long, |ack, _| Reply::GenImg(ack)),
            Self::Img2Tz { .. } => Descriptor::new(0x02, 1, Long, |ack, _| Reply::Img2Tz(ack)),
            Self::Match => Descriptor::new(0x03, 3, Long, |ack, body| {
                Reply::Match(decode_match(ack, body))
            }),
            Self::Search { .. } => Descriptor::new(0x04, 5, Long, |ack, body| {
                Reply::Search(decode_search(ack, body))
            }),
            Self::RegModel => Descriptor::new(0x05, 1, Long, |ack, _| Reply::RegModel(ack)),
            Self::Store { .. } => Descriptor::new(0x06, 1, Long, |ack, _| Reply::Store(ack)),
            Self::LoadChar { .. } => Descriptor::new(0x07, 1, Long, |ack, _| Reply::LoadChar(ack)),
            Self::UpImage => Descriptor::new(0x0A, 1, Short, |ack, _| Reply::UpImage(ack)),
            Self::DeletChar { .. } => {
                Descriptor::new(0x0C, 1, Long, |ack, _| Reply::DeletChar(ack))
            }
            Self::Empty => Descriptor::new(0x0D, 1, Long, |ack, _| Reply::Empty(ack)),
            Self::SetSysPara(_) => {
                Descriptor::new(0x0E, 1, Short, |ack, _| Reply::SetSysPara(ack))
            }
            Self::ReadSysPara => Descriptor::new(0x0F, 17, Short, |ack, body| {
                Reply::ReadSysPara(decode_read_sys_para(ack, body))
            }),
            Self::SetPwd { .. } => Descriptor::new(0x12, 1, Short, |ack, _| Reply::SetPwd(ack)),
            Self::VfyPwd { .. } => Descriptor::new(0x13, 1, Short, |ack, _| Reply::VfyPwd(ack)),
            Self::GetRandomCode => Descriptor::new(0x14, 5, Short, |ack, body| {
                Reply::GetRandomCode(decode_random_code(ack, body))
            }),
            Self::SetAdder { .. } => {
                Descriptor::new(0x15, 1, Short, |ack, _| Reply::SetAdder(ack))
            }
            Self::WriteNotepad { .. } => {
                Descriptor::new(0x18, 1, Long, |ack, _| Reply::WriteNotepad(ack))
            }
            Self::ReadNotepad { .. } => Descriptor::new(0x19, 33, Short, |ack, body| {
                Reply::ReadNotepad(decode_notepad(ack, body))
            }),
            Self::TemplateNum => Descriptor::new(0x1D, 3, Short, |ack, body| {
                Reply::TemplateNum(decode_template_num(ack, body))
            }),
            Self::AuraLedConfig { .. } => {
                Descriptor::new(0x35, 1, Short, |ack, _| Reply::AuraLedConfig(ack))
            }
        }
    }

    /// Rejects settings the module would not accept. Called before anything is sent.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        match self {
            Self::SetSysPara(setting) => setting.validate(),
            Self::WriteNotepad { page, .. } | Self::ReadNotepad { page } if *page > 15 => {
                Err(InvalidInput::NotepadPage(*page))
            }
            _ => Ok(()),
        }
    }
}

impl ToPayload for Command {
    fn to_payload(&self, writer: &mut dyn CommandWriter) {
        writer.write_cmd_bytes(&[self.descriptor().instruction]);

        match self {
            // instr  | 0x02 [1]
            // bufid  | buffer [1]
            Self::Img2Tz { buffer } => writer.write_cmd_bytes(&[*buffer]),

            // instr  | 0x04 [1]
            // bufid  | buffer [1]
            // sstart | start_index [2]
            // snum   | page_count [2]
            Self::Search {
                buffer,
                start_index,
                page_count,
            } => {
                writer.write_cmd_bytes(&[*buffer]);
                writer.write_cmd_bytes(&start_index.to_be_bytes()[..]);
                writer.write_cmd_bytes(&page_count.to_be_bytes()[..]);
            }

            // instr  | 0x06 / 0x07 [1]
            // bufid  | buffer [1]
            // pageid | index [2]
            Self::Store { buffer, index } | Self::LoadChar { buffer, index } => {
                writer.write_cmd_bytes(&[*buffer]);
                writer.write_cmd_bytes(&index.to_be_bytes()[..]);
            }

            // instr  | 0x0C [1]
            // pageid | start_index [2]
            // num    | num_to_delete [2]
            Self::DeletChar {
                start_index,
                num_to_delete,
            } => {
                writer.write_cmd_bytes(&start_index.to_be_bytes()[..]);
                writer.write_cmd_bytes(&num_to_delete.to_be_bytes()[..]);
            }

            // instr  | 0x0E [1]
            // param  | parameter number [1]
            // value  | value [1]
            Self::SetSysPara(setting) => {
                writer.write_cmd_bytes(&[setting.number(), setting.value()]);
            }

            // instr  | 0x12 / 0x13 [1]
            // passwd | password [4]
            Self::SetPwd { password } | Self::VfyPwd { password } => {
                writer.write_cmd_bytes(&password.to_be_bytes()[..]);
            }

            // instr  | 0x15 [1]
            // addr   | new address [4]
            Self::SetAdder { address } => writer.write_cmd_bytes(&address.to_be_bytes()[..]),

            // instr  | 0x18 [1]
            // page   | page [1]
            // data   | content [32]
            Self::WriteNotepad { page, content } => {
                writer.write_cmd_bytes(&[*page]);
                writer.write_cmd_bytes(&content[..]);
            }

            Self::ReadNotepad { page } => writer.write_cmd_bytes(&[*page]),

            // instr  | 0x35 [1]
            // ctrl   | control [1]
            // speed  | speed [1]
            // colour | colour [1]
            // times  | cycles [1]
            Self::AuraLedConfig {
                control,
                speed,
                colour,
                cycles,
            } => {
                writer.write_cmd_bytes(&[control.to_byte(), *speed, colour.to_byte(), *cycles]);
            }

            Self::GenImg
            | Self::Match
            | Self::RegModel
            | Self::UpImage
            | Self::Empty
            | Self::ReadSysPara
            | Self::GetRandomCode
            | Self::TemplateNum => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::PayloadBuffer;

    fn payload_of(command: &Command) -> PayloadBuffer {
        let mut payload = PayloadBuffer::new();
        command.to_payload(&mut payload);
        payload
    }

    #[test]
    fn vfy_pwd_carries_the_password_big_endian() {
        let payload = payload_of(&Command::VfyPwd { password: 0x0102_0304 });
        assert_eq!(&payload[..], &[0x13, 0x01, 0x02, 0x03, 0x04][..]);
    }

    #[test]
    fn set_sys_para_carries_parameter_number_and_value() {
        let payload = payload_of(&Command::SetSysPara(SysParaSetting::SecurityLevel(4)));
        assert_eq!(&payload[..], &[0x0E, 5, 4][..]);
    }

    #[test]
    fn search_carries_buffer_start_and_count() {
        let payload = payload_of(&Command::Search {
            buffer: 1,
            start_index: 0x0010,
            page_count: 0x00C8,
        });
        assert_eq!(&payload[..], &[0x04, 0x01, 0x00, 0x10, 0x00, 0xC8][..]);
    }

    #[test]
    fn write_notepad_is_the_largest_payload() {
        let payload = payload_of(&Command::WriteNotepad {
            page: 3,
            content: [0xAA; 32],
        });
        assert_eq!(payload.len(), 34);
        assert_eq!(payload[1], 3);
    }

    #[test]
    fn led_config_uses_datasheet_codes() {
        let payload = payload_of(&Command::AuraLedConfig {
            control: LedControl::Breathing,
            speed: 0x20,
            colour: LedColour::Purple,
            cycles: 0,
        });
        assert_eq!(&payload[..], &[0x35, 0x01, 0x20, 0x03, 0x00][..]);
    }

    #[test]
    fn validation_rejects_out_of_range_settings() {
        assert_eq!(
            Command::SetSysPara(SysParaSetting::SecurityLevel(6)).validate(),
            Err(InvalidInput::SecurityLevel(6))
        );
        assert_eq!(
            Command::SetSysPara(SysParaSetting::BaudRate(5)).validate(),
            Err(InvalidInput::BaudRate(5))
        );
        assert_eq!(
            Command::SetSysPara(SysParaSetting::PacketSize(4)).validate(),
            Err(InvalidInput::PacketSize(4))
        );
        assert_eq!(Command::ReadNotepad { page: 16 }.validate(), Err(InvalidInput::NotepadPage(16)));
        assert_eq!(Command::SetSysPara(SysParaSetting::BaudRate(12)).validate(), Ok(()));
    }

    #[test]
    fn reply_shapes_follow_the_descriptor() {
        assert_eq!(Command::ReadSysPara.descriptor().ack_len, 17);
        assert_eq!(Command::TemplateNum.descriptor().ack_len, 3);
        assert_eq!(Command::ReadNotepad { page: 0 }.descriptor().ack_len, 33);
        assert_eq!(Command::GenImg.descriptor().timeout, Timeout::Long);
    }
}
