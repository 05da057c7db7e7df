use core::convert::TryFrom;
use core::time::Duration;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, error, trace, warn};

use crate::commands::{Command, SysParaSetting};
use crate::config::{BaudRate, Config, PacketSize};
use crate::error::Error;
use crate::header::{self, HeaderError};
use crate::packet::{self, Packet, PacketKind, CHECKSUM_LEN, HEADER_LEN};
use crate::responses::{
    self, AckResult, ConfirmationCode, ReadSysParaResult, Reply, SystemParameters,
    TemplateNumResult,
};
use crate::transport::Transport;
use crate::utils::{PayloadBuffer, ToPayload};

/// Represents a R502 device connected to a U(S)ART.
///
/// Owns the link and the session settings (address, password, packet size, baud rate). The
/// settings only change when the matching command succeeds.
#[derive(Debug)]
pub struct R502<T> {
    pub(crate) transport: T,
    pub(crate) config: Config,
    received: [u8; 384],
    received_len: usize,
}

impl<T> R502<T>
where
    T: Transport,
{
    /// Talks to the module at `address` with otherwise default settings.
    pub fn new(transport: T, address: u32) -> Self {
        Self::with_config(transport, Config::default().with_address(address))
    }

    pub fn with_config(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            received: [0u8; 384],
            received_len: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn address(&self) -> u32 {
        self.config.address
    }

    pub fn packet_size(&self) -> PacketSize {
        self.config.packet_size
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.config.baud_rate
    }

    /// Gives the transport back.
    pub fn release(self) -> T {
        self.transport
    }

    /// Sends a command to the R502 and then blocks waiting for the reply.
    ///
    /// A reply carrying a failure confirmation code is still `Ok`; only transport, integrity,
    /// protocol and input errors are returned as `Err`.
    pub fn send_command(&mut self, cmd: Command) -> Result<Reply, Error<T::Error>> {
        let descriptor = cmd.descriptor();
        let ack = self.exchange(&cmd)?;
        Ok((descriptor.decode)(ack, self.ack_body()))
    }

    pub fn verify_password(&mut self, password: u32) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::VfyPwd { password })
    }

    /// Handshake with the password from the session [`Config`].
    pub fn verify_configured_password(&mut self) -> Result<ConfirmationCode, Error<T::Error>> {
        let password = self.config.password;
        self.verify_password(password)
    }

    pub fn set_password(&mut self, password: u32) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::SetPwd { password })
    }

    /// Moves the module to `address`. On success the session follows it.
    pub fn set_address(&mut self, address: u32) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::SetAdder { address })
    }

    pub fn read_system_parameters(&mut self) -> Result<ReadSysParaResult, Error<T::Error>> {
        let ack = self.exchange(&Command::ReadSysPara)?;
        Ok(responses::decode_read_sys_para(ack, self.ack_body()))
    }

    pub fn template_count(&mut self) -> Result<TemplateNumResult, Error<T::Error>> {
        let ack = self.exchange(&Command::TemplateNum)?;
        Ok(responses::decode_template_num(ack, self.ack_body()))
    }

    /// Captures a finger image into the module's image buffer.
    pub fn generate_image(&mut self) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::GenImg)
    }

    /// Switches the module to `multiplier` × 9600 baud, then the transport.
    ///
    /// The module switches as soon as it has acknowledged at the old speed, so a transport
    /// that fails to follow is reported as [`Error::SpeedChange`] while the session already
    /// records the new speed.
    pub fn set_baud_rate(&mut self, multiplier: u8) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::SetSysPara(SysParaSetting::BaudRate(multiplier)))
    }

    pub fn set_security_level(&mut self, level: u8) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::SetSysPara(SysParaSetting::SecurityLevel(level)))
    }

    /// Sets the data packet length used for bulk transfers; `selector` 0..=3 is 32..=256 bytes.
    ///
    /// The selector is sent as given. Some modules are known to answer with another size than
    /// requested; use [`sync_settings`](Self::sync_settings) to read back what they chose.
    pub fn set_packet_size(&mut self, selector: u8) -> Result<ConfirmationCode, Error<T::Error>> {
        self.status_of(&Command::SetSysPara(SysParaSetting::PacketSize(selector)))
    }

    /// Reads the system parameters and adopts the module's packet size and baud rate.
    pub fn sync_settings(&mut self) -> Result<SystemParameters, Error<T::Error>> {
        let result = self.read_system_parameters()?;
        let params = result.system_parameters;
        if !result.ack.confirmation_code.is_success() {
            warn!("ReadSysPara answered {:?}, keeping settings", result.ack.confirmation_code);
            return Ok(params);
        }

        match u8::try_from(params.packet_size).ok().and_then(|s| PacketSize::try_from(s).ok()) {
            Some(size) => self.config.packet_size = size,
            None => warn!("module reports unknown packet size code {}", params.packet_size),
        }
        match u8::try_from(params.baud_setting).ok().and_then(|m| BaudRate::try_from(m).ok()) {
            Some(baud) => self.config.baud_rate = baud,
            None => warn!("module reports unknown baud setting {}", params.baud_setting),
        }
        Ok(params)
    }

    fn status_of(&mut self, cmd: &Command) -> Result<ConfirmationCode, Error<T::Error>> {
        self.exchange(cmd).map(|ack| ack.confirmation_code)
    }

    /// One command/acknowledgement round trip. The acknowledgement stays in the receive
    /// buffer for the caller to decode.
    pub(crate) fn exchange(&mut self, cmd: &Command) -> Result<AckResult, Error<T::Error>> {
        if let Err(e) = cmd.validate() {
            warn!("not sending {:?}: {}", cmd, e);
            return Err(Error::InvalidInput(e));
        }
        let descriptor = cmd.descriptor();

        let mut payload = PayloadBuffer::new();
        cmd.to_payload(&mut payload);
        debug!("sending {:?}", cmd);
        self.send_packet(PacketKind::Command, &payload)?;

        // SetAdder is acknowledged from the new address already.
        let ack_address = match *cmd {
            Command::SetAdder { address } => address,
            _ => self.config.address,
        };
        let timeout = self.config.timeout(descriptor.timeout);
        self.receive_packet(ack_address, &[PacketKind::Acknowledge], descriptor.ack_len, timeout)?;

        let code = self.received[HEADER_LEN];
        let confirmation_code = match ConfirmationCode::from_byte(code) {
            Some(confirmation_code) => confirmation_code,
            None => {
                error!("instruction {:#04x} answered with unknown code {:#04x}", descriptor.instruction, code);
                self.discard_input();
                return Err(Error::UnknownConfirmationCode(code));
            }
        };
        debug!("instruction {:#04x} answered {:?}", descriptor.instruction, confirmation_code);

        let ack = AckResult {
            address: ack_address,
            confirmation_code,
            checksum: BigEndian::read_u16(&self.received[self.received_len - CHECKSUM_LEN..self.received_len]),
        };

        if confirmation_code.is_success() {
            self.apply(cmd)?;
        }
        Ok(ack)
    }

    /// Follows a setting the module has just accepted.
    fn apply(&mut self, cmd: &Command) -> Result<(), Error<T::Error>> {
        match *cmd {
            Command::SetSysPara(SysParaSetting::BaudRate(multiplier)) => {
                if let Ok(baud) = BaudRate::try_from(multiplier) {
                    self.config.baud_rate = baud;
                }
                self.transport.set_baud_rate(multiplier).map_err(|e| {
                    error!("module is now at {}x9600 baud but the transport is not: {:?}", multiplier, e);
                    Error::SpeedChange(e)
                })?;
            }
            Command::SetSysPara(SysParaSetting::PacketSize(selector)) => {
                if let Ok(size) = PacketSize::try_from(selector) {
                    self.config.packet_size = size;
                }
            }
            Command::SetAdder { address } => self.config.address = address,
            Command::SetPwd { password } => self.config.password = password,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn send_packet(&mut self, kind: PacketKind, payload: &[u8]) -> Result<(), Error<T::Error>> {
        let packet = packet::encode(kind, payload, self.config.address);
        trace!("tx {:02x?}", &packet[..]);

        let written = self.transport.write(&packet).map_err(|e| {
            error!("uart write error: {:?}", e);
            Error::Write(e)
        })?;
        if written != packet.len() {
            error!("uart write error, {} of {} bytes written", written, packet.len());
            return Err(Error::ShortWrite {
                expected: packet.len(),
                written,
            });
        }
        Ok(())
    }

    /// Reads one packet carrying `payload_len` bytes and checks it: checksum first, then the
    /// header against `address`, `accepted` kinds and the implied length field.
    pub(crate) fn receive_packet(
        &mut self,
        address: u32,
        accepted: &[PacketKind],
        payload_len: usize,
        timeout: Duration,
    ) -> Result<PacketKind, Error<T::Error>> {
        let expected = HEADER_LEN + payload_len + CHECKSUM_LEN;
        self.received_len = 0;

        let received = self
            .transport
            .read(&mut self.received[..expected], timeout)
            .map_err(|e| {
                error!("uart read error: {:?}", e);
                Error::Read(e)
            })?;
        if received == 0 {
            error!("uart read error, R502 not found");
            return Err(Error::NotFound);
        }
        if received < expected {
            error!("uart read error, {} of {} bytes received", received, expected);
            self.discard_input();
            return Err(Error::ShortRead { expected, received });
        }
        trace!("rx {:02x?}", &self.received[..expected]);

        let checked = check_packet(
            &self.received[..expected],
            address,
            accepted,
            (payload_len + CHECKSUM_LEN) as u16,
        );
        match checked {
            Ok(kind) => {
                self.received_len = expected;
                Ok(kind)
            }
            Err(e) => {
                error!("invalid response: {}", e);
                self.discard_input();
                Err(e)
            }
        }
    }

    /// Payload of the last received packet.
    pub(crate) fn received_payload(&self) -> &[u8] {
        &self.received[HEADER_LEN..self.received_len - CHECKSUM_LEN]
    }

    /// Acknowledgement fields after the confirmation code.
    fn ack_body(&self) -> &[u8] {
        &self.received_payload()[1..]
    }

    fn discard_input(&mut self) {
        if let Err(e) = self.transport.flush() {
            warn!("could not discard pending input: {:?}", e);
        }
    }
}

fn check_packet<E>(
    frame: &[u8],
    address: u32,
    accepted: &[PacketKind],
    expected_length: u16,
) -> Result<PacketKind, Error<E>> {
    let packet = match Packet::parse(frame) {
        Some(packet) => packet,
        None => {
            return Err(Error::ShortRead {
                expected: HEADER_LEN + CHECKSUM_LEN,
                received: frame.len(),
            })
        }
    };

    let computed = packet.computed_checksum();
    if computed != packet.checksum {
        return Err(Error::Checksum {
            computed,
            received: packet.checksum,
        });
    }

    header::validate(&packet, address, accepted, expected_length)?;
    packet
        .kind()
        .ok_or(Error::Header(HeaderError::Kind { found: packet.kind }))
}
