// RFID click — CR95HF 13.56 MHz multiprotocol transceiver over SPI.
//
// Every exchange is three phases under software framing: send
// `[0x00, cmd, len, params…]`, poll the ready flag with control byte
// 0x03 (bit 3 set once the response is queued), then read with control
// byte 0x02 into a `[code, len, data…]` frame.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};

use crate::error::Error;

mod ctrl {
    pub const SEND: u8 = 0x00;
    pub const READ: u8 = 0x02;
    pub const POLL: u8 = 0x03;
}

mod cmd {
    pub const IDN: u8 = 0x01;
    pub const PROTOCOL_SELECT: u8 = 0x02;
    pub const SEND_RECV: u8 = 0x04;
    pub const ECHO: u8 = 0x55;
}

const FLAG_DATA_READY: u8 = 0x08;

const RESULT_FRAME_OK: u8 = 0x80;
const RESULT_NO_TAG: u8 = 0x87;

const POLL_INTERVAL_US: u32 = 100;
const POLL_TRIES: u32 = 100;

/// Largest response our convenience commands expect (IDN is 15 bytes).
pub const MAX_RESPONSE: usize = 32;

pub struct Rfid<SPI> {
    spi: SPI,
}

impl<SPI, E> Rfid<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Liveness check: the echo command reflects a bare 0x55.
    pub fn echo<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        self.spi.write(&[ctrl::SEND, cmd::ECHO])?;
        self.wait_ready(delay)?;

        let mut buf = [0u8; 1];
        self.spi
            .transaction(&mut [Operation::Write(&[ctrl::READ]), Operation::Read(&mut buf)])?;
        if buf[0] != cmd::ECHO {
            return Err(Error::Frame);
        }
        Ok(())
    }

    /// Device identification string (13 ASCII bytes + CRC).
    pub fn device_id<D: DelayNs>(
        &mut self,
        delay: &mut D,
        id: &mut [u8; 15],
    ) -> Result<(), Error<E>> {
        let mut resp = [0u8; MAX_RESPONSE];
        let (code, len) = self.command(cmd::IDN, &[], delay, &mut resp)?;
        if code != 0x00 || len != 15 {
            return Err(Error::Frame);
        }
        id.copy_from_slice(&resp[..15]);
        Ok(())
    }

    /// Put the RF field up in ISO 14443-A mode at 106 kbps.
    pub fn select_iso14443a<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        let mut resp = [0u8; MAX_RESPONSE];
        let (code, _) = self.command(cmd::PROTOCOL_SELECT, &[0x02, 0x00], delay, &mut resp)?;
        if code != 0x00 {
            return Err(Error::Frame);
        }
        Ok(())
    }

    /// Single-size anticollision: REQA then cascade level 1, returning the
    /// 4-byte UID. `NoTag` when nothing answers in the field.
    pub fn read_tag_uid<D: DelayNs>(&mut self, delay: &mut D) -> Result<[u8; 4], Error<E>> {
        // REQA, 7 significant bits
        let mut resp = [0u8; MAX_RESPONSE];
        self.transceive(&[0x26, 0x07], delay, &mut resp)?;

        // SEL CL1 + NVB 0x20, 8 significant bits
        let len = self.transceive(&[0x93, 0x20, 0x08], delay, &mut resp)?;
        // UID0..3 + BCC, then reception flags
        if len < 5 {
            return Err(Error::Frame);
        }
        let bcc = resp[0] ^ resp[1] ^ resp[2] ^ resp[3];
        if bcc != resp[4] {
            return Err(Error::Frame);
        }
        Ok([resp[0], resp[1], resp[2], resp[3]])
    }

    /// Raw SendRecv: transmit `data` over the field, response payload into
    /// `resp`. Returns the payload length.
    pub fn transceive<D: DelayNs>(
        &mut self,
        data: &[u8],
        delay: &mut D,
        resp: &mut [u8; MAX_RESPONSE],
    ) -> Result<usize, Error<E>> {
        let (code, len) = self.command(cmd::SEND_RECV, data, delay, resp)?;
        match code {
            RESULT_FRAME_OK => Ok(len),
            RESULT_NO_TAG => Err(Error::NoTag),
            _ => Err(Error::Frame),
        }
    }

    // one full command round-trip; returns (result code, payload length)
    fn command<D: DelayNs>(
        &mut self,
        command: u8,
        params: &[u8],
        delay: &mut D,
        resp: &mut [u8; MAX_RESPONSE],
    ) -> Result<(u8, usize), Error<E>> {
        let mut frame = [0u8; MAX_RESPONSE + 3];
        if params.len() > MAX_RESPONSE {
            return Err(Error::InvalidParam);
        }
        frame[0] = ctrl::SEND;
        frame[1] = command;
        frame[2] = params.len() as u8;
        frame[3..3 + params.len()].copy_from_slice(params);
        self.spi.write(&frame[..3 + params.len()])?;

        self.wait_ready(delay)?;

        let mut hdr = [0u8; 2];
        self.spi.transaction(&mut [
            Operation::Write(&[ctrl::READ]),
            Operation::Read(&mut hdr),
            Operation::Read(resp),
        ])?;
        let len = hdr[1] as usize;
        if len > MAX_RESPONSE {
            return Err(Error::Frame);
        }
        Ok((hdr[0], len))
    }

    fn wait_ready<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        for _ in 0..POLL_TRIES {
            let mut flags = [0u8; 1];
            self.spi.transaction(&mut [
                Operation::Write(&[ctrl::POLL]),
                Operation::Read(&mut flags),
            ])?;
            if flags[0] & FLAG_DATA_READY != 0 {
                return Ok(());
            }
            delay.delay_us(POLL_INTERVAL_US);
        }
        Err(Error::Timeout)
    }
}
