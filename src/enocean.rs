// EnOcean click — TCM 310 gateway module speaking ESP3 over UART.
//
// ESP3 frame: 0x55 sync, 4-byte header (data length u16 BE, optional
// length u8, packet type u8), CRC8 over the header, then data +
// optional data, CRC8 over both. The reader resynchronizes on the next
// sync byte after a bad header CRC; a bad data CRC drops the frame.

use embedded_io::{Read, ReadExactError, Write};

use crate::error::Error;

pub const SYNC: u8 = 0x55;

pub const MAX_DATA: usize = 256;
pub const MAX_OPTIONAL: usize = 16;

/// ESP3 packet types (the ones the module emits).
pub mod packet_type {
    pub const RADIO_ERP1: u8 = 0x01;
    pub const RESPONSE: u8 = 0x02;
    pub const EVENT: u8 = 0x04;
    pub const COMMON_COMMAND: u8 = 0x05;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: u8,
    pub data: heapless::Vec<u8, MAX_DATA>,
    pub optional: heapless::Vec<u8, MAX_OPTIONAL>,
}

pub struct EnOcean<UART> {
    uart: UART,
}

impl<UART, E> EnOcean<UART>
where
    UART: Read<Error = E> + Write<Error = E>,
{
    pub fn new(uart: UART) -> Self {
        Self { uart }
    }

    /// Block until one well-formed ESP3 packet arrives.
    pub fn receive(&mut self) -> Result<Packet, Error<E>> {
        loop {
            let mut byte = [0u8];
            self.read_exact(&mut byte)?;
            if byte[0] != SYNC {
                continue;
            }

            let mut header = [0u8; 5];
            self.read_exact(&mut header)?;
            if crc8(&header[..4]) != header[4] {
                log::warn!("enocean: header CRC mismatch, resyncing");
                continue;
            }

            let data_len = u16::from_be_bytes([header[0], header[1]]) as usize;
            let opt_len = header[2] as usize;
            let packet_type = header[3];
            if data_len > MAX_DATA || opt_len > MAX_OPTIONAL {
                return Err(Error::Frame);
            }

            let mut packet = Packet {
                packet_type,
                data: heapless::Vec::new(),
                optional: heapless::Vec::new(),
            };
            // lengths were checked against the backing capacity above
            let _ = packet.data.resize_default(data_len);
            let _ = packet.optional.resize_default(opt_len);
            self.read_exact(&mut packet.data)?;
            self.read_exact(&mut packet.optional)?;

            let mut crc_byte = [0u8];
            self.read_exact(&mut crc_byte)?;
            let mut crc = crc8(&packet.data);
            crc = crc8_update(crc, &packet.optional);
            if crc != crc_byte[0] {
                return Err(Error::Frame);
            }
            return Ok(packet);
        }
    }

    /// Frame and send one ESP3 packet.
    pub fn send(&mut self, packet: &Packet) -> Result<(), Error<E>> {
        let header = [
            (packet.data.len() >> 8) as u8,
            (packet.data.len() & 0xFF) as u8,
            packet.optional.len() as u8,
            packet.packet_type,
        ];
        self.uart.write_all(&[SYNC])?;
        self.uart.write_all(&header)?;
        self.uart.write_all(&[crc8(&header)])?;
        self.uart.write_all(&packet.data)?;
        self.uart.write_all(&packet.optional)?;
        let crc = crc8_update(crc8(&packet.data), &packet.optional);
        self.uart.write_all(&[crc])?;
        self.uart.flush()?;
        Ok(())
    }

    /// Send an ERP1 radio telegram and wait for the module's RESPONSE
    /// packet (return code 0 = OK).
    pub fn send_radio(&mut self, telegram: &[u8]) -> Result<(), Error<E>> {
        let packet = Packet {
            packet_type: packet_type::RADIO_ERP1,
            data: heapless::Vec::from_slice(telegram).map_err(|_| Error::InvalidParam)?,
            optional: heapless::Vec::new(),
        };
        self.send(&packet)?;

        let response = self.receive()?;
        if response.packet_type != packet_type::RESPONSE
            || response.data.first() != Some(&0x00)
        {
            return Err(Error::Frame);
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.uart.read_exact(buf).map_err(|e| match e {
            ReadExactError::UnexpectedEof => Error::Frame,
            ReadExactError::Other(e) => Error::Bus(e),
        })
    }
}

// CRC8 with polynomial 0x07, as the ESP3 specification defines
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(0, data)
}

fn crc8_update(mut crc: u8, data: &[u8]) -> u8 {
    for &byte in data {
        crc = CRC8_TABLE[(crc ^ byte) as usize];
    }
    crc
}

static CRC8_TABLE: [u8; 256] = build_crc8_table();

const fn build_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    // in-memory UART: reads from a script, captures writes
    struct MockUart {
        rx: Vec<u8>,
        pos: usize,
        tx: Vec<u8>,
    }

    impl MockUart {
        fn new(rx: &[u8]) -> Self {
            Self {
                rx: rx.to_vec(),
                pos: 0,
                tx: Vec::new(),
            }
        }
    }

    impl embedded_io::ErrorType for MockUart {
        type Error = core::convert::Infallible;
    }

    impl Read for MockUart {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.rx.len() - self.pos);
            buf[..n].copy_from_slice(&self.rx[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl Write for MockUart {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn frame(packet_type: u8, data: &[u8], optional: &[u8]) -> Vec<u8> {
        let header = [
            (data.len() >> 8) as u8,
            (data.len() & 0xFF) as u8,
            optional.len() as u8,
            packet_type,
        ];
        let mut out = vec![SYNC];
        out.extend_from_slice(&header);
        out.push(crc8(&header));
        out.extend_from_slice(data);
        out.extend_from_slice(optional);
        let mut crc = crc8(data);
        crc = crc8_update(crc, optional);
        out.push(crc);
        out
    }

    #[test]
    fn crc8_matches_esp3_reference() {
        // CRC8 of a zero-length buffer is 0; single bytes follow the table
        assert_eq!(crc8(&[]), 0x00);
        assert_eq!(crc8(&[0x00]), 0x00);
        assert_eq!(crc8(&[0x01]), 0x07);
        // polynomial 0x07 over "123456789" is the standard check value
        assert_eq!(crc8(b"123456789"), 0xF4);
    }

    #[test]
    fn receives_a_radio_telegram() {
        let data = [0xF6, 0x50, 0x00, 0x29, 0x21, 0x94, 0x30];
        let optional = [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x31, 0x00];
        let uart = MockUart::new(&frame(packet_type::RADIO_ERP1, &data, &optional));
        let mut modem = EnOcean::new(uart);
        let packet = modem.receive().unwrap();
        assert_eq!(packet.packet_type, packet_type::RADIO_ERP1);
        assert_eq!(packet.data.as_slice(), &data);
        assert_eq!(packet.optional.as_slice(), &optional);
    }

    #[test]
    fn resynchronizes_past_line_noise() {
        let mut rx = vec![0x12, 0x34, 0x00];
        rx.extend(frame(packet_type::EVENT, &[0x04], &[]));
        let uart = MockUart::new(&rx);
        let mut modem = EnOcean::new(uart);
        let packet = modem.receive().unwrap();
        assert_eq!(packet.packet_type, packet_type::EVENT);
        assert_eq!(packet.data.as_slice(), &[0x04]);
    }

    #[test]
    fn bad_header_crc_skips_to_next_frame() {
        let mut rx = frame(packet_type::EVENT, &[0x04], &[]);
        rx[5] ^= 0xFF; // corrupt header CRC
        rx.extend(frame(packet_type::EVENT, &[0x07], &[]));
        let uart = MockUart::new(&rx);
        let mut modem = EnOcean::new(uart);
        let packet = modem.receive().unwrap();
        assert_eq!(packet.data.as_slice(), &[0x07]);
    }

    #[test]
    fn bad_data_crc_is_a_frame_error() {
        let mut rx = frame(packet_type::EVENT, &[0x04], &[]);
        let last = rx.len() - 1;
        rx[last] ^= 0xFF;
        let uart = MockUart::new(&rx);
        let mut modem = EnOcean::new(uart);
        assert_eq!(modem.receive(), Err(Error::Frame));
    }

    #[test]
    fn send_emits_the_wire_frame() {
        let uart = MockUart::new(&[]);
        let mut modem = EnOcean::new(uart);
        let packet = Packet {
            packet_type: packet_type::COMMON_COMMAND,
            data: heapless::Vec::from_slice(&[0x08]).unwrap(), // CO_RD_IDBASE
            optional: heapless::Vec::new(),
        };
        modem.send(&packet).unwrap();
        assert_eq!(
            modem.uart.tx,
            frame(packet_type::COMMON_COMMAND, &[0x08], &[])
        );
    }

    #[test]
    fn send_radio_checks_the_response() {
        let rx = frame(packet_type::RESPONSE, &[0x00], &[]);
        let uart = MockUart::new(&rx);
        let mut modem = EnOcean::new(uart);
        let telegram = [0xF6, 0x50, 0x00, 0x29, 0x21, 0x94, 0x30];
        modem.send_radio(&telegram).unwrap();
        // the radio frame went out before the response was consumed
        assert_eq!(
            modem.uart.tx,
            frame(packet_type::RADIO_ERP1, &telegram, &[])
        );
    }
}
