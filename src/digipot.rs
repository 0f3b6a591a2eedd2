// DIGI POT click — MCP4161 8-bit digital potentiometer over SPI.
//
// 16-bit command frame: 4-bit register address, 2-bit command, 10-bit
// data (wiper takes 0..=256, so 9 bits used). Mode 0, max 10 MHz.

use embedded_hal::spi::SpiDevice;

use crate::error::Error;

/// Full-scale wiper position (257 taps).
pub const WIPER_MAX: u16 = 0x100;

mod reg {
    pub const WIPER0: u8 = 0x00;
    pub const TCON: u8 = 0x04;
    pub const STATUS: u8 = 0x05;
}

mod cmd {
    pub const WRITE: u8 = 0b00;
    pub const INCREMENT: u8 = 0b01;
    pub const DECREMENT: u8 = 0b10;
    pub const READ: u8 = 0b11;
}

pub struct DigiPot<SPI> {
    spi: SPI,
}

impl<SPI, E> DigiPot<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Set the wiper position, 0 (B terminal) ..= 256 (A terminal).
    pub fn set_wiper(&mut self, position: u16) -> Result<(), Error<E>> {
        if position > WIPER_MAX {
            return Err(Error::InvalidParam);
        }
        self.write_register(reg::WIPER0, position)
    }

    pub fn read_wiper(&mut self) -> Result<u16, Error<E>> {
        self.read_register(reg::WIPER0)
    }

    /// Step the wiper one tap towards terminal A.
    pub fn increment(&mut self) -> Result<(), Error<E>> {
        self.spi
            .write(&[(reg::WIPER0 << 4) | (cmd::INCREMENT << 2)])?;
        Ok(())
    }

    /// Step the wiper one tap towards terminal B.
    pub fn decrement(&mut self) -> Result<(), Error<E>> {
        self.spi
            .write(&[(reg::WIPER0 << 4) | (cmd::DECREMENT << 2)])?;
        Ok(())
    }

    /// Terminal-connection control (R0HW, R0A, R0W, R0B bits).
    pub fn set_tcon(&mut self, value: u16) -> Result<(), Error<E>> {
        self.write_register(reg::TCON, value)
    }

    pub fn read_status(&mut self) -> Result<u16, Error<E>> {
        self.read_register(reg::STATUS)
    }

    fn write_register(&mut self, addr: u8, value: u16) -> Result<(), Error<E>> {
        let hi = (addr << 4) | (cmd::WRITE << 2) | ((value >> 8) & 0x03) as u8;
        self.spi.write(&[hi, (value & 0xFF) as u8])?;
        Ok(())
    }

    fn read_register(&mut self, addr: u8) -> Result<u16, Error<E>> {
        let mut buf = [(addr << 4) | (cmd::READ << 2) | 0x03, 0xFF];
        self.spi.transfer_in_place(&mut buf)?;
        Ok((((buf[0] & 0x03) as u16) << 8) | buf[1] as u16)
    }
}

/// Wiper output in millivolts for a resistive divider fed from `vref_mv`.
pub fn wiper_millivolts(position: u16, vref_mv: u16) -> u16 {
    (position.min(WIPER_MAX) as u32 * vref_mv as u32 / WIPER_MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn set_wiper_frames_nine_data_bits() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x01, 0x00]),
            SpiTransaction::transaction_end(),
        ]);
        let mut pot = DigiPot::new(spi);
        pot.set_wiper(0x100).unwrap();
        pot.spi.done();
    }

    #[test]
    fn set_wiper_rejects_out_of_range() {
        let spi = SpiMock::new(&[]);
        let mut pot = DigiPot::new(spi);
        assert_eq!(pot.set_wiper(0x101), Err(Error::InvalidParam));
        pot.spi.done();
    }

    #[test]
    fn read_wiper_decodes_nine_bits() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x0F, 0xFF], vec![0x01, 0x80]),
            SpiTransaction::transaction_end(),
        ]);
        let mut pot = DigiPot::new(spi);
        assert_eq!(pot.read_wiper().unwrap(), 0x180);
        pot.spi.done();
    }

    #[test]
    fn increment_is_single_byte_command() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x04]),
            SpiTransaction::transaction_end(),
        ]);
        let mut pot = DigiPot::new(spi);
        pot.increment().unwrap();
        pot.spi.done();
    }

    #[test]
    fn wiper_millivolts_scales_against_vref() {
        assert_eq!(wiper_millivolts(0, 3300), 0);
        assert_eq!(wiper_millivolts(0x100, 3300), 3300);
        assert_eq!(wiper_millivolts(0x80, 3300), 1650);
    }
}
