// DAC click — MCP4921 12-bit SPI DAC.
//
// One 16-bit frame per update: config nibble (/A-B, BUF, /GA, /SHDN)
// then 12 data bits, MSB first. Mode 0, max 20 MHz.

use embedded_hal::spi::SpiDevice;

use crate::error::Error;

pub const VALUE_MAX: u16 = 0x0FFF;

// config nibble, shifted into bits 15..12
const CFG_BUF: u16 = 0x4000;
const CFG_GAIN_1X: u16 = 0x2000;
const CFG_ACTIVE: u16 = 0x1000;

pub struct Dac<SPI> {
    spi: SPI,
    vref_mv: u16,
}

impl<SPI, E> Dac<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI, vref_mv: u16) -> Self {
        Self { spi, vref_mv }
    }

    /// Latch a raw 12-bit code (buffered input, 1x gain, output active).
    pub fn set_value(&mut self, value: u16) -> Result<(), Error<E>> {
        if value > VALUE_MAX {
            return Err(Error::InvalidParam);
        }
        let frame = CFG_BUF | CFG_GAIN_1X | CFG_ACTIVE | value;
        self.spi.write(&frame.to_be_bytes())?;
        Ok(())
    }

    /// Set the output in millivolts, scaled against Vref.
    pub fn set_voltage(&mut self, millivolts: u16) -> Result<(), Error<E>> {
        if millivolts > self.vref_mv {
            return Err(Error::InvalidParam);
        }
        let code = (millivolts as u32 * VALUE_MAX as u32 / self.vref_mv as u32) as u16;
        self.set_value(code)
    }

    /// Power the output stage down (500k load to ground).
    pub fn shutdown(&mut self) -> Result<(), Error<E>> {
        let frame = CFG_BUF | CFG_GAIN_1X; // /SHDN low
        self.spi.write(&frame.to_be_bytes())?;
        Ok(())
    }
}
