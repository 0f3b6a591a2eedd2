// ADC click — MCP3204 12-bit 4-channel SAR ADC over SPI.
//
// 3-byte transaction: start bit + SGL/DIFF + channel in the first two
// bytes, 12 result bits right-aligned in the last two. Single-ended
// only; the board wires all four inputs to the screw terminals.
//
// The driver keeps the last converted millivolt reading per channel so
// callers can refresh all inputs once and consume them piecemeal.

use embedded_hal::spi::SpiDevice;

use crate::error::Error;

pub const CHANNELS: usize = 4;
pub const RESOLUTION: u16 = 0x0FFF;

const START_SGL: u8 = 0x06;

pub struct Adc<SPI> {
    spi: SPI,
    vref_mv: u16,
    millivolts: [u16; CHANNELS],
}

impl<SPI, E> Adc<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI, vref_mv: u16) -> Self {
        Self {
            spi,
            vref_mv,
            millivolts: [0; CHANNELS],
        }
    }

    /// One conversion on `channel` (0..=3), raw 12-bit code.
    pub fn read_raw(&mut self, channel: u8) -> Result<u16, Error<E>> {
        if channel as usize >= CHANNELS {
            return Err(Error::InvalidParam);
        }
        let mut buf = [
            START_SGL | (channel >> 2),
            (channel & 0x03) << 6,
            0x00,
        ];
        self.spi.transfer_in_place(&mut buf)?;
        Ok((((buf[1] & 0x0F) as u16) << 8) | buf[2] as u16)
    }

    /// Convert `channel` and store the scaled millivolt reading.
    pub fn read_millivolts(&mut self, channel: u8) -> Result<u16, Error<E>> {
        let raw = self.read_raw(channel)?;
        let mv = (raw as u32 * self.vref_mv as u32 / RESOLUTION as u32) as u16;
        self.millivolts[channel as usize] = mv;
        Ok(mv)
    }

    /// Refresh all four stored channel readings.
    pub fn read_all(&mut self) -> Result<(), Error<E>> {
        for ch in 0..CHANNELS as u8 {
            self.read_millivolts(ch)?;
        }
        Ok(())
    }

    /// Last stored millivolt reading for `channel`, without a new conversion.
    pub fn stored_millivolts(&self, channel: u8) -> Option<u16> {
        self.millivolts.get(channel as usize).copied()
    }
}
