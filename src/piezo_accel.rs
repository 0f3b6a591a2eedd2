// PIEZO ACCEL click — MCP3551 22-bit delta-sigma ADC reading a piezo
// element through the onboard charge amplifier.
//
// No registers: the chip streams one 24-bit frame per conversion. Top
// two bits are OVH/OVL overload flags, the remaining 22 bits are the
// two's-complement result. Conversion-ready is sensed on the RDY line
// (SDO while CS is held low), polled rather than interrupt-serviced.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal::spi::SpiDevice;

use crate::error::Error;

// frame order on SDO: OVL, OVH, then 22 data bits MSB first
const OVL: u32 = 0x80_0000;
const OVH: u32 = 0x40_0000;
const SIGN: u32 = 0x20_0000;

const POLL_INTERVAL_US: u32 = 100;
const POLL_TRIES: u32 = 800; // > one 12.5 SPS conversion period

pub struct PiezoAccel<SPI, RDY> {
    spi: SPI,
    rdy: RDY,
    offset: i32,
}

impl<SPI, RDY, E> PiezoAccel<SPI, RDY>
where
    SPI: SpiDevice<Error = E>,
    RDY: InputPin,
{
    pub fn new(spi: SPI, rdy: RDY) -> Self {
        Self {
            spi,
            rdy,
            offset: 0,
        }
    }

    /// Non-blocking read: `WouldBlock` until the conversion has settled.
    pub fn try_read(&mut self) -> nb::Result<i32, Error<E>> {
        if self.rdy.is_high().unwrap_or(true) {
            return Err(nb::Error::WouldBlock);
        }
        self.read_conversion().map_err(nb::Error::Other)
    }

    /// Poll RDY at a fixed interval until a conversion is ready, then read it.
    pub fn read_blocking<D: DelayNs>(&mut self, delay: &mut D) -> Result<i32, Error<E>> {
        for _ in 0..POLL_TRIES {
            match self.try_read() {
                Ok(value) => return Ok(value),
                Err(nb::Error::WouldBlock) => delay.delay_us(POLL_INTERVAL_US),
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
        Err(Error::Timeout)
    }

    /// Average `samples` conversions into the stored zero offset.
    pub fn calibrate_offset<D: DelayNs>(
        &mut self,
        samples: u8,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        let mut sum: i64 = 0;
        for _ in 0..samples.max(1) {
            sum += self.read_blocking(delay)? as i64;
        }
        self.offset = (sum / samples.max(1) as i64) as i32;
        Ok(())
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Conversion with the calibrated zero offset removed.
    pub fn read_compensated<D: DelayNs>(&mut self, delay: &mut D) -> Result<i32, Error<E>> {
        Ok(self.read_blocking(delay)? - self.offset)
    }

    fn read_conversion(&mut self) -> Result<i32, Error<E>> {
        let mut buf = [0u8; 3];
        self.spi.read(&mut buf)?;
        let raw = ((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | buf[2] as u32;

        // in-range codes sign-extend into both overload bits; they only
        // disagree when the input ran past full scale
        if (raw & OVL != 0) != (raw & OVH != 0) {
            return Err(Error::Overload);
        }

        let value = if raw & SIGN != 0 {
            (raw | 0xFFC0_0000) as i32
        } else {
            (raw & 0x1F_FFFF) as i32
        };
        Ok(value)
    }
}
