// THERMOSTAT click — LM75A digital temperature sensor over I2C.
//
// Four-register map behind a pointer byte. Temperature is 9-bit
// two's-complement at 0.5 °C/LSB, left-justified in two bytes; the
// hysteresis and overtemperature-shutdown setpoints use the same
// encoding.

use embedded_hal::i2c::I2c;

use crate::error::Error;

pub const DEFAULT_ADDR: u8 = 0x48;

mod reg {
    pub const TEMP: u8 = 0x00;
    pub const CONF: u8 = 0x01;
    pub const THYST: u8 = 0x02;
    pub const TOS: u8 = 0x03;
}

const CONF_SHUTDOWN: u8 = 0x01;

pub struct Lm75<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C, E> Lm75<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Temperature in °C at 0.5 °C resolution.
    pub fn temperature(&mut self) -> Result<f32, Error<E>> {
        Ok(self.read_temp_register(reg::TEMP)? as f32 * 0.5)
    }

    /// Enter shutdown (conversions stop, ~4 µA).
    pub fn shutdown(&mut self) -> Result<(), Error<E>> {
        let conf = self.read_config()?;
        self.write_config(conf | CONF_SHUTDOWN)
    }

    pub fn wake(&mut self) -> Result<(), Error<E>> {
        let conf = self.read_config()?;
        self.write_config(conf & !CONF_SHUTDOWN)
    }

    pub fn read_config(&mut self) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.i2c.write_read(self.addr, &[reg::CONF], &mut buf)?;
        Ok(buf[0])
    }

    pub fn write_config(&mut self, value: u8) -> Result<(), Error<E>> {
        self.i2c.write(self.addr, &[reg::CONF, value])?;
        Ok(())
    }

    /// Hysteresis setpoint for the OS output, in half-degrees.
    pub fn set_hysteresis(&mut self, half_degrees: i16) -> Result<(), Error<E>> {
        self.write_temp_register(reg::THYST, half_degrees)
    }

    /// Overtemperature-shutdown setpoint, in half-degrees.
    pub fn set_overtemp(&mut self, half_degrees: i16) -> Result<(), Error<E>> {
        self.write_temp_register(reg::TOS, half_degrees)
    }

    fn read_temp_register(&mut self, reg: u8) -> Result<i16, Error<E>> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(self.addr, &[reg], &mut buf)?;
        Ok(i16::from_be_bytes(buf) >> 7)
    }

    fn write_temp_register(&mut self, reg: u8, half_degrees: i16) -> Result<(), Error<E>> {
        let raw = (half_degrees << 7) as u16;
        self.i2c
            .write(self.addr, &[reg, (raw >> 8) as u8, (raw & 0xFF) as u8])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn positive_temperature_decodes() {
        // +25.5 °C = 51 half-degrees, left-justified
        let i2c = I2cMock::new(&[I2cTransaction::write_read(
            DEFAULT_ADDR,
            vec![0x00],
            vec![0x19, 0x80],
        )]);
        let mut sensor = Lm75::new(i2c, DEFAULT_ADDR);
        assert_eq!(sensor.temperature().unwrap(), 25.5);
        sensor.i2c.done();
    }

    #[test]
    fn negative_temperature_decodes() {
        // -25.0 °C = 0xE70 in 9-bit two's complement, left-justified
        let i2c = I2cMock::new(&[I2cTransaction::write_read(
            DEFAULT_ADDR,
            vec![0x00],
            vec![0xE7, 0x00],
        )]);
        let mut sensor = Lm75::new(i2c, DEFAULT_ADDR);
        assert_eq!(sensor.temperature().unwrap(), -25.0);
        sensor.i2c.done();
    }

    #[test]
    fn shutdown_preserves_other_config_bits() {
        let i2c = I2cMock::new(&[
            I2cTransaction::write_read(DEFAULT_ADDR, vec![0x01], vec![0x18]),
            I2cTransaction::write(DEFAULT_ADDR, vec![0x01, 0x19]),
        ]);
        let mut sensor = Lm75::new(i2c, DEFAULT_ADDR);
        sensor.shutdown().unwrap();
        sensor.i2c.done();
    }

    #[test]
    fn setpoints_left_justify() {
        // 80.0 °C = 160 half-degrees = 0x0A00 left-justified
        let i2c = I2cMock::new(&[I2cTransaction::write(
            DEFAULT_ADDR,
            vec![0x03, 0x50, 0x00],
        )]);
        let mut sensor = Lm75::new(i2c, DEFAULT_ADDR);
        sensor.set_overtemp(160).unwrap();
        sensor.i2c.done();
    }
}
