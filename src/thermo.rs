// THERMO click — MAX6675 K-type thermocouple-to-digital converter.
//
// Read-only SPI device: one 16-bit frame per conversion. Bits 14..3 are
// the temperature (0.25 °C/LSB, 0..+1023.75 °C), bit 2 flags an open
// thermocouple input.

use embedded_hal::spi::SpiDevice;

use crate::error::Error;

const OPEN_INPUT: u16 = 0x0004;

pub struct Thermo<SPI> {
    spi: SPI,
}

impl<SPI, E> Thermo<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Raw 16-bit conversion frame, fault bit included.
    pub fn read_raw(&mut self) -> Result<u16, Error<E>> {
        let mut buf = [0u8; 2];
        self.spi.read(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Temperature in °C, or `OpenThermocouple` when the input is floating.
    pub fn temperature(&mut self) -> Result<f32, Error<E>> {
        let raw = self.read_raw()?;
        if raw & OPEN_INPUT != 0 {
            return Err(Error::OpenThermocouple);
        }
        Ok((raw >> 3) as f32 * 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn read_txn(frame: [u8; 2]) -> [SpiTransaction<u8>; 3] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::read_vec(frame.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn quarter_degree_scaling() {
        // 100.0 °C = 400 counts = 0x190, shifted left 3
        let spi = SpiMock::new(&read_txn([0x0C, 0x80]));
        let mut thermo = Thermo::new(spi);
        assert_eq!(thermo.temperature().unwrap(), 100.0);
        thermo.spi.done();
    }

    #[test]
    fn open_input_reports_fault() {
        let spi = SpiMock::new(&read_txn([0x0C, 0x84]));
        let mut thermo = Thermo::new(spi);
        assert_eq!(thermo.temperature(), Err(Error::OpenThermocouple));
        thermo.spi.done();
    }

    #[test]
    fn raw_read_keeps_fault_bit() {
        let spi = SpiMock::new(&read_txn([0x00, 0x04]));
        let mut thermo = Thermo::new(spi);
        assert_eq!(thermo.read_raw().unwrap(), 0x0004);
        thermo.spi.done();
    }
}
