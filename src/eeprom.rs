// EEPROM click — 24C08 I2C EEPROM (1 KB, four 256-byte blocks).
//
// The two block-select bits ride in the device address, so a memory
// address is 10 bits split across address byte and device address.
// Writes are page-bounded (16 bytes) and followed by acknowledge
// polling until the internal write cycle finishes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::Error;

pub const CAPACITY: u16 = 1024;
pub const PAGE_SIZE: usize = 16;

const BASE_ADDR: u8 = 0x50;

const ACK_POLL_INTERVAL_US: u32 = 500;
const ACK_POLL_TRIES: u32 = 20; // 10 ms, twice the worst-case write cycle

pub struct Eeprom<I2C> {
    i2c: I2C,
}

impl<I2C, E> Eeprom<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    fn device_addr(mem_addr: u16) -> u8 {
        BASE_ADDR | ((mem_addr >> 8) & 0x03) as u8
    }

    pub fn read_byte(&mut self, mem_addr: u16) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.read(mem_addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Sequential read starting at `mem_addr`.
    pub fn read(&mut self, mem_addr: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
        if mem_addr as usize + buf.len() > CAPACITY as usize {
            return Err(Error::InvalidParam);
        }
        self.i2c
            .write_read(Self::device_addr(mem_addr), &[(mem_addr & 0xFF) as u8], buf)?;
        Ok(())
    }

    pub fn write_byte<D: DelayNs>(
        &mut self,
        mem_addr: u16,
        value: u8,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        self.write(mem_addr, &[value], delay)
    }

    /// Write `data` starting at `mem_addr`, split on page boundaries, with
    /// acknowledge polling between pages.
    pub fn write<D: DelayNs>(
        &mut self,
        mem_addr: u16,
        data: &[u8],
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        if mem_addr as usize + data.len() > CAPACITY as usize {
            return Err(Error::InvalidParam);
        }

        let mut addr = mem_addr;
        let mut rest = data;
        while !rest.is_empty() {
            let room = PAGE_SIZE - (addr as usize % PAGE_SIZE);
            let chunk = room.min(rest.len());

            let mut frame = [0u8; PAGE_SIZE + 1];
            frame[0] = (addr & 0xFF) as u8;
            frame[1..=chunk].copy_from_slice(&rest[..chunk]);
            self.i2c
                .write(Self::device_addr(addr), &frame[..=chunk])?;
            self.wait_write_cycle(Self::device_addr(addr), delay)?;

            addr += chunk as u16;
            rest = &rest[chunk..];
        }
        Ok(())
    }

    // the part NAKs its address until the write cycle completes
    fn wait_write_cycle<D: DelayNs>(&mut self, dev: u8, delay: &mut D) -> Result<(), Error<E>> {
        for _ in 0..ACK_POLL_TRIES {
            delay.delay_us(ACK_POLL_INTERVAL_US);
            if self.i2c.write(dev, &[]).is_ok() {
                return Ok(());
            }
        }
        Err(Error::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn block_bits_fold_into_device_address() {
        let i2c = I2cMock::new(&[I2cTransaction::write_read(
            0x53,
            vec![0x10],
            vec![0xAB],
        )]);
        let mut eeprom = Eeprom::new(i2c);
        assert_eq!(eeprom.read_byte(0x0310).unwrap(), 0xAB);
        eeprom.i2c.done();
    }

    #[test]
    fn write_splits_on_page_boundary() {
        // 4 bytes at 0x0E cross the 16-byte page edge: 2 + 2
        let i2c = I2cMock::new(&[
            I2cTransaction::write(0x50, vec![0x0E, 0x01, 0x02]),
            I2cTransaction::write(0x50, vec![]),
            I2cTransaction::write(0x50, vec![0x10, 0x03, 0x04]),
            I2cTransaction::write(0x50, vec![]),
        ]);
        let mut eeprom = Eeprom::new(i2c);
        let mut delay = NoopDelay::new();
        eeprom
            .write(0x000E, &[0x01, 0x02, 0x03, 0x04], &mut delay)
            .unwrap();
        eeprom.i2c.done();
    }

    #[test]
    fn ack_polling_retries_until_ready() {
        use embedded_hal::i2c::ErrorKind;
        let i2c = I2cMock::new(&[
            I2cTransaction::write(0x50, vec![0x00, 0x55]),
            I2cTransaction::write(0x50, vec![]).with_error(ErrorKind::Other),
            I2cTransaction::write(0x50, vec![]),
        ]);
        let mut eeprom = Eeprom::new(i2c);
        let mut delay = NoopDelay::new();
        eeprom.write_byte(0x0000, 0x55, &mut delay).unwrap();
        eeprom.i2c.done();
    }

    #[test]
    fn rejects_reads_past_end() {
        let i2c = I2cMock::new(&[]);
        let mut eeprom = Eeprom::new(i2c);
        let mut buf = [0u8; 2];
        assert_eq!(eeprom.read(0x03FF, &mut buf), Err(Error::InvalidParam));
        eeprom.i2c.done();
    }
}
