// EEPROM 2 click — 25LC256 SPI EEPROM (32 KB, 64-byte pages).
//
// Classic opcode + 16-bit address framing. Every write is preceded by
// WREN and followed by polling WIP in the status register at a fixed
// delay until the part goes idle.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};

use crate::error::Error;

pub const CAPACITY: u32 = 32 * 1024;
pub const PAGE_SIZE: usize = 64;

mod op {
    pub const READ: u8 = 0x03;
    pub const WRITE: u8 = 0x02;
    pub const WREN: u8 = 0x06;
    pub const WRDI: u8 = 0x04;
    pub const RDSR: u8 = 0x05;
    pub const WRSR: u8 = 0x01;
}

const STATUS_WIP: u8 = 0x01;

const WIP_POLL_INTERVAL_US: u32 = 500;
const WIP_POLL_TRIES: u32 = 20; // 10 ms, twice the 5 ms page-write time

pub struct Eeprom2<SPI> {
    spi: SPI,
}

impl<SPI, E> Eeprom2<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Sequential read starting at `addr`.
    pub fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Error<E>> {
        if addr as u32 + buf.len() as u32 > CAPACITY {
            return Err(Error::InvalidParam);
        }
        let hdr = [op::READ, (addr >> 8) as u8, (addr & 0xFF) as u8];
        self.spi
            .transaction(&mut [Operation::Write(&hdr), Operation::Read(buf)])?;
        Ok(())
    }

    /// Write `data` starting at `addr`, split on page boundaries; each page
    /// gets its own WREN and WIP poll.
    pub fn write<D: DelayNs>(
        &mut self,
        addr: u16,
        data: &[u8],
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        if addr as u32 + data.len() as u32 > CAPACITY {
            return Err(Error::InvalidParam);
        }

        let mut addr = addr;
        let mut rest = data;
        while !rest.is_empty() {
            let room = PAGE_SIZE - (addr as usize % PAGE_SIZE);
            let chunk = room.min(rest.len());

            self.spi.write(&[op::WREN])?;
            let hdr = [op::WRITE, (addr >> 8) as u8, (addr & 0xFF) as u8];
            self.spi
                .transaction(&mut [Operation::Write(&hdr), Operation::Write(&rest[..chunk])])?;
            self.wait_idle(delay)?;

            addr += chunk as u16;
            rest = &rest[chunk..];
        }
        Ok(())
    }

    /// Drop the write-enable latch without writing.
    pub fn write_disable(&mut self) -> Result<(), Error<E>> {
        self.spi.write(&[op::WRDI])?;
        Ok(())
    }

    pub fn read_status(&mut self) -> Result<u8, Error<E>> {
        let mut buf = [op::RDSR, 0x00];
        self.spi.transfer_in_place(&mut buf)?;
        Ok(buf[1])
    }

    /// Write the status register (block-protection bits).
    pub fn write_status<D: DelayNs>(&mut self, value: u8, delay: &mut D) -> Result<(), Error<E>> {
        self.spi.write(&[op::WREN])?;
        self.spi.write(&[op::WRSR, value])?;
        self.wait_idle(delay)
    }

    fn wait_idle<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        for _ in 0..WIP_POLL_TRIES {
            delay.delay_us(WIP_POLL_INTERVAL_US);
            if self.read_status()? & STATUS_WIP == 0 {
                return Ok(());
            }
        }
        Err(Error::Timeout)
    }
}
