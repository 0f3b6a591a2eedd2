// 8x8 click — MAX7219 LED matrix driver.
//
// One 16-bit register write per SPI frame. The driver keeps an 8-byte
// row buffer; glyphs come from the shared 5x8 font and text scrolls
// column by column with a fixed per-step delay.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use crate::error::Error;
use crate::fonts;

pub const WIDTH: usize = 8;
pub const HEIGHT: usize = 8;

const GLYPH_STRIDE: usize = fonts::GLYPH_WIDTH + 1; // 1 blank column between chars

mod reg {
    pub const DIGIT0: u8 = 0x01;
    pub const DECODE_MODE: u8 = 0x09;
    pub const INTENSITY: u8 = 0x0A;
    pub const SCAN_LIMIT: u8 = 0x0B;
    pub const SHUTDOWN: u8 = 0x0C;
    pub const DISPLAY_TEST: u8 = 0x0F;
}

const SCROLL_STEP_MS: u32 = 80;

pub struct LedMatrix<SPI> {
    spi: SPI,
    frame: [u8; HEIGHT],
}

impl<SPI, E> LedMatrix<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            frame: [0; HEIGHT],
        }
    }

    /// Wake the chip and put it into raw (no-decode) matrix mode.
    pub fn init(&mut self, intensity: u8) -> Result<(), Error<E>> {
        self.write_register(reg::DISPLAY_TEST, 0x00)?;
        self.write_register(reg::DECODE_MODE, 0x00)?;
        self.write_register(reg::SCAN_LIMIT, 0x07)?;
        self.set_intensity(intensity)?;
        self.write_register(reg::SHUTDOWN, 0x01)?;
        self.clear()
    }

    /// Duty-cycle brightness, 0..=15.
    pub fn set_intensity(&mut self, intensity: u8) -> Result<(), Error<E>> {
        if intensity > 0x0F {
            return Err(Error::InvalidParam);
        }
        self.write_register(reg::INTENSITY, intensity)
    }

    pub fn clear(&mut self) -> Result<(), Error<E>> {
        self.frame = [0; HEIGHT];
        self.flush()
    }

    /// Set one pixel in the frame buffer; call [`Self::flush`] to show it.
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let mask = 0x80 >> x;
        if on {
            self.frame[y] |= mask;
        } else {
            self.frame[y] &= !mask;
        }
    }

    /// Show a single character, glyph left-aligned.
    pub fn draw_char(&mut self, ch: char) -> Result<(), Error<E>> {
        let glyph = fonts::glyph(ch);
        for y in 0..HEIGHT {
            let mut row = 0u8;
            for (x, col) in glyph.iter().enumerate() {
                if col & (1 << y) != 0 {
                    row |= 0x80 >> x;
                }
            }
            self.frame[y] = row;
        }
        self.flush()
    }

    /// Scroll `text` through the matrix, one column per step.
    pub fn scroll_text<D: DelayNs>(&mut self, text: &str, delay: &mut D) -> Result<(), Error<E>> {
        let total_cols = text.chars().count() * GLYPH_STRIDE + WIDTH;
        for step in 0..total_cols {
            for y in 0..HEIGHT {
                let mut row = 0u8;
                for x in 0..WIDTH {
                    // column `step + x - WIDTH` of the rendered text enters
                    // from the right edge
                    let col_idx = (step + x) as isize - WIDTH as isize;
                    if col_idx >= 0 && text_column(text, col_idx as usize) & (1 << y) != 0 {
                        row |= 0x80 >> x;
                    }
                }
                self.frame[y] = row;
            }
            self.flush()?;
            delay.delay_ms(SCROLL_STEP_MS);
        }
        Ok(())
    }

    /// Push the frame buffer out, one digit register per row.
    pub fn flush(&mut self) -> Result<(), Error<E>> {
        for y in 0..HEIGHT {
            self.write_register(reg::DIGIT0 + y as u8, self.frame[y])?;
        }
        Ok(())
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Error<E>> {
        self.spi.write(&[addr, value])?;
        Ok(())
    }
}

// column `idx` of `text` rendered with the shared font plus spacing
fn text_column(text: &str, idx: usize) -> u8 {
    let ch_idx = idx / GLYPH_STRIDE;
    let col = idx % GLYPH_STRIDE;
    if col >= fonts::GLYPH_WIDTH {
        return 0; // inter-character gap
    }
    match text.chars().nth(ch_idx) {
        Some(ch) => fonts::glyph(ch)[col],
        None => 0,
    }
}
