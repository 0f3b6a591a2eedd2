// eINK click — SSD1608-class monochrome e-paper controller, 200x200.
//
// Frame RAM is packed 1 bit per pixel, MSB first, 25 bytes per row;
// bit set = white. The controller is write-only: commands on DC low,
// payload on DC high, refresh progress polled on the BUSY pin at a
// fixed interval. Full-waveform refresh only — the panel has no
// partial-update LUT.

use core::convert::Infallible;

use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::BinaryColor,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::error::Error;
use crate::fonts;

pub const WIDTH: usize = 200;
pub const HEIGHT: usize = 200;
pub const ROW_BYTES: usize = WIDTH / 8;
pub const BUFFER_SIZE: usize = ROW_BYTES * HEIGHT; // 5000

mod cmd {
    pub const DRIVER_OUTPUT_CONTROL: u8 = 0x01;
    pub const BOOSTER_SOFT_START: u8 = 0x0C;
    pub const DEEP_SLEEP: u8 = 0x10;
    pub const DATA_ENTRY_MODE: u8 = 0x11;
    pub const SW_RESET: u8 = 0x12;
    pub const MASTER_ACTIVATION: u8 = 0x20;
    pub const DISPLAY_UPDATE_CONTROL_2: u8 = 0x22;
    pub const WRITE_RAM: u8 = 0x24;
    pub const WRITE_VCOM: u8 = 0x2C;
    pub const WRITE_LUT: u8 = 0x32;
    pub const SET_DUMMY_LINE: u8 = 0x3A;
    pub const SET_GATE_TIME: u8 = 0x3B;
    pub const SET_RAM_X_RANGE: u8 = 0x44;
    pub const SET_RAM_Y_RANGE: u8 = 0x45;
    pub const SET_RAM_X_COUNTER: u8 = 0x4E;
    pub const SET_RAM_Y_COUNTER: u8 = 0x4F;
}

// full-refresh GC waveform for the 1.54" panel
const LUT_FULL: [u8; 30] = [
    0x02, 0x02, 0x01, 0x11, 0x12, 0x12, 0x22, 0x22, 0x66, 0x69, 0x69, 0x59, 0x58, 0x99, 0x99,
    0x88, 0x00, 0x00, 0x00, 0x00, 0xF8, 0xB4, 0x13, 0x51, 0x35, 0x51, 0x51, 0x19, 0x01, 0x00,
];

const BUSY_POLL_INTERVAL_MS: u32 = 10;
const BUSY_POLL_TRIES: u32 = 400; // 4 s, covers a full GC refresh

pub struct Eink<SPI, DC, RST, BUSY> {
    spi: SPI,
    dc: DC,
    rst: RST,
    busy: BUSY,
    init_done: bool,
}

impl<SPI, DC, RST, BUSY, E> Eink<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice<Error = E>,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            init_done: false,
        }
    }

    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) {
        let _ = self.rst.set_high();
        delay.delay_ms(20);
        let _ = self.rst.set_low();
        delay.delay_ms(2);
        let _ = self.rst.set_high();
        delay.delay_ms(20);
    }

    /// Hardware reset plus the fixed power-up register sequence.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        self.reset(delay);

        self.send_command(cmd::SW_RESET)?;
        self.wait_busy(delay)?;

        self.send_command(cmd::DRIVER_OUTPUT_CONTROL)?;
        self.send_data(&[(HEIGHT - 1) as u8, ((HEIGHT - 1) >> 8) as u8, 0x00])?;

        self.send_command(cmd::BOOSTER_SOFT_START)?;
        self.send_data(&[0xD7, 0xD6, 0x9D])?;

        self.send_command(cmd::WRITE_VCOM)?;
        self.send_data(&[0xA8])?;

        self.send_command(cmd::SET_DUMMY_LINE)?;
        self.send_data(&[0x1A])?;

        self.send_command(cmd::SET_GATE_TIME)?;
        self.send_data(&[0x08])?;

        // X increment, Y increment
        self.send_command(cmd::DATA_ENTRY_MODE)?;
        self.send_data(&[0x03])?;

        self.send_command(cmd::WRITE_LUT)?;
        self.send_data(&LUT_FULL)?;

        self.set_ram_area()?;

        self.init_done = true;
        Ok(())
    }

    /// Stream a frame into RAM and run a full refresh.
    pub fn update<D: DelayNs>(&mut self, frame: &Frame, delay: &mut D) -> Result<(), Error<E>> {
        if !self.init_done {
            self.init(delay)?;
        }

        self.set_ram_area()?;
        self.send_command(cmd::WRITE_RAM)?;
        self.send_data(frame.data())?;

        self.refresh(delay)
    }

    /// Blank the panel to white without a caller-side frame buffer.
    pub fn clear<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        if !self.init_done {
            self.init(delay)?;
        }

        self.set_ram_area()?;
        self.send_command(cmd::WRITE_RAM)?;
        let row = [0xFFu8; ROW_BYTES];
        for _ in 0..HEIGHT {
            self.send_data(&row)?;
        }

        self.refresh(delay)
    }

    /// Lowest-power state; needs a hardware reset (re-`init`) to recover.
    pub fn deep_sleep(&mut self) -> Result<(), Error<E>> {
        self.send_command(cmd::DEEP_SLEEP)?;
        self.send_data(&[0x01])?;
        self.init_done = false;
        Ok(())
    }

    fn refresh<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        // enable clock + analog, display, disable
        self.send_command(cmd::DISPLAY_UPDATE_CONTROL_2)?;
        self.send_data(&[0xC4])?;
        self.send_command(cmd::MASTER_ACTIVATION)?;
        self.wait_busy(delay)
    }

    fn set_ram_area(&mut self) -> Result<(), Error<E>> {
        self.send_command(cmd::SET_RAM_X_RANGE)?;
        self.send_data(&[0x00, (ROW_BYTES - 1) as u8])?;

        self.send_command(cmd::SET_RAM_Y_RANGE)?;
        self.send_data(&[
            0x00,
            0x00,
            (HEIGHT - 1) as u8,
            ((HEIGHT - 1) >> 8) as u8,
        ])?;

        self.send_command(cmd::SET_RAM_X_COUNTER)?;
        self.send_data(&[0x00])?;

        self.send_command(cmd::SET_RAM_Y_COUNTER)?;
        self.send_data(&[0x00, 0x00])?;
        Ok(())
    }

    fn wait_busy<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        for _ in 0..BUSY_POLL_TRIES {
            if self.busy.is_low().unwrap_or(false) {
                return Ok(());
            }
            delay.delay_ms(BUSY_POLL_INTERVAL_MS);
        }
        Err(Error::Timeout)
    }

    fn send_command(&mut self, command: u8) -> Result<(), Error<E>> {
        let _ = self.dc.set_low();
        self.spi.write(&[command])?;
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        let _ = self.dc.set_high();
        self.spi.write(data)?;
        Ok(())
    }
}

/// One full panel frame, drawable via `embedded-graphics` or the shared
/// 5x8 font. Bit set = white.
pub struct Frame {
    buf: [u8; BUFFER_SIZE],
}

impl Frame {
    pub const fn new() -> Self {
        Self {
            buf: [0xFF; BUFFER_SIZE],
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self, black: bool) {
        self.buf.fill(if black { 0x00 } else { 0xFF });
    }

    /// `black = true` darkens the pixel. Out-of-range coordinates are
    /// clipped.
    pub fn set_pixel(&mut self, x: usize, y: usize, black: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let idx = y * ROW_BYTES + x / 8;
        let mask = 0x80 >> (x % 8);
        if black {
            self.buf[idx] &= !mask;
        } else {
            self.buf[idx] |= mask;
        }
    }

    /// Render `text` in the shared 5x8 font with `(x, y)` as the top-left
    /// corner. Returns the x coordinate one column past the rendered text.
    pub fn draw_text(&mut self, x: usize, y: usize, text: &str) -> usize {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = fonts::glyph(ch);
            for (col, bits) in glyph.iter().enumerate() {
                for row in 0..fonts::GLYPH_HEIGHT {
                    if bits & (1 << row) != 0 {
                        self.set_pixel(cx + col, y + row, true);
                    }
                }
            }
            cx += fonts::GLYPH_WIDTH + 1;
        }
        cx
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as usize, point.y as usize, color == BinaryColor::On);
            }
        }
        Ok(())
    }
}
