// BT click — Microchip RN4678 dual-mode Bluetooth module over UART.
//
// ASCII command protocol: `$$$` enters command mode (the module answers
// `CMD> `), commands are CR-terminated, and the module replies `AOK` or
// `Err` plus the prompt. Outside command mode the UART is a transparent
// data pipe to the remote end.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_io::{Read, Write};

use crate::error::Error;

const RESPONSE_MAX: usize = 64;
const RESET_PULSE_MS: u32 = 100;
const RESET_SETTLE_MS: u32 = 500;

pub struct Rn4678<UART, RST> {
    uart: UART,
    rst: RST,
}

impl<UART, RST, E> Rn4678<UART, RST>
where
    UART: Read<Error = E> + Write<Error = E>,
    RST: OutputPin,
{
    pub fn new(uart: UART, rst: RST) -> Self {
        Self { uart, rst }
    }

    /// Hard reset via the RST pin; the module needs ~500 ms to boot.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) {
        let _ = self.rst.set_low();
        delay.delay_ms(RESET_PULSE_MS);
        let _ = self.rst.set_high();
        delay.delay_ms(RESET_SETTLE_MS);
    }

    /// Switch the UART from data mode into command mode.
    pub fn enter_command_mode(&mut self) -> Result<(), Error<E>> {
        self.uart.write_all(b"$$$")?;
        self.uart.flush()?;
        let resp = self.read_line()?;
        if !resp.starts_with(b"CMD") {
            return Err(Error::Frame);
        }
        Ok(())
    }

    /// Leave command mode; the module answers `END`.
    pub fn exit_command_mode(&mut self) -> Result<(), Error<E>> {
        self.command(b"---")
    }

    /// Send one CR-terminated command and check for `AOK`/`END`.
    pub fn command(&mut self, cmd: &[u8]) -> Result<(), Error<E>> {
        self.uart.write_all(cmd)?;
        self.uart.write_all(b"\r")?;
        self.uart.flush()?;
        let resp = self.read_line()?;
        if resp.starts_with(b"AOK") || resp.starts_with(b"END") {
            Ok(())
        } else {
            log::warn!("rn4678: command rejected");
            Err(Error::Frame)
        }
    }

    /// `SN,<name>` — the advertised device name, max 16 characters.
    pub fn set_device_name(&mut self, name: &str) -> Result<(), Error<E>> {
        if name.is_empty() || name.len() > 16 {
            return Err(Error::InvalidParam);
        }
        let mut cmd: heapless::Vec<u8, 20> = heapless::Vec::new();
        // "SN," plus at most 16 bytes always fits
        let _ = cmd.extend_from_slice(b"SN,");
        let _ = cmd.extend_from_slice(name.as_bytes());
        self.command(&cmd)
    }

    /// Transparent data write (data mode).
    pub fn send(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        self.uart.write_all(data)?;
        self.uart.flush()?;
        Ok(())
    }

    /// Transparent data read (data mode); returns bytes received.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Error<E>> {
        Ok(self.uart.read(buf)?)
    }

    // collect one response line, CR/LF stripped, prompt tails tolerated
    fn read_line(&mut self) -> Result<heapless::Vec<u8, RESPONSE_MAX>, Error<E>> {
        let mut line: heapless::Vec<u8, RESPONSE_MAX> = heapless::Vec::new();
        loop {
            let mut byte = [0u8];
            let n = self.uart.read(&mut byte)?;
            if n == 0 {
                if line.is_empty() {
                    return Err(Error::Frame);
                }
                return Ok(line);
            }
            match byte[0] {
                b'\r' | b'\n' => {
                    if !line.is_empty() {
                        return Ok(line);
                    }
                }
                b => {
                    if line.push(b).is_err() {
                        return Err(Error::Frame);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    struct MockUart {
        rx: Vec<u8>,
        pos: usize,
        tx: Vec<u8>,
    }

    impl MockUart {
        fn new(rx: &[u8]) -> Self {
            Self {
                rx: rx.to_vec(),
                pos: 0,
                tx: Vec::new(),
            }
        }
    }

    impl embedded_io::ErrorType for MockUart {
        type Error = core::convert::Infallible;
    }

    impl Read for MockUart {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.rx.len() - self.pos);
            buf[..n].copy_from_slice(&self.rx[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl Write for MockUart {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn no_reset_pin() -> PinMock {
        PinMock::new(&[])
    }

    #[test]
    fn command_mode_entry_expects_prompt() {
        let uart = MockUart::new(b"CMD> ");
        let mut bt = Rn4678::new(uart, no_reset_pin());
        bt.enter_command_mode().unwrap();
        assert_eq!(bt.uart.tx, b"$$$");
        bt.rst.done();
    }

    #[test]
    fn command_sends_cr_and_accepts_aok() {
        let uart = MockUart::new(b"AOK\r\nCMD> ");
        let mut bt = Rn4678::new(uart, no_reset_pin());
        bt.command(b"SS,C0").unwrap();
        assert_eq!(bt.uart.tx, b"SS,C0\r");
        bt.rst.done();
    }

    #[test]
    fn rejected_command_is_an_error() {
        let uart = MockUart::new(b"Err\r\nCMD> ");
        let mut bt = Rn4678::new(uart, no_reset_pin());
        assert_eq!(bt.command(b"SX,1"), Err(Error::Frame));
        bt.rst.done();
    }

    #[test]
    fn device_name_is_length_checked() {
        let uart = MockUart::new(b"AOK\r\n");
        let mut bt = Rn4678::new(uart, no_reset_pin());
        assert_eq!(
            bt.set_device_name("seventeen-chars-x"),
            Err(Error::InvalidParam)
        );
        bt.set_device_name("clicker").unwrap();
        assert_eq!(bt.uart.tx, b"SN,clicker\r");
        bt.rst.done();
    }

    #[test]
    fn reset_pulses_the_pin() {
        let uart = MockUart::new(b"");
        let rst = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut bt = Rn4678::new(uart, rst);
        let mut delay = NoopDelay::new();
        bt.reset(&mut delay);
        bt.rst.done();
    }

    #[test]
    fn transparent_passthrough() {
        let uart = MockUart::new(b"pong");
        let mut bt = Rn4678::new(uart, no_reset_pin());
        bt.send(b"ping").unwrap();
        let mut buf = [0u8; 8];
        let n = bt.receive(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pong");
        assert_eq!(bt.uart.tx, b"ping");
        bt.rst.done();
    }
}
