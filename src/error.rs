// Shared driver error type.
//
// `E` is the underlying bus error (SPI/I2C/UART). The domain variants are
// the few the chips themselves force; there is deliberately no retry or
// recovery machinery here — the caller owns retry policy.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error<E> {
    /// Underlying bus transfer failed.
    #[error("bus transfer failed")]
    Bus(E),

    /// Thermocouple input reads open (MAX6675 bit D2).
    #[error("thermocouple input open")]
    OpenThermocouple,

    /// Delta-sigma conversion overloaded past full scale.
    #[error("conversion overload")]
    Overload,

    /// No transponder answered the inventory command.
    #[error("no tag in field")]
    NoTag,

    /// Response or packet framing did not match the chip's protocol.
    #[error("malformed frame")]
    Frame,

    /// Polled ready/busy condition never arrived.
    #[error("timed out waiting for device")]
    Timeout,

    /// Argument outside the range the chip accepts.
    #[error("parameter out of range")]
    InvalidParam,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}
