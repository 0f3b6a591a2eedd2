// Click board peripheral drivers — chip-level and board-independent.
//
// One module per board. Each driver owns its bus handle and pins and is
// generic over the embedded-hal 1.0 traits (plus embedded-io for the
// UART-attached modules); pin assignments and bus wiring stay with the
// host HAL.

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod fonts;

pub mod adc;
pub mod dac;
pub mod dc_motor;
pub mod digipot;
pub mod eeprom;
pub mod eeprom2;
pub mod eink;
pub mod enocean;
pub mod led_matrix;
pub mod lm75;
pub mod piezo_accel;
pub mod relay;
pub mod rfid;
pub mod rn4678;
pub mod thermo;

pub use error::Error;
