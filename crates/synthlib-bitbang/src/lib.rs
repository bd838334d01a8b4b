//! synthlib-bitbang: register-write protocols for chips with no byte
//! interface.
//!
//! Several synthesizer chips are loaded one bit at a time over dedicated
//! control lines rather than through a UART or I2C peripheral:
//!
//! - [`shift`] -- synchronous clock/data/strobe shifting (AD9851-style
//!   serial load, AD9835-style framed 16-bit words)
//! - [`latch`] -- masked writes to write-only latches multiplexed over a
//!   shared data bus, through the session's shadow cache
//! - [`i2c`] -- bit-banged I2C rendered as a waveform of port-byte
//!   samples and sent in one bulk write (FT232R bit-bang mode)
//!
//! There is no protocol-level acknowledgement anywhere in this crate: a
//! successful write means every line transition completed without an I/O
//! error, nothing more.

pub mod i2c;
pub mod latch;
pub mod shift;

pub use latch::LatchWriter;
pub use shift::{BitOrder, ShiftWriter};
