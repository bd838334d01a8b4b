//! synthlib-elektor: Elektor SDR-USB receiver backend.
//!
//! A QSD receiver clocked by a CY27EE16 programmable PLL. The PLL's I2C
//! bus is bit-banged through an FT232R in bit-bang mode: SDA and SCL are
//! the low two bits of the port byte, the antenna multiplexer and the
//! attenuator relays ride on the upper bits, and every I2C transaction
//! is rendered to a waveform buffer and pushed in one bulk write.
//!
//! Setting a frequency runs the CY27 triple search, then programs the
//! pump/counter registers and the post divider. The chip is write-only;
//! reads are served from the last programmed plan.

pub mod builder;
pub mod registers;
pub mod rig;

pub use builder::ElektorBuilder;
pub use rig::{Antenna, ElektorRig};
