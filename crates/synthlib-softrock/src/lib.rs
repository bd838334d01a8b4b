//! synthlib-softrock: SoftRock / Si570 USB tuner backend.
//!
//! These tuners put an Si570 programmable oscillator behind a small AVR
//! or PIC microcontroller speaking vendor USB control transfers. Two
//! generations of firmware exist:
//!
//! - the original firmware expects the host to solve the Si570 divider
//!   problem itself and ship a raw register image;
//! - PE0FKO-descended firmware (version >= 0x0F00) and the PIC/Peaberry
//!   units solve on the device and accept an 11.21 fixed-point MHz value.
//!
//! The driver probes the firmware version at open, reads the calibrated
//! crystal frequency where the firmware publishes it, and picks the
//! matching set-frequency path automatically.
//!
//! # Example
//!
//! ```no_run
//! use synthlib_softrock::{models, SoftRockBuilder};
//! use synthlib_core::{Tuner, Vfo};
//!
//! # async fn example() -> synthlib_core::Result<()> {
//! let rig = SoftRockBuilder::new(models::si570_avr_usb())
//!     .build()
//!     .await?;
//! rig.set_frequency(Vfo::A, 7_100_000).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod models;
pub mod requests;
pub mod rig;

pub use builder::SoftRockBuilder;
pub use models::SoftRockModel;
pub use rig::SoftRockRig;
