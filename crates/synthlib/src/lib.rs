//! # synthlib -- Frequency-Synthesis Control for SDR Kits and Classic Rigs
//!
//! `synthlib` is an asynchronous Rust library for driving the frequency
//! synthesizers of amateur-radio tuners and transceivers: Si570 USB
//! dongles, CY27-based PLL receivers, bit-banged DDS boards, and rigs
//! that speak a command language over a serial link.
//!
//! ## Quick Start
//!
//! Add `synthlib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! synthlib = { version = "0.1", features = ["softrock"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Tune a SoftRock to 7.1 MHz:
//!
//! ```no_run
//! use synthlib::{Tuner, Vfo};
//! use synthlib::softrock::{models, SoftRockBuilder};
//!
//! #[tokio::main]
//! async fn main() -> synthlib::Result<()> {
//!     let rig = SoftRockBuilder::new(models::si570_avr_usb())
//!         .build()
//!         .await?;
//!     rig.set_frequency(Vfo::A, 7_100_000).await?;
//!     println!("tuned to {} Hz", rig.get_frequency(Vfo::A).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                  | Purpose                                      |
//! |------------------------|----------------------------------------------|
//! | `synthlib-core`        | Traits ([`Tuner`], [`Transport`]), session state, errors |
//! | `synthlib-solver`      | Si570 / CY27 / DDS numeric solvers           |
//! | `synthlib-transaction` | Command/response engine with retry and resync |
//! | `synthlib-bitbang`     | Clock/data/strobe, latch, and I2C writers     |
//! | `synthlib-transport`   | Serial, USB control, FTDI bit-bang transports |
//! | `synthlib-softrock`    | Si570 AVR/PIC USB tuners                      |
//! | `synthlib-elektor`     | Elektor SDR-USB (CY27EE16) receiver           |
//! | `synthlib-dds`         | DDS-60, Elektor 3/04, SDR-1000 boards         |
//! | `synthlib-tentec`      | Ten-Tec DSP transceivers (ASCII protocol)     |
//! | `synthlib-yaesu`       | Classic Yaesu rigs (5-byte binary frames)     |
//! | **`synthlib`**         | This facade crate -- re-exports everything    |
//!
//! All device drivers implement the [`Tuner`] trait, so application code
//! can work with `dyn Tuner` and stay device-agnostic.
//!
//! ## Feature Flags
//!
//! Each backend is gated behind a feature flag, all on by default:
//! `softrock`, `elektor`, `dds`, `tentec`, `yaesu`.

pub use synthlib_core::*;

/// Numeric frequency solvers (usable standalone).
pub mod solver {
    pub use synthlib_solver::*;
}

/// The command/response transaction engine.
pub mod transaction {
    pub use synthlib_transaction::*;
}

/// Bit-banged register-write protocols.
pub mod bitbang {
    pub use synthlib_bitbang::*;
}

/// Physical transports (serial, USB control, FTDI bit-bang).
pub mod transport {
    pub use synthlib_transport::*;
}

/// SoftRock / Si570 USB tuner backend.
#[cfg(feature = "softrock")]
pub mod softrock {
    pub use synthlib_softrock::*;
}

/// Elektor SDR-USB (CY27EE16 PLL) receiver backend.
#[cfg(feature = "elektor")]
pub mod elektor {
    pub use synthlib_elektor::*;
}

/// DDS kit backends (DDS-60, Elektor 3/04, SDR-1000).
#[cfg(feature = "dds")]
pub mod dds {
    pub use synthlib_dds::*;
}

/// Ten-Tec DSP transceiver backend.
#[cfg(feature = "tentec")]
pub mod tentec {
    pub use synthlib_tentec::*;
}

/// Classic Yaesu binary CAT backend.
#[cfg(feature = "yaesu")]
pub mod yaesu {
    pub use synthlib_yaesu::*;
}
