//! synthlib-core: Core traits, types, and error definitions for synthlib.
//!
//! This crate defines the chip-agnostic abstractions that all synthlib
//! backends implement. Applications depend on these types without pulling
//! in any specific tuner driver.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`ControlLines`] -- clock/data/strobe primitives for bit-banged chips
//! - [`ControlTransport`] -- vendor USB control transfers
//! - [`Session`] -- per-connection cached state (VFO, frequency, shadow latches)
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod helpers;
pub mod session;
pub mod transport;
pub mod tuner;
pub mod types;

// Re-export key types at crate root for ergonomic `use synthlib_core::*`.
pub use error::{Error, Result};
pub use helpers::{format_freq_mhz, khz, mhz};
pub use session::{Session, LATCH_COUNT};
pub use transport::{ControlLines, ControlTransport, LatchBus, Transport};
pub use tuner::Tuner;
pub use types::*;
