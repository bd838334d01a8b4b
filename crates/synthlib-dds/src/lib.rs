//! synthlib-dds: direct digital synthesizer kit backends.
//!
//! Three boards, three flavors of the same idea -- shift a tuning word
//! into a write-only chip and strobe it live:
//!
//! - [`Dds60Rig`] (AD9851): 32-bit word plus a control byte, LSB first,
//!   with the x6 reference multiplier and phase-step bits.
//! - [`Elektor304Rig`] (AD9835): 16-bit command frames, MSB first, data
//!   line inverted by the RS-232 drivers, frame-sync framing.
//! - [`Sdr1kRig`] (AD9854 behind a latch board): six tuning-word bytes
//!   funneled through an address/data latch pair on a shared bus, with
//!   the band-relay latch along for the ride.
//!
//! All three are write-only; `get_frequency` answers from the session
//! cache of the last successful write.

pub mod ad9835;
pub mod ad9851;
pub mod sdr1k;

pub use ad9835::Elektor304Rig;
pub use ad9851::Dds60Rig;
pub use sdr1k::Sdr1kRig;
