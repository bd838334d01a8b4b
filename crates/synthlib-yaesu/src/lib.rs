//! synthlib-yaesu: classic Yaesu binary CAT backend.
//!
//! The pre-ASCII Yaesu rigs speak fixed five-byte binary frames: four
//! parameter bytes and an opcode. A state-changing frame is echoed
//! byte-for-byte by the rig; the host then sends an explicit "go" frame
//! and reads back a fixed-length status block with documented offsets
//! for the BCD-encoded frequencies, the mode bytes, and the flag bits.
//! There is no other acknowledgement -- the status block *is* the
//! confirmation.
//!
//! # Example
//!
//! ```no_run
//! use synthlib_yaesu::YaesuBuilder;
//! use synthlib_core::{Tuner, Vfo};
//!
//! # async fn example() -> synthlib_core::Result<()> {
//! let rig = YaesuBuilder::new()
//!     .serial_port("/dev/ttyUSB1")
//!     .build()
//!     .await?;
//! rig.set_frequency(Vfo::A, 14_250_000).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod protocol;
pub mod rig;

pub use builder::YaesuBuilder;
pub use rig::YaesuRig;
