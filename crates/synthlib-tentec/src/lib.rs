//! synthlib-tentec: Ten-Tec DSP transceiver backend.
//!
//! Ten-Tec's DSP rigs (Jupiter generation) speak a terse ASCII protocol
//! over serial: `*`-prefixed set commands and `?`-prefixed queries, CR
//! terminated, with fixed response lengths and a leading echo of the
//! queried register. A confused DSP answers with stale or short lines;
//! the recovery is a firmware restart command (`XX`) until the radio
//! announces itself, then re-issuing the original command. Both behaviors
//! are folded into [`TentecRig`]'s transaction path.
//!
//! The first-generation receivers ([`Rx320Rig`]) predate direct
//! frequency commands: the host computes three binary tuning factors per
//! tune and the receiver is otherwise write-only.
//!
//! # Example
//!
//! ```no_run
//! use synthlib_tentec::TentecBuilder;
//! use synthlib_core::{Tuner, Vfo};
//!
//! # async fn example() -> synthlib_core::Result<()> {
//! let rig = TentecBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//! rig.set_frequency(Vfo::A, 14_074_000).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod factors;
pub mod protocol;
pub mod rig;
pub mod rx320;

pub use builder::TentecBuilder;
pub use rig::TentecRig;
pub use rx320::Rx320Rig;
