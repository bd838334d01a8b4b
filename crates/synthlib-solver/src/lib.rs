//! synthlib-solver: pure numeric frequency solvers.
//!
//! Maps a target frequency (plus a reference oscillator and chip-specific
//! constraints) to the register values an outboard synthesizer needs:
//!
//! - [`si570`] -- divider triple (HS_DIV, N1, RFREQ) search for
//!   Si570-family programmable oscillators
//! - [`cy27`] -- (P, Q, Div1N) PLL triple search for CY27EE16-family
//!   clock generators, with the three historical search strategies
//! - [`dds`] -- fixed-point tuning words for direct digital synthesizers
//!
//! Everything in this crate is purely functional: no I/O, no side effects.
//! The only error a solver can produce is
//! [`Error::NoSolution`](synthlib_core::Error::NoSolution) when no legal
//! divider combination keeps the chip's VCO inside its documented range.

pub mod cy27;
pub mod dds;
pub mod si570;

pub use cy27::{Cy27Registers, Cy27Solver, PllTriple, SearchStrategy};
pub use dds::{phase_word, phase_word_to_hz};
pub use si570::{DividerSolution, Si570Solver};
