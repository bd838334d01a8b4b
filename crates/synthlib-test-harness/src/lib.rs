//! synthlib-test-harness: mock transports for protocol-engine tests.
//!
//! Every seam in `synthlib-core::transport` has a mock here:
//!
//! - [`MockTransport`] -- byte link with pre-loaded request/response pairs
//! - [`MockControlLines`] -- records clock/data/strobe transitions
//! - [`MockLatchBus`] -- records data-bus writes and latch strobes
//! - [`MockControlTransport`] -- scripted vendor USB control transfers
//!
//! These let the solvers, writers, and backends be tested bit-for-bit
//! without hardware on the bench.

pub mod mock_latch;
pub mod mock_lines;
pub mod mock_serial;
pub mod mock_usb;

pub use mock_latch::MockLatchBus;
pub use mock_lines::{LineEvent, MockControlLines};
pub use mock_serial::MockTransport;
pub use mock_usb::{ControlExchange, MockControlTransport};
