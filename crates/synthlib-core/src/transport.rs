//! Transport traits for device communication.
//!
//! Three distinct physical interfaces reach the synthesizer chips:
//!
//! - [`Transport`] -- an ordinary byte-oriented link (serial port, bulk USB
//!   endpoint). The transaction engine and the waveform-buffered I2C writer
//!   operate on this.
//! - [`ControlLines`] -- individual control lines (clock, data, strobe) for
//!   chips with no byte-level serial interface at all. The bit-banged
//!   register writers operate on this.
//! - [`ControlTransport`] -- vendor-specific USB control transfers for
//!   dongle tuners whose firmware does the chip programming itself.
//!
//! Protocol engines operate on these traits rather than directly on a port
//! handle, enabling both real hardware control and deterministic unit
//! testing with the mocks from `synthlib-test-harness`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Asynchronous byte-level transport to a device.
///
/// Implementations handle buffering and error mapping at the physical
/// layer. Protocol-level concerns (command framing, response validation)
/// are handled by the engines that consume this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the device.
    ///
    /// Implementations should block until all bytes have been written to
    /// the underlying transport; a short write is an error.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`] if no data is
    /// received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard any bytes already queued on the receive side.
    ///
    /// Called by the transaction engine before every command so a prior
    /// exchange's trailing bytes cannot be mistaken for the new response.
    async fn flush_input(&mut self) -> Result<()> {
        let mut scratch = [0u8; 64];
        loop {
            match self.receive(&mut scratch, Duration::from_millis(1)).await {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(Error::Timeout) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Set the DTR serial control line.
    async fn set_dtr(&mut self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("DTR control not available".into()))
    }

    /// Set the RTS serial control line.
    async fn set_rts(&mut self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("RTS control not available".into()))
    }

    /// Assert or release a break condition on the transmit line.
    async fn set_break(&mut self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("break control not available".into()))
    }

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}

/// The three primitive line operations of a bit-banged control interface,
/// plus the settling delay between transitions.
///
/// A synthesizer with no byte-serial interface is loaded by wiggling a
/// data line while pulsing a clock line, then strobing a latch line to
/// commit the shifted value. How those three roles map onto physical pins
/// (RTS/DTR/break on a serial port, bit positions of a bit-bang FIFO) is
/// the implementation's business.
///
/// `settle` must wait the configured per-chip settling time using a
/// monotonic clock. Calibrated busy-loops are not acceptable here; they
/// do not survive CPU speed changes.
#[async_trait]
pub trait ControlLines: Send + Sync {
    /// Drive the clock line high or low.
    async fn set_clock(&mut self, high: bool) -> Result<()>;

    /// Drive the data line high or low.
    async fn set_data(&mut self, high: bool) -> Result<()>;

    /// Drive the strobe/latch/frame-sync line high or low.
    async fn set_strobe(&mut self, high: bool) -> Result<()>;

    /// Wait the chip's line-settling time.
    async fn settle(&mut self);
}

/// An 8-bit data bus shared between several destination latches, with one
/// strobe line per latch.
///
/// Boards built this way (SDR-1000 and friends) present a byte-wide port
/// whose value is captured into whichever latch gets strobed. The latches
/// are write-only; the shadow copy of their contents lives in
/// [`Session`](crate::session::Session).
#[async_trait]
pub trait LatchBus: Send + Sync {
    /// Present a byte on the shared data bus.
    async fn write_data(&mut self, value: u8) -> Result<()>;

    /// Pulse the strobe line of the given latch, committing the bus value.
    async fn strobe(&mut self, latch: usize) -> Result<()>;

    /// Wait the board's line-settling time.
    async fn settle(&mut self);
}

/// Vendor-specific USB control transfers.
///
/// Dongle tuners (SoftRock AVR-USB and derivatives) expose their firmware
/// commands as vendor control requests carrying a request code, a 16-bit
/// value, a 16-bit index, and a small payload.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Vendor OUT transfer. Returns the number of payload bytes accepted.
    async fn control_out(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize>;

    /// Vendor IN transfer. Returns the number of payload bytes received.
    async fn control_in(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize>;
}
