//! The `Tuner` trait -- unified interface for all device backends.
//!
//! Applications program against `dyn Tuner` without needing to know
//! whether the device underneath is a USB dongle, a bit-banged DDS board,
//! or a full CAT-speaking transceiver. Backends implement the operations
//! their hardware supports; everything else reports `Unsupported`.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{Mode, Vfo};

/// Unified asynchronous interface for frequency-synthesis devices.
///
/// All methods that touch the device are `async` because the underlying
/// transport involves serial or USB round-trips. Cached-state reads on
/// write-only devices resolve without I/O but keep the same signatures.
#[async_trait]
pub trait Tuner: Send + Sync {
    /// Set the RF frequency of a VFO in hertz.
    async fn set_frequency(&self, vfo: Vfo, freq_hz: u64) -> Result<()>;

    /// Get the current RF frequency of a VFO in hertz.
    ///
    /// For write-only chips this is the session's cached value: the last
    /// successfully commanded frequency, not a hardware readback.
    async fn get_frequency(&self, vfo: Vfo) -> Result<u64>;

    /// Select the active VFO.
    async fn select_vfo(&self, _vfo: Vfo) -> Result<()> {
        Err(Error::Unsupported("VFO selection not supported".into()))
    }

    /// Set the operating mode.
    async fn set_mode(&self, _mode: Mode) -> Result<()> {
        Err(Error::Unsupported("mode control not supported".into()))
    }

    /// Get the operating mode.
    async fn get_mode(&self) -> Result<Mode> {
        Err(Error::Unsupported("mode control not supported".into()))
    }

    /// Key or unkey the transmitter.
    async fn set_ptt(&self, _on: bool) -> Result<()> {
        Err(Error::Unsupported("PTT not supported".into()))
    }

    /// Recall a memory channel.
    async fn recall_memory(&self, _channel: u32) -> Result<()> {
        Err(Error::Unsupported("memory channels not supported".into()))
    }

    /// Key a text message in Morse through the rig's keyer.
    async fn send_morse(&self, _msg: &str) -> Result<()> {
        Err(Error::Unsupported("Morse keying not supported".into()))
    }
}
