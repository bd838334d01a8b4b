//! Per-connection device session state.
//!
//! A [`Session`] is created when a connection to a device is opened,
//! mutated exclusively through the success paths of the transaction engine
//! and the bit-banged register writers, and destroyed when the connection
//! is torn down. It is a cache of the last known *commanded* state, not a
//! readback from hardware: most of the chips here are write-only, so the
//! session is the only record of what they currently hold.
//!
//! One session owns one transport; there is no cross-session sharing.

use crate::error::{Error, Result};
use crate::types::{Mode, OscillatorRef, Vfo};

/// Number of shadow latches a session tracks.
///
/// Latch-multiplexed boards in this family have at most four destination
/// latches on the shared data bus.
pub const LATCH_COUNT: usize = 4;

/// Mutable per-connection state for one device.
///
/// The cached frequency/mode must only be updated after the corresponding
/// command has succeeded on the wire, so that a read-back of cached state
/// always reflects the last *successful* command, never a failed attempt.
#[derive(Debug, Clone)]
pub struct Session {
    osc: OscillatorRef,
    current_vfo: Vfo,
    freq_a: Option<u64>,
    freq_b: Option<u64>,
    freq_mem: Option<u64>,
    mode: Option<Mode>,
    shadow: [u8; LATCH_COUNT],
    last_mem_channel: Option<u32>,
    keyer_enabled: bool,
}

impl Session {
    /// Create a fresh session with the given oscillator configuration.
    ///
    /// All cached state starts unknown; shadow latches start at zero, which
    /// matches the hardware state after the reset sequence every backend
    /// runs at open.
    pub fn new(osc: OscillatorRef) -> Self {
        Session {
            osc,
            current_vfo: Vfo::A,
            freq_a: None,
            freq_b: None,
            freq_mem: None,
            mode: None,
            shadow: [0; LATCH_COUNT],
            last_mem_channel: None,
            keyer_enabled: false,
        }
    }

    /// The session's oscillator reference.
    pub fn osc(&self) -> &OscillatorRef {
        &self.osc
    }

    /// Replace the oscillator reference (e.g. after reading the calibrated
    /// crystal frequency from the device at open).
    pub fn set_osc(&mut self, osc: OscillatorRef) {
        self.osc = osc;
    }

    /// The currently selected VFO.
    pub fn current_vfo(&self) -> Vfo {
        self.current_vfo
    }

    /// Record a successful VFO selection.
    pub fn select_vfo(&mut self, vfo: Vfo) {
        self.current_vfo = vfo;
    }

    /// Cached frequency of the given VFO, if one has been commanded.
    pub fn frequency(&self, vfo: Vfo) -> Option<u64> {
        match vfo {
            Vfo::A => self.freq_a,
            Vfo::B => self.freq_b,
            Vfo::Memory => self.freq_mem,
        }
    }

    /// Record a successful frequency change on the given VFO.
    pub fn set_frequency(&mut self, vfo: Vfo, freq_hz: u64) {
        match vfo {
            Vfo::A => self.freq_a = Some(freq_hz),
            Vfo::B => self.freq_b = Some(freq_hz),
            Vfo::Memory => self.freq_mem = Some(freq_hz),
        }
    }

    /// Cached operating mode, if one has been commanded.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Record a successful mode change.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = Some(mode);
    }

    /// The last memory channel selected on this session.
    pub fn last_mem_channel(&self) -> Option<u32> {
        self.last_mem_channel
    }

    /// Record a successful memory-channel selection.
    pub fn set_last_mem_channel(&mut self, channel: u32) {
        self.last_mem_channel = Some(channel);
    }

    /// Whether the one-time keyer setup command has been issued on this
    /// session.
    ///
    /// Session-scoped on purpose: two sessions to two rigs must each do
    /// their own setup.
    pub fn keyer_enabled(&self) -> bool {
        self.keyer_enabled
    }

    /// Mark the one-time keyer setup as done.
    pub fn set_keyer_enabled(&mut self, enabled: bool) {
        self.keyer_enabled = enabled;
    }

    /// Current shadow value of a latch.
    pub fn latch(&self, latch: usize) -> Result<u8> {
        self.shadow
            .get(latch)
            .copied()
            .ok_or_else(|| Error::InvalidParameter(format!("latch {latch} out of range")))
    }

    /// Merge `value` into the shadow copy of `latch` under `mask` and
    /// return the byte that must now be written to the hardware.
    ///
    /// The merge is exactly `(old & !mask) | (value & mask)`: bits outside
    /// the mask keep their previous shadow value. This is what keeps
    /// unrelated functions sharing one write-only latch from clobbering
    /// each other.
    pub fn merge_latch(&mut self, latch: usize, value: u8, mask: u8) -> Result<u8> {
        let old = self.latch(latch)?;
        let merged = (old & !mask) | (value & mask);
        self.shadow[latch] = merged;
        Ok(merged)
    }

    /// Reset every shadow latch to zero (after a hardware reset sequence).
    pub fn clear_latches(&mut self) {
        self.shadow = [0; LATCH_COUNT];
    }
}
