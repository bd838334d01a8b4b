//! DDS-60 daughterboard (AD9851) driver.
//!
//! The AD9851 serial load takes 32 tuning-word bits followed by an
//! 8-bit control word, least significant bit first, then a load strobe.
//! The control word carries the 6x reference-clock multiplier enable and
//! a 5-bit output phase offset in 11.25 degree steps.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use synthlib_bitbang::ShiftWriter;
use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::ControlLines;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{OscillatorRef, Vfo};
use synthlib_solver::dds;

/// Output phase granularity of the AD9851, in degrees.
pub const PHASE_STEP_DEG: f64 = 11.25;

/// Configuration for a DDS-60.
#[derive(Debug, Clone, Copy)]
pub struct Dds60Config {
    /// On-board reference oscillator in Hz (30 MHz stock).
    pub osc_freq_hz: f64,
    /// Enable the chip's 6x reference multiplier (stock boards do).
    pub multiplier_x6: bool,
    /// IF offset added to every target before conversion, in Hz.
    pub if_mix_freq_hz: f64,
    /// Output phase offset in 11.25 degree steps (0..31).
    pub phase_step: u8,
}

impl Default for Dds60Config {
    fn default() -> Self {
        Dds60Config {
            osc_freq_hz: 30e6,
            multiplier_x6: true,
            if_mix_freq_hz: 0.0,
            phase_step: 0,
        }
    }
}

impl Dds60Config {
    /// System clock the phase accumulator runs from.
    pub fn system_clock_hz(&self) -> f64 {
        if self.multiplier_x6 {
            self.osc_freq_hz * 6.0
        } else {
            self.osc_freq_hz
        }
    }

    /// The control word shifted after the tuning word.
    pub fn control_word(&self) -> u8 {
        let mult = u8::from(self.multiplier_x6);
        mult | ((self.phase_step & 0x1F) << 3)
    }
}

/// Driver for the DDS-60 (AD9851) board.
pub struct Dds60Rig<L: ControlLines> {
    lines: Mutex<L>,
    session: Mutex<Session>,
    config: Dds60Config,
    writer: ShiftWriter,
}

impl<L: ControlLines> Dds60Rig<L> {
    /// Build the driver and run the chip's serial-load enable sequence.
    pub async fn open(lines: L, config: Dds60Config) -> Result<Self> {
        if config.phase_step > 31 {
            return Err(Error::InvalidParameter(format!(
                "phase step {} beyond 31",
                config.phase_step
            )));
        }

        let rig = Dds60Rig {
            lines: Mutex::new(lines),
            session: Mutex::new(Session::new(OscillatorRef::new(config.osc_freq_hz, 1.0))),
            config,
            writer: ShiftWriter::lsb_first(),
        };

        // Serial-load enable: one bare clock pulse, then one load pulse.
        {
            let mut lines = rig.lines.lock().await;
            lines.set_clock(false).await?;
            lines.settle().await;
            lines.set_clock(true).await?;
            lines.settle().await;
            lines.set_clock(false).await?;
            lines.settle().await;
            rig.writer.pulse_strobe(&mut *lines).await?;
        }
        Ok(rig)
    }

    /// Access the wrapped control lines (mock inspection in tests).
    #[cfg(test)]
    pub(crate) async fn lines(&self) -> tokio::sync::MutexGuard<'_, L> {
        self.lines.lock().await
    }
}

#[async_trait]
impl<L: ControlLines> Tuner for Dds60Rig<L> {
    async fn set_frequency(&self, _vfo: Vfo, freq_hz: u64) -> Result<()> {
        let target = freq_hz as f64 + self.config.if_mix_freq_hz;
        let word = dds::phase_word(target, self.config.system_clock_hz(), 32);
        let control = self.config.control_word();
        trace!(freq_hz, word, control, "AD9851 load");

        {
            let mut lines = self.lines.lock().await;
            self.writer.shift_bits(&mut *lines, word, 32).await?;
            self.writer
                .shift_bits(&mut *lines, control as u64, 8)
                .await?;
            self.writer.pulse_strobe(&mut *lines).await?;
        }

        self.session.lock().await.set_frequency(Vfo::A, freq_hz);
        Ok(())
    }

    async fn get_frequency(&self, _vfo: Vfo) -> Result<u64> {
        // Write-only chip; the cache of the last commanded value is the
        // only record there is.
        self.session
            .lock()
            .await
            .frequency(Vfo::A)
            .ok_or_else(|| Error::Unsupported("no frequency commanded yet".into()))
    }
}
