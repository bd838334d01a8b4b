//! Elektor 3/04 DRM receiver (AD9835) driver.
//!
//! The receiver hangs the AD9835 off a serial port's control lines: the
//! break line clocks, RTS carries data (inverted by the RS-232 drivers),
//! and DTR frames each 16-bit command word as the chip's FSYNC. A tune
//! is six frames: reset, four byte-loads into the FREQ0 register, a
//! sync, and the reset release.

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

/// Command words of the AD9835's 16-bit serial interface.
mod words {
    /// Full reset, output squelched.
    pub const RESET: u16 = 0xF800;
    /// Load FREQ0 byte 0 (LSB) through the defer register.
    pub const FREQ0_BYTE0: u16 = 0x3000;
    /// Load FREQ0 byte 1.
    pub const FREQ0_BYTE1: u16 = 0x2100;
    /// Load FREQ0 byte 2 through the defer register.
    pub const FREQ0_BYTE2: u16 = 0x3200;
    /// Load FREQ0 byte 3.
    pub const FREQ0_BYTE3: u16 = 0x2300;
    /// Transfer the deferred bytes into the live register.
    pub const SYNC: u16 = 0x8000;
    /// Release reset, output running.
    pub const RESET_END: u16 = 0xC000;
}

/// Configuration for the Elektor 3/04 receiver.
#[derive(Debug, Clone, Copy)]
pub struct Elektor304Config {
    /// DDS master clock in Hz (50 MHz stock).
    pub osc_freq_hz: f64,
    /// IF the mixer sits above the tuned frequency, in Hz (454.3 kHz
    /// stock).
    pub if_mix_freq_hz: f64,
}

impl Default for Elektor304Config {
    fn default() -> Self {
        Elektor304Config {
            osc_freq_hz: 50e6,
            if_mix_freq_hz: 454_300.0,
        }
    }
}

/// Driver for the Elektor 3/04 DRM receiver.
pub struct Elektor304Rig<L: ControlLines> {
    lines: Mutex<L>,
    session: Mutex<Session>,
    config: Elektor304Config,
    writer: ShiftWriter,
}

impl<L: ControlLines> Elektor304Rig<L> {
    /// Build the driver. The chip needs no open sequence beyond parked
    /// lines; the first tune resets it anyway.
    pub fn new(lines: L, config: Elektor304Config) -> Self {
        Elektor304Rig {
            lines: Mutex::new(lines),
            session: Mutex::new(Session::new(OscillatorRef::new(config.osc_freq_hz, 1.0))),
            config,
            // RS-232 drivers invert the data line between port and chip.
            writer: ShiftWriter::msb_first().with_inverted_data(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn lines(&self) -> tokio::sync::MutexGuard<'_, L> {
        self.lines.lock().await
    }
}

#[async_trait]
impl<L: ControlLines> Tuner for Elektor304Rig<L> {
    async fn set_frequency(&self, _vfo: Vfo, freq_hz: u64) -> Result<()> {
        let target = freq_hz as f64 + self.config.if_mix_freq_hz;
        let word = dds::phase_word(target, self.config.osc_freq_hz, 32) as u32;
        trace!(freq_hz, word, "AD9835 load");

        let frames = [
            words::RESET,
            words::FREQ0_BYTE0 | (word & 0xFF) as u16,
            words::FREQ0_BYTE1 | ((word >> 8) & 0xFF) as u16,
            words::FREQ0_BYTE2 | ((word >> 16) & 0xFF) as u16,
            words::FREQ0_BYTE3 | ((word >> 24) & 0xFF) as u16,
            words::SYNC,
            words::RESET_END,
        ];

        {
            let mut lines = self.lines.lock().await;
            // Park everything before the first frame.
            lines.set_strobe(false).await?;
            lines.settle().await;
            lines.set_data(false).await?;
            lines.settle().await;
            lines.set_clock(false).await?;
            lines.settle().await;

            for frame in frames {
                self.writer
                    .write_framed(&mut *lines, frame as u64, 16)
                    .await?;
            }
        }

        self.session.lock().await.set_frequency(Vfo::A, freq_hz);
        Ok(())
    }

    async fn get_frequency(&self, _vfo: Vfo) -> Result<u64> {
        self.session
            .lock()
            .await
            .frequency(Vfo::A)
            .ok_or_else(|| Error::Unsupported("no frequency commanded yet".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthlib_test_harness::MockControlLines;

    /// Undo the data-line inversion and reassemble the 16-bit frames.
    fn frames_from_bits(bits: &[bool]) -> Vec<u16> {
        bits.chunks(16)
            .map(|c| {
                c.iter()
                    .fold(0u16, |acc, &b| (acc << 1) | u16::from(!b))
            })
            .collect()
    }

    #[tokio::test]
    async fn tune_sends_reset_load_sync_sequence() {
        let rig = Elektor304Rig::new(MockControlLines::new(), Elektor304Config::default());
        rig.set_frequency(Vfo::A, 6_075_000).await.unwrap();

        let lines = rig.lines().await;
        let frames = frames_from_bits(&lines.clocked_bits());
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[0], words::RESET);
        assert_eq!(frames[5], words::SYNC);
        assert_eq!(frames[6], words::RESET_END);

        // Reassemble the tuning word from the four byte-load frames.
        let word = (frames[1] & 0xFF) as u32
            | ((frames[2] & 0xFF) as u32) << 8
            | ((frames[3] & 0xFF) as u32) << 16
            | ((frames[4] & 0xFF) as u32) << 24;
        let expected = dds::phase_word(6_075_000.0 + 454_300.0, 50e6, 32) as u32;
        assert_eq!(word, expected);

        // And the command nibbles are intact on top of the data bytes.
        assert_eq!(frames[1] & 0xFF00, words::FREQ0_BYTE0);
        assert_eq!(frames[2] & 0xFF00, words::FREQ0_BYTE1);
        assert_eq!(frames[3] & 0xFF00, words::FREQ0_BYTE2);
        assert_eq!(frames[4] & 0xFF00, words::FREQ0_BYTE3);
    }

    #[tokio::test]
    async fn round_trip_within_one_lsb() {
        let config = Elektor304Config::default();
        for freq in [500_000u64, 6_075_000, 21_500_000] {
            let word = dds::phase_word(freq as f64 + config.if_mix_freq_hz, config.osc_freq_hz, 32);
            let back = dds::phase_word_to_hz(word, config.osc_freq_hz, 32)
                - config.if_mix_freq_hz;
            let lsb = config.osc_freq_hz / 2f64.powi(32);
            assert!((back - freq as f64).abs() <= lsb);
        }
    }

    #[tokio::test]
    async fn cache_updates_after_write() {
        let rig = Elektor304Rig::new(MockControlLines::new(), Elektor304Config::default());
        rig.set_frequency(Vfo::A, 6_075_000).await.unwrap();
        assert_eq!(rig.get_frequency(Vfo::A).await.unwrap(), 6_075_000);
    }
}
