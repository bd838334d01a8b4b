//! SDR-1000 (AD9854 behind a latch board) driver.
//!
//! The SDR-1000 multiplexes four write-only latches over one byte-wide
//! bus: external control, band relays, and an address/data pair feeding
//! the DDS. Every write goes through the session's shadow cache so that
//! the band bits, the PTT bit, and the DDS control bits sharing these
//! latches never clobber each other.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use synthlib_bitbang::LatchWriter;
use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::LatchBus;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{OscillatorRef, Vfo};

/// Latch assignments on the shared bus.
pub const LATCH_EXT: usize = 0;
pub const LATCH_BAND: usize = 1;
pub const LATCH_DDS0: usize = 2;
pub const LATCH_DDS1: usize = 3;

/// PTT bit in the band latch.
const PTT_BIT: u8 = 6;

/// Stock DDS reference clock in Hz.
pub const DEFAULT_XTAL_HZ: f64 = 200e6;

/// First DDS frequency-tuning-word register address.
const FTW_BASE_REG: u8 = 4;

/// Driver for the SDR-1000 latch board.
pub struct Sdr1kRig<B: LatchBus> {
    bus: Mutex<B>,
    session: Mutex<Session>,
    writer: LatchWriter,
    xtal_hz: f64,
}

impl<B: LatchBus> Sdr1kRig<B> {
    /// Build the driver and run the board reset sequence.
    pub async fn open(bus: B, xtal_hz: f64) -> Result<Self> {
        let rig = Sdr1kRig {
            bus: Mutex::new(bus),
            session: Mutex::new(Session::new(OscillatorRef::new(xtal_hz, 1.0))),
            writer: LatchWriter::new(),
            xtal_hz,
        };
        rig.reset().await?;
        Ok(rig)
    }

    /// Clear every latch and park the DDS in reset, then bring it up
    /// with the serial-control word.
    pub async fn reset(&self) -> Result<()> {
        let mut bus = self.bus.lock().await;
        let mut session = self.session.lock().await;
        session.clear_latches();

        self.writer
            .write_latch(&mut *bus, &mut session, LATCH_EXT, 0x00, 0xFF)
            .await?;
        self.writer
            .write_latch(&mut *bus, &mut session, LATCH_BAND, 0x00, 0xFF)
            .await?;
        // Hold the DDS in reset while the latches settle.
        self.writer
            .write_latch(&mut *bus, &mut session, LATCH_DDS0, 0x80, 0xFF)
            .await?;
        self.writer
            .write_latch(&mut *bus, &mut session, LATCH_DDS1, 0x00, 0xFF)
            .await?;

        // Reset low, write-strobe low, then program the control register
        // for serial updates.
        self.writer
            .write_latch(&mut *bus, &mut session, LATCH_DDS1, 0x00, 0xC0)
            .await?;
        self.write_reg(&mut *bus, &mut session, 0x20, 0x40).await?;
        debug!("SDR-1000 board reset");
        Ok(())
    }

    /// Load one DDS register through the address/data latch pair: set
    /// the address bits, present the data, pulse the write strobe.
    async fn write_reg(
        &self,
        bus: &mut B,
        session: &mut Session,
        addr: u8,
        data: u8,
    ) -> Result<()> {
        trace!(addr, data, "DDS register write");
        self.writer
            .write_latch(bus, session, LATCH_DDS1, addr & 0x3F, 0x3F)
            .await?;
        self.writer
            .write_latch(bus, session, LATCH_DDS0, data, 0xFF)
            .await?;
        self.writer
            .write_latch(bus, session, LATCH_DDS1, 0x40, 0x40)
            .await?;
        self.writer
            .write_latch(bus, session, LATCH_DDS1, 0x00, 0x40)
            .await
    }

    /// Band relay selection for a frequency.
    ///
    /// Bands 2 and 3 are swapped deliberately: the production boards
    /// were wired that way and the software has compensated ever since.
    fn band_for(freq_hz: u64) -> u8 {
        match freq_hz {
            0..=2_250_000 => 0,
            2_250_001..=5_500_000 => 1,
            5_500_001..=11_000_000 => 3,
            11_000_001..=22_000_000 => 2,
            22_000_001..=37_500_000 => 4,
            _ => 5,
        }
    }

    #[cfg(test)]
    pub(crate) async fn bus(&self) -> tokio::sync::MutexGuard<'_, B> {
        self.bus.lock().await
    }

    #[cfg(test)]
    pub(crate) async fn session(&self) -> tokio::sync::MutexGuard<'_, Session> {
        self.session.lock().await
    }
}

#[async_trait]
impl<B: LatchBus> Tuner for Sdr1kRig<B> {
    async fn set_frequency(&self, _vfo: Vfo, freq_hz: u64) -> Result<()> {
        let band = Self::band_for(freq_hz);
        trace!(freq_hz, band, "tuning");

        let mut bus = self.bus.lock().await;
        let mut session = self.session.lock().await;

        self.writer
            .write_latch(&mut *bus, &mut session, LATCH_BAND, 1 << band, 0x3F)
            .await?;

        // Six FTW bytes, most significant first: each pass scales the
        // fraction up and peels one byte into the next register.
        let mut ftw = freq_hz as f64 / self.xtal_hz;
        for i in 0..6 {
            let scaled = ftw * 256.0;
            let word = scaled as u8;
            ftw = scaled - f64::from(word);
            self.write_reg(&mut *bus, &mut session, FTW_BASE_REG + i, word)
                .await?;
        }

        session.set_frequency(Vfo::A, freq_hz);
        Ok(())
    }

    async fn get_frequency(&self, _vfo: Vfo) -> Result<u64> {
        self.session
            .lock()
            .await
            .frequency(Vfo::A)
            .ok_or_else(|| Error::Unsupported("no frequency commanded yet".into()))
    }

    async fn set_ptt(&self, on: bool) -> Result<()> {
        let mut bus = self.bus.lock().await;
        let mut session = self.session.lock().await;
        self.writer
            .set_bit(&mut *bus, &mut session, LATCH_BAND, PTT_BIT, on)
            .await
    }
}
