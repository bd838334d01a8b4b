//! Rx320Rig -- first-generation DSP receiver driver (tuning-factor
//! protocol).
//!
//! Unlike the later rigs, this receiver is almost entirely write-only:
//! the host keeps the authoritative state and pushes tuning factors at
//! it. A failed write must leave the cached state untouched, so a
//! subsequent read-back reflects the last *successful* command.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::Transport;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{Mode, OscillatorRef, Vfo};
use synthlib_transaction::{ResponseShape, TransactionEngine};

use crate::factors::{self, TuningFactors};
use crate::protocol::EOM;

/// Receiver DSP setup that feeds the factor computation.
#[derive(Debug, Clone, Copy)]
struct DspSetup {
    width_hz: u32,
    pbt_hz: i32,
    cwbfo_hz: u32,
}

/// Driver for the first-generation Ten-Tec DSP receivers.
pub struct Rx320Rig {
    transport: Mutex<Box<dyn Transport>>,
    session: Mutex<Session>,
    setup: Mutex<DspSetup>,
    engine: TransactionEngine,
}

impl Rx320Rig {
    /// Build the driver on an open transport and start the DSP program.
    pub async fn open(transport: Box<dyn Transport>) -> Result<Self> {
        let mut session = Session::new(OscillatorRef::new(0.0, 1.0));
        // The receiver powers up on 10 MHz AM with the widest filter;
        // mirror that so the factor math has a full state from the
        // first command on.
        session.set_frequency(Vfo::A, 10_000_000);
        session.set_mode(Mode::AM);

        let rig = Rx320Rig {
            transport: Mutex::new(transport),
            session: Mutex::new(session),
            setup: Mutex::new(DspSetup {
                width_hz: 6000,
                pbt_hz: 0,
                cwbfo_hz: 1000,
            }),
            engine: TransactionEngine::new(Duration::from_millis(500), 2),
        };

        // Dsp Program Execute; harmless if already running.
        let mut transport = rig.transport.lock().await;
        rig.engine
            .transact(transport.as_mut(), &[b'P', b'1', EOM], &ResponseShape::None)
            .await?;
        drop(transport);
        Ok(rig)
    }

    /// Set the filter width (and resend the factors, which depend on it).
    pub async fn set_filter_width(&self, width_hz: u32) -> Result<()> {
        let idx = factors::filter_index(width_hz)?;

        let (freq, mode, mut setup) = self.current_state().await?;
        setup.width_hz = width_hz;
        let f = TuningFactors::compute(freq, mode, setup.width_hz, setup.pbt_hz, setup.cwbfo_hz)?;
        let cmd = factors::encode_mode_change(idx, &f, mode)?;

        let mut transport = self.transport.lock().await;
        self.engine
            .transact(transport.as_mut(), &cmd, &ResponseShape::None)
            .await?;
        drop(transport);

        self.setup.lock().await.width_hz = width_hz;
        Ok(())
    }

    async fn current_state(&self) -> Result<(u64, Mode, DspSetup)> {
        let session = self.session.lock().await;
        let freq = session
            .frequency(Vfo::A)
            .ok_or_else(|| Error::InvalidParameter("no frequency state".into()))?;
        let mode = session
            .mode()
            .ok_or_else(|| Error::InvalidParameter("no mode state".into()))?;
        let setup = *self.setup.lock().await;
        Ok((freq, mode, setup))
    }
}

#[async_trait]
impl Tuner for Rx320Rig {
    async fn set_frequency(&self, _vfo: Vfo, freq_hz: u64) -> Result<()> {
        let (_, mode, setup) = self.current_state().await?;
        let f = TuningFactors::compute(freq_hz, mode, setup.width_hz, setup.pbt_hz, setup.cwbfo_hz)?;
        trace!(freq_hz, ?f, "tuning factors");

        let mut transport = self.transport.lock().await;
        self.engine
            .transact(transport.as_mut(), &f.encode(), &ResponseShape::None)
            .await?;
        drop(transport);

        // Only a write that reached the wire moves the cache.
        self.session.lock().await.set_frequency(Vfo::A, freq_hz);
        Ok(())
    }

    async fn get_frequency(&self, _vfo: Vfo) -> Result<u64> {
        // Write-only receiver: the cache is the record.
        self.session
            .lock()
            .await
            .frequency(Vfo::A)
            .ok_or_else(|| Error::InvalidParameter("no frequency state".into()))
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        let (freq, _, setup) = self.current_state().await?;
        let idx = factors::filter_index(setup.width_hz)?;
        let f = TuningFactors::compute(freq, mode, setup.width_hz, setup.pbt_hz, setup.cwbfo_hz)?;
        let cmd = factors::encode_mode_change(idx, &f, mode)?;

        let mut transport = self.transport.lock().await;
        self.engine
            .transact(transport.as_mut(), &cmd, &ResponseShape::None)
            .await?;
        drop(transport);

        self.session.lock().await.set_mode(mode);
        Ok(())
    }

    async fn get_mode(&self) -> Result<Mode> {
        self.session
            .lock()
            .await
            .mode()
            .ok_or_else(|| Error::InvalidParameter("no mode state".into()))
    }
}
