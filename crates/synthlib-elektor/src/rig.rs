//! ElektorRig -- the CY27EE16-based receiver driver.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use synthlib_bitbang::i2c;
use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::Transport;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{OscillatorRef, Vfo};
use synthlib_solver::cy27::{Cy27Solver, PllTriple, SearchStrategy};

use crate::registers::*;

/// Antenna input selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antenna {
    /// Filtered input; the low/high-pass is picked per frequency at
    /// every tune.
    Auto,
    /// External (unfiltered) input.
    External,
    /// The PLL's 5 MHz test clock, looped back for checkout.
    TestClock,
}

/// Hardware-facing mutable state: the FT232R port byte and the last
/// programmed PLL plan.
struct PortState {
    port: u8,
    triple: PllTriple,
}

/// Driver for the Elektor SDR-USB receiver.
pub struct ElektorRig {
    transport: Mutex<Box<dyn Transport>>,
    session: Mutex<Session>,
    state: Mutex<PortState>,
    solver: Cy27Solver,
    antenna: Mutex<Antenna>,
}

impl ElektorRig {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        osc_freq_hz: f64,
        strategy: SearchStrategy,
    ) -> Self {
        ElektorRig {
            transport: Mutex::new(transport),
            session: Mutex::new(Session::new(OscillatorRef::new(osc_freq_hz, 4.0))),
            state: Mutex::new(PortState {
                port: PORT_IDLE,
                // Safe power-on plan matching the chip's defaults.
                triple: PllTriple { p: 8, q: 2, div1n: 8 },
            }),
            solver: Cy27Solver::new(osc_freq_hz).with_strategy(strategy),
            antenna: Mutex::new(Antenna::Auto),
        }
    }

    /// PLL setup at session open: enable CLOCK5, park the post divider
    /// on a safe value, route the clock matrix, source DIV2 from REF.
    pub(crate) async fn open(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        let mut state = self.state.lock().await;

        self.write_reg(transport.as_mut(), &mut state, CLKOE_REG, &[0x20])
            .await?;
        self.write_reg(transport.as_mut(), &mut state, DIV1_REG, &[8])
            .await?;
        self.write_reg(
            transport.as_mut(),
            &mut state,
            CLKSRC_REG,
            &[0x02, 0x8E, 0x47],
        )
        .await?;
        self.write_reg(transport.as_mut(), &mut state, DIV2_REG, &[0x88])
            .await?;
        debug!("PLL initialized");
        Ok(())
    }

    /// One I2C register burst, rendered and sent as a waveform.
    async fn write_reg(
        &self,
        transport: &mut dyn Transport,
        state: &mut PortState,
        reg: u8,
        values: &[u8],
    ) -> Result<()> {
        i2c::write_registers(transport, state.port, CY_I2C_RAM_ADDR, reg, values).await?;
        // The stop condition leaves both bus lines released.
        state.port |= PORT_IDLE;
        Ok(())
    }

    /// Program the pump, counters, and post divider for a solved plan.
    async fn update_pll(
        &self,
        transport: &mut dyn Transport,
        state: &mut PortState,
        triple: PllTriple,
    ) -> Result<()> {
        let regs = triple.registers();
        self.write_reg(
            transport,
            state,
            PUMP_COUNTERS_REG,
            &[regs.r40, regs.r41, regs.r42],
        )
        .await?;
        self.write_reg(transport, state, DIV1_REG, &[regs.div1_reg])
            .await?;
        // Low bits of the CLOCK5 source row select DIV1CLK.
        self.write_reg(transport, state, CLKSRC_REG + 2, &[regs.clk3_src | 0x07])
            .await?;
        state.triple = triple;
        Ok(())
    }

    /// Select the antenna input.
    pub async fn set_antenna(&self, antenna: Antenna) -> Result<()> {
        let mux = match antenna {
            Antenna::Auto => 0, // refined on the next tune
            Antenna::External => 3,
            Antenna::TestClock => 7,
        };

        let mut transport = self.transport.lock().await;
        let mut state = self.state.lock().await;
        state.port = (state.port & PORT_KEEP_ON_MUX) | (mux << 2);

        // CLOCK3 carries the test clock; enable it only on demand.
        let clkoe = 0x20 | if antenna == Antenna::TestClock { 0x04 } else { 0 };
        self.write_reg(transport.as_mut(), &mut state, CLKOE_REG, &[clkoe])
            .await?;
        *self.antenna.lock().await = antenna;
        Ok(())
    }

    /// Set the input attenuator (0, 10, or 20 dB).
    pub async fn set_attenuator(&self, db: u32) -> Result<()> {
        let att: u8 = match db {
            0 => 0,
            10 => 1,
            20 => 2,
            other => {
                return Err(Error::InvalidParameter(format!(
                    "unsupported attenuation {other} dB"
                )))
            }
        };

        let mut transport = self.transport.lock().await;
        let mut state = self.state.lock().await;
        state.port = (state.port & !PORT_ATT_MASK) | (att << 5);
        // Relay bits are plain port outputs; one byte, no I2C involved.
        transport.send(&[state.port]).await
    }
}

#[async_trait]
impl Tuner for ElektorRig {
    async fn set_frequency(&self, _vfo: Vfo, freq_hz: u64) -> Result<()> {
        // Solve first: a target the PLL cannot reach must not disturb
        // the hardware at all.
        let triple = self.solver.solve(freq_hz)?;
        let achieved = (self.solver.clock_hz(&triple) / 4.0).round() as u64;
        trace!(freq_hz, ?triple, achieved, "tuning plan");

        let mut transport = self.transport.lock().await;
        let mut state = self.state.lock().await;

        if *self.antenna.lock().await == Antenna::Auto {
            // Low-pass below 1.6 MHz, high-pass above.
            let mux = if freq_hz <= 1_600_000 { 1 } else { 2 };
            state.port = (state.port & PORT_KEEP_ON_MUX) | (mux << 2);
        }

        self.update_pll(transport.as_mut(), &mut state, triple)
            .await?;

        // Cache what the PLL will actually produce, not the request.
        self.session.lock().await.set_frequency(Vfo::A, achieved);
        Ok(())
    }

    async fn get_frequency(&self, _vfo: Vfo) -> Result<u64> {
        // Write-only chip: derive from the last programmed plan.
        let state = self.state.lock().await;
        Ok((self.solver.clock_hz(&state.triple) / 4.0).round() as u64)
    }
}
