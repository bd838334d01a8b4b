//! ElektorBuilder -- fluent builder for constructing [`ElektorRig`]
//! instances.

use synthlib_core::error::Result;
use synthlib_core::transport::Transport;
use synthlib_solver::cy27::SearchStrategy;

use crate::rig::ElektorRig;

/// FT232R VID/PID the receiver enumerates under.
pub const USB_VID: u16 = 0x0403;
pub const USB_PID: u16 = 0x6001;

/// Fluent builder for [`ElektorRig`].
pub struct ElektorBuilder {
    osc_freq_hz: f64,
    strategy: SearchStrategy,
}

impl ElektorBuilder {
    /// Create a builder with the stock 10 MHz reference and the default
    /// search strategy.
    pub fn new() -> Self {
        ElektorBuilder {
            osc_freq_hz: 10e6,
            strategy: SearchStrategy::default(),
        }
    }

    /// Override the reference oscillator frequency in Hz.
    pub fn osc_freq_hz(mut self, hz: f64) -> Self {
        self.osc_freq_hz = hz;
        self
    }

    /// Select a PLL search strategy (the legacy searches remain
    /// available for installations calibrated against them).
    pub fn strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Find the receiver's FT232R on the USB bus, switch it to bit-bang
    /// mode, and build the rig.
    pub async fn build(self) -> Result<ElektorRig> {
        let transport =
            synthlib_transport::FtdiBitbangTransport::open(USB_VID, USB_PID).await?;
        self.build_with_transport(Box::new(transport)).await
    }

    /// Build the rig on an already-open transport (the FT232R bulk pipe
    /// or a mock) and run the PLL setup sequence.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<ElektorRig> {
        let rig = ElektorRig::new(transport, self.osc_freq_hz, self.strategy);
        rig.open().await?;
        Ok(rig)
    }
}

impl Default for ElektorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
