//! YaesuBuilder -- fluent builder for constructing [`YaesuRig`]
//! instances.

use std::time::Duration;

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::Transport;

use crate::rig::YaesuRig;

/// Fluent builder for [`YaesuRig`].
///
/// The pacing value is the delay the rig inserts between status-block
/// bytes; zero (fastest) suits modern serial hardware.
pub struct YaesuBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    command_timeout: Duration,
    retry_budget: u32,
    pacing: u8,
}

impl YaesuBuilder {
    /// Create a builder with the rig's stock settings (4800 baud,
    /// 2 s command timeout for the long status reads, three retries).
    pub fn new() -> Self {
        YaesuBuilder {
            serial_port: None,
            baud_rate: 4_800,
            command_timeout: Duration::from_secs(2),
            retry_budget: 3,
            pacing: 0,
        }
    }

    /// Set the serial port path.
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Override the per-command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Override the retry budget.
    pub fn retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Override the status-byte pacing value.
    pub fn pacing(mut self, pacing: u8) -> Self {
        self.pacing = pacing;
        self
    }

    /// Open the configured serial port and build the rig.
    pub async fn build(self) -> Result<YaesuRig> {
        let port = self
            .serial_port
            .clone()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let transport = synthlib_transport::SerialTransport::open(&port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }

    /// Build the rig on an already-open transport and run the open
    /// sequence (pacing setup).
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<YaesuRig> {
        let rig = YaesuRig::new(transport, self.command_timeout, self.retry_budget);
        rig.set_pacing(self.pacing).await?;
        Ok(rig)
    }
}

impl Default for YaesuBuilder {
    fn default() -> Self {
        Self::new()
    }
}
