//! TentecBuilder -- fluent builder for constructing [`TentecRig`]
//! instances.
//!
//! Separates configuration from construction so callers can set serial
//! parameters, retry policy, and timeouts before the transport is
//! opened.

use std::time::Duration;

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::Transport;

use crate::rig::TentecRig;

/// Fluent builder for [`TentecRig`].
pub struct TentecBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    command_timeout: Duration,
    retry_budget: u32,
}

impl TentecBuilder {
    /// Create a builder with the rig's stock settings (57600 baud,
    /// 500 ms command timeout, three retries).
    pub fn new() -> Self {
        TentecBuilder {
            serial_port: None,
            baud_rate: 57_600,
            command_timeout: Duration::from_millis(500),
            retry_budget: 3,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0`).
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

    /// Open the configured serial port and build the rig.
    pub async fn build(self) -> Result<TentecRig> {
        let port = self
            .serial_port
            .clone()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let transport = synthlib_transport::SerialTransport::open(&port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }

    /// Build the rig on an already-open transport (mock or real) and run
    /// the open sequence (DSP restart handshake).
    pub async fn build_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<TentecRig> {
        let rig = TentecRig::new(transport, self.command_timeout, self.retry_budget);
        rig.restart_dsp().await?;
        Ok(rig)
    }
}

impl Default for TentecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serial_port_required_for_build() {
        let result = TentecBuilder::new().build().await;
        assert!(matches!(result.unwrap_err(), Error::InvalidParameter(_)));
    }
}

