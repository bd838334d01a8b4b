//! FT232R bit-bang transport.
//!
//! The FT232R's asynchronous bit-bang mode replays every byte written to
//! its bulk endpoint onto the eight port pins at a fixed rate. The
//! Elektor-style receivers drive their PLL's I2C bus and the antenna
//! relays this way: the host renders a waveform of port-byte samples and
//! pushes it in one bulk write.
//!
//! The setup sequence (reset, enable bit-bang on all pins, set the
//! replay rate) uses the FTDI vendor control requests.

use async_trait::async_trait;
use nusb::transfer::{ControlOut, ControlType, Recipient};
use std::time::Duration;
use tracing::debug;

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::Transport;

/// FTDI vendor requests.
const FTDI_RESET: u8 = 0x00;
const FTDI_SET_BAUDRATE: u8 = 0x03;
const FTDI_SET_BITMODE: u8 = 0x0B;

/// Bulk endpoint the port-byte stream is written to.
const FTDI_OUT_EP: u8 = 0x02;

/// Magic divisor for a 38400 baud replay rate (9600 x4 in bit-bang mode).
const BAUD_38400: u16 = 49_230;

/// Byte transport onto an FT232R in bit-bang mode.
///
/// Write-only: the boards hung off it never talk back, so `receive`
/// reports a timeout and `flush_input` is a no-op.
pub struct FtdiBitbangTransport {
    interface: Option<nusb::Interface>,
}

impl FtdiBitbangTransport {
    /// Open the first matching FTDI device and switch it to bit-bang
    /// mode on all eight pins.
    pub async fn open(vid: u16, pid: u16) -> Result<Self> {
        let info = nusb::list_devices()?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or_else(|| {
                Error::Transport(format!("no FTDI device {vid:04x}:{pid:04x} found"))
            })?;
        let device = info.open()?;
        let interface = device.claim_interface(0)?;

        let mut transport = FtdiBitbangTransport {
            interface: Some(interface),
        };
        transport.vendor_request(FTDI_RESET, 0).await?;
        // Low byte: pin direction mask (all output); high byte: mode 1.
        transport.vendor_request(FTDI_SET_BITMODE, 0x01FF).await?;
        transport.vendor_request(FTDI_SET_BAUDRATE, BAUD_38400).await?;
        debug!("FT232R switched to bit-bang mode");
        Ok(transport)
    }

    async fn vendor_request(&mut self, request: u8, value: u16) -> Result<()> {
        let interface = self.interface.as_mut().ok_or(Error::NotConnected)?;
        interface
            .control_out(ControlOut {
                control_type: ControlType::Vendor,
                recipient: Recipient::Device,
                request,
                value,
                index: 0,
                data: &[],
            })
            .await
            .status
            .map_err(|e| Error::Transport(format!("FTDI request {request:#04x} failed: {e}")))
    }
}

#[async_trait]
impl Transport for FtdiBitbangTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let interface = self.interface.as_mut().ok_or(Error::NotConnected)?;
        interface
            .bulk_out(FTDI_OUT_EP, data.to_vec())
            .await
            .status
            .map_err(|e| Error::Transport(format!("bulk write failed: {e}")))?;
        Ok(())
    }

    async fn receive(&mut self, _buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        // Nothing ever comes back from a bit-bang board.
        Err(Error::Timeout)
    }

    async fn flush_input(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.interface = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.interface.is_some()
    }
}
