//! Vendor USB control transfers via `nusb`.
//!
//! Dongle tuners expose their firmware commands as vendor control
//! requests on the default endpoint: a request code, a 16-bit value, a
//! 16-bit index, and a payload of at most a few dozen bytes in either
//! direction.

use async_trait::async_trait;
use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient};
use tracing::{debug, trace};

use synthlib_core::error::{Error, Result};
use synthlib_core::transport::ControlTransport;

/// USB control-transfer transport for a vendor device.
pub struct UsbControlTransport {
    interface: nusb::Interface,
}

impl UsbControlTransport {
    /// Open the first device matching the VID/PID pair and claim its
    /// first interface.
    pub fn open(vid: u16, pid: u16) -> Result<Self> {
        let info = nusb::list_devices()?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or_else(|| {
                Error::Transport(format!("no USB device {vid:04x}:{pid:04x} found"))
            })?;

        debug!(
            vid = %format_args!("{vid:04x}"),
            pid = %format_args!("{pid:04x}"),
            bus = info.bus_number(),
            addr = info.device_address(),
            "opening USB device"
        );

        let device = info.open()?;
        let interface = device.claim_interface(0)?;
        Ok(UsbControlTransport { interface })
    }
}

#[async_trait]
impl ControlTransport for UsbControlTransport {
    async fn control_out(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize> {
        trace!(request, value, index, len = data.len(), "control OUT");
        let completion = self
            .interface
            .control_out(ControlOut {
                control_type: ControlType::Vendor,
                recipient: Recipient::Device,
                request,
                value,
                index,
                data,
            })
            .await;
        completion
            .status
            .map_err(|e| Error::Transport(format!("control OUT failed: {e}")))?;
        Ok(data.len())
    }

    async fn control_in(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize> {
        trace!(request, value, index, len = buf.len(), "control IN");
        let data = self
            .interface
            .control_in(ControlIn {
                control_type: ControlType::Vendor,
                recipient: Recipient::Device,
                request,
                value,
                index,
                length: buf.len() as u16,
            })
            .await
            .into_result()
            .map_err(|e| Error::Transport(format!("control IN failed: {e}")))?;

        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}
