//! SoftRockBuilder -- fluent builder for constructing [`SoftRockRig`]
//! instances.
//!
//! The oscillator reference, frequency multiplier, and I2C address are
//! all overridable per device instance; they default from the model
//! description and, where the firmware publishes a calibrated crystal
//! frequency, from the device itself at open.

use synthlib_core::error::Result;
use synthlib_core::transport::ControlTransport;

use crate::models::SoftRockModel;
use crate::requests;
use crate::rig::SoftRockRig;

/// Fluent builder for [`SoftRockRig`].
pub struct SoftRockBuilder {
    model: SoftRockModel,
    osc_freq_mhz: f64,
    multiplier: Option<f64>,
    i2c_addr: Option<u16>,
    bpf: Option<bool>,
}

impl SoftRockBuilder {
    /// Create a builder for the given model.
    pub fn new(model: SoftRockModel) -> Self {
        SoftRockBuilder {
            model,
            osc_freq_mhz: synthlib_solver::si570::NOMINAL_XTAL_MHZ,
            multiplier: None,
            i2c_addr: None,
            bpf: None,
        }
    }

    /// Override the oscillator (crystal) frequency in MHz.
    ///
    /// Calibrated firmware overrides this again at open with the value
    /// stored on the device.
    pub fn osc_freq_mhz(mut self, mhz: f64) -> Self {
        self.osc_freq_mhz = mhz;
        self
    }

    /// Override the output-to-RF frequency multiplier.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Override the Si570 I2C address.
    pub fn i2c_addr(mut self, addr: u16) -> Self {
        self.i2c_addr = Some(addr);
        self
    }

    /// Force the band-pass filter bank on or off.
    pub fn bpf(mut self, enable: bool) -> Self {
        self.bpf = Some(enable);
        self
    }

    /// Find the tuner on the USB bus and build the rig.
    pub async fn build(self) -> Result<SoftRockRig> {
        let usb =
            synthlib_transport::UsbControlTransport::open(requests::USB_VID, requests::USB_PID)?;
        self.build_with_transport(Box::new(usb)).await
    }

    /// Build the rig on an already-open control transport and run the
    /// open sequence (version probe, crystal readback, filter setup).
    pub async fn build_with_transport(
        self,
        usb: Box<dyn ControlTransport>,
    ) -> Result<SoftRockRig> {
        let multiplier = self.multiplier.unwrap_or(self.model.multiplier);
        let i2c_addr = self.i2c_addr.unwrap_or(self.model.i2c_addr);
        let bpf = self.bpf.unwrap_or(self.model.bpf);

        let rig = SoftRockRig::new(usb, self.model, self.osc_freq_mhz, multiplier, i2c_addr, bpf);
        rig.open().await?;
        Ok(rig)
    }
}
