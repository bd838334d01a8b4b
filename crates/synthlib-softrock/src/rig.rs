//! SoftRockRig -- the Si570 USB tuner driver.

use std::sync::atomic::{AtomicU16, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::ControlTransport;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{OscillatorRef, Vfo};
use synthlib_solver::dds;
use synthlib_solver::si570::{unpack_frequency, Si570Solver};

use crate::models::SoftRockModel;
use crate::requests;

/// Driver for SoftRock-family Si570 USB tuners.
///
/// Single-oscillator hardware: there is only one frequency register, so
/// the VFO selector is accepted and ignored, and the cache lives under
/// [`Vfo::A`].
pub struct SoftRockRig {
    usb: Mutex<Box<dyn ControlTransport>>,
    session: Mutex<Session>,
    model: SoftRockModel,
    i2c_addr: u16,
    bpf: bool,
    version: AtomicU16,
}

impl SoftRockRig {
    pub(crate) fn new(
        usb: Box<dyn ControlTransport>,
        model: SoftRockModel,
        osc_freq_mhz: f64,
        multiplier: f64,
        i2c_addr: u16,
        bpf: bool,
    ) -> Self {
        SoftRockRig {
            usb: Mutex::new(usb),
            session: Mutex::new(Session::new(OscillatorRef::from_mhz(
                osc_freq_mhz,
                multiplier,
            ))),
            model,
            i2c_addr,
            bpf,
            version: AtomicU16::new(0),
        }
    }

    /// Firmware version reported at open.
    pub fn firmware_version(&self) -> u16 {
        self.version.load(Ordering::Relaxed)
    }

    /// Whether the firmware solves the Si570 dividers itself.
    fn by_value(&self) -> bool {
        self.model.always_by_value || self.firmware_version() >= requests::FIRMWARE_BY_VALUE
    }

    /// The `wValue` carrying the I2C address for register commands.
    fn i2c_value(&self) -> u16 {
        0x700 + self.i2c_addr
    }

    /// Open sequence: version probe, calibrated-crystal readback on
    /// firmware that publishes it, optional band-pass filter enable.
    pub(crate) async fn open(&self) -> Result<()> {
        let mut usb = self.usb.lock().await;

        let mut buf = [0u8; 2];
        let n = usb
            .control_in(requests::READ_VERSION, 0x0E00, 0, &mut buf)
            .await?;
        if n != 2 {
            return Err(Error::Protocol(format!(
                "version record wrong length: {n}"
            )));
        }
        let version = u16::from_le_bytes(buf);
        self.version.store(version, Ordering::Relaxed);
        debug!(version = %format_args!("{version:#06x}"), "firmware probed");

        if self.by_value() {
            let mut buf = [0u8; 4];
            let n = usb
                .control_in(requests::READ_XTALL, 0, 0, &mut buf)
                .await?;
            if n != 4 {
                return Err(Error::Protocol(format!(
                    "crystal record wrong length: {n}"
                )));
            }
            let raw = u32::from_le_bytes(buf);
            let xtal_mhz = dds::fixed_point_mhz_to_mhz(raw, 24);
            debug!(xtal_mhz, "using calibrated crystal");

            let mut session = self.session.lock().await;
            let multiplier = session.osc().multiplier;
            session.set_osc(OscillatorRef::from_mhz(xtal_mhz, multiplier));
        }

        if self.bpf {
            self.enable_bpf(usb.as_mut()).await?;
        }
        Ok(())
    }

    /// Turn the band-pass filter bank on (receive-only kits).
    async fn enable_bpf(&self, usb: &mut dyn ControlTransport) -> Result<()> {
        // First ask how many crossover points bank 1 holds, then enable.
        let mut table = [0u8; 32];
        let n = usb
            .control_in(requests::FILTERS, 0, 255, &mut table)
            .await?;
        if n > 2 {
            let index = (n as u16 / 2) - 1;
            let m = usb
                .control_in(requests::FILTERS, 1, index, &mut table)
                .await?;
            if m < 2 {
                return Err(Error::Protocol("filter enable readback too short".into()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Tuner for SoftRockRig {
    async fn set_frequency(&self, _vfo: Vfo, freq_hz: u64) -> Result<()> {
        let (osc, chip_mhz) = {
            let session = self.session.lock().await;
            let osc = *session.osc();
            (osc, osc.chip_frequency(freq_hz) / 1e6)
        };

        if self.by_value() {
            let word = dds::fixed_point_mhz(chip_mhz, 21);
            let bytes = word.to_le_bytes();
            trace!(chip_mhz, word, "set frequency by value");
            let mut usb = self.usb.lock().await;
            usb.control_out(requests::SET_FREQ_BY_VALUE, self.i2c_value(), 0, &bytes)
                .await?;
        } else {
            // Host-side divider solve; a target with no in-range DCO
            // plan never reaches the wire.
            let solver = Si570Solver::new(osc.reference_mhz());
            let solution = solver.solve(chip_mhz)?;
            let regs = solution.pack();
            trace!(
                chip_mhz,
                hs_div = solution.hs_div_value(),
                n1 = solution.n1,
                "set frequency via register image"
            );
            let mut usb = self.usb.lock().await;
            usb.control_out(requests::SET_FREQ, self.i2c_value(), 0, &regs)
                .await?;
        }

        self.session.lock().await.set_frequency(Vfo::A, freq_hz);
        Ok(())
    }

    async fn get_frequency(&self, _vfo: Vfo) -> Result<u64> {
        let freq_hz = if self.by_value() {
            let mut buf = [0u8; 4];
            let mut usb = self.usb.lock().await;
            let n = usb
                .control_in(requests::READ_FREQUENCY, 0, 0, &mut buf)
                .await?;
            if n != 4 {
                return Err(Error::Protocol(format!(
                    "frequency record wrong length: {n}"
                )));
            }
            let chip_mhz = dds::fixed_point_mhz_to_mhz(u32::from_le_bytes(buf), 21);
            let session = self.session.lock().await;
            session.osc().rf_frequency(chip_mhz * 1e6)
        } else {
            let mut regs = [0u8; 6];
            let mut usb = self.usb.lock().await;
            let n = usb
                .control_in(requests::READ_REGISTERS, self.i2c_addr, 0, &mut regs)
                .await?;
            if n != 6 {
                return Err(Error::Protocol(format!(
                    "register image wrong length: {n}"
                )));
            }
            let session = self.session.lock().await;
            let chip_mhz = unpack_frequency(&regs, session.osc().reference_mhz())?;
            session.osc().rf_frequency(chip_mhz * 1e6)
        };

        self.session.lock().await.set_frequency(Vfo::A, freq_hz);
        Ok(freq_hz)
    }

    async fn set_ptt(&self, on: bool) -> Result<()> {
        // The firmware reports key states in a 3-byte record on the same
        // request; the transfer direction is IN even for the set.
        let mut buf = [0u8; 3];
        let mut usb = self.usb.lock().await;
        usb.control_in(requests::SET_PTT, u16::from(on), 0, &mut buf)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SoftRockBuilder;
    use crate::models;
    use synthlib_test_harness::MockControlTransport;

    const LEGACY_VERSION: [u8; 2] = [0x00, 0x0E]; // 0x0E00
    const PE0FKO_VERSION: [u8; 2] = [0x00, 0x0F]; // 0x0F00
    const XTAL_RECORD: [u8; 4] = [0xC3, 0xF5, 0x48, 0x72]; // 114.285 MHz in 8.24

    async fn legacy_rig(mut usb: MockControlTransport) -> SoftRockRig {
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &LEGACY_VERSION);
        // Expectations queue keeps ordering honest through open().
        SoftRockBuilder::new(models::si570_avr_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap()
    }

    // -------------------------------------------------------------------
    // Open sequence
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn legacy_firmware_skips_crystal_readback() {
        let rig = legacy_rig(MockControlTransport::new()).await;
        assert_eq!(rig.firmware_version(), 0x0E00);
        assert!(!rig.by_value());
        let session = rig.session.lock().await;
        assert!((session.osc().reference_mhz() - 114.285).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pe0fko_firmware_reads_calibrated_crystal() {
        let mut usb = MockControlTransport::new();
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &PE0FKO_VERSION);
        usb.expect_in(requests::READ_XTALL, 0, 0, &XTAL_RECORD);

        let rig = SoftRockBuilder::new(models::si570_avr_usb())
            .osc_freq_mhz(110.0) // must be overridden by the device record
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();

        assert!(rig.by_value());
        let session = rig.session.lock().await;
        assert!((session.osc().reference_mhz() - 114.285).abs() < 1e-6);
    }

    // -------------------------------------------------------------------
    // Register-image path (host-side solver)
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn set_frequency_ships_solved_registers() {
        let mut usb = MockControlTransport::new();
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &LEGACY_VERSION);
        // 7.1 MHz RF x4 = 28.4 MHz chip frequency; the register image is
        // the legacy solver fixture.
        usb.expect_out(
            requests::SET_FREQ,
            0x0755,
            0,
            &[0xE3, 0xC2, 0xBB, 0xC7, 0xC6, 0x91],
        );

        let rig = SoftRockBuilder::new(models::si570_avr_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();
        rig.set_frequency(Vfo::A, 7_100_000).await.unwrap();

        assert_eq!(
            rig.session.lock().await.frequency(Vfo::A),
            Some(7_100_000)
        );
    }

    #[tokio::test]
    async fn no_solution_never_reaches_the_wire() {
        // 500 kHz x4 = 2 MHz: below the chip's reachable range, the
        // solve fails and no control transfer may happen.
        let rig = legacy_rig(MockControlTransport::new()).await;
        let err = rig.set_frequency(Vfo::A, 500_000).await.unwrap_err();
        assert!(matches!(err, Error::NoSolution(_)));
        assert_eq!(rig.session.lock().await.frequency(Vfo::A), None);
    }

    #[tokio::test]
    async fn get_frequency_unpacks_registers() {
        let mut usb = MockControlTransport::new();
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &LEGACY_VERSION);
        usb.expect_in(
            requests::READ_REGISTERS,
            0x55,
            0,
            &[0xE3, 0xC2, 0xBB, 0xC7, 0xC6, 0x91],
        );

        let rig = SoftRockBuilder::new(models::si570_avr_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();
        let freq = rig.get_frequency(Vfo::A).await.unwrap();
        // Within a fraction of the 28-bit RFREQ resolution.
        assert!((freq as i64 - 7_100_000).unsigned_abs() < 2, "got {freq}");
        assert_eq!(rig.session.lock().await.frequency(Vfo::A), Some(freq));
    }

    // -------------------------------------------------------------------
    // By-value path (device-side solver)
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn set_frequency_by_value() {
        let mut usb = MockControlTransport::new();
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &PE0FKO_VERSION);
        usb.expect_in(requests::READ_XTALL, 0, 0, &XTAL_RECORD);
        // 28.4 MHz in 11.21 fixed point, little-endian.
        usb.expect_out(
            requests::SET_FREQ_BY_VALUE,
            0x0755,
            0,
            &[0xCD, 0xCC, 0x8C, 0x03],
        );

        let rig = SoftRockBuilder::new(models::si570_avr_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();
        rig.set_frequency(Vfo::A, 7_100_000).await.unwrap();
    }

    #[tokio::test]
    async fn get_frequency_by_value() {
        let mut usb = MockControlTransport::new();
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &PE0FKO_VERSION);
        usb.expect_in(requests::READ_XTALL, 0, 0, &XTAL_RECORD);
        usb.expect_in(requests::READ_FREQUENCY, 0, 0, &[0xCD, 0xCC, 0x8C, 0x03]);

        let rig = SoftRockBuilder::new(models::si570_avr_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();
        let freq = rig.get_frequency(Vfo::A).await.unwrap();
        assert!((freq as i64 - 7_100_000).unsigned_abs() < 2, "got {freq}");
    }

    #[tokio::test]
    async fn pic_model_always_by_value() {
        let mut usb = MockControlTransport::new();
        // Old version number, but the PIC model forces the by-value path.
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &LEGACY_VERSION);
        usb.expect_in(requests::READ_XTALL, 0, 0, &XTAL_RECORD);
        // BPF is wired in on this model: crossover count query, enable.
        usb.expect_in(requests::FILTERS, 0, 255, &[0x10, 0x00, 0x20, 0x00]);
        usb.expect_in(requests::FILTERS, 1, 1, &[0x10, 0x00, 0x20, 0x00]);

        let rig = SoftRockBuilder::new(models::si570_pic_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();
        assert!(rig.by_value());
    }

    // -------------------------------------------------------------------
    // PTT
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn ptt_uses_in_transfer_with_state_in_value() {
        let mut usb = MockControlTransport::new();
        usb.expect_in(requests::READ_VERSION, 0x0E00, 0, &LEGACY_VERSION);
        usb.expect_in(requests::SET_PTT, 1, 0, &[0x00, 0x00, 0x00]);
        usb.expect_in(requests::SET_PTT, 0, 0, &[0x00, 0x00, 0x00]);

        let rig = SoftRockBuilder::new(models::si570_avr_usb())
            .build_with_transport(Box::new(usb))
            .await
            .unwrap();
        rig.set_ptt(true).await.unwrap();
        rig.set_ptt(false).await.unwrap();
    }
}
