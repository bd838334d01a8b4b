//! First-generation DSP receiver tuning factors.
//!
//! The earlier Ten-Tec DSP receivers do not take a frequency directly:
//! the host computes three 16-bit "tuning factors" -- a coarse factor, a
//! fine factor, and a BFO factor -- from the target frequency, the mode,
//! the filter width, the passband tuning offset, and (on CW) the BFO
//! pitch, and ships them in one binary `N` command. Mode changes resend
//! the factors because the mode-dependent correction moves the coarse
//! and fine values.

use synthlib_core::error::{Error, Result};
use synthlib_core::types::Mode;

use crate::protocol::EOM;

/// Filter widths the DSP offers, in Hz.
pub const FILTERS: [u32; 34] = [
    6000, 5700, 5400, 5100, 4800, 4500, 4200, 3900, 3600, 3300, 3000, 2850, 2700, 2550, 2400,
    2250, 2100, 1950, 1800, 1650, 1500, 1350, 1200, 1050, 900, 750, 675, 600, 525, 450, 375,
    330, 300, 8000,
];

/// Index of a filter width in the DSP's table.
pub fn filter_index(width_hz: u32) -> Result<u8> {
    FILTERS
        .iter()
        .position(|&w| w == width_hz)
        .map(|i| i as u8)
        .ok_or_else(|| Error::InvalidParameter(format!("unsupported filter width {width_hz} Hz")))
}

/// The three factors of one tuning command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningFactors {
    /// Coarse tuning factor.
    pub ctf: u16,
    /// Fine tuning factor.
    pub ftf: u16,
    /// BFO factor.
    pub btf: u16,
}

impl TuningFactors {
    /// Compute the factors for a target frequency and receiver setup.
    ///
    /// `pbt_hz` is the passband tuning offset; `cwbfo_hz` is the CW BFO
    /// pitch, only folded in when the mode is CW.
    pub fn compute(
        freq_hz: u64,
        mode: Mode,
        width_hz: u32,
        pbt_hz: i32,
        cwbfo_hz: u32,
    ) -> Result<TuningFactors> {
        let (mcor, cwbfo) = match mode {
            Mode::AM | Mode::FM => (0.0, 0.0),
            Mode::CW => (-1.0, f64::from(cwbfo_hz)),
            Mode::LSB => (-1.0, 0.0),
            Mode::USB => (1.0, 0.0),
            Mode::DataUSB => {
                return Err(Error::InvalidParameter(format!(
                    "mode {mode} not supported by this receiver"
                )))
            }
        };

        let tfreq = freq_hz as f64 / 1e6;
        let fcor = f64::from(width_hz) / 2.0 + 200.0;
        let pbt = f64::from(pbt_hz);

        let adjtfreq = tfreq - 0.00125 + mcor * ((fcor + pbt) / 1e6);

        let ctf = (adjtfreq * 400.0).floor();
        let ftf = ((adjtfreq * 400.0 - ctf) * 2500.0 * 5.46).floor() as u16;
        let ctf = ctf as u16 + 18000;
        let btf = ((fcor + pbt + cwbfo + 8000.0) * 2.73).floor() as u16;

        Ok(TuningFactors { ctf, ftf, btf })
    }

    /// The six factor bytes of the `N` command payload.
    pub fn payload(&self) -> [u8; 6] {
        [
            (self.ctf >> 8) as u8,
            (self.ctf & 0xFF) as u8,
            (self.ftf >> 8) as u8,
            (self.ftf & 0xFF) as u8,
            (self.btf >> 8) as u8,
            (self.btf & 0xFF) as u8,
        ]
    }

    /// Encode a bare tuning command.
    pub fn encode(&self) -> Vec<u8> {
        let mut cmd = Vec::with_capacity(8);
        cmd.push(b'N');
        cmd.extend_from_slice(&self.payload());
        cmd.push(EOM);
        cmd
    }
}

/// Wire character for a mode on this receiver.
pub fn mode_char(mode: Mode) -> Result<u8> {
    crate::protocol::mode_char(mode)
}

/// Encode the combined width + factors + mode buffer a mode change
/// sends (one write, three commands).
pub fn encode_mode_change(
    filter_idx: u8,
    factors: &TuningFactors,
    mode: Mode,
) -> Result<Vec<u8>> {
    let mut cmd = Vec::with_capacity(14);
    cmd.push(b'W');
    cmd.push(filter_idx);
    cmd.push(EOM);
    cmd.extend_from_slice(&factors.encode());
    cmd.push(b'M');
    cmd.push(mode_char(mode)?);
    cmd.push(EOM);
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured factor fixtures; the floor-based arithmetic is a wire
    // format, so these bytes must never drift.

    #[test]
    fn usb_14_074_mhz() {
        let f = TuningFactors::compute(14_074_000, Mode::USB, 2400, 0, 1000).unwrap();
        assert_eq!((f.ctf, f.ftf, f.btf), (23629, 9008, 25662));
        assert_eq!(f.payload(), [92, 77, 35, 48, 100, 62]);
    }

    #[test]
    fn am_10_mhz_default_setup() {
        let f = TuningFactors::compute(10_000_000, Mode::AM, 6000, 0, 1000).unwrap();
        assert_eq!((f.ctf, f.ftf, f.btf), (21999, 6824, 30576));
    }

    #[test]
    fn cw_folds_in_the_bfo() {
        let f = TuningFactors::compute(7_030_000, Mode::CW, 500, 0, 1000).unwrap();
        assert_eq!((f.ctf, f.ftf, f.btf), (20811, 4368, 25798));
    }

    #[test]
    fn lsb_3_65_mhz() {
        let f = TuningFactors::compute(3_650_000, Mode::LSB, 2700, 0, 1000).unwrap();
        assert_eq!((f.ctf, f.ftf, f.btf), (19458, 12011, 26071));
    }

    #[test]
    fn encode_frames_the_payload() {
        let f = TuningFactors::compute(10_000_000, Mode::AM, 6000, 0, 1000).unwrap();
        let cmd = f.encode();
        assert_eq!(cmd[0], b'N');
        assert_eq!(cmd.len(), 8);
        assert_eq!(*cmd.last().unwrap(), b'\r');
    }

    #[test]
    fn mode_change_buffer_is_three_commands() {
        let f = TuningFactors::compute(10_000_000, Mode::USB, 2400, 0, 1000).unwrap();
        let idx = filter_index(2400).unwrap();
        let cmd = encode_mode_change(idx, &f, Mode::USB).unwrap();
        assert_eq!(cmd[0], b'W');
        assert_eq!(cmd[1], 14); // 2400 Hz is entry 14
        assert_eq!(cmd[2], b'\r');
        assert_eq!(cmd[3], b'N');
        assert_eq!(cmd[10], b'\r');
        assert_eq!(cmd[11], b'M');
        assert_eq!(cmd[12], b'1'); // USB
        assert_eq!(cmd[13], b'\r');
    }

    #[test]
    fn unknown_filter_width_rejected() {
        assert!(filter_index(2500).is_err());
    }
}
