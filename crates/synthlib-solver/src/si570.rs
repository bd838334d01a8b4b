//! Si570 divider solver and register image codec.
//!
//! The Si570 locks an internal DCO (4.85..5.67 GHz) to a fractional
//! multiple of its crystal, then divides the DCO down through two output
//! dividers:
//!
//! ```text
//! f_out = (xtal * RFREQ) / (N1 * HS_DIV)        DCO = xtal * RFREQ
//! ```
//!
//! Programming a frequency means finding an (HS_DIV, N1) pair that puts
//! the DCO inside its legal range, then computing RFREQ as a 38-bit
//! fixed-point value (10 integer bits, 28 fraction bits) spread across
//! registers 7..12.
//!
//! # Divider selection
//!
//! For each legal HS_DIV the candidate N1 is found by centering the DCO
//! in its range and rounding to the nearest even divider. Among all
//! candidates whose DCO lands in range, the one with the *smallest* DCO
//! wins; candidates are scanned in descending HS_DIV order and only a
//! strictly smaller DCO displaces the current best, so a tie keeps the
//! first-found (largest HS_DIV) candidate. Deployed firmware depends on
//! exactly this selection, so it is a compatibility contract here, not an
//! optimization to revisit.

use synthlib_core::error::{Error, Result};
use tracing::trace;

/// HS_DIV register encoding: index is the 3-bit register value, entry is
/// the divider it selects. Slots 4 and 6 are reserved on the chip.
pub const HS_DIV_MAP: [i32; 8] = [4, 5, 6, 7, -1, 9, -1, 11];

/// Lower edge of the DCO operating range, in MHz.
pub const DCO_LOW_MHZ: f64 = 4850.0;

/// Upper edge of the DCO operating range, in MHz.
pub const DCO_HIGH_MHZ: f64 = 5670.0;

/// Nominal crystal frequency in MHz, before per-part calibration.
pub const NOMINAL_XTAL_MHZ: f64 = 114.285;

/// Scale of the RFREQ fraction field: 2^28.
const RFREQ_FRAC_SCALE: f64 = 268_435_456.0;

/// One divider solution: the register-encoded dividers plus the resulting
/// DCO frequency and fractional multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividerSolution {
    /// 3-bit HS_DIV register field (index into [`HS_DIV_MAP`]).
    pub hs_div: u8,
    /// N1 register field. The chip divides by `n1 + 1`.
    pub n1: u8,
    /// Resulting DCO frequency in MHz. Always within the configured range.
    pub dco_mhz: f64,
    /// Fractional crystal multiplier `dco / xtal`.
    pub rfreq: f64,
}

impl DividerSolution {
    /// The actual high-speed divider value selected.
    pub fn hs_div_value(&self) -> i32 {
        HS_DIV_MAP[self.hs_div as usize]
    }

    /// RFREQ split into its integer part and 28-bit fraction field.
    pub fn rfreq_parts(&self) -> (u32, u32) {
        let int = self.rfreq.trunc() as u32;
        let frac = ((self.rfreq - int as f64) * RFREQ_FRAC_SCALE).round() as u32;
        (int, frac)
    }

    /// Pack this solution into the register 7..12 image the chip expects.
    pub fn pack(&self) -> [u8; 6] {
        let (int, frac) = self.rfreq_parts();
        let mut buf = [0u8; 6];
        buf[5] = (frac & 0xFF) as u8;
        buf[4] = ((frac >> 8) & 0xFF) as u8;
        buf[3] = ((frac >> 16) & 0xFF) as u8;
        buf[2] = ((frac >> 24) & 0xFF) as u8 | (((int & 0xF) << 4) as u8);
        buf[1] = (int >> 4) as u8 | ((self.n1 & 0x3) << 6);
        buf[0] = (self.n1 >> 2) | (self.hs_div << 5);
        buf
    }
}

/// Decode a register 7..12 image back to the output frequency in MHz.
///
/// Used when reading the chip's startup registers to learn the frequency
/// a device is currently producing.
pub fn unpack_frequency(buf: &[u8; 6], xtal_mhz: f64) -> Result<f64> {
    let rfreq_int = ((buf[2] & 0xF0) >> 4) as u32 + ((buf[1] & 0x3F) as u32) * 16;
    let rfreq_frac = ((buf[2] & 0x0F) as u32) << 24
        | (buf[3] as u32) << 16
        | (buf[4] as u32) << 8
        | buf[5] as u32;
    let rfreq = rfreq_int as f64 + rfreq_frac as f64 / RFREQ_FRAC_SCALE;
    let n1 = ((buf[1] & 0xC0) >> 6) as u32 + ((buf[0] & 0x1F) as u32) * 4;
    let hs_div = ((buf[0] & 0xE0) >> 5) as usize;

    let divider = HS_DIV_MAP[hs_div];
    if divider < 0 {
        return Err(Error::Protocol(format!(
            "register image selects reserved HS_DIV slot {hs_div}"
        )));
    }
    Ok(xtal_mhz * rfreq / ((n1 + 1) as f64 * divider as f64))
}

/// Si570 divider solver.
///
/// `xtal_mhz` is the calibrated crystal frequency; the DCO bounds default
/// to the datasheet values but stay configurable for the wider-range
/// speed grades.
#[derive(Debug, Clone, Copy)]
pub struct Si570Solver {
    pub xtal_mhz: f64,
    pub dco_low_mhz: f64,
    pub dco_high_mhz: f64,
}

impl Default for Si570Solver {
    fn default() -> Self {
        Si570Solver {
            xtal_mhz: NOMINAL_XTAL_MHZ,
            dco_low_mhz: DCO_LOW_MHZ,
            dco_high_mhz: DCO_HIGH_MHZ,
        }
    }
}

impl Si570Solver {
    /// Create a solver for a calibrated crystal frequency.
    pub fn new(xtal_mhz: f64) -> Self {
        Si570Solver {
            xtal_mhz,
            ..Default::default()
        }
    }

    /// Find dividers for a target chip output frequency in MHz.
    ///
    /// Returns [`Error::NoSolution`] when every legal HS_DIV candidate
    /// puts the DCO outside `[dco_low_mhz, dco_high_mhz]`.
    pub fn solve(&self, target_mhz: f64) -> Result<DividerSolution> {
        if target_mhz <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "target frequency must be positive, got {target_mhz} MHz"
            )));
        }

        let dco_mid = (self.dco_high_mhz + self.dco_low_mhz) / 2.0;
        let mut best: Option<DividerSolution> = None;

        // Count down through the dividers; a strictly smaller in-range DCO
        // displaces the current best, so ties keep the largest HS_DIV.
        for idx in (0..HS_DIV_MAP.len()).rev() {
            let divider = HS_DIV_MAP[idx];
            if divider < 0 {
                continue;
            }

            let mut y = dco_mid / target_mhz / divider as f64;
            if y < 1.5 {
                y = 1.0;
            } else {
                y = 2.0 * (y / 2.0).round();
            }
            if y > 128.0 {
                y = 128.0;
            }

            let n1 = y.trunc() as u8 - 1;
            let dco = target_mhz * y * divider as f64;
            trace!(
                hs_div = divider,
                n1,
                dco_mhz = dco,
                "Si570 divider candidate"
            );

            if dco < self.dco_low_mhz || dco > self.dco_high_mhz {
                continue;
            }
            if best.map_or(true, |b| dco < b.dco_mhz) {
                best = Some(DividerSolution {
                    hs_div: idx as u8,
                    n1,
                    dco_mhz: dco,
                    rfreq: dco / self.xtal_mhz,
                });
            }
        }

        best.ok_or_else(|| {
            Error::NoSolution(format!(
                "no HS_DIV/N1 pair puts the DCO in [{}, {}] MHz for {target_mhz} MHz",
                self.dco_low_mhz, self.dco_high_mhz
            ))
        })
    }
}
