//! CY27EE16-family PLL triple solver and register math.
//!
//! The chip synthesizes `VCO = (Ref / Q) * P` and routes it to the output
//! through a post divider: `clock = VCO / Div1N`. Receivers built on it
//! clock their QSD at four times the RF frequency, so the solver minimizes
//! `|4 * target - VCO / Div1N|` subject to the VCO staying inside its
//! stable range and the divider fields staying inside their register
//! widths (Div1N 2..127, Q up to 129, P best between 16 and 1023 because
//! of the charge pump).
//!
//! Three search strategies shipped over the years and all remain
//! selectable; they trade exhaustiveness for speed and never differ on the
//! VCO invariant, only on which in-range triple they pick. The default is
//! the exhaustive VCO sweep, which dominates the older two on solution
//! error.

use synthlib_core::error::{Error, Result};
use tracing::{trace, warn};

/// VCO stable-range lower bound in Hz.
pub const VCO_MIN_HZ: f64 = 100_000_000.0;

/// VCO stable-range upper bound in Hz for the default strategy.
pub const VCO_MAX_HZ: f64 = 400_000_000.0;

/// The divider-sweep strategy historically allowed the VCO up to 500 MHz.
const VCO_MAX_SWEEP_HZ: f64 = 500_000_000.0;

/// A (P, Q, Div1N) PLL solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllTriple {
    /// Total feedback divider (P counter).
    pub p: u32,
    /// Total reference divider (Q counter).
    pub q: u32,
    /// Output post divider, 2..=127 (plus the legacy low-band encodings
    /// above 128 produced by the shelf strategy).
    pub div1n: u32,
}

/// Search strategy selector. See the module docs for provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Frequency-shelf table with a bounded (P, Q) refinement for the
    /// upper shelves. The original algorithm; kept for rigs whose
    /// calibration data was captured against it.
    Shelves,
    /// Sweep the post divider and derive P from each (Q, Div1N) pair.
    DividerSweep,
    /// Exhaustive sweep of the VCO plan: every Q, every in-range P,
    /// rounding Div1N per candidate. Most accurate; the default.
    #[default]
    VcoSweep,
}

/// Register values derived from a [`PllTriple`].
///
/// `r40`/`r41`/`r42` hold the charge pump and P/Q counters; `div1_reg` and
/// `clk3_src` carry the post-divider, folding the fixed /2 and /3 divider
/// options in for Div1N values the 7-bit field cannot express directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cy27Registers {
    pub r40: u8,
    pub r41: u8,
    pub r42: u8,
    pub div1_reg: u8,
    pub clk3_src: u8,
}

/// Charge-pump setting for a given total P, per the datasheet table.
pub fn charge_pump(p: u32) -> u8 {
    match p {
        0..=44 => 0,
        45..=479 => 1,
        480..=639 => 2,
        640..=799 => 3,
        _ => 4,
    }
}

impl PllTriple {
    /// Compute the counter/divider register values for this triple.
    pub fn registers(&self) -> Cy27Registers {
        let pump = charge_pump(self.p);
        let p0 = self.p & 0x1;
        let p_counter = (self.p >> 1) - 4;
        let r40 = ((p_counter >> 8) as u8) | (pump << 2) | 0xC0;
        let r41 = (p_counter & 0xFF) as u8;
        let r42 = ((self.q - 2) as u8) | ((p0 as u8) << 7);

        // Div1N of 2 and 3 use the fixed divider options; the 7-bit field
        // itself is then parked on a safe value.
        let (clk3_src, div1_reg) = match self.div1n {
            2 => (0x80, 8),
            3 => (0xC0, 6),
            n => (0x40, n as u8),
        };

        Cy27Registers {
            r40,
            r41,
            r42,
            div1_reg,
            clk3_src,
        }
    }
}

/// CY27 PLL solver: reference frequency plus strategy selection.
#[derive(Debug, Clone, Copy)]
pub struct Cy27Solver {
    /// Reference oscillator frequency in Hz (10 MHz on the stock board).
    pub ref_hz: f64,
    pub strategy: SearchStrategy,
}

impl Cy27Solver {
    /// Create a solver with the default (most accurate) strategy.
    pub fn new(ref_hz: f64) -> Self {
        Cy27Solver {
            ref_hz,
            strategy: SearchStrategy::default(),
        }
    }

    /// Select a different search strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// VCO frequency a triple produces with this solver's reference.
    pub fn vco_hz(&self, t: &PllTriple) -> f64 {
        self.ref_hz / t.q as f64 * t.p as f64
    }

    /// Output clock frequency (VCO through the post divider).
    pub fn clock_hz(&self, t: &PllTriple) -> f64 {
        self.vco_hz(t) / t.div1n as f64
    }

    /// Find the triple for a target RF frequency in Hz (the chip output
    /// runs at four times this).
    ///
    /// Returns [`Error::NoSolution`] when the selected search cannot keep
    /// the VCO inside its stable range for this target.
    pub fn solve(&self, target_hz: u64) -> Result<PllTriple> {
        if target_hz == 0 {
            return Err(Error::InvalidParameter("target frequency is zero".into()));
        }

        let (triple, vco_max) = match self.strategy {
            SearchStrategy::Shelves => (self.solve_shelves(target_hz), VCO_MAX_HZ),
            SearchStrategy::DividerSweep => (self.solve_divider_sweep(target_hz), VCO_MAX_SWEEP_HZ),
            SearchStrategy::VcoSweep => (self.solve_vco_sweep(target_hz), VCO_MAX_HZ),
        };

        let triple = triple.ok_or_else(|| {
            Error::NoSolution(format!(
                "no (P, Q, Div1N) candidate found for {target_hz} Hz"
            ))
        })?;

        let vco = self.vco_hz(&triple);
        if !(VCO_MIN_HZ..=vco_max).contains(&vco) {
            warn!(vco_hz = vco, ?triple, "search left the VCO out of range");
            return Err(Error::NoSolution(format!(
                "VCO {:.0} Hz outside [{:.0}, {:.0}] for {target_hz} Hz",
                vco, VCO_MIN_HZ, vco_max
            )));
        }

        let err = (self.clock_hz(&triple) - 4.0 * target_hz as f64).abs();
        trace!(?triple, vco_hz = vco, err_hz = err, "CY27 solution");
        Ok(triple)
    }

    /// Original shelf-table algorithm. Works in kHz like the hardware
    /// notes it was derived from; the lowest shelf encodes dividers above
    /// 127, which the DIV1 register folds into its high bit.
    fn solve_shelves(&self, target_hz: u64) -> Option<PllTriple> {
        let ref_khz = self.ref_hz / 1e3;
        let f_khz_int = target_hz / 1_000;

        let div1n: u32 = match f_khz_int {
            20..=59 => {
                let f = f_khz_int as u32;
                return Some(PllTriple {
                    p: 1000,
                    q: 40,
                    div1n: (2500 + f / 2) / f + 128,
                });
            }
            60..=800 => {
                return Some(PllTriple {
                    p: f_khz_int as u32 * 2,
                    q: 40,
                    div1n: 125,
                });
            }
            801..=2000 => {
                return Some(PllTriple {
                    p: f_khz_int as u32,
                    q: 50,
                    div1n: 50,
                });
            }
            2001..=4000 => 25,
            4001..=10000 => 10,
            10001..=20000 => 5,
            20001..=30000 => 4,
            // Out of the shelf table; park the divider on the safe default.
            _ => 8,
        };

        let f_khz = target_hz as f64 / 1e3;
        let q_max = (ref_khz / 250.0) as u32;
        let mut min = ref_khz;
        let mut best = None;
        // Ref/Qtotal must stay above 250 kHz for a stable pump.
        for q in (10..=q_max).rev() {
            for p in 500..=2000u32 {
                let vco = ref_khz / q as f64 * p as f64;
                let delta = (4.0 * f_khz - vco / div1n as f64).abs();
                if delta < min {
                    min = delta;
                    best = Some(PllTriple { p, q, div1n });
                }
            }
        }
        best
    }

    /// Divider-sweep algorithm: bound Div1N from the VCO range, derive P
    /// from each (Q, Div1N) pair, keep the best in-range candidate.
    fn solve_divider_sweep(&self, target_hz: u64) -> Option<PllTriple> {
        let ref_khz = self.ref_hz / 1e3;
        let freq4 = target_hz as f64 * 4.0 / 1e3;
        let vco_min = VCO_MIN_HZ / 1e3;
        let vco_max = VCO_MAX_SWEEP_HZ / 1e3;

        let q_max = (ref_khz / 250.0) as u32;
        let div1n_min = ((vco_min / freq4) as u32).clamp(2, 127);
        let div1n_max = ((vco_max / freq4) as u32).clamp(2, 127);

        let mut min = ref_khz;
        let mut best = None;
        for div1n in div1n_min..=div1n_max {
            for q in (2..=q_max).rev() {
                let p = (q as f64 * freq4 * div1n as f64 / ref_khz) as u32;
                if !(16..=1023).contains(&p) {
                    continue;
                }
                let vco = ref_khz / q as f64 * p as f64;
                if vco < vco_min || vco > vco_max {
                    continue;
                }
                let delta = (freq4 - vco / div1n as f64).abs();
                if delta < min {
                    min = delta;
                    best = Some(PllTriple { p, q, div1n });
                }
            }
        }
        best
    }

    /// Exhaustive VCO sweep: for every Q, walk every P that keeps the VCO
    /// in range and round the post divider to the candidate target.
    fn solve_vco_sweep(&self, target_hz: u64) -> Option<PllTriple> {
        let freq4 = target_hz as f64 * 4.0;
        let mut delta = f64::INFINITY;
        let mut best = None;

        for q in 2..=40u32 {
            let ref_div_q = self.ref_hz / q as f64;
            // P bounds come straight from the VCO range at this Q, so every
            // candidate examined below already satisfies the invariant.
            let p_min = (VCO_MIN_HZ / ref_div_q).ceil() as u32;
            let p_max = (VCO_MAX_HZ / ref_div_q) as u32;
            for p in p_min..=p_max {
                let p_mul = p as f64 * ref_div_q;
                let div1n = (((p_mul + freq4 / 2.0) / freq4) as u32).clamp(2, 127);
                let new_delta = (p_mul / div1n as f64 - freq4).abs();
                if new_delta < delta {
                    delta = new_delta;
                    best = Some(PllTriple { p, q, div1n });
                }
            }
        }
        best
    }
}
