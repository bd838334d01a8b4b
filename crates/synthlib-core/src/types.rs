//! Core types used throughout synthlib.
//!
//! These types provide a chip-agnostic abstraction layer over the various
//! synthesizer programming protocols (Si570 register images, CY27 PLL
//! triples, DDS tuning words, CAT-style command languages).

use std::fmt;
use std::str::FromStr;

/// A named frequency/mode register slot on the rig.
///
/// Traditional rigs expose two VFOs plus a memory channel register. Chips
/// without VFO hardware (Si570, DDS kits) only ever use [`Vfo::A`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vfo {
    /// Main VFO.
    A,
    /// Sub VFO.
    B,
    /// The memory-channel register (see [`Session::last_mem_channel`]).
    ///
    /// [`Session::last_mem_channel`]: crate::session::Session::last_mem_channel
    Memory,
}

impl fmt::Display for Vfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vfo::A => write!(f, "VFO-A"),
            Vfo::B => write!(f, "VFO-B"),
            Vfo::Memory => write!(f, "MEM"),
        }
    }
}

/// Operating mode of the receiver/transceiver.
///
/// Only the modes the kit-class devices actually implement are listed;
/// QSD/QSE tuners are effectively mode-less and report [`Mode::USB`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Upper sideband voice.
    USB,
    /// Lower sideband voice.
    LSB,
    /// CW (morse).
    CW,
    /// Amplitude modulation.
    AM,
    /// Frequency modulation.
    FM,
    /// Data mode using upper sideband (sound-card digital).
    DataUSB,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::USB => "USB",
            Mode::LSB => "LSB",
            Mode::CW => "CW",
            Mode::AM => "AM",
            Mode::FM => "FM",
            Mode::DataUSB => "DATA-USB",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode: {}", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USB" => Ok(Mode::USB),
            "LSB" => Ok(Mode::LSB),
            "CW" => Ok(Mode::CW),
            "AM" => Ok(Mode::AM),
            "FM" => Ok(Mode::FM),
            "DATA-USB" | "DATAUSB" => Ok(Mode::DataUSB),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Reference oscillator description for a synthesizer chip.
///
/// `reference_hz` is the crystal/reference frequency feeding the chip
/// (e.g. 114.285 MHz for the Si570, 10 MHz for the CY27EE16). `multiplier`
/// relates the programmed chip output to the radio's RF frequency: QSD/QSE
/// front ends clock the mixer at 4x the RF frequency, so the default is 4.
///
/// Both are configurable per device instance at session-open time and then
/// persist for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorRef {
    /// Reference/crystal frequency in Hz.
    pub reference_hz: f64,
    /// Output-to-RF frequency multiplier.
    pub multiplier: f64,
}

impl OscillatorRef {
    /// Create a reference from a frequency in Hz and a multiplier.
    pub fn new(reference_hz: f64, multiplier: f64) -> Self {
        OscillatorRef {
            reference_hz,
            multiplier,
        }
    }

    /// Create a reference from a frequency in MHz.
    pub fn from_mhz(reference_mhz: f64, multiplier: f64) -> Self {
        OscillatorRef {
            reference_hz: reference_mhz * 1e6,
            multiplier,
        }
    }

    /// Reference frequency in MHz (the Si570 solver's working unit).
    pub fn reference_mhz(&self) -> f64 {
        self.reference_hz / 1e6
    }

    /// Scale an RF frequency in Hz up to the chip output frequency.
    pub fn chip_frequency(&self, rf_hz: u64) -> f64 {
        rf_hz as f64 * self.multiplier
    }

    /// Scale a chip output frequency back down to an RF frequency in Hz.
    pub fn rf_frequency(&self, chip_hz: f64) -> u64 {
        (chip_hz / self.multiplier).round() as u64
    }
}
