//! DDS tuning words and fixed-point frequency encodings.
//!
//! A DDS chip produces `f = word / 2^bits * clock` from a phase
//! accumulator, so programming one is a single fixed-point conversion --
//! no search, no failure mode short of integer overflow. The same
//! fixed-point idea shows up in tuner firmware that accepts a frequency
//! "by value": an 11.21 (or 8.24) fixed-point MHz number instead of raw
//! synthesizer registers.
//!
//! Range checking does not happen here; whether a target is inside the
//! device's tuning range is the capability layer's concern.

/// Phase-accumulator tuning word: `round(f / clock * 2^bits)`.
///
/// `bits` is the accumulator width (32 for the AD9851/AD9835 family).
/// An IF-mixing offset, when the receiver architecture has one, is applied
/// by the caller before conversion.
pub fn phase_word(freq_hz: f64, clock_hz: f64, bits: u32) -> u64 {
    (freq_hz / clock_hz * (1u64 << bits) as f64 + 0.5) as u64
}

/// Inverse of [`phase_word`]; exact to the fixed-point scale.
pub fn phase_word_to_hz(word: u64, clock_hz: f64, bits: u32) -> f64 {
    word as f64 / (1u64 << bits) as f64 * clock_hz
}

/// Fixed-point MHz encoding: `round(f_mhz * 2^frac_bits)`.
///
/// Firmware "set frequency by value" commands use 21 fraction bits; the
/// calibrated-crystal record uses 24.
pub fn fixed_point_mhz(freq_mhz: f64, frac_bits: u32) -> u32 {
    (freq_mhz * (1u64 << frac_bits) as f64).round() as u32
}

/// Decode a fixed-point MHz value back to MHz.
pub fn fixed_point_mhz_to_mhz(raw: u32, frac_bits: u32) -> f64 {
    raw as f64 / (1u64 << frac_bits) as f64
}
