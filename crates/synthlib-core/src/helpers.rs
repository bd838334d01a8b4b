//! Formatting and conversion helpers.
//!
//! Small utility functions shared by the backends and the demo tooling.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// Returns a string like `"14.074000 MHz"` with six decimal places,
/// which is the standard display precision for amateur radio frequencies.
///
/// # Example
///
/// ```
/// use synthlib_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(14_074_000), "14.074000 MHz");
/// assert_eq!(format_freq_mhz(432_100_000), "432.100000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// A frequency in kHz expressed in Hz.
///
/// ```
/// use synthlib_core::khz;
/// assert_eq!(khz(455), 455_000);
/// ```
pub const fn khz(k: u64) -> u64 {
    k * 1_000
}

/// A frequency in MHz expressed in Hz.
///
/// ```
/// use synthlib_core::mhz;
/// assert_eq!(mhz(30), 30_000_000);
/// ```
pub const fn mhz(m: u64) -> u64 {
    m * 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_freq_mhz_hf() {
        assert_eq!(format_freq_mhz(7_040_000), "7.040000 MHz");
    }

    #[test]
    fn format_freq_mhz_sub_hz_precision() {
        assert_eq!(format_freq_mhz(1), "0.000001 MHz");
    }

    #[test]
    fn unit_constructors() {
        assert_eq!(khz(800), 800_000);
        assert_eq!(mhz(54), 54_000_000);
    }
}
