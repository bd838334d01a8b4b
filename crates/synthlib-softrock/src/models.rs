//! Known SoftRock-family tuner models and their per-model defaults.

/// Static description of one tuner model.
#[derive(Debug, Clone)]
pub struct SoftRockModel {
    /// Display name.
    pub name: &'static str,
    /// Default output-to-RF multiplier (4 for QSD/QSE front ends that
    /// divide the clock by four, 2 for the PIC units).
    pub multiplier: f64,
    /// Default Si570 I2C address on the tuner's bus.
    pub i2c_addr: u16,
    /// Whether the firmware always takes the by-value path regardless of
    /// its reported version.
    pub always_by_value: bool,
    /// Whether to enable the band-pass filter bank at open (receive-only
    /// kits wire it in; transceivers share the line with PTT).
    pub bpf: bool,
}

/// SoftRock with DG8SAQ AVR firmware.
pub fn si570_avr_usb() -> SoftRockModel {
    SoftRockModel {
        name: "Si570 AVR-USB",
        multiplier: 4.0,
        i2c_addr: 0x55,
        always_by_value: false,
        bpf: false,
    }
}

/// KTH-SDR PIC variant; receive-only, device-side solver.
pub fn si570_pic_usb() -> SoftRockModel {
    SoftRockModel {
        name: "Si570 PIC-USB",
        multiplier: 2.0,
        i2c_addr: 0x55,
        always_by_value: true,
        bpf: true,
    }
}

/// Peaberry SDR (either hardware revision).
pub fn peaberry() -> SoftRockModel {
    SoftRockModel {
        name: "Peaberry SDR",
        multiplier: 4.0,
        i2c_addr: 0x55,
        always_by_value: true,
        bpf: false,
    }
}

/// FA-SDR transceiver.
pub fn fa_sdr() -> SoftRockModel {
    SoftRockModel {
        name: "FA-SDR",
        multiplier: 4.0,
        i2c_addr: 0x55,
        always_by_value: false,
        bpf: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_defaults() {
        assert_eq!(si570_avr_usb().multiplier, 4.0);
        assert_eq!(si570_pic_usb().multiplier, 2.0);
        assert!(si570_pic_usb().always_by_value);
        assert!(!si570_avr_usb().always_by_value);
    }
}
