//! Vendor control request codes of the DG8SAQ/PE0FKO firmware family.

/// Read the firmware version (two bytes, value 0x0E00 selects the info
/// record).
pub const READ_VERSION: u8 = 0x00;

/// Read/configure the band-pass filter crossover table.
pub const FILTERS: u8 = 0x17;

/// Write a raw Si570 register image (the host solved the dividers).
pub const SET_FREQ: u8 = 0x30;

/// Set frequency by value: 11.21 fixed-point MHz, little-endian.
pub const SET_FREQ_BY_VALUE: u8 = 0x32;

/// Read back the frequency as 11.21 fixed-point MHz.
pub const READ_FREQUENCY: u8 = 0x3A;

/// Read the calibrated crystal frequency (8.24 fixed-point MHz).
pub const READ_XTALL: u8 = 0x3D;

/// Read the Si570's current register image.
pub const READ_REGISTERS: u8 = 0x3F;

/// Key/unkey the transmitter.
pub const SET_PTT: u8 = 0x50;

/// The shared VID/PID pair the firmware enumerates under.
pub const USB_VID: u16 = 0x16C0;
pub const USB_PID: u16 = 0x05DC;

/// Firmware versions at or above this solve the dividers on the device.
pub const FIRMWARE_BY_VALUE: u16 = 0x0F00;
