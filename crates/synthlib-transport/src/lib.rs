//! synthlib-transport: physical links to the devices.
//!
//! - [`SerialTransport`] -- USB virtual COM ports and RS-232, via
//!   `tokio-serial`. Also exposes the DTR/RTS/break control lines the
//!   bit-banged kits are wired to.
//! - [`SerialControlLines`] -- adapter presenting a serial port's control
//!   lines as the clock/data/strobe roles the register writers expect.
//! - [`UsbControlTransport`] -- vendor control transfers to USB dongle
//!   tuners, via `nusb`.
//! - [`FtdiBitbangTransport`] -- FT232R asynchronous bit-bang mode for
//!   waveform-driven boards.

pub mod ftdi;
pub mod serial;
pub mod usb;

pub use ftdi::FtdiBitbangTransport;
pub use serial::{LineRole, SerialControlLines, SerialTransport};
pub use usb::UsbControlTransport;
