//! Waveform-buffered bit-banged I2C.
//!
//! The FT232R-style bit-bang interface replays a buffer of port-byte
//! samples at a fixed rate, so instead of driving SCL/SDA transition by
//! transition we render the whole register write into a byte buffer and
//! push it through the transport in a single bulk write. SDA and SCL
//! occupy the low two port bits; the remaining six bits (antenna mux,
//! attenuator relays on the receiver this ships on) are carried along
//! unchanged in every sample.
//!
//! The device never acknowledges: the master clocks the ACK slot with
//! SDA released and moves on.

use synthlib_core::error::Result;
use synthlib_core::transport::Transport;
use tracing::trace;

/// SDA position in the port byte.
pub const SDA_BIT: u8 = 0x01;

/// SCL position in the port byte.
pub const SCL_BIT: u8 = 0x02;

/// Incremental builder for an I2C waveform.
///
/// Starts from the current port-byte state so the non-I2C bits survive;
/// [`I2cWaveform::port_state`] afterwards returns the final state for the
/// caller to carry into its next waveform.
#[derive(Debug, Clone)]
pub struct I2cWaveform {
    port: u8,
    samples: Vec<u8>,
}

impl I2cWaveform {
    /// Start a waveform from the given port-byte state.
    pub fn new(port: u8) -> Self {
        I2cWaveform {
            port,
            samples: Vec::new(),
        }
    }

    fn scl(&mut self, high: bool) {
        if high {
            self.port |= SCL_BIT;
        } else {
            self.port &= !SCL_BIT;
        }
        self.samples.push(self.port);
    }

    fn sda(&mut self, high: bool) {
        if high {
            self.port |= SDA_BIT;
        } else {
            self.port &= !SDA_BIT;
        }
        self.samples.push(self.port);
    }

    /// Idle both lines high.
    pub fn init(&mut self) {
        self.scl(true);
        self.sda(true);
    }

    /// Start condition: SDA falls while SCL is high, then SCL falls.
    pub fn start(&mut self) {
        self.sda(false);
        self.scl(false);
    }

    /// Stop condition: SDA rises after SCL.
    pub fn stop(&mut self) {
        self.scl(false);
        self.sda(false);
        self.scl(true);
        self.sda(true);
    }

    /// One data byte, MSB first, followed by the (ignored) ACK clock.
    pub fn write_byte(&mut self, byte: u8) {
        for i in (0..8).rev() {
            self.sda(byte & (1 << i) != 0);
            self.scl(true);
            self.scl(false);
        }
        // Release SDA and clock the ACK slot.
        self.sda(true);
        self.scl(true);
        self.scl(false);
    }

    /// Final port-byte state after the rendered transitions.
    pub fn port_state(&self) -> u8 {
        self.port
    }

    /// The rendered samples.
    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }
}

/// Render a complete register write: start, device address, register
/// address, data bytes, stop.
pub fn register_write_waveform(port: u8, device_addr: u8, reg_addr: u8, values: &[u8]) -> Vec<u8> {
    let mut wf = I2cWaveform::new(port);
    wf.init();
    wf.start();
    wf.write_byte(device_addr);
    wf.write_byte(reg_addr);
    for &v in values {
        wf.write_byte(v);
    }
    wf.stop();
    wf.into_samples()
}

/// Render and send a register write over the transport.
///
/// Success means the bulk write completed; the bus has no acknowledgement
/// to check.
pub async fn write_registers(
    transport: &mut dyn Transport,
    port: u8,
    device_addr: u8,
    reg_addr: u8,
    values: &[u8],
) -> Result<()> {
    trace!(device_addr, reg_addr, ?values, "I2C register write");
    let waveform = register_write_waveform(port, device_addr, reg_addr, values);
    transport.send(&waveform).await
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode the bytes a slave would see: sample SDA on each rising SCL
    /// edge, 9 bits per byte (8 data + ACK).
    fn decode(samples: &[u8]) -> Vec<u8> {
        let mut bits = Vec::new();
        let mut prev_scl = false;
        // Skip the init/start preamble: begin collecting after the first
        // falling SCL that follows a low SDA (the start condition).
        let mut started = false;
        for &s in samples {
            let scl = s & SCL_BIT != 0;
            let sda = s & SDA_BIT != 0;
            if !started {
                if !scl && !sda {
                    started = true;
                    prev_scl = false;
                }
                continue;
            }
            if scl && !prev_scl {
                bits.push(sda);
            }
            prev_scl = scl;
        }
        // Drop the stop condition's trailing rising edge, then strip the
        // ACK bit from each 9-bit group.
        bits.pop();
        bits.chunks(9)
            .filter(|c| c.len() == 9)
            .map(|c| {
                c[..8]
                    .iter()
                    .fold(0u8, |acc, &b| (acc << 1) | u8::from(b))
            })
            .collect()
    }

    #[test]
    fn single_register_write_decodes() {
        let samples = register_write_waveform(0x03, 210, 0x0C, &[0x08]);
        assert_eq!(decode(&samples), vec![210, 0x0C, 0x08]);
    }

    #[test]
    fn multi_register_write_decodes() {
        let samples = register_write_waveform(0x03, 210, 0x40, &[0xD1, 0xF0, 0x26]);
        assert_eq!(decode(&samples), vec![210, 0x40, 0xD1, 0xF0, 0x26]);
    }

    #[test]
    fn sample_count_is_deterministic() {
        // init 2 + start 2 + 3 bytes x 27 + stop 4.
        let samples = register_write_waveform(0x00, 0xD2, 0x09, &[0x20]);
        assert_eq!(samples.len(), 2 + 2 + 3 * 27 + 4);
    }

    #[test]
    fn upper_port_bits_survive() {
        // Mux/attenuator bits (2..7) must appear unchanged in every sample.
        let samples = register_write_waveform(0xA8, 210, 0x12, &[0x32]);
        for s in samples {
            assert_eq!(s & 0xFC, 0xA8);
        }
    }

    #[test]
    fn ends_with_both_lines_high() {
        let mut wf = I2cWaveform::new(0x00);
        wf.init();
        wf.start();
        wf.write_byte(0x55);
        wf.stop();
        assert_eq!(wf.port_state() & (SDA_BIT | SCL_BIT), SDA_BIT | SCL_BIT);
    }
}
