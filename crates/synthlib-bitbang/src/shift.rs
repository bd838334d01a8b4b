//! Synchronous clock/data/strobe shifting.
//!
//! The protocol, common to the whole chip family:
//!
//! 1. Idle: clock low, strobe deasserted.
//! 2. Per bit: drive the data line to the bit value, pulse the clock
//!    high then low.
//! 3. After a full register (address plus data field where the chip has
//!    one), pulse the strobe line to commit the shifted shadow value
//!    into the active register.
//!
//! Every transition is followed by the transport's settling delay. Bit
//! order and data-line polarity vary per chip: the AD9851 serial load is
//! LSB-first, the AD9835 is MSB-first with an inverted data line because
//! it hangs off RS-232 drivers.

use synthlib_core::error::Result;
use synthlib_core::transport::ControlLines;
use tracing::trace;

/// Shift direction for a register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Most significant bit first.
    #[default]
    MsbFirst,
    /// Least significant bit first (AD9851 serial load mode).
    LsbFirst,
}

/// Bit-banged register writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftWriter {
    pub bit_order: BitOrder,
    /// Invert the data line (RS-232 level shifters invert).
    pub invert_data: bool,
}

impl ShiftWriter {
    /// MSB-first writer with true data polarity.
    pub fn msb_first() -> Self {
        ShiftWriter {
            bit_order: BitOrder::MsbFirst,
            invert_data: false,
        }
    }

    /// LSB-first writer with true data polarity.
    pub fn lsb_first() -> Self {
        ShiftWriter {
            bit_order: BitOrder::LsbFirst,
            invert_data: false,
        }
    }

    /// Invert the data line.
    pub fn with_inverted_data(mut self) -> Self {
        self.invert_data = true;
        self
    }

    /// Drive all lines to the idle state: clock low, data low, strobe
    /// deasserted.
    pub async fn idle(&self, lines: &mut dyn ControlLines) -> Result<()> {
        lines.set_clock(false).await?;
        lines.settle().await;
        lines.set_data(self.invert_data).await?;
        lines.settle().await;
        lines.set_strobe(false).await?;
        lines.settle().await;
        Ok(())
    }

    /// Shift the low `nbits` bits of `value` out on the data line.
    pub async fn shift_bits(
        &self,
        lines: &mut dyn ControlLines,
        value: u64,
        nbits: u32,
    ) -> Result<()> {
        trace!(value, nbits, order = ?self.bit_order, "shifting bits");
        for i in 0..nbits {
            let bit = match self.bit_order {
                BitOrder::MsbFirst => (value >> (nbits - 1 - i)) & 1 != 0,
                BitOrder::LsbFirst => (value >> i) & 1 != 0,
            };
            lines.set_data(bit != self.invert_data).await?;
            lines.settle().await;
            lines.set_clock(true).await?;
            lines.settle().await;
            lines.set_clock(false).await?;
            lines.settle().await;
        }
        Ok(())
    }

    /// Pulse the strobe line high then low, committing the shifted value.
    pub async fn pulse_strobe(&self, lines: &mut dyn ControlLines) -> Result<()> {
        lines.set_strobe(true).await?;
        lines.settle().await;
        lines.set_strobe(false).await?;
        lines.settle().await;
        Ok(())
    }

    /// Shift a value and commit it with a strobe pulse.
    pub async fn write_word(
        &self,
        lines: &mut dyn ControlLines,
        value: u64,
        nbits: u32,
    ) -> Result<()> {
        self.shift_bits(lines, value, nbits).await?;
        self.pulse_strobe(lines).await
    }

    /// Shift a value inside a strobe-framed window (frame-sync chips:
    /// the strobe is held asserted for the whole word instead of pulsed
    /// after it).
    pub async fn write_framed(
        &self,
        lines: &mut dyn ControlLines,
        value: u64,
        nbits: u32,
    ) -> Result<()> {
        lines.set_clock(false).await?;
        lines.settle().await;
        lines.set_strobe(true).await?;
        lines.settle().await;
        self.shift_bits(lines, value, nbits).await?;
        lines.set_strobe(false).await?;
        lines.settle().await;
        Ok(())
    }

    /// Load an addressed register: shift the address byte, then
    /// `byte_count` bytes of `value`, then commit with the strobe.
    pub async fn write_register(
        &self,
        lines: &mut dyn ControlLines,
        address: u8,
        value: u64,
        byte_count: u32,
    ) -> Result<()> {
        self.shift_bits(lines, address as u64, 8).await?;
        self.shift_bits(lines, value, byte_count * 8).await?;
        self.pulse_strobe(lines).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthlib_test_harness::{LineEvent, MockControlLines};

    fn bits_to_value(bits: &[bool], order: BitOrder) -> u64 {
        let mut value = 0u64;
        for (i, &b) in bits.iter().enumerate() {
            if b {
                match order {
                    BitOrder::MsbFirst => value |= 1 << (bits.len() - 1 - i),
                    BitOrder::LsbFirst => value |= 1 << i,
                }
            }
        }
        value
    }

    // -------------------------------------------------------------------
    // Bit order and polarity
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn msb_first_shifts_high_bit_first() {
        let mut lines = MockControlLines::new();
        ShiftWriter::msb_first()
            .shift_bits(&mut lines, 0b1010_0001, 8)
            .await
            .unwrap();

        assert_eq!(
            lines.clocked_bits(),
            vec![true, false, true, false, false, false, false, true]
        );
    }

    #[tokio::test]
    async fn lsb_first_shifts_low_bit_first() {
        let mut lines = MockControlLines::new();
        ShiftWriter::lsb_first()
            .shift_bits(&mut lines, 0b1010_0001, 8)
            .await
            .unwrap();

        assert_eq!(
            lines.clocked_bits(),
            vec![true, false, false, false, false, true, false, true]
        );
    }

    #[tokio::test]
    async fn inverted_data_flips_every_bit() {
        let mut lines = MockControlLines::new();
        ShiftWriter::msb_first()
            .with_inverted_data()
            .shift_bits(&mut lines, 0b1100, 4)
            .await
            .unwrap();

        assert_eq!(lines.clocked_bits(), vec![false, false, true, true]);
    }

    #[tokio::test]
    async fn round_trip_32_bit_word() {
        for order in [BitOrder::MsbFirst, BitOrder::LsbFirst] {
            let writer = ShiftWriter {
                bit_order: order,
                invert_data: false,
            };
            let mut lines = MockControlLines::new();
            writer
                .shift_bits(&mut lines, 0xDEAD_BEEF, 32)
                .await
                .unwrap();
            assert_eq!(bits_to_value(&lines.clocked_bits(), order), 0xDEAD_BEEF);
        }
    }

    // -------------------------------------------------------------------
    // Settling and strobe discipline
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn every_transition_settles() {
        let mut lines = MockControlLines::new();
        ShiftWriter::msb_first()
            .write_word(&mut lines, 0xF0, 8)
            .await
            .unwrap();

        // 8 bits x 3 transitions + 2 strobe transitions.
        assert_eq!(lines.events().len(), 8 * 3 + 2);
        assert_eq!(lines.settle_count(), lines.events().len());
    }

    #[tokio::test]
    async fn write_word_ends_with_strobe_pulse() {
        let mut lines = MockControlLines::new();
        ShiftWriter::lsb_first()
            .write_word(&mut lines, 0x3, 2)
            .await
            .unwrap();

        let events = lines.events();
        assert_eq!(
            &events[events.len() - 2..],
            &[LineEvent::Strobe(true), LineEvent::Strobe(false)]
        );
    }

    #[tokio::test]
    async fn framed_write_wraps_bits_in_strobe() {
        let mut lines = MockControlLines::new();
        ShiftWriter::msb_first()
            .write_framed(&mut lines, 0xABCD, 16)
            .await
            .unwrap();

        let events = lines.events();
        assert_eq!(events[0], LineEvent::Clock(false));
        assert_eq!(events[1], LineEvent::Strobe(true));
        assert_eq!(*events.last().unwrap(), LineEvent::Strobe(false));
        assert_eq!(
            bits_to_value(&lines.clocked_bits(), BitOrder::MsbFirst),
            0xABCD
        );
    }

    #[tokio::test]
    async fn write_register_prefixes_address() {
        let mut lines = MockControlLines::new();
        ShiftWriter::msb_first()
            .write_register(&mut lines, 0x04, 0xCAFE, 2)
            .await
            .unwrap();

        let bits = lines.clocked_bits();
        assert_eq!(bits.len(), 24);
        assert_eq!(bits_to_value(&bits[..8], BitOrder::MsbFirst), 0x04);
        assert_eq!(bits_to_value(&bits[8..], BitOrder::MsbFirst), 0xCAFE);
    }

    #[tokio::test]
    async fn idle_parks_all_lines() {
        let mut lines = MockControlLines::new();
        ShiftWriter::msb_first().idle(&mut lines).await.unwrap();
        assert_eq!(
            lines.events(),
            &[
                LineEvent::Clock(false),
                LineEvent::Data(false),
                LineEvent::Strobe(false),
            ]
        );
    }
}
