//! Masked writes to write-only latches on a shared data bus.
//!
//! The latches have no readback, so the session's shadow cache is the
//! writer-of-record for their contents: every write merges into the
//! shadow under a mask and sends the merged byte, which is what keeps
//! unrelated functions sharing a latch (band relays, PTT, DDS control
//! bits) from trampling each other.

use synthlib_core::error::Result;
use synthlib_core::session::Session;
use synthlib_core::transport::LatchBus;
use tracing::trace;

/// Writer for latch-multiplexed boards.
///
/// Stateless by itself; the shadow state lives in the [`Session`] so
/// that it shares the session's lifetime and single-owner discipline.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatchWriter;

impl LatchWriter {
    pub fn new() -> Self {
        LatchWriter
    }

    /// Merge `value` into `latch` under `mask` and write the result out.
    ///
    /// The hardware sequence is: present the merged byte on the bus, let
    /// it settle, pulse the latch's strobe, let it settle.
    pub async fn write_latch(
        &self,
        bus: &mut dyn LatchBus,
        session: &mut Session,
        latch: usize,
        value: u8,
        mask: u8,
    ) -> Result<()> {
        let merged = session.merge_latch(latch, value, mask)?;
        trace!(latch, value, mask, merged, "latch write");
        bus.write_data(merged).await?;
        bus.settle().await;
        bus.strobe(latch).await?;
        bus.settle().await;
        Ok(())
    }

    /// Set or clear a single bit of a latch.
    pub async fn set_bit(
        &self,
        bus: &mut dyn LatchBus,
        session: &mut Session,
        latch: usize,
        bit: u8,
        state: bool,
    ) -> Result<()> {
        let value = if state { 1 << bit } else { 0 };
        self.write_latch(bus, session, latch, value, 1 << bit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthlib_core::types::OscillatorRef;
    use synthlib_test_harness::mock_latch::BusEvent;
    use synthlib_test_harness::MockLatchBus;

    fn session() -> Session {
        Session::new(OscillatorRef::from_mhz(200.0, 1.0))
    }

    #[tokio::test]
    async fn write_latch_sends_merged_byte() {
        let writer = LatchWriter::new();
        let mut bus = MockLatchBus::new();
        let mut session = session();

        writer
            .write_latch(&mut bus, &mut session, 1, 0x0A, 0x0F)
            .await
            .unwrap();
        // Second write to the high nibble must carry the low nibble along.
        writer
            .write_latch(&mut bus, &mut session, 1, 0x50, 0xF0)
            .await
            .unwrap();

        assert_eq!(bus.latched(1), 0x5A);
        assert_eq!(session.latch(1).unwrap(), 0x5A);
        assert_eq!(
            bus.events(),
            &[
                BusEvent::Data(0x0A),
                BusEvent::Strobe(1),
                BusEvent::Data(0x5A),
                BusEvent::Strobe(1),
            ]
        );
    }

    #[tokio::test]
    async fn hardware_and_shadow_agree_across_latches() {
        let writer = LatchWriter::new();
        let mut bus = MockLatchBus::new();
        let mut session = session();

        writer
            .write_latch(&mut bus, &mut session, 0, 0xFF, 0x3F)
            .await
            .unwrap();
        writer
            .write_latch(&mut bus, &mut session, 3, 0x80, 0xC0)
            .await
            .unwrap();

        for latch in 0..4 {
            assert_eq!(bus.latched(latch), session.latch(latch).unwrap());
        }
        assert_eq!(bus.latched(0), 0x3F);
        assert_eq!(bus.latched(3), 0x80);
    }

    #[tokio::test]
    async fn set_bit_touches_only_that_bit() {
        let writer = LatchWriter::new();
        let mut bus = MockLatchBus::new();
        let mut session = session();

        writer
            .write_latch(&mut bus, &mut session, 1, 0x55, 0xFF)
            .await
            .unwrap();
        writer
            .set_bit(&mut bus, &mut session, 1, 7, true)
            .await
            .unwrap();
        assert_eq!(bus.latched(1), 0xD5);

        writer
            .set_bit(&mut bus, &mut session, 1, 0, false)
            .await
            .unwrap();
        assert_eq!(bus.latched(1), 0xD4);
    }

    #[tokio::test]
    async fn failed_write_does_not_strobe() {
        let writer = LatchWriter::new();
        let mut bus = MockLatchBus::new();
        let mut session = session();

        // Out-of-range latch: rejected before any bus traffic.
        assert!(writer
            .write_latch(&mut bus, &mut session, 9, 0x01, 0xFF)
            .await
            .is_err());
        assert!(bus.events().is_empty());
    }
}
