//! YaesuRig -- classic Yaesu binary CAT driver.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::Transport;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{Mode, OscillatorRef, Vfo};
use synthlib_transaction::{ResponseShape, TransactionEngine};

use crate::protocol::{self, opcode, StatusBlock};

/// Driver for five-byte-frame Yaesu rigs.
///
/// Every command follows the same discipline: send the frame, read the
/// rig's byte-for-byte echo, send the "go" frame, read the status block.
/// The status block refreshes the session's cached view of both VFOs on
/// every exchange, so get-operations after any command are served with
/// current data.
pub struct YaesuRig {
    transport: Mutex<Box<dyn Transport>>,
    session: Mutex<Session>,
    engine: TransactionEngine,
}

impl std::fmt::Debug for YaesuRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YaesuRig").finish_non_exhaustive()
    }
}

impl YaesuRig {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        command_timeout: Duration,
        retry_budget: u32,
    ) -> Self {
        YaesuRig {
            transport: Mutex::new(transport),
            // The synthesizer is internal; no outboard oscillator.
            session: Mutex::new(Session::new(OscillatorRef::new(0.0, 1.0))),
            engine: TransactionEngine::new(command_timeout, retry_budget),
        }
    }

    /// One-time pacing setup, run at session open.
    pub(crate) async fn set_pacing(&self, pacing: u8) -> Result<()> {
        self.execute(protocol::frame(0, 0, 0, pacing, opcode::PACING))
            .await?;
        Ok(())
    }

    /// Run one echo-validated command and read back the status block.
    async fn execute(&self, cmd: [u8; protocol::CMD_LENGTH]) -> Result<StatusBlock> {
        let mut transport = self.transport.lock().await;

        // The rig echoes state-changing frames before acting on them; a
        // mismatched echo means the frame must be re-issued, which the
        // engine handles inside its retry budget.
        self.engine
            .transact(transport.as_mut(), &cmd, &ResponseShape::Echo)
            .await?;

        let block = self
            .engine
            .transact(
                transport.as_mut(),
                &protocol::CMD_GO,
                &ResponseShape::fixed(protocol::STATUS_LENGTH),
            )
            .await?;
        let status = protocol::parse_status(&block)?;
        trace!(?status, "status block");

        // The block is the rig's own report, so it is always safe to
        // fold into the cache -- including after set-commands, where it
        // doubles as the confirmation.
        let mut session = self.session.lock().await;
        session.set_frequency(Vfo::A, status.vfo_a_freq_hz);
        session.set_frequency(Vfo::B, status.vfo_b_freq_hz);
        session.set_mode(status.op_mode);
        session.select_vfo(status.current_vfo);
        session.set_last_mem_channel(status.mem_channel);
        Ok(status)
    }

    /// Query the full status block without changing rig state.
    pub async fn status(&self) -> Result<StatusBlock> {
        self.execute(protocol::frame(0, 0, 0, 0, opcode::STATUS))
            .await
    }
}

#[async_trait]
impl Tuner for YaesuRig {
    async fn set_frequency(&self, vfo: Vfo, freq_hz: u64) -> Result<()> {
        // The set-frequency frame targets the active VFO; select first
        // when the caller addresses the other one. Order matters: the
        // rig applies frames strictly in sequence.
        let current = self.session.lock().await.current_vfo();
        if vfo != current {
            self.select_vfo(vfo).await?;
        }

        let cmd = protocol::encode_set_freq(freq_hz)?;
        self.execute(cmd).await?;
        Ok(())
    }

    async fn get_frequency(&self, vfo: Vfo) -> Result<u64> {
        let status = self.status().await?;
        match vfo {
            Vfo::A => Ok(status.vfo_a_freq_hz),
            Vfo::B => Ok(status.vfo_b_freq_hz),
            Vfo::Memory => Err(Error::InvalidParameter(
                "memory register has no direct frequency readout".into(),
            )),
        }
    }

    async fn select_vfo(&self, vfo: Vfo) -> Result<()> {
        let p4 = match vfo {
            Vfo::A => 0,
            Vfo::B => 1,
            Vfo::Memory => {
                return Err(Error::InvalidParameter(
                    "select a memory channel with recall_memory".into(),
                ))
            }
        };
        self.execute(protocol::frame(0, 0, 0, p4, opcode::SELECT_VFO))
            .await?;
        Ok(())
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        let code = protocol::mode_code(mode)?;
        self.execute(protocol::frame(0, 0, 0, code, opcode::SET_MODE))
            .await?;
        Ok(())
    }

    async fn get_mode(&self) -> Result<Mode> {
        Ok(self.status().await?.op_mode)
    }

    async fn set_ptt(&self, on: bool) -> Result<()> {
        self.execute(protocol::frame(0, 0, 0, u8::from(on), opcode::PTT))
            .await?;
        Ok(())
    }

    async fn recall_memory(&self, channel: u32) -> Result<()> {
        if channel > protocol::MAX_MEM_CHANNEL {
            return Err(Error::InvalidParameter(format!(
                "memory channel {channel} beyond {}",
                protocol::MAX_MEM_CHANNEL
            )));
        }
        self.execute(protocol::frame(0, 0, 0, channel as u8, opcode::RECALL_MEMORY))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::test_status_block;
    use synthlib_test_harness::MockTransport;

    fn rig_with(mock: MockTransport) -> YaesuRig {
        YaesuRig::new(Box::new(mock), Duration::from_millis(50), 2)
    }

    fn expect_exchange(mock: &mut MockTransport, cmd: &[u8], block: &[u8]) {
        mock.expect(cmd, cmd); // echo
        mock.expect(&protocol::CMD_GO, block);
    }

    // -------------------------------------------------------------------
    // Frequency
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn set_frequency_echo_go_status() {
        let mut mock = MockTransport::new();
        let cmd = protocol::encode_set_freq(14_250_000).unwrap();
        let block = test_status_block(14_250_000, 14_250_000, 7_030_000, 1, 0x00, 0);
        expect_exchange(&mut mock, &cmd, &block);

        let rig = rig_with(mock);
        rig.set_frequency(Vfo::A, 14_250_000).await.unwrap();

        let session = rig.session.lock().await;
        assert_eq!(session.frequency(Vfo::A), Some(14_250_000));
        assert_eq!(session.frequency(Vfo::B), Some(7_030_000));
    }

    #[tokio::test]
    async fn set_frequency_on_inactive_vfo_selects_first() {
        let mut mock = MockTransport::new();
        // Select VFO B, then set. Status after select reports B active.
        let select = protocol::frame(0, 0, 0, 1, opcode::SELECT_VFO);
        let block_b = test_status_block(7_030_000, 14_250_000, 7_030_000, 1, 0x01, 0);
        expect_exchange(&mut mock, &select, &block_b);

        let cmd = protocol::encode_set_freq(7_100_000).unwrap();
        let block_after = test_status_block(7_100_000, 14_250_000, 7_100_000, 1, 0x01, 0);
        expect_exchange(&mut mock, &cmd, &block_after);

        let rig = rig_with(mock);
        rig.set_frequency(Vfo::B, 7_100_000).await.unwrap();

        let session = rig.session.lock().await;
        // VFO A's cache is untouched by the B-side set.
        assert_eq!(session.frequency(Vfo::A), Some(14_250_000));
        assert_eq!(session.frequency(Vfo::B), Some(7_100_000));
        assert_eq!(session.current_vfo(), Vfo::B);
    }

    #[tokio::test]
    async fn get_frequency_reads_status_block() {
        let mut mock = MockTransport::new();
        let status = protocol::frame(0, 0, 0, 0, opcode::STATUS);
        let block = test_status_block(14_250_000, 14_250_000, 7_030_000, 0, 0x00, 5);
        expect_exchange(&mut mock, &status, &block);

        let rig = rig_with(mock);
        assert_eq!(rig.get_frequency(Vfo::B).await.unwrap(), 7_030_000);
        // The combined status command refreshed everything else too.
        let session = rig.session.lock().await;
        assert_eq!(session.frequency(Vfo::A), Some(14_250_000));
        assert_eq!(session.mode(), Some(Mode::LSB));
        assert_eq!(session.last_mem_channel(), Some(5));
    }

    // -------------------------------------------------------------------
    // Echo discipline
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn bad_echo_exhausts_budget_as_protocol_error() {
        let mut mock = MockTransport::new();
        let cmd = protocol::encode_set_freq(14_250_000).unwrap();
        let garbled = [0xFF, 0x50, 0x42, 0x01, 0x08];
        // Budget 2 = three attempts, every echo garbled.
        for _ in 0..3 {
            mock.expect(&cmd, &garbled);
        }

        let rig = rig_with(mock);
        let err = rig.set_frequency(Vfo::A, 14_250_000).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        // The failed set must not leave a cached frequency behind.
        assert_eq!(rig.session.lock().await.frequency(Vfo::A), None);
    }

    #[tokio::test]
    async fn garbled_echo_then_clean_matches_clean_run() {
        let mut mock = MockTransport::new();
        let cmd = protocol::encode_set_freq(14_250_000).unwrap();
        let garbled = [0xFF, 0x50, 0x42, 0x01, 0x08];
        let block = test_status_block(14_250_000, 14_250_000, 0, 1, 0x00, 0);
        // Two bad echoes, then the exchange completes.
        mock.expect(&cmd, &garbled);
        mock.expect(&cmd, &garbled);
        expect_exchange(&mut mock, &cmd, &block);

        let rig = rig_with(mock);
        rig.set_frequency(Vfo::A, 14_250_000).await.unwrap();

        // Same final state as a first-try success: no duplicate or
        // partial side effects from the retries.
        let session = rig.session.lock().await;
        assert_eq!(session.frequency(Vfo::A), Some(14_250_000));
        assert_eq!(session.current_vfo(), Vfo::A);
    }

    #[tokio::test]
    async fn short_status_block_is_protocol_error() {
        let mut mock = MockTransport::new();
        let status = protocol::frame(0, 0, 0, 0, opcode::STATUS);
        mock.expect(&status, &status);
        // The rig stalls mid-block; the engine keeps retrying the go
        // frame and then gives up on the bounded read.
        let short = vec![0u8; 12];
        for _ in 0..3 {
            mock.expect(&protocol::CMD_GO, &short);
        }

        let rig = rig_with(mock);
        let err = rig.status().await.unwrap_err();
        assert!(matches!(err, Error::Timeout | Error::Protocol(_)));
    }

    // -------------------------------------------------------------------
    // Mode / memory
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn set_mode_sends_code() {
        let mut mock = MockTransport::new();
        let cmd = protocol::frame(0, 0, 0, 2, opcode::SET_MODE);
        let block = test_status_block(14_025_000, 14_025_000, 0, 2, 0x00, 0);
        expect_exchange(&mut mock, &cmd, &block);

        let rig = rig_with(mock);
        rig.set_mode(Mode::CW).await.unwrap();
        assert_eq!(rig.session.lock().await.mode(), Some(Mode::CW));
    }

    #[tokio::test]
    async fn recall_memory_tracks_channel() {
        let mut mock = MockTransport::new();
        let cmd = protocol::frame(0, 0, 0, 7, opcode::RECALL_MEMORY);
        let block = test_status_block(3_573_000, 3_573_000, 0, 1, 0x00, 7);
        expect_exchange(&mut mock, &cmd, &block);

        let rig = rig_with(mock);
        rig.recall_memory(7).await.unwrap();
        assert_eq!(rig.session.lock().await.last_mem_channel(), Some(7));
    }

    #[tokio::test]
    async fn recall_memory_out_of_range() {
        let rig = rig_with(MockTransport::new());
        assert!(matches!(
            rig.recall_memory(99).await.unwrap_err(),
            Error::InvalidParameter(_)
        ));
    }
}
