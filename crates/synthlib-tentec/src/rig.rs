//! TentecRig -- the Ten-Tec DSP transceiver driver.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use synthlib_core::error::{Error, Result};
use synthlib_core::session::Session;
use synthlib_core::transport::Transport;
use synthlib_core::tuner::Tuner;
use synthlib_core::types::{Mode, OscillatorRef, Vfo};
use synthlib_transaction::{ResponseShape, TransactionEngine};

use crate::protocol;

/// How many DSP restarts to attempt when resynchronizing.
const RESYNC_ATTEMPTS: u32 = 3;

/// Driver for Ten-Tec DSP transceivers.
///
/// One `TentecRig` owns one serial link and the session cache for that
/// link. Commands run strictly one at a time; the transport mutex also
/// serializes any accidental cross-task use.
pub struct TentecRig {
    transport: Mutex<Box<dyn Transport>>,
    session: Mutex<Session>,
    engine: TransactionEngine,
}

impl std::fmt::Debug for TentecRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TentecRig").finish_non_exhaustive()
    }
}

impl TentecRig {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        command_timeout: Duration,
        retry_budget: u32,
    ) -> Self {
        TentecRig {
            transport: Mutex::new(transport),
            // DSP rig: the synthesizer is internal, there is no outboard
            // oscillator to describe.
            session: Mutex::new(Session::new(OscillatorRef::new(0.0, 1.0))),
            engine: TransactionEngine::new(command_timeout, retry_budget)
                .with_forced_response_prefix(b"?"),
        }
    }

    /// Restart the DSP and wait for the `RADIO START` banner.
    pub(crate) async fn restart_dsp(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        self.restart_dsp_locked(transport.as_mut()).await
    }

    async fn restart_dsp_locked(&self, transport: &mut dyn Transport) -> Result<()> {
        let banner = self
            .engine
            .transact(transport, b"XX\r", &ResponseShape::line(protocol::EOM))
            .await?;
        if !banner
            .windows(protocol::RESTART_BANNER.len())
            .any(|w| w == protocol::RESTART_BANNER)
        {
            return Err(Error::Protocol(format!(
                "unexpected restart banner: {banner:02X?}"
            )));
        }
        Ok(())
    }

    /// Run a transaction; on failure, restart the DSP to resynchronize
    /// and try the command once more.
    ///
    /// The DSP occasionally wedges after a malformed command and answers
    /// everything with stale bytes. The engine's own retries handle line
    /// noise; this outer loop handles the wedge.
    async fn transact(&self, cmd: &[u8], shape: &ResponseShape) -> Result<Vec<u8>> {
        let mut transport = self.transport.lock().await;

        let first = self.engine.transact(transport.as_mut(), cmd, shape).await;
        let err = match first {
            Ok(response) => return Ok(response),
            Err(e @ (Error::Timeout | Error::Protocol(_))) => e,
            Err(e) => return Err(e),
        };

        warn!(?err, "transaction failed, restarting DSP to resync");
        let mut restarted = false;
        for attempt in 0..RESYNC_ATTEMPTS {
            match self.restart_dsp_locked(transport.as_mut()).await {
                Ok(()) => {
                    restarted = true;
                    break;
                }
                Err(e) => debug!(attempt, ?e, "DSP restart attempt failed"),
            }
        }
        if !restarted {
            return Err(err);
        }

        self.engine.transact(transport.as_mut(), cmd, shape).await
    }

    async fn query_mode_chars(&self) -> Result<(u8, u8)> {
        let response = self
            .transact(
                b"?M\r",
                &ResponseShape::line_exact(protocol::EOM, protocol::MODE_RESPONSE_LEN)
                    .with_marker(b"M"),
            )
            .await?;
        protocol::parse_mode_response(&response)
    }
}

#[async_trait]
impl Tuner for TentecRig {
    async fn set_frequency(&self, vfo: Vfo, freq_hz: u64) -> Result<()> {
        let cmd = protocol::encode_set_freq(vfo, freq_hz)?;
        self.transact(&cmd, &ResponseShape::None).await?;

        // Cache only after the write went out without error.
        let mut session = self.session.lock().await;
        session.set_frequency(vfo, freq_hz);
        Ok(())
    }

    async fn get_frequency(&self, vfo: Vfo) -> Result<u64> {
        let cmd = protocol::encode_get_freq(vfo)?;
        let marker = [protocol::vfo_char(vfo)?];
        let response = self
            .transact(
                &cmd,
                &ResponseShape::line_exact(protocol::EOM, protocol::FREQ_RESPONSE_LEN)
                    .with_marker(&marker),
            )
            .await?;
        let freq_hz = protocol::parse_freq_response(&response)?;

        // Refresh the cache from the readback.
        let mut session = self.session.lock().await;
        session.set_frequency(vfo, freq_hz);
        Ok(freq_hz)
    }

    async fn select_vfo(&self, vfo: Vfo) -> Result<()> {
        // Commands address VFOs explicitly, so selection is session
        // state only; Memory is not addressable on this rig.
        protocol::vfo_char(vfo)?;
        self.session.lock().await.select_vfo(vfo);
        Ok(())
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        let c = protocol::mode_char(mode)?;
        let (main, sub) = self.query_mode_chars().await?;

        // Only the active VFO's character changes.
        let current = self.session.lock().await.current_vfo();
        let (main, sub) = match current {
            Vfo::B => (main, c),
            _ => (c, sub),
        };

        let cmd = protocol::encode_set_mode(main, sub);
        self.transact(&cmd, &ResponseShape::None).await?;

        self.session.lock().await.set_mode(mode);
        Ok(())
    }

    async fn get_mode(&self) -> Result<Mode> {
        let (main, sub) = self.query_mode_chars().await?;
        let current = self.session.lock().await.current_vfo();
        let c = match current {
            Vfo::B => sub,
            _ => main,
        };
        let mode = protocol::parse_mode_char(c)?;
        self.session.lock().await.set_mode(mode);
        Ok(mode)
    }

    async fn send_morse(&self, msg: &str) -> Result<()> {
        // One-time keyer setup, tracked per session rather than in any
        // process-wide flag: two rigs on two ports each get their own.
        if !self.session.lock().await.keyer_enabled() {
            self.transact(b"*CK1\r", &ResponseShape::None).await?;
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.session.lock().await.set_keyer_enabled(true);
        }

        for c in msg.chars().take(20) {
            if !c.is_ascii() {
                return Err(Error::InvalidParameter(format!(
                    "non-ASCII character {c:?} in Morse message"
                )));
            }
            let cmd = [b'/', c as u8, protocol::EOM];
            self.transact(&cmd, &ResponseShape::None).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthlib_test_harness::MockTransport;

    // The mock errors on any out-of-order or unexpected send, so a test
    // that drives the rig to completion has also proven the exact wire
    // sequence.
    fn rig_with(mock: MockTransport) -> TentecRig {
        TentecRig::new(Box::new(mock), Duration::from_millis(50), 2)
    }

    // -------------------------------------------------------------------
    // Frequency
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn set_frequency_updates_cache_on_success() {
        let mut mock = MockTransport::new();
        let cmd = protocol::encode_set_freq(Vfo::A, 14_074_000).unwrap();
        mock.expect(&cmd, b"");

        let rig = rig_with(mock);
        rig.set_frequency(Vfo::A, 14_074_000).await.unwrap();

        assert_eq!(
            rig.session.lock().await.frequency(Vfo::A),
            Some(14_074_000)
        );
    }

    #[tokio::test]
    async fn failed_set_leaves_cache_unchanged() {
        // No expectations: the send itself errors out.
        let mock = MockTransport::new();
        let rig = rig_with(mock);

        let err = rig.set_frequency(Vfo::A, 14_074_000).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_) | Error::Timeout));
        assert_eq!(rig.session.lock().await.frequency(Vfo::A), None);
    }

    #[tokio::test]
    async fn get_frequency_parses_and_caches() {
        let mut mock = MockTransport::new();
        mock.expect(b"?A\r", &[b'A', 0x00, 0xD6, 0xC2, 0x90, b'\r']);

        let rig = rig_with(mock);
        let freq = rig.get_frequency(Vfo::A).await.unwrap();
        assert_eq!(freq, 14_074_000);
        assert_eq!(
            rig.session.lock().await.frequency(Vfo::A),
            Some(14_074_000)
        );
    }

    #[tokio::test]
    async fn vfo_b_set_does_not_touch_vfo_a() {
        let mut mock = MockTransport::new();
        let cmd_a = protocol::encode_set_freq(Vfo::A, 14_074_000).unwrap();
        let cmd_b = protocol::encode_set_freq(Vfo::B, 7_000_000).unwrap();
        mock.expect(&cmd_a, b"");
        mock.expect(&cmd_b, b"");

        let rig = rig_with(mock);
        rig.set_frequency(Vfo::A, 14_074_000).await.unwrap();
        rig.select_vfo(Vfo::B).await.unwrap();
        rig.set_frequency(Vfo::B, 7_000_000).await.unwrap();

        let session = rig.session.lock().await;
        assert_eq!(session.frequency(Vfo::A), Some(14_074_000));
        assert_eq!(session.frequency(Vfo::B), Some(7_000_000));
        assert_eq!(session.current_vfo(), Vfo::B);
    }

    // -------------------------------------------------------------------
    // Resync
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn wedged_dsp_is_restarted_and_command_reissued() {
        let mut mock = MockTransport::new();
        // Engine budget 2 = three attempts, all stale short answers.
        for _ in 0..3 {
            mock.expect(b"?A\r", b"X\r");
        }
        // Resync: restart command, banner, then the reissued query works.
        mock.expect(b"XX\r", b" RADIO START\r");
        mock.expect(b"?A\r", &[b'A', 0x00, 0x6A, 0xCF, 0xC0, b'\r']);

        let rig = rig_with(mock);
        let freq = rig.get_frequency(Vfo::A).await.unwrap();
        assert_eq!(freq, 7_000_000);
    }

    #[tokio::test]
    async fn resync_failure_surfaces_original_error() {
        let mut mock = MockTransport::new();
        for _ in 0..3 {
            mock.expect(b"?A\r", b"X\r");
        }
        // All restart attempts answer garbage too.
        for _ in 0..3 {
            mock.expect(b"XX\r", b"???\r");
        }

        let rig = rig_with(mock);
        let err = rig.get_frequency(Vfo::A).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    // -------------------------------------------------------------------
    // Mode
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn set_mode_preserves_other_vfo_mode() {
        let mut mock = MockTransport::new();
        mock.expect(b"?M\r", b"M13\r");
        mock.expect(b"*M23\r", b"");

        let rig = rig_with(mock);
        rig.set_mode(Mode::LSB).await.unwrap();
        assert_eq!(rig.session.lock().await.mode(), Some(Mode::LSB));
    }

    #[tokio::test]
    async fn get_mode_for_sub_vfo() {
        let mut mock = MockTransport::new();
        mock.expect(b"?M\r", b"M13\r");

        let rig = rig_with(mock);
        rig.select_vfo(Vfo::B).await.unwrap();
        assert_eq!(rig.get_mode().await.unwrap(), Mode::CW);
    }

    // -------------------------------------------------------------------
    // Keyer
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn keyer_enabled_once_per_session() {
        let mut mock = MockTransport::new();
        mock.expect(b"*CK1\r", b"");
        mock.expect(b"/C\r", b"");
        mock.expect(b"/Q\r", b"");
        // Second message: no further keyer-enable command.
        mock.expect(b"/K\r", b"");

        let rig = rig_with(mock);
        rig.send_morse("CQ").await.unwrap();
        // A second enable command here would desynchronize the mock's
        // expectation queue and fail the send.
        rig.send_morse("K").await.unwrap();
    }

    // -------------------------------------------------------------------
    // Guard rails
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn memory_register_rejected() {
        let rig = rig_with(MockTransport::new());
        assert!(matches!(
            rig.set_frequency(Vfo::Memory, 7_000_000).await.unwrap_err(),
            Error::InvalidParameter(_)
        ));
    }
}
