//! Ten-Tec ASCII command encoding and response parsing.
//!
//! Commands are `<verb><params><CR>`:
//!
//! - `*<V><b3><b2><b1><b0>` -- set VFO V to a frequency, four raw binary
//!   bytes, MSB first. No response.
//! - `?<V>` -- query VFO V. Response: `<V><b3><b2><b1><b0><CR>`, six
//!   bytes total.
//! - `*M<a><b>` / `?M` -- set/query the mode characters of both VFOs.
//! - `XX` -- restart the DSP; the radio prints a banner containing
//!   `RADIO START` when it comes back.
//! - `*CK1` -- force the internal keyer on; `/<c>` keys one character.
//!
//! A response of the wrong length or without its leading register echo is
//! a protocol error, never silently tolerated.

use bytes::{BufMut, BytesMut};

use synthlib_core::error::{Error, Result};
use synthlib_core::types::{Mode, Vfo};

/// Command/response terminator.
pub const EOM: u8 = b'\r';

/// Banner substring the DSP prints after a restart.
pub const RESTART_BANNER: &[u8] = b"RADIO START";

/// Total length of a frequency query response, terminator included.
pub const FREQ_RESPONSE_LEN: usize = 6;

/// Total length of a mode query response, terminator included.
pub const MODE_RESPONSE_LEN: usize = 4;

/// The VFO address character used on the wire.
pub fn vfo_char(vfo: Vfo) -> Result<u8> {
    match vfo {
        Vfo::A => Ok(b'A'),
        Vfo::B => Ok(b'B'),
        Vfo::Memory => Err(Error::InvalidParameter(
            "memory register is not directly addressable".into(),
        )),
    }
}

/// Mode character for the wire protocol.
pub fn mode_char(mode: Mode) -> Result<u8> {
    match mode {
        Mode::AM => Ok(b'0'),
        Mode::USB => Ok(b'1'),
        Mode::LSB => Ok(b'2'),
        Mode::CW => Ok(b'3'),
        Mode::FM => Ok(b'4'),
        Mode::DataUSB => Err(Error::InvalidParameter(format!(
            "mode {mode} not supported by this rig"
        ))),
    }
}

/// Parse a wire mode character.
pub fn parse_mode_char(c: u8) -> Result<Mode> {
    match c {
        b'0' => Ok(Mode::AM),
        b'1' => Ok(Mode::USB),
        b'2' => Ok(Mode::LSB),
        b'3' => Ok(Mode::CW),
        b'4' => Ok(Mode::FM),
        other => Err(Error::Protocol(format!(
            "unknown mode character {:#04x}",
            other
        ))),
    }
}

/// Encode a set-frequency command for a VFO.
pub fn encode_set_freq(vfo: Vfo, freq_hz: u64) -> Result<Vec<u8>> {
    let freq = u32::try_from(freq_hz)
        .map_err(|_| Error::InvalidParameter(format!("frequency {freq_hz} Hz out of range")))?;

    let mut buf = BytesMut::with_capacity(7);
    buf.put_u8(b'*');
    buf.put_u8(vfo_char(vfo)?);
    buf.put_u32(freq); // MSB first
    buf.put_u8(EOM);
    Ok(buf.to_vec())
}

/// Encode a frequency query for a VFO.
pub fn encode_get_freq(vfo: Vfo) -> Result<Vec<u8>> {
    Ok(vec![b'?', vfo_char(vfo)?, EOM])
}

/// Parse a frequency query response (already shape-validated).
pub fn parse_freq_response(response: &[u8]) -> Result<u64> {
    if response.len() != FREQ_RESPONSE_LEN {
        return Err(Error::Protocol(format!(
            "frequency response wrong length: {}",
            response.len()
        )));
    }
    Ok(u64::from(u32::from_be_bytes([
        response[1],
        response[2],
        response[3],
        response[4],
    ])))
}

/// Encode a set-mode command carrying both VFOs' mode characters.
pub fn encode_set_mode(main: u8, sub: u8) -> Vec<u8> {
    vec![b'*', b'M', main, sub, EOM]
}

/// Parse a mode query response into the two mode characters.
pub fn parse_mode_response(response: &[u8]) -> Result<(u8, u8)> {
    if response.len() != MODE_RESPONSE_LEN || response[0] != b'M' {
        return Err(Error::Protocol(format!(
            "malformed mode response: {response:02X?}"
        )));
    }
    Ok((response[1], response[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_freq_command_layout() {
        let cmd = encode_set_freq(Vfo::A, 14_074_000).unwrap();
        // 14_074_000 = 0x00D6C290, MSB first after the VFO address.
        assert_eq!(cmd, [b'*', b'A', 0x00, 0xD6, 0xC2, 0x90, b'\r']);
    }

    #[test]
    fn set_freq_vfo_b() {
        let cmd = encode_set_freq(Vfo::B, 7_000_000).unwrap();
        assert_eq!(cmd[1], b'B');
    }

    #[test]
    fn set_freq_rejects_out_of_range() {
        assert!(matches!(
            encode_set_freq(Vfo::A, u64::from(u32::MAX) + 1),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn memory_register_not_addressable() {
        assert!(encode_get_freq(Vfo::Memory).is_err());
    }

    #[test]
    fn freq_response_round_trip() {
        let cmd = encode_set_freq(Vfo::A, 14_074_000).unwrap();
        // The rig's query response echoes the same four binary bytes.
        let response = [b'A', cmd[2], cmd[3], cmd[4], cmd[5], b'\r'];
        assert_eq!(parse_freq_response(&response).unwrap(), 14_074_000);
    }

    #[test]
    fn mode_chars_round_trip() {
        for mode in [Mode::AM, Mode::USB, Mode::LSB, Mode::CW, Mode::FM] {
            let c = mode_char(mode).unwrap();
            assert_eq!(parse_mode_char(c).unwrap(), mode);
        }
    }

    #[test]
    fn data_mode_unsupported() {
        assert!(mode_char(Mode::DataUSB).is_err());
    }

    #[test]
    fn mode_response_parses_both_vfos() {
        let (a, b) = parse_mode_response(b"M13\r").unwrap();
        assert_eq!((a, b), (b'1', b'3'));
    }

    #[test]
    fn short_mode_response_rejected() {
        assert!(parse_mode_response(b"M1\r").is_err());
    }
}
