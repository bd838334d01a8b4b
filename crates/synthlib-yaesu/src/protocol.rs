//! Yaesu binary frame encoding: opcodes, packed BCD, status block layout.
//!
//! Every command is exactly [`CMD_LENGTH`] bytes: `[p1, p2, p3, p4, op]`.
//! Frequencies travel as packed BCD in units of 10 Hz, least significant
//! digit pair first. The status block returned after the "go" frame is
//! [`STATUS_LENGTH`] bytes; the offsets of interest are defined below.

use synthlib_core::error::{Error, Result};
use synthlib_core::types::{Mode, Vfo};

/// Every command frame is exactly this long.
pub const CMD_LENGTH: usize = 5;

/// Length of the full status block.
pub const STATUS_LENGTH: usize = 148;

/// The "go" frame: sent after the command echo validates, telling the
/// rig to execute and report status.
pub const CMD_GO: [u8; CMD_LENGTH] = [0x00, 0x00, 0x00, 0x00, 0x0B];

/// Opcodes used by this driver.
pub mod opcode {
    /// Request the full status block without changing state.
    pub const STATUS: u8 = 0x01;
    /// Recall a memory channel (channel number in p4).
    pub const RECALL_MEMORY: u8 = 0x02;
    /// Select VFO A (p4 = 0) or VFO B (p4 = 1).
    pub const SELECT_VFO: u8 = 0x05;
    /// Set the active VFO frequency, packed BCD in p1..p4.
    pub const SET_FREQ: u8 = 0x08;
    /// Set the operating mode (mode code in p4).
    pub const SET_MODE: u8 = 0x0A;
    /// Set the pacing delay inserted between status bytes (p4 = value).
    pub const PACING: u8 = 0x0E;
    /// PTT off/on (p4 = 0/1).
    pub const PTT: u8 = 0x0F;
}

/// Status block offsets.
pub mod status {
    /// Displayed (operating) frequency, 4 bytes packed BCD, 10 Hz units.
    pub const OP_FREQ: usize = 0;
    /// Displayed mode code.
    pub const OP_MODE: usize = 4;
    /// VFO A frequency, 4 bytes packed BCD.
    pub const VFO_A_FREQ: usize = 5;
    /// VFO A mode code.
    pub const VFO_A_MODE: usize = 9;
    /// VFO B frequency, 4 bytes packed BCD.
    pub const VFO_B_FREQ: usize = 10;
    /// VFO B mode code.
    pub const VFO_B_MODE: usize = 14;
    /// Last selected memory channel.
    pub const MEM_CHANNEL: usize = 15;
    /// Flag bits: bit 0 = VFO B selected, bit 5 = transmitting.
    pub const FLAGS: usize = 147;

    pub const FLAG_VFO_B: u8 = 0x01;
    pub const FLAG_TX: u8 = 0x20;
}

/// Highest memory channel the rig stores.
pub const MAX_MEM_CHANNEL: u32 = 15;

/// Build a command frame.
pub fn frame(p1: u8, p2: u8, p3: u8, p4: u8, op: u8) -> [u8; CMD_LENGTH] {
    [p1, p2, p3, p4, op]
}

/// Pack an integer into little-endian packed BCD.
///
/// `digits` must be even; each output byte carries two decimal digits,
/// least significant pair first, more significant digit in the high
/// nibble.
pub fn to_bcd(mut value: u64, digits: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(digits as usize / 2);
    for _ in 0..digits / 2 {
        let lo = (value % 10) as u8;
        value /= 10;
        let hi = (value % 10) as u8;
        value /= 10;
        out.push((hi << 4) | lo);
    }
    out
}

/// Unpack little-endian packed BCD back to an integer.
pub fn from_bcd(bytes: &[u8], digits: u32) -> Result<u64> {
    let mut value = 0u64;
    for i in (0..digits as usize / 2).rev() {
        let b = bytes[i];
        let hi = (b >> 4) as u64;
        let lo = (b & 0x0F) as u64;
        if hi > 9 || lo > 9 {
            return Err(Error::Protocol(format!(
                "invalid BCD byte {b:#04x} at offset {i}"
            )));
        }
        value = value * 100 + hi * 10 + lo;
    }
    Ok(value)
}

/// Encode a set-frequency frame. Frequencies are sent in 10 Hz steps.
pub fn encode_set_freq(freq_hz: u64) -> Result<[u8; CMD_LENGTH]> {
    if freq_hz >= 10_000_000_000 {
        return Err(Error::InvalidParameter(format!(
            "frequency {freq_hz} Hz does not fit in 8 BCD digits"
        )));
    }
    let bcd = to_bcd(freq_hz / 10, 8);
    Ok(frame(bcd[0], bcd[1], bcd[2], bcd[3], opcode::SET_FREQ))
}

/// Wire code for an operating mode.
pub fn mode_code(mode: Mode) -> Result<u8> {
    match mode {
        Mode::LSB => Ok(0),
        Mode::USB => Ok(1),
        Mode::CW => Ok(2),
        Mode::AM => Ok(4),
        Mode::FM => Ok(6),
        Mode::DataUSB => Err(Error::InvalidParameter(format!(
            "mode {mode} not supported by this rig"
        ))),
    }
}

/// Decode a status-block mode code.
pub fn parse_mode_code(code: u8) -> Result<Mode> {
    match code {
        0 => Ok(Mode::LSB),
        1 => Ok(Mode::USB),
        2 | 3 => Ok(Mode::CW),
        4 | 5 => Ok(Mode::AM),
        6 | 7 => Ok(Mode::FM),
        other => Err(Error::Protocol(format!("unknown mode code {other:#04x}"))),
    }
}

/// Decoded view of the interesting parts of a status block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBlock {
    pub op_freq_hz: u64,
    pub vfo_a_freq_hz: u64,
    pub vfo_b_freq_hz: u64,
    pub op_mode: Mode,
    pub current_vfo: Vfo,
    pub mem_channel: u32,
    pub transmitting: bool,
}

/// Parse a full status block.
pub fn parse_status(block: &[u8]) -> Result<StatusBlock> {
    if block.len() != STATUS_LENGTH {
        return Err(Error::Protocol(format!(
            "status block wrong length: {}",
            block.len()
        )));
    }
    let flags = block[status::FLAGS];
    Ok(StatusBlock {
        op_freq_hz: from_bcd(&block[status::OP_FREQ..], 8)? * 10,
        vfo_a_freq_hz: from_bcd(&block[status::VFO_A_FREQ..], 8)? * 10,
        vfo_b_freq_hz: from_bcd(&block[status::VFO_B_FREQ..], 8)? * 10,
        op_mode: parse_mode_code(block[status::OP_MODE])?,
        current_vfo: if flags & status::FLAG_VFO_B != 0 {
            Vfo::B
        } else {
            Vfo::A
        },
        mem_channel: block[status::MEM_CHANNEL] as u32,
        transmitting: flags & status::FLAG_TX != 0,
    })
}

/// Build a status block image for tests.
#[cfg(test)]
pub(crate) fn test_status_block(
    op_freq_hz: u64,
    a_freq_hz: u64,
    b_freq_hz: u64,
    mode: u8,
    flags: u8,
    mem: u8,
) -> Vec<u8> {
    let mut block = vec![0u8; STATUS_LENGTH];
    block[status::OP_FREQ..status::OP_FREQ + 4].copy_from_slice(&to_bcd(op_freq_hz / 10, 8));
    block[status::OP_MODE] = mode;
    block[status::VFO_A_FREQ..status::VFO_A_FREQ + 4].copy_from_slice(&to_bcd(a_freq_hz / 10, 8));
    block[status::VFO_B_FREQ..status::VFO_B_FREQ + 4].copy_from_slice(&to_bcd(b_freq_hz / 10, 8));
    block[status::MEM_CHANNEL] = mem;
    block[status::FLAGS] = flags;
    block
}
