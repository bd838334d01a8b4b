//! Response shapes and their validation predicates.
//!
//! A command's expected response is one of four shapes: nothing at all,
//! a terminated line, a fixed-length block, or a byte-for-byte echo of
//! the command. Validity is command-specific: a shape can additionally
//! pin the exact total length and/or require leading marker bytes.

/// Expected response for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// Write-only command; no response follows.
    None,

    /// A variable-length response ending with a terminator byte.
    Line {
        /// Terminator byte (CR for the ASCII rigs handled here).
        terminator: u8,
        /// Exact total length including the terminator, when the command
        /// documents one. A different length is a validation failure, not
        /// something to tolerate silently.
        expected_len: Option<usize>,
        /// Required leading bytes (typically the echoed command verb).
        marker: Option<Vec<u8>>,
    },

    /// A fixed-length binary block.
    Fixed {
        /// Exact number of bytes to read.
        len: usize,
        /// Required leading bytes, if the block carries a marker.
        marker: Option<Vec<u8>>,
    },

    /// The device echoes the command byte-for-byte.
    Echo,
}

impl ResponseShape {
    /// A terminated line with no further constraints.
    pub fn line(terminator: u8) -> Self {
        ResponseShape::Line {
            terminator,
            expected_len: None,
            marker: None,
        }
    }

    /// A terminated line with an exact total length.
    pub fn line_exact(terminator: u8, expected_len: usize) -> Self {
        ResponseShape::Line {
            terminator,
            expected_len: Some(expected_len),
            marker: None,
        }
    }

    /// A fixed-length block.
    pub fn fixed(len: usize) -> Self {
        ResponseShape::Fixed { len, marker: None }
    }

    /// Add a leading-marker requirement to a `Line` or `Fixed` shape.
    pub fn with_marker(mut self, bytes: &[u8]) -> Self {
        match &mut self {
            ResponseShape::Line { marker, .. } | ResponseShape::Fixed { marker, .. } => {
                *marker = Some(bytes.to_vec());
            }
            _ => {}
        }
        self
    }

    /// How many bytes must be buffered before the response can be judged
    /// complete, if the shape knows in advance.
    pub(crate) fn fixed_read_len(&self, cmd: &[u8]) -> Option<usize> {
        match self {
            ResponseShape::None => Some(0),
            ResponseShape::Line { .. } => None,
            ResponseShape::Fixed { len, .. } => Some(*len),
            ResponseShape::Echo => Some(cmd.len()),
        }
    }

    /// Check a complete response against this shape.
    ///
    /// Returns a human-readable reason on failure; the engine logs it and
    /// retries.
    pub fn validate(&self, cmd: &[u8], response: &[u8]) -> Result<(), String> {
        match self {
            ResponseShape::None => Ok(()),

            ResponseShape::Line {
                terminator,
                expected_len,
                marker,
            } => {
                if response.last() != Some(terminator) {
                    return Err(format!(
                        "line not terminated with {:#04x}: {response:02X?}",
                        terminator
                    ));
                }
                if let Some(want) = expected_len {
                    if response.len() != *want {
                        return Err(format!(
                            "expected {want} bytes, got {}: {response:02X?}",
                            response.len()
                        ));
                    }
                }
                if let Some(marker) = marker {
                    if !response.starts_with(marker) {
                        return Err(format!(
                            "missing leading marker {marker:02X?}: {response:02X?}"
                        ));
                    }
                }
                Ok(())
            }

            ResponseShape::Fixed { len, marker } => {
                if response.len() != *len {
                    return Err(format!(
                        "expected {len} bytes, got {}",
                        response.len()
                    ));
                }
                if let Some(marker) = marker {
                    if !response.starts_with(marker) {
                        return Err(format!(
                            "missing leading marker {marker:02X?}: {response:02X?}"
                        ));
                    }
                }
                Ok(())
            }

            ResponseShape::Echo => {
                if response != cmd {
                    return Err(format!(
                        "echo mismatch: sent {cmd:02X?}, got {response:02X?}"
                    ));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_requires_terminator() {
        let shape = ResponseShape::line(b'\r');
        assert!(shape.validate(b"?A\r", b"A123\r").is_ok());
        assert!(shape.validate(b"?A\r", b"A123").is_err());
    }

    #[test]
    fn line_exact_length() {
        let shape = ResponseShape::line_exact(b'\r', 6);
        assert!(shape.validate(b"?A\r", b"A1234\r").is_ok());
        assert!(shape.validate(b"?A\r", b"A12\r").is_err());
        assert!(shape.validate(b"?A\r", b"A12345678\r").is_err());
    }

    #[test]
    fn line_marker() {
        let shape = ResponseShape::line_exact(b'\r', 6).with_marker(b"A");
        assert!(shape.validate(b"?A\r", b"A1234\r").is_ok());
        assert!(shape.validate(b"?A\r", b"B1234\r").is_err());
    }

    #[test]
    fn fixed_length_and_marker() {
        let shape = ResponseShape::fixed(4).with_marker(&[0xFE, 0xFE]);
        assert!(shape.validate(b"", &[0xFE, 0xFE, 0x01, 0x02]).is_ok());
        assert!(shape.validate(b"", &[0xFE, 0x01, 0x02, 0x03]).is_err());
        assert!(shape.validate(b"", &[0xFE, 0xFE, 0x01]).is_err());
    }

    #[test]
    fn echo_must_match_exactly() {
        let cmd = [0x00, 0x00, 0x00, 0x01, 0x05];
        assert!(ResponseShape::Echo.validate(&cmd, &cmd).is_ok());
        let wrong = [0x00, 0x00, 0x00, 0x02, 0x05];
        assert!(ResponseShape::Echo.validate(&cmd, &wrong).is_err());
    }

    #[test]
    fn none_accepts_empty() {
        assert!(ResponseShape::None.validate(b"X\r", b"").is_ok());
    }
}
