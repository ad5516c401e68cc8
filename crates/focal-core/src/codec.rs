//! Line codec for session records: one JSON object per line.

use crate::error::{Error, Result};
use crate::types::SessionRecord;

/// A single line that failed to decode.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// How a batch decode treats corrupt lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Skip corrupt lines and keep going.
    Tolerant,
    /// Stop at the first corrupt line.
    Strict,
}

/// Result of a batch decode.
#[derive(Debug, Default)]
pub struct Decoded {
    pub records: Vec<SessionRecord>,
    /// 1-based line numbers that were skipped (tolerant mode only).
    pub skipped: Vec<usize>,
}

/// Encode a record as a single line without a trailing newline.
pub fn encode(record: &SessionRecord) -> Result<String> {
    // serde_json escapes control characters inside strings, so the
    // output never contains a raw line terminator.
    Ok(serde_json::to_string(record)?)
}

/// Decode one line. Only structural parseability is checked here.
pub fn decode(line: &[u8]) -> std::result::Result<SessionRecord, DecodeError> {
    Ok(serde_json::from_slice(line)?)
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Decode a whole log body. Blank lines are ignored in both modes.
pub fn decode_lines(body: &[u8], mode: DecodeMode) -> Result<Decoded> {
    let mut out = Decoded::default();
    for (idx, line) in body.split(|b| *b == b'\n').enumerate() {
        if is_blank(line) {
            continue;
        }
        match decode(line) {
            Ok(record) => out.records.push(record),
            Err(e) => match mode {
                DecodeMode::Tolerant => out.skipped.push(idx + 1),
                DecodeMode::Strict => {
                    return Err(Error::Decode {
                        line: idx + 1,
                        message: e.to_string(),
                    })
                }
            },
        }
    }
    Ok(out)
}
