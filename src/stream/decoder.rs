//! Splits a raw response body into logical records.

use serde::{Deserialize, Serialize};

use super::parser::DATA_MARKER;

const DEFAULT_MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Tuning for [`ChunkDecoder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Largest unterminated fragment kept between reads.
    pub max_buffer_bytes: usize,
    /// Also split where a `data:` marker directly follows the end of a JSON
    /// value on the same line.
    pub split_on_marker: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            split_on_marker: true,
        }
    }
}

/// Incremental newline-delimited decoder.
///
/// Bytes are buffered rather than text so that a multi-byte character split
/// across two reads decodes correctly. Whatever is left when the stream ends
/// is discarded by [`finish`](Self::finish), never force-emitted.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    buffer: Vec<u8>,
    config: DecoderConfig,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            buffer: Vec::new(),
            config,
        }
    }

    /// Feed one network read and return every record it completed.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<String> {
        self.buffer.extend_from_slice(chunk.as_ref());

        let mut records = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.buffer[start..end]);
            self.push_line(line.trim_end_matches('\r'), &mut records);
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.config.max_buffer_bytes {
            tracing::warn!(
                bytes = self.buffer.len(),
                limit = self.config.max_buffer_bytes,
                "dropping oversized unterminated stream fragment"
            );
            self.buffer.clear();
        }

        records
    }

    /// End of stream. Returns how many buffered bytes were discarded.
    pub fn finish(&mut self) -> usize {
        let leftover = self.buffer.len();
        if leftover > 0 {
            tracing::debug!(bytes = leftover, "discarding unterminated stream fragment");
        }
        self.buffer.clear();
        leftover
    }

    /// Bytes currently held waiting for a record boundary.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn push_line(&self, line: &str, records: &mut Vec<String>) {
        if self.config.split_on_marker {
            for piece in split_on_marker(line) {
                push_record(piece, records);
            }
        } else {
            push_record(line, records);
        }
    }
}

fn push_record(piece: &str, records: &mut Vec<String>) {
    if !piece.trim().is_empty() {
        records.push(piece.to_string());
    }
}

/// Split `data: {..}data: {..}` into separate records. Only markers outside
/// JSON strings that directly follow a closing `}` or `]` count.
fn split_on_marker(line: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (at, ch) in line.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            'd' if at > start && line[at..].starts_with(DATA_MARKER) => {
                let before = line[start..at].trim_end();
                if before.ends_with('}') || before.ends_with(']') {
                    pieces.push(&line[start..at]);
                    start = at;
                }
            }
            _ => {}
        }
    }
    pieces.push(&line[start..]);
    pieces
}
