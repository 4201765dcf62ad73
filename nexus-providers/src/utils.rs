//! Server-Sent Events decoding for streaming providers

use crate::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};

/// Incremental SSE decoder.
///
/// Bytes are buffered until a blank line closes an event, so UTF-8 sequences
/// and `data:` lines split across network chunks come out whole.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: BytesMut,
    max_capacity: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_capacity_limit(4 * 1024 * 1024)
    }
}

impl SseDecoder {
    /// Create a decoder with the default 4MB limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom capacity limit
    pub fn with_capacity_limit(max_capacity: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_capacity,
        }
    }

    /// Bytes waiting for the rest of their event
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a chunk and return the `data` payload of every event it completes
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        if self.buffer.len() + bytes.len() > self.max_capacity {
            return Err(Error::StreamInterrupted(format!(
                "SSE buffer exceeded max capacity of {} bytes",
                self.max_capacity
            )));
        }
        self.buffer.put_slice(bytes);

        let mut payloads = Vec::new();
        while let Some((end, delimiter_len)) = self.find_event_end() {
            let event = self.buffer.split_to(end);
            self.buffer.advance(delimiter_len);

            let text = std::str::from_utf8(&event).map_err(|e| {
                Error::StreamInterrupted(format!("Invalid UTF-8 in SSE stream: {}", e))
            })?;
            if let Some(data) = event_data(text) {
                payloads.push(data);
            }
        }
        Ok(payloads)
    }

    /// Position of the first blank line, and the length of the delimiter
    fn find_event_end(&self) -> Option<(usize, usize)> {
        let bytes = self.buffer.as_ref();
        (0..bytes.len()).find_map(|i| {
            if bytes[i..].starts_with(b"\r\n\r\n") {
                Some((i, 4))
            } else if bytes[i..].starts_with(b"\n\n") {
                Some((i, 2))
            } else {
                None
            }
        })
    }
}

/// Join the `data:` lines of one event; comments and other fields are ignored
fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}
