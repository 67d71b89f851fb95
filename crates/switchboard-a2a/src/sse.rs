//! Incremental SSE parsing for streamed task bodies
//!
//! The streaming endpoint replies with Server-Sent Events. [`SseBuffer`]
//! accumulates raw body chunks, splits complete lines, and hands back the
//! `data:` payloads; comments, field lines and `[DONE]` markers are
//! filtered out here so callers only see payload text.

use bytes::BytesMut;

/// Line buffer for a chunked SSE body
#[derive(Debug, Default)]
pub struct SseBuffer {
    buf: BytesMut,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(8192),
        }
    }

    /// Feed one body chunk, returning every complete `data:` payload it
    /// finished
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line_bytes = self.buf.split_to(newline_pos + 1);
            line_bytes.truncate(line_bytes.len() - 1);
            if line_bytes.last() == Some(&b'\r') {
                line_bytes.truncate(line_bytes.len() - 1);
            }

            // Lines are split on byte boundaries, so a complete line is
            // either valid UTF-8 or garbage we skip whole
            let Ok(line) = std::str::from_utf8(&line_bytes) else {
                continue;
            };
            if let Some(data) = extract_sse_data(line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing data line the body ended without terminating
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).to_string();
        self.buf.clear();
        extract_sse_data(line.trim())
    }
}

/// Extract the payload from one SSE line.
///
/// Returns `None` for empty lines, comments, non-data fields and the
/// `[DONE]` marker.
fn extract_sse_data(line: &str) -> Option<String> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let data = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))?;
    let data = data.trim();

    if data == "[DONE]" || data.is_empty() {
        return None;
    }

    Some(data.to_string())
}
