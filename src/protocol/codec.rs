//! DAP wire protocol framing
//!
//! The protocol uses HTTP-style headers followed by a raw payload:
//! ```text
//! Content-Length: <byte-length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! Transports deliver arbitrary byte chunks, so decoding is incremental: a
//! single chunk may complete zero, one, or many frames, and a frame may span
//! any number of chunks.

use crate::common::{Error, Result};

const CRLF: &str = "\r\n";
const TWO_CRLF: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &str = "Content-Length";

/// Default cap on a declared payload size (100 MB)
///
/// The declared length controls an allocation, so it is bounded even though
/// the codec otherwise accepts whatever the peer sends.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Incremental decoder for header-delimited frames
///
/// Feed it byte chunks as they arrive; it buffers partial frames internally
/// and returns every payload completed by the latest chunk, in wire order.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    content_length: Option<usize>,
    max_payload_bytes: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with the default payload size cap
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_PAYLOAD_BYTES)
    }

    /// Create a decoder with an explicit payload size cap
    pub fn with_limit(max_payload_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            content_length: None,
            max_payload_bytes,
        }
    }

    /// Append a chunk and return all payloads it completed
    ///
    /// Empty payloads (`Content-Length: 0`) are consumed but not emitted.
    /// Header lines other than `Content-Length` are ignored, and bytes
    /// preceding the first `Content-Length` token are discarded as lead-in
    /// noise. A header whose length field does not parse is dropped and the
    /// decoder resynchronizes at the next header terminator rather than
    /// failing the stream.
    ///
    /// A declared length above the configured cap is the one hard error:
    /// the decoder resets itself and returns `Error::ProtocolFraming`.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        loop {
            if let Some(expected) = self.content_length {
                if self.buffer.len() < expected {
                    break;
                }

                let body: Vec<u8> = self.buffer.drain(..expected).collect();
                self.content_length = None;

                if !body.is_empty() {
                    messages.push(String::from_utf8_lossy(&body).into_owned());
                }
                // there may be more complete frames in the buffer
                continue;
            }

            // Anything before the Content-Length token is lead-in noise
            // (e.g. banner text an adapter prints before its first frame).
            if let Some(idx) = find(&self.buffer, CONTENT_LENGTH.as_bytes()) {
                if idx > 0 {
                    tracing::debug!(bytes = idx, "Discarding non-protocol lead-in");
                    self.buffer.drain(..idx);
                }
            }

            let Some(end) = find(&self.buffer, TWO_CRLF) else {
                break;
            };

            let header = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
            self.buffer.drain(..end + TWO_CRLF.len());

            match parse_content_length(&header) {
                Some(len) if len > self.max_payload_bytes => {
                    self.buffer.clear();
                    self.content_length = None;
                    return Err(Error::ProtocolFraming(format!(
                        "declared Content-Length {} exceeds maximum of {} bytes",
                        len, self.max_payload_bytes
                    )));
                }
                Some(len) => {
                    self.content_length = Some(len);
                }
                None => {
                    // Malformed or absent length: drop this header and
                    // resynchronize at the next terminator.
                    tracing::warn!(header = %header, "Dropping unparsable frame header");
                }
            }
        }

        Ok(messages)
    }

    /// Bytes currently buffered while waiting for more input
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Parse the Content-Length value out of a header block
///
/// The key is matched case-sensitively; other header lines are ignored.
fn parse_content_length(header: &str) -> Option<usize> {
    for line in header.split(CRLF) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key == CONTENT_LENGTH {
            return value.trim().parse().ok();
        }
    }
    None
}

/// Frame a payload for writing
///
/// The length is the UTF-8 byte count, and the frame is returned as one unit
/// with no trailing delimiter.
pub fn encode_frame(payload: &str) -> Vec<u8> {
    let mut frame =
        format!("{}: {}{}{}", CONTENT_LENGTH, payload.len(), CRLF, CRLF).into_bytes();
    frame.extend_from_slice(payload.as_bytes());
    frame
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
