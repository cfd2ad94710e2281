//! Incremental Text Decoding
//!
//! Turns a sequence of arbitrarily split byte chunks into UTF-8 text without
//! ever emitting a replacement character for a code point that merely
//! straddles a chunk boundary. The trailing bytes of an unfinished code point
//! are carried over and completed by the next chunk.
//!
//! Bytes that can never become valid UTF-8 are replaced with U+FFFD, the same
//! way a non-fatal text decoder behaves. Only a stream that *ends* in the
//! middle of a code point is reported as an error.

use thiserror::Error;

/// Errors raised by [`Utf8StreamDecoder::finish`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte source ended while a multi-byte code point was still open.
    #[error("stream ended inside a multi-byte character ({pending} byte(s) pending)")]
    IncompleteSequence { pending: usize },
}

/// Stateful UTF-8 decoder for chunked input.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, prefixed by whatever was carried over from the
    /// previous call. May return an empty string when the chunk only extends
    /// an unfinished code point.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&rest[..valid]) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid + bad..];
                        }
                        None => {
                            // Unfinished code point at the end of the input.
                            self.pending = rest[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Number of carried-over bytes waiting for the rest of their code point.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Signal end of data. Fails if a code point was left unfinished; the
    /// pending bytes are discarded either way.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::IncompleteSequence {
                pending: pending.len(),
            })
        }
    }
}
