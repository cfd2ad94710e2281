//! Streamed Text
//!
//! Adapts a response byte stream into a lazy, finite sequence of decoded text
//! increments. Nothing is buffered beyond the bytes of one unfinished code
//! point.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use suluk_core::streaming::Utf8StreamDecoder;

use crate::error::{ApiError, ApiResult};
use crate::transport::ByteStream;

/// Decoded text increments, in the order the bytes arrived.
///
/// Yields `Err` at most once, as its last item: `StreamRead` when the source
/// broke, `Decode` when it ended inside a character. A clean end of data
/// simply ends the stream.
pub type TextStream = Pin<Box<dyn Stream<Item = ApiResult<String>> + Send>>;

struct DecodeState {
    inner: ByteStream,
    decoder: Utf8StreamDecoder,
    finished: bool,
}

pub fn decode_text_stream(bytes: ByteStream) -> TextStream {
    let state = DecodeState {
        inner: bytes,
        decoder: Utf8StreamDecoder::new(),
        finished: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let text = state.decoder.decode(&chunk);
                    if !text.is_empty() {
                        return Some((Ok(text), state));
                    }
                    // Only part of a character so far, keep reading.
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let err = match e {
                        ApiError::Network { message } => ApiError::StreamRead { message },
                        other => other,
                    };
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    return match state.decoder.finish() {
                        Ok(()) => None,
                        Err(e) => Some((Err(ApiError::from(e)), state)),
                    };
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn source(chunks: Vec<ApiResult<Bytes>>) -> ByteStream {
        Box::pin(futures_util::stream::iter(chunks))
    }

    async fn collect(mut stream: TextStream) -> Vec<ApiResult<String>> {
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(item);
        }
        out
    }

    #[tokio::test]
    async fn test_increments_preserve_order() {
        let items = collect(decode_text_stream(source(vec![
            Ok(Bytes::from_static(b"Hi ")),
            Ok(Bytes::from_static(b"there")),
        ])))
        .await;
        let texts: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
        assert_eq!(texts, vec!["Hi ", "there"]);
    }

    #[tokio::test]
    async fn test_split_character_is_carried_over() {
        let bytes = "héllo".as_bytes();
        for at in 1..bytes.len() {
            let items = collect(decode_text_stream(source(vec![
                Ok(Bytes::copy_from_slice(&bytes[..at])),
                Ok(Bytes::copy_from_slice(&bytes[at..])),
            ])))
            .await;
            let text: String = items.into_iter().map(|i| i.unwrap()).collect();
            assert_eq!(text, "héllo", "split at byte {}", at);
        }
    }

    #[tokio::test]
    async fn test_partial_only_chunk_yields_nothing() {
        // "é" = C3 A9: the first chunk decodes to nothing and is not emitted.
        let items = collect(decode_text_stream(source(vec![
            Ok(Bytes::from_static(&[0xC3])),
            Ok(Bytes::from_static(&[0xA9, b'!'])),
        ])))
        .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "é!");
    }

    #[tokio::test]
    async fn test_read_error_terminates_stream() {
        let items = collect(decode_text_stream(source(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(ApiError::stream_read("connection reset")),
            Ok(Bytes::from_static(b"never seen")),
        ])))
        .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(ApiError::StreamRead { .. })));
    }

    #[tokio::test]
    async fn test_network_error_mid_body_reported_as_stream_read() {
        let items = collect(decode_text_stream(source(vec![Err(ApiError::network(
            "timed out",
        ))])))
        .await;
        assert!(matches!(items[0], Err(ApiError::StreamRead { .. })));
    }

    #[tokio::test]
    async fn test_dangling_bytes_at_end_are_decode_error() {
        let items = collect(decode_text_stream(source(vec![Ok(Bytes::from_static(&[
            b'o', b'k', 0xE2, 0x82,
        ]))])))
        .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "ok");
        assert!(matches!(items[1], Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_empty_source() {
        assert!(collect(decode_text_stream(source(vec![]))).await.is_empty());
    }
}
