//! Splits a raw upstream byte stream into individual `data: <json>`
//! frames. Every supported provider's
//! streaming wire format is newline-delimited JSON framed this way once
//! it reaches a [`crate::translate::DialectTranslator::decode_frame`]
//! call; this is the one place that byte-level framing is peeled off.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use gateway_core::GatewayError;
use std::time::Duration;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Wraps a byte stream so that each item must arrive within `idle_limit` of
/// the previous one (or of stream start), surfacing
/// [`GatewayError::Timeout`] and ending the stream otherwise — the §5
/// 60s per-frame idle limit for streaming responses. Applied once, at the
/// raw-byte-chunk level, upstream of [`json_frames`]'s line reassembly.
pub fn with_idle_timeout(
    bytes: impl Stream<Item = Result<Bytes, GatewayError>> + Unpin,
    idle_limit: Duration,
) -> impl Stream<Item = Result<Bytes, GatewayError>> {
    async_stream::stream! {
        let mut bytes = bytes;
        loop {
            match tokio::time::timeout(idle_limit, bytes.next()).await {
                Ok(Some(item)) => yield item,
                Ok(None) => return,
                Err(_) => {
                    yield Err(GatewayError::Timeout(idle_limit));
                    return;
                }
            }
        }
    }
}

/// Turn a byte stream into a stream of parsed JSON frames, buffering
/// partial lines across chunk boundaries. Skips the terminal `[DONE]`
/// sentinel line; callers rely on the upstream connection closing (or a
/// provider-native usage-bearing frame) to know the stream ended.
pub fn json_frames(
    bytes: impl Stream<Item = Result<Bytes, GatewayError>> + Unpin,
) -> impl Stream<Item = Result<serde_json::Value, GatewayError>> {
    async_stream::stream! {
        let mut buffer = String::new();
        let mut bytes = bytes;

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim_end_matches('\r').to_string();
                buffer.drain(..=newline);

                let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                    continue;
                };
                let payload = payload.trim();
                if payload.is_empty() || payload == DONE_SENTINEL {
                    continue;
                }

                match serde_json::from_str::<serde_json::Value>(payload) {
                    Ok(value) => yield Ok(value),
                    Err(e) => yield Err(GatewayError::upstream(
                        format!("malformed stream frame: {e}"),
                        None,
                        Some(payload.to_string()),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn splits_data_lines_into_json_values() {
        let raw = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"a\":1}\n\n")),
            Ok(Bytes::from_static(b"data: {\"a\":2}\n\ndata: [DONE]\n\n")),
        ]);
        let frames: Vec<_> = json_frames(raw).collect().await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap()["a"], 1);
        assert_eq!(frames[1].as_ref().unwrap()["a"], 2);
    }

    #[tokio::test]
    async fn reassembles_a_frame_split_across_chunks() {
        let raw = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"a\"")),
            Ok(Bytes::from_static(b":1}\n\n")),
        ]);
        let frames: Vec<_> = json_frames(raw).collect().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap()["a"], 1);
    }

    #[tokio::test]
    async fn malformed_payload_yields_an_error_frame() {
        let raw = stream::iter(vec![Ok(Bytes::from_static(b"data: not-json\n\n"))]);
        let frames: Vec<_> = json_frames(raw).collect().await;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_err());
    }

    #[tokio::test]
    async fn idle_timeout_ends_the_stream_with_a_timeout_error() {
        let never = futures_util::stream::pending::<Result<Bytes, GatewayError>>();
        let items: Vec<_> = with_idle_timeout(never, Duration::from_millis(10)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(GatewayError::Timeout(_))));
    }

    #[tokio::test]
    async fn idle_timeout_passes_through_items_arriving_in_time() {
        let raw = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"a\":1}\n\n")),
            Ok(Bytes::from_static(b"data: {\"a\":2}\n\n")),
        ]);
        let items: Vec<_> = with_idle_timeout(raw, Duration::from_secs(60)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Result::is_ok));
    }
}
