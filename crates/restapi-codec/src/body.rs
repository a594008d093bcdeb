//! Size-limited body reading.

use crate::error::BodyError;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use restapi_core::{Body, BoxError};

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Reads `body` to the end, failing once more than `limit` bytes arrive.
///
/// The body is dropped on return, whichever way reading ended.
///
/// # Example
///
/// ```rust
/// use restapi_codec::{read_body, BodyError};
/// use restapi_core::full;
///
/// # tokio_test::block_on(async {
/// let bytes = read_body(full("abc"), 3).await.unwrap();
/// assert_eq!(&bytes[..], b"abc");
///
/// let err = read_body(full("abcd"), 3).await.unwrap_err();
/// assert!(matches!(err, BodyError::TooLarge { limit: 3 }));
/// # });
/// ```
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, BodyError> {
    // Boxed as a `Send` trait object so callers' futures stay provably
    // `Send` (works around rustc's higher-ranked auto-trait inference).
    let collect: std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<http_body_util::Collected<Bytes>, BoxError>> + Send>,
    > = Box::pin(Limited::new(body, limit).collect());
    let err: BoxError = match collect.await {
        Ok(collected) => return Ok(collected.to_bytes()),
        Err(err) => err,
    };
    match err.downcast::<LengthLimitError>() {
        Ok(_) => Err(BodyError::TooLarge { limit }),
        Err(err) => Err(BodyError::Read(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use restapi_core::{empty, from_stream, full, BoxError};

    #[tokio::test]
    async fn test_within_limit() {
        let bytes = read_body(full("abc"), 3).await.unwrap();
        assert_eq!(&bytes[..], b"abc");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let bytes = read_body(empty(), 0).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_one_byte_over_limit() {
        let err = read_body(full("abcd"), 3).await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 3 }));
    }

    #[tokio::test]
    async fn test_streamed_body_over_limit() {
        let chunks: Vec<Result<Bytes, BoxError>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ];
        let err = read_body(from_stream(stream::iter(chunks)), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_stream_error_is_read_error() {
        let chunks: Vec<Result<Bytes, BoxError>> = vec![
            Ok(Bytes::from_static(b"a")),
            Err("connection reset".into()),
        ];
        let err = read_body(from_stream(stream::iter(chunks)), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::Read(_)));
    }
}
