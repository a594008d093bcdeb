//! Codec error types.

use restapi_core::{BoxError, RestError};

/// Error produced while encoding or decoding a value.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// The value could not be encoded.
    #[error("failed to encode value: {0}")]
    Encode(#[source] anyhow::Error),

    /// The input could not be decoded into the requested type.
    #[error("failed to decode value: {0}")]
    Decode(#[source] anyhow::Error),
}

impl SerializeError {
    pub(crate) fn encode(err: impl Into<anyhow::Error>) -> Self {
        Self::Encode(err.into())
    }

    pub(crate) fn decode(err: impl Into<anyhow::Error>) -> Self {
        Self::Decode(err.into())
    }

    /// Returns `true` for decode failures.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Error produced while reading a request body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// The body exceeded the configured limit.
    #[error("request body exceeds the limit of {limit} bytes")]
    TooLarge {
        /// The limit in bytes.
        limit: usize,
    },

    /// The underlying body stream failed.
    #[error("failed to read request body")]
    Read(#[source] BoxError),
}

impl From<BodyError> for RestError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::TooLarge { .. } => {
                RestError::request_entity_too_large().with_detail(err.to_string())
            }
            BodyError::Read(source) => {
                RestError::invalid_request_body().with_source(anyhow::anyhow!(source))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restapi_core::ErrorKind;

    #[test]
    fn test_too_large_maps_to_413() {
        let err: RestError = BodyError::TooLarge { limit: 3 }.into();
        assert_eq!(err.kind(), ErrorKind::RequestEntityTooLarge);
        assert_eq!(err.detail(), Some("request body exceeds the limit of 3 bytes"));
    }

    #[test]
    fn test_read_failure_maps_to_400() {
        let err: RestError = BodyError::Read("connection reset".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidRequestBody);
    }

    #[test]
    fn test_decode_flag() {
        let err = SerializeError::decode(anyhow::anyhow!("bad"));
        assert!(err.is_decode());
        assert!(!SerializeError::encode(anyhow::anyhow!("bad")).is_decode());
    }
}
