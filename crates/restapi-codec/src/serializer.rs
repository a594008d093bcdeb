//! Serializers and list encoders.
//!
//! A [`Serializer`] turns values into bytes and back. Serializers that can
//! frame a sequence of values also hand out a [`ListEncoder`], which is what
//! lets an index response stream one element at a time.

use crate::error::SerializeError;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A user-supplied codec working on JSON values.
///
/// Wrap one with [`Serializer::custom`] to register a format the built-in
/// serializers do not cover.
///
/// # Example
///
/// ```rust
/// use restapi_codec::{ListFraming, Serializer, ValueCodec};
///
/// struct Pretty;
///
/// impl ValueCodec for Pretty {
///     fn encode(&self, value: &serde_json::Value) -> anyhow::Result<Vec<u8>> {
///         Ok(serde_json::to_vec_pretty(value)?)
///     }
///
///     fn decode(&self, bytes: &[u8]) -> anyhow::Result<serde_json::Value> {
///         Ok(serde_json::from_slice(bytes)?)
///     }
/// }
///
/// let serializer = Serializer::custom(Pretty).with_list_framing(ListFraming::JSON_ARRAY);
/// assert!(serializer.supports_lists());
/// ```
pub trait ValueCodec: Send + Sync + 'static {
    /// Encodes a single value.
    fn encode(&self, value: &serde_json::Value) -> anyhow::Result<Vec<u8>>;

    /// Decodes a single value.
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<serde_json::Value>;
}

/// Byte framing of a streamed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFraming {
    /// Written before the first element.
    pub open: &'static str,
    /// Written between two elements.
    pub separator: &'static str,
    /// Written after every element.
    pub terminator: &'static str,
    /// Written after the last element.
    pub close: &'static str,
}

impl ListFraming {
    /// A JSON array: `[a,b,c]`.
    pub const JSON_ARRAY: Self = Self {
        open: "[",
        separator: ",",
        terminator: "",
        close: "]",
    };

    /// One document per line: `a\nb\nc\n`.
    pub const LINES: Self = Self {
        open: "",
        separator: "",
        terminator: "\n",
        close: "",
    };
}

#[derive(Clone)]
enum Format {
    Json,
    JsonLines,
    Form,
    Custom(Arc<dyn ValueCodec>),
}

/// Encodes and decodes values for one MIME type.
#[derive(Clone)]
pub struct Serializer {
    format: Format,
    framing: Option<ListFraming>,
}

impl Serializer {
    /// JSON documents; lists are framed as JSON arrays.
    pub const fn json() -> Self {
        Self {
            format: Format::Json,
            framing: Some(ListFraming::JSON_ARRAY),
        }
    }

    /// Newline-delimited JSON; lists are written one element per line.
    pub const fn json_lines() -> Self {
        Self {
            format: Format::JsonLines,
            framing: Some(ListFraming::LINES),
        }
    }

    /// `application/x-www-form-urlencoded`; has no list encoder.
    pub const fn form() -> Self {
        Self {
            format: Format::Form,
            framing: None,
        }
    }

    /// Wraps a custom codec; it has no list encoder until one is configured
    /// with [`with_list_framing`](Self::with_list_framing).
    pub fn custom(codec: impl ValueCodec) -> Self {
        Self {
            format: Format::Custom(Arc::new(codec)),
            framing: None,
        }
    }

    /// Sets the list framing, enabling [`list_encoder`](Self::list_encoder).
    #[must_use]
    pub fn with_list_framing(mut self, framing: ListFraming) -> Self {
        self.framing = Some(framing);
        self
    }

    /// Encodes a single value.
    pub fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, SerializeError> {
        let bytes = match &self.format {
            Format::Json | Format::JsonLines => {
                serde_json::to_vec(value).map_err(SerializeError::encode)?
            }
            Format::Form => serde_urlencoded::to_string(value)
                .map_err(SerializeError::encode)?
                .into_bytes(),
            Format::Custom(codec) => {
                let value = serde_json::to_value(value).map_err(SerializeError::encode)?;
                codec.encode(&value).map_err(SerializeError::Encode)?
            }
        };
        Ok(Bytes::from(bytes))
    }

    /// Decodes a single value.
    pub fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializeError> {
        match &self.format {
            Format::Json | Format::JsonLines => {
                serde_json::from_slice(bytes).map_err(SerializeError::decode)
            }
            Format::Form => serde_urlencoded::from_bytes(bytes).map_err(SerializeError::decode),
            Format::Custom(codec) => {
                let value = codec.decode(bytes).map_err(SerializeError::Decode)?;
                serde_json::from_value(value).map_err(SerializeError::decode)
            }
        }
    }

    /// Returns `true` if this serializer can stream lists.
    pub fn supports_lists(&self) -> bool {
        self.framing.is_some()
    }

    /// Starts a new list, or returns `None` if lists are not supported.
    pub fn list_encoder(&self) -> Option<ListEncoder> {
        let framing = self.framing?;
        Some(ListEncoder {
            serializer: self.clone(),
            framing,
            written: 0,
        })
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match &self.format {
            Format::Json => "json",
            Format::JsonLines => "json-lines",
            Format::Form => "form",
            Format::Custom(_) => "custom",
        };
        f.debug_struct("Serializer")
            .field("format", &format)
            .field("framing", &self.framing)
            .finish()
    }
}

/// Frames a sequence of values produced one at a time.
///
/// Call [`begin`](Self::begin) once, [`encode`](Self::encode) per element,
/// and [`finish`](Self::finish) once, even when the sequence stopped early.
#[derive(Debug)]
pub struct ListEncoder {
    serializer: Serializer,
    framing: ListFraming,
    written: usize,
}

impl ListEncoder {
    /// Returns the bytes that open the list.
    pub fn begin(&mut self) -> Bytes {
        Bytes::from_static(self.framing.open.as_bytes())
    }

    /// Returns the framed bytes of the next element.
    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<Bytes, SerializeError> {
        let body = self.serializer.marshal(value)?;
        let separator = if self.written == 0 {
            ""
        } else {
            self.framing.separator
        };

        let mut chunk =
            Vec::with_capacity(separator.len() + body.len() + self.framing.terminator.len());
        chunk.extend_from_slice(separator.as_bytes());
        chunk.extend_from_slice(&body);
        chunk.extend_from_slice(self.framing.terminator.as_bytes());
        self.written += 1;
        Ok(Bytes::from(chunk))
    }

    /// Returns the bytes that close the list.
    pub fn finish(&mut self) -> Bytes {
        Bytes::from_static(self.framing.close.as_bytes())
    }

    /// Number of elements encoded so far.
    pub fn written(&self) -> usize {
        self.written
    }
}
