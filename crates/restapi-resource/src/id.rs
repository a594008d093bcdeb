//! Conversion between resource IDs and path segments.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Error converting an ID.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The segment is not a valid ID.
    #[error("malformed id {raw:?}")]
    Malformed {
        /// The rejected segment
        raw: String,
        /// Why it was rejected
        #[source]
        source: anyhow::Error,
    },

    /// No conversion exists for the ID type.
    #[error("id conversion not implemented for {0}")]
    NotImplemented(&'static str),
}

impl IdError {
    /// Creates a [`IdError::Malformed`] for `raw`.
    pub fn malformed(raw: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Malformed {
            raw: raw.into(),
            source: source.into(),
        }
    }
}

/// Formats IDs into path segments and parses them back.
pub trait IdConverter<ID>: Send + Sync + 'static {
    /// Formats `id` as a path segment.
    fn format(&self, id: &ID) -> Result<String, IdError>;

    /// Parses a path segment.
    fn parse(&self, raw: &str) -> Result<ID, IdError>;
}

/// The converter used when none is configured.
///
/// Integer IDs use their decimal form and `String` IDs are used as is.
/// Any other ID type fails with [`IdError::NotImplemented`].
///
/// # Example
///
/// ```rust
/// use restapi_resource::{DefaultIdConverter, IdConverter, IdError};
///
/// assert_eq!(IdConverter::<u64>::parse(&DefaultIdConverter, "42").unwrap(), 42);
/// assert!(matches!(
///     IdConverter::<u64>::parse(&DefaultIdConverter, "ABC"),
///     Err(IdError::Malformed { .. })
/// ));
/// assert_eq!(DefaultIdConverter.format(&"abc".to_string()).unwrap(), "abc");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdConverter;

macro_rules! format_as {
    ($id:expr, $($ty:ty),+) => {
        $(
            if let Some(id) = $id.downcast_ref::<$ty>() {
                return Ok(id.to_string());
            }
        )+
    };
}

macro_rules! parse_as {
    ($target:ty, $raw:expr, $($ty:ty),+) => {
        $(
            if std::any::TypeId::of::<$target>() == std::any::TypeId::of::<$ty>() {
                let parsed: $ty = $raw.parse().map_err(|err| IdError::malformed($raw, err))?;
                let boxed: Box<dyn Any> = Box::new(parsed);
                return boxed
                    .downcast::<$target>()
                    .map(|id| *id)
                    .map_err(|_| IdError::NotImplemented(type_name::<$target>()));
            }
        )+
    };
}

impl<ID: Any + Send + Sync> IdConverter<ID> for DefaultIdConverter {
    fn format(&self, id: &ID) -> Result<String, IdError> {
        let id: &dyn Any = id;
        format_as!(id, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String);
        Err(IdError::NotImplemented(type_name::<ID>()))
    }

    fn parse(&self, raw: &str) -> Result<ID, IdError> {
        parse_as!(ID, raw, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String);
        Err(IdError::NotImplemented(type_name::<ID>()))
    }
}

type FormatFn<ID> = Arc<dyn Fn(&ID) -> anyhow::Result<String> + Send + Sync>;
type ParseFn<ID> = Arc<dyn Fn(&str) -> anyhow::Result<ID> + Send + Sync>;

/// An [`IdConverter`] built from two closures.
///
/// Parse failures are reported as [`IdError::Malformed`].
///
/// # Example
///
/// ```rust
/// use restapi_resource::{FnIdConverter, IdConverter};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Sku(String);
///
/// let skus = FnIdConverter::new(
///     |sku: &Sku| Ok(sku.0.to_lowercase()),
///     |raw: &str| Ok(Sku(raw.to_uppercase())),
/// );
/// assert_eq!(skus.parse("ab-1").unwrap(), Sku("AB-1".into()));
/// ```
pub struct FnIdConverter<ID> {
    format: FormatFn<ID>,
    parse: ParseFn<ID>,
}

impl<ID> Clone for FnIdConverter<ID> {
    fn clone(&self) -> Self {
        Self {
            format: Arc::clone(&self.format),
            parse: Arc::clone(&self.parse),
        }
    }
}

impl<ID> fmt::Debug for FnIdConverter<ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnIdConverter").finish_non_exhaustive()
    }
}

impl<ID> FnIdConverter<ID> {
    /// Creates a converter from a formatter and a parser.
    pub fn new<F, P>(format: F, parse: P) -> Self
    where
        F: Fn(&ID) -> anyhow::Result<String> + Send + Sync + 'static,
        P: Fn(&str) -> anyhow::Result<ID> + Send + Sync + 'static,
    {
        Self {
            format: Arc::new(format),
            parse: Arc::new(parse),
        }
    }
}

impl<ID: 'static> IdConverter<ID> for FnIdConverter<ID> {
    fn format(&self, id: &ID) -> Result<String, IdError> {
        (self.format)(id).map_err(|err| IdError::malformed(type_name::<ID>(), err))
    }

    fn parse(&self, raw: &str) -> Result<ID, IdError> {
        (self.parse)(raw).map_err(|err| IdError::malformed(raw, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<ID: Any + Send + Sync>(raw: &str) -> Result<ID, IdError> {
        DefaultIdConverter.parse(raw)
    }

    fn format<ID: Any + Send + Sync>(id: &ID) -> Result<String, IdError> {
        DefaultIdConverter.format(id)
    }

    #[test]
    fn test_integer_round_trip() {
        assert_eq!(parse::<i64>("-17").unwrap(), -17);
        assert_eq!(parse::<u8>("255").unwrap(), 255);
        assert_eq!(parse::<usize>("0").unwrap(), 0);
        assert_eq!(format(&-17_i64).unwrap(), "-17");
        assert_eq!(format(&u128::MAX).unwrap(), u128::MAX.to_string());
    }

    #[test]
    fn test_string_round_trip() {
        assert_eq!(parse::<String>("ABC").unwrap(), "ABC");
        assert_eq!(format(&"ABC".to_string()).unwrap(), "ABC");
    }

    #[test]
    fn test_malformed_keeps_cause() {
        let err = parse::<u32>("ABC").unwrap_err();
        match &err {
            IdError::Malformed { raw, .. } => assert_eq!(raw, "ABC"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());

        assert!(matches!(parse::<u8>("256"), Err(IdError::Malformed { .. })));
    }

    #[test]
    fn test_unsupported_type() {
        #[derive(Debug)]
        struct Opaque;

        assert!(matches!(
            parse::<Opaque>("x"),
            Err(IdError::NotImplemented(_))
        ));
        assert!(matches!(format(&Opaque), Err(IdError::NotImplemented(_))));
        assert!(matches!(format(&1.5_f64), Err(IdError::NotImplemented(_))));
    }

    #[test]
    fn test_fn_converter() {
        let converter = FnIdConverter::new(
            |id: &u64| Ok(format!("{id:x}")),
            |raw: &str| Ok(u64::from_str_radix(raw, 16)?),
        );
        assert_eq!(converter.format(&255).unwrap(), "ff");
        assert_eq!(converter.parse("ff").unwrap(), 255);
        assert!(matches!(
            converter.parse("zz"),
            Err(IdError::Malformed { .. })
        ));
    }
}
