//! Error taxonomy for restapi.
//!
//! Every failure a router or resource can report is one of the
//! [`ErrorKind`]s below. Each kind has a stable identifier (used as the
//! suffix of the problem document's `type` URI) and a fixed HTTP status.
//!
//! | `ErrorKind` | Status | Identifier |
//! |---|---|---|
//! | `EntityNotFound` | 404 | `entity-not-found` |
//! | `PathNotFound` | 404 | `path-not-found` |
//! | `EntityAlreadyExist` | 409 | `entity-already-exist` |
//! | `MethodNotAllowed` | 405 | `method-not-allowed` |
//! | `MalformedId` | 400 | `malformed-id-in-path` |
//! | `InvalidRequestBody` | 400 | `invalid-request-body` |
//! | `RequestEntityTooLarge` | 413 | `request-entity-too-large` |
//! | `NotAcceptable` | 406 | `not-acceptable` |
//! | `InternalServerError` | 500 | `internal-server-error` |

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`RestError`].
pub type RestResult<T> = Result<T, RestError>;

/// The kinds of errors reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The repository has no entity with the requested ID.
    EntityNotFound,
    /// No route matched the request path.
    PathNotFound,
    /// The repository rejected a create because the entity exists.
    EntityAlreadyExist,
    /// The path matched but the method is unsupported.
    MethodNotAllowed,
    /// The ID segment of the path could not be parsed.
    MalformedId,
    /// The request body could not be decoded.
    InvalidRequestBody,
    /// The request body exceeded the configured limit.
    RequestEntityTooLarge,
    /// The negotiated serializer cannot produce the response.
    NotAcceptable,
    /// Anything else.
    InternalServerError,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 9] = [
        Self::EntityNotFound,
        Self::PathNotFound,
        Self::EntityAlreadyExist,
        Self::MethodNotAllowed,
        Self::MalformedId,
        Self::InvalidRequestBody,
        Self::RequestEntityTooLarge,
        Self::NotAcceptable,
        Self::InternalServerError,
    ];

    /// Returns the stable identifier of this kind.
    pub const fn id(self) -> &'static str {
        match self {
            Self::EntityNotFound => "entity-not-found",
            Self::PathNotFound => "path-not-found",
            Self::EntityAlreadyExist => "entity-already-exist",
            Self::MethodNotAllowed => "method-not-allowed",
            Self::MalformedId => "malformed-id-in-path",
            Self::InvalidRequestBody => "invalid-request-body",
            Self::RequestEntityTooLarge => "request-entity-too-large",
            Self::NotAcceptable => "not-acceptable",
            Self::InternalServerError => "internal-server-error",
        }
    }

    /// Returns the HTTP status code for this kind.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::EntityNotFound | Self::PathNotFound => StatusCode::NOT_FOUND,
            Self::EntityAlreadyExist => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedId | Self::InvalidRequestBody => StatusCode::BAD_REQUEST,
            Self::RequestEntityTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the human readable title used in problem documents.
    pub const fn title(self) -> &'static str {
        match self {
            Self::EntityNotFound => "Entity not found",
            Self::PathNotFound => "Path not found",
            Self::EntityAlreadyExist => "Entity already exists",
            Self::MethodNotAllowed => "Method not allowed",
            Self::MalformedId => "Malformed ID in path",
            Self::InvalidRequestBody => "Invalid request body",
            Self::RequestEntityTooLarge => "Request entity too large",
            Self::NotAcceptable => "Not acceptable",
            Self::InternalServerError => "Internal server error",
        }
    }

    /// Looks a kind up by its identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Returns the [`UserError`] value carrying this kind's id and title.
    pub fn user_error(self) -> UserError {
        UserError::new(self.id(), self.title())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A named error raised by user code.
///
/// The problem writer keeps the `id` and `message` of a `UserError` found
/// anywhere in an error's source chain. If the id is one of the
/// [`ErrorKind`] identifiers, that kind's status is used; otherwise the
/// status is 500.
///
/// ```rust
/// use restapi_core::{ErrorKind, UserError};
///
/// let err = UserError::new("quota-exceeded", "Too many widgets");
/// assert_eq!(err.to_string(), "Too many widgets");
/// assert_eq!(err.kind(), None);
/// assert_eq!(ErrorKind::EntityNotFound.user_error().kind(), Some(ErrorKind::EntityNotFound));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UserError {
    /// Stable machine-readable identifier.
    pub id: String,
    /// Human-readable message.
    pub message: String,
}

impl UserError {
    /// Creates a new user error.
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Returns the taxonomy kind matching this error's id, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_id(&self.id)
    }
}

/// An error with a taxonomy kind.
///
/// # Example
///
/// ```
/// use restapi_core::{ErrorKind, RestError};
///
/// let err = RestError::malformed_id().with_detail("'abc' is not an integer");
/// assert_eq!(err.kind(), ErrorKind::MalformedId);
/// assert_eq!(err.status().as_u16(), 400);
/// ```
#[derive(Debug, Error)]
#[error("{}", display_rest_error(.kind, .detail.as_deref()))]
pub struct RestError {
    kind: ErrorKind,
    detail: Option<String>,
    #[source]
    source: Option<anyhow::Error>,
}

fn display_rest_error(kind: &ErrorKind, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{}: {detail}", kind.title()),
        None => kind.title().to_string(),
    }
}

impl RestError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            detail: None,
            source: None,
        }
    }

    /// Attaches a human readable detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Creates an [`ErrorKind::EntityNotFound`] error.
    pub fn entity_not_found() -> Self {
        Self::new(ErrorKind::EntityNotFound)
    }

    /// Creates an [`ErrorKind::PathNotFound`] error.
    pub fn path_not_found() -> Self {
        Self::new(ErrorKind::PathNotFound)
    }

    /// Creates an [`ErrorKind::EntityAlreadyExist`] error.
    pub fn entity_already_exist() -> Self {
        Self::new(ErrorKind::EntityAlreadyExist)
    }

    /// Creates an [`ErrorKind::MethodNotAllowed`] error.
    pub fn method_not_allowed() -> Self {
        Self::new(ErrorKind::MethodNotAllowed)
    }

    /// Creates an [`ErrorKind::MalformedId`] error.
    pub fn malformed_id() -> Self {
        Self::new(ErrorKind::MalformedId)
    }

    /// Creates an [`ErrorKind::InvalidRequestBody`] error.
    pub fn invalid_request_body() -> Self {
        Self::new(ErrorKind::InvalidRequestBody)
    }

    /// Creates an [`ErrorKind::RequestEntityTooLarge`] error.
    pub fn request_entity_too_large() -> Self {
        Self::new(ErrorKind::RequestEntityTooLarge)
    }

    /// Creates an [`ErrorKind::NotAcceptable`] error.
    pub fn not_acceptable() -> Self {
        Self::new(ErrorKind::NotAcceptable)
    }

    /// Creates an [`ErrorKind::InternalServerError`] error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::InternalServerError)
    }
}

impl From<ErrorKind> for RestError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_status_table() {
        assert_eq!(ErrorKind::EntityNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::PathNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::EntityAlreadyExist.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorKind::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ErrorKind::MalformedId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::InvalidRequestBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorKind::RequestEntityTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ErrorKind::NotAcceptable.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            ErrorKind::InternalServerError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_id_lookup_round_trips() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(ErrorKind::from_id("no-such-kind"), None);
    }

    #[test]
    fn test_rest_error_display() {
        assert_eq!(RestError::entity_not_found().to_string(), "Entity not found");
        assert_eq!(
            RestError::malformed_id().with_detail("bad").to_string(),
            "Malformed ID in path: bad"
        );
    }

    #[test]
    fn test_rest_error_source_chain() {
        let err = RestError::internal().with_source(UserError::new("boom", "it broke"));
        let source = err.source().expect("source");
        let user = source.downcast_ref::<UserError>().expect("user error");
        assert_eq!(user.id, "boom");
    }

    #[test]
    fn test_user_error_kind() {
        let err = ErrorKind::EntityAlreadyExist.user_error();
        assert_eq!(err.kind(), Some(ErrorKind::EntityAlreadyExist));
        assert_eq!(err.message, "Entity already exists");
    }
}
