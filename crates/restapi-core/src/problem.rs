//! RFC 7807 problem documents.
//!
//! A [`Problem`] is serialized as a flat JSON object: the standard members
//! (`type`, `title`, `status`, `detail`, `instance`) come first, followed by
//! any extension members.
//!
//! ```text
//! {
//!   "type":     "https://errors.example.com/entity-not-found",
//!   "title":    "Entity not found",
//!   "status":   404,
//!   "detail":   "no widget with id 7",
//!   "instance": "/widgets/7"
//! }
//! ```
//!
//! [`ProblemWriter`] turns arbitrary errors into problem responses by
//! walking the error's source chain for a [`RestError`] or [`UserError`].

use crate::body::{full, Response, ResponseExt};
use crate::error::{ErrorKind, RestError, UserError};
use crate::mime::APPLICATION_PROBLEM_JSON;
use http::request::Parts;
use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Members defined by RFC 7807 that extensions may not shadow.
const RESERVED_MEMBERS: [&str; 5] = ["type", "title", "status", "detail", "instance"];

const INTERNAL_DETAIL: &str = "The server encountered an unexpected condition.";

/// Errors raised while building or parsing problem documents.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// The type URI was empty or had no identifier.
    #[error("invalid problem type URI: {0:?}")]
    InvalidType(String),

    /// An extension tried to use a reserved member name.
    #[error("extension member {0:?} is reserved")]
    ReservedMember(String),

    /// An extension value could not be serialized.
    #[error("failed to serialize extension member: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The `type` member of a problem document.
///
/// Formats as `<base_url>/<id>`, or as the bare `id` when no base URL is
/// configured. Parsing splits at the last `/`.
///
/// ```rust
/// use restapi_core::ProblemType;
///
/// let t: ProblemType = "https://errors.example.com/entity-not-found".parse().unwrap();
/// assert_eq!(t.id(), "entity-not-found");
/// assert_eq!(t.base_url(), Some("https://errors.example.com"));
/// assert_eq!(t.to_string(), "https://errors.example.com/entity-not-found");
///
/// let bare: ProblemType = "entity-not-found".parse().unwrap();
/// assert_eq!(bare.base_url(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProblemType {
    base_url: Option<String>,
    id: String,
}

impl ProblemType {
    /// Creates a problem type from a base URL and an identifier.
    pub fn new(base_url: Option<&str>, id: impl Into<String>) -> Self {
        Self {
            base_url: base_url
                .map(|base| base.trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty()),
            id: id.into(),
        }
    }

    /// Returns the identifier suffix.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base_url {
            Some(base) => write!(f, "{base}/{}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

impl FromStr for ProblemType {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (base, id) = match s.rfind('/') {
            Some(idx) => (Some(&s[..idx]), &s[idx + 1..]),
            None => (None, s),
        };
        if id.is_empty() {
            return Err(ProblemError::InvalidType(s.to_string()));
        }
        Ok(Self::new(base, id))
    }
}

impl Serialize for ProblemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProblemType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An RFC 7807 problem document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub problem_type: ProblemType,
    /// Short human-readable summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable explanation of this occurrence.
    #[serde(default)]
    pub detail: String,
    /// URI reference identifying this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Extension members, flattened into the document.
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl Problem {
    /// Creates a problem with the given type, title, and status.
    pub fn new(problem_type: ProblemType, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            problem_type,
            title: title.into(),
            status: status.as_u16(),
            detail: String::new(),
            instance: None,
            extensions: serde_json::Map::new(),
        }
    }

    /// Creates a problem describing an [`ErrorKind`].
    pub fn from_kind(kind: ErrorKind, base_url: Option<&str>) -> Self {
        Self::new(ProblemType::new(base_url, kind.id()), kind.title(), kind.status())
    }

    /// Sets the detail member.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Sets the instance member.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Adds an extension member.
    ///
    /// Fails if `name` is one of the standard members.
    pub fn with_extension(
        mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, ProblemError> {
        let name = name.into();
        if RESERVED_MEMBERS.contains(&name.as_str()) {
            return Err(ProblemError::ReservedMember(name));
        }
        self.extensions.insert(name, serde_json::to_value(value)?);
        Ok(self)
    }

    /// Returns the status as a [`StatusCode`].
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Renders the problem as an `application/problem+json` response.
    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match serde_json::to_vec(&self) {
            Ok(body) => Response::with_body(status, APPLICATION_PROBLEM_JSON, full(body)),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize problem document");
                Response::with_status(status)
            }
        }
    }
}

/// Turns errors into HTTP responses.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Writes the response for `error`, raised while serving `request`.
    fn handle_error(&self, request: &Parts, error: &(dyn StdError + 'static)) -> Response;
}

/// The default [`ErrorHandler`], writing RFC 7807 problem documents.
///
/// Classification walks the error's source chain:
///
/// - a [`RestError`] of any kind other than `InternalServerError` decides
///   the kind and detail;
/// - a [`UserError`] keeps its id and message, with the status of the
///   matching [`ErrorKind`] or 500;
/// - anything else is an internal server error.
#[derive(Debug, Clone, Default)]
pub struct ProblemWriter {
    base_url: Option<String>,
    expose_details: bool,
}

impl ProblemWriter {
    /// Creates a writer producing bare-id type URIs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for problem type URIs.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Whether internal error messages are sent to clients.
    #[must_use]
    pub fn expose_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }

    /// Builds the problem document for `error`.
    pub fn problem(&self, error: &(dyn StdError + 'static)) -> Problem {
        let base = self.base_url.as_deref();

        let mut next = Some(error);
        while let Some(cause) = next {
            next = cause.source();
            if let Some(rest) = cause.downcast_ref::<RestError>() {
                if rest.kind() == ErrorKind::InternalServerError {
                    continue;
                }
                let problem = Problem::from_kind(rest.kind(), base);
                return match rest.detail() {
                    Some(detail) => problem.with_detail(detail),
                    None => match rest.source() {
                        Some(source) => problem.with_detail(source.to_string()),
                        None => problem.with_detail(rest.kind().title()),
                    },
                };
            }
            if let Some(user) = cause.downcast_ref::<UserError>() {
                let kind = user.kind();
                let status = kind.map_or(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::status);
                let title = match kind {
                    Some(kind) => kind.title().to_string(),
                    None => user.id.clone(),
                };
                return Problem::new(ProblemType::new(base, user.id.clone()), title, status)
                    .with_detail(user.message.clone());
            }
        }

        let detail = if self.expose_details {
            error.to_string()
        } else {
            INTERNAL_DETAIL.to_string()
        };
        Problem::from_kind(ErrorKind::InternalServerError, base).with_detail(detail)
    }
}

impl ErrorHandler for ProblemWriter {
    fn handle_error(&self, request: &Parts, error: &(dyn StdError + 'static)) -> Response {
        let problem = self.problem(error).with_instance(request.uri.path());
        if problem.status_code().is_server_error() {
            tracing::error!(
                error = %error,
                method = %request.method,
                path = %request.uri.path(),
                "request failed"
            );
        } else {
            tracing::debug!(
                error = %error,
                status = problem.status,
                "request rejected"
            );
        }
        problem.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn parts(path: &str) -> Parts {
        http::Request::builder()
            .uri(path)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_problem_type_round_trip() {
        for raw in ["https://example.com/errors/entity-not-found", "path-not-found"] {
            let parsed: ProblemType = raw.parse().unwrap();
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn test_problem_type_rejects_empty_id() {
        assert!("https://example.com/".parse::<ProblemType>().is_err());
        assert!("".parse::<ProblemType>().is_err());
    }

    #[test]
    fn test_problem_serializes_flat() {
        let problem = Problem::from_kind(ErrorKind::EntityNotFound, Some("https://e.io/"))
            .with_detail("gone")
            .with_extension("entity", "widget")
            .unwrap();
        let value = serde_json::to_value(&problem).unwrap();
        assert_eq!(value["type"], "https://e.io/entity-not-found");
        assert_eq!(value["title"], "Entity not found");
        assert_eq!(value["status"], 404);
        assert_eq!(value["detail"], "gone");
        assert_eq!(value["entity"], "widget");
        assert!(value.get("instance").is_none());

        let text = serde_json::to_string(&problem).unwrap();
        assert!(text.starts_with("{\"type\":"));
    }

    #[test]
    fn test_problem_deserializes_extensions() {
        let raw = r#"{"type":"quota","title":"Quota","status":429,"detail":"","limit":5}"#;
        let problem: Problem = serde_json::from_str(raw).unwrap();
        assert_eq!(problem.problem_type.id(), "quota");
        assert_eq!(problem.extensions["limit"], 5);
    }

    #[test]
    fn test_reserved_extension_rejected() {
        let result = Problem::from_kind(ErrorKind::PathNotFound, None).with_extension("status", 1);
        assert!(matches!(result, Err(ProblemError::ReservedMember(_))));
    }

    #[test]
    fn test_writer_uses_rest_error_kind() {
        let writer = ProblemWriter::new();
        let err = RestError::malformed_id().with_detail("not an integer");
        let problem = writer.problem(&err);
        assert_eq!(problem.status, 400);
        assert_eq!(problem.problem_type.id(), "malformed-id-in-path");
        assert_eq!(problem.detail, "not an integer");
    }

    #[test]
    fn test_writer_preserves_user_error() {
        let writer = ProblemWriter::new().base_url("https://errors.example.com");
        let err = RestError::internal().with_source(UserError::new("quota-exceeded", "slow down"));
        let problem = writer.problem(&err);
        assert_eq!(problem.status, 500);
        assert_eq!(
            problem.problem_type.to_string(),
            "https://errors.example.com/quota-exceeded"
        );
        assert_eq!(problem.detail, "slow down");
    }

    #[test]
    fn test_writer_maps_known_user_error_id() {
        let err = ErrorKind::EntityAlreadyExist.user_error();
        let problem = ProblemWriter::new().problem(&err);
        assert_eq!(problem.status, 409);
    }

    #[test]
    fn test_writer_hides_unknown_errors() {
        let err = std::io::Error::other("disk on fire");
        let hidden = ProblemWriter::new().problem(&err);
        assert_eq!(hidden.status, 500);
        assert_eq!(hidden.problem_type.id(), "internal-server-error");
        assert!(!hidden.detail.contains("disk"));

        let exposed = ProblemWriter::new().expose_details(true).problem(&err);
        assert_eq!(exposed.detail, "disk on fire");
    }

    #[tokio::test]
    async fn test_handle_error_writes_problem_json() {
        let writer = ProblemWriter::new();
        let response = writer.handle_error(&parts("/widgets/9"), &RestError::entity_not_found());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            APPLICATION_PROBLEM_JSON
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["instance"], "/widgets/9");
        assert_eq!(value["type"], "entity-not-found");
    }
}
