//! Handler-facing error: a fixed [`ErrorKind`] plus optional details.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use strum::IntoStaticStr;

use crate::handler::response::ErrorResponse;

/// Error returned by portal handlers, extractors and middleware.
///
/// The kind decides the status line and the `name` of the JSON body; the
/// details only refine the body.
#[derive(Clone)]
#[must_use = "errors do nothing unless turned into a response"]
pub struct Error<'a> {
    kind: ErrorKind,
    details: Details<'a>,
}

#[derive(Clone, Default)]
struct Details<'a> {
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
}

impl Details<'_> {
    fn into_owned(self) -> Details<'static> {
        Details {
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            resource: self.resource.map(|r| Cow::Owned(r.into_owned())),
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
        }
    }
}

impl Error<'static> {
    /// Creates an error without details.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            details: Details::default(),
        }
    }
}

impl<'a> Error<'a> {
    /// Replaces the client-facing message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.details.message = Some(message.into());
        self
    }

    /// Names the resource the error is about.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.details.resource = Some(resource.into());
        self
    }

    /// Adds free-form context.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.details.context = Some(context.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.details.message.as_deref()
    }

    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.details.resource.as_deref()
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.details.context.as_deref()
    }

    /// Detaches the error from any borrowed text.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            details: self.details.into_owned(),
        }
    }

    /// Builds the JSON body for this error.
    pub(crate) fn to_body(&self) -> ErrorResponse<'_> {
        ErrorResponse {
            name: self.kind.name(),
            message: self
                .message()
                .unwrap_or_else(|| self.kind.default_message())
                .into(),
            resource: self.resource().map(Cow::Borrowed),
            context: self.context().map(Cow::Borrowed),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("status", &self.kind.status_code())
            .field("message", &self.message())
            .field("resource", &self.resource())
            .field("context", &self.context())
            .finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.kind.status_code().as_u16();
        let message = self.message().unwrap_or_else(|| self.kind.default_message());
        write!(f, "{status} {}: {message}", self.kind.name())?;

        match (self.resource(), self.context()) {
            (Some(resource), Some(context)) => write!(f, " ({resource}; {context})"),
            (Some(detail), None) | (None, Some(detail)) => write!(f, " ({detail})"),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        (self.kind.status_code(), self.to_body()).into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result of a handler.
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// What went wrong, as far as the client is concerned.
///
/// The snake case variant name is the `name` of the JSON body.
#[must_use = "error kinds do nothing unless turned into errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// 400, malformed request.
    BadRequest,
    /// 401, no usable session.
    MissingAuthToken,
    /// 401, the credentials were rejected.
    Unauthorized,
    /// 403, signed in but not allowed.
    Forbidden,
    /// 404.
    NotFound,
    /// 500.
    #[default]
    InternalServerError,
    /// 502, the identity provider failed.
    BadGateway,
}

impl ErrorKind {
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Machine-readable name sent to clients.
    #[inline]
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::MissingAuthToken | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message used when the error carries none of its own.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The request is malformed",
            Self::MissingAuthToken => "Sign in to continue",
            Self::Unauthorized => "Your session is invalid or has expired",
            Self::Forbidden => "You are not allowed to do this",
            Self::NotFound => "Nothing here",
            Self::InternalServerError => "Something went wrong on our side, try again later",
            Self::BadGateway => "The identity provider did not answer properly",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        Error::new(self).into_response()
    }
}
