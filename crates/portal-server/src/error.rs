//! Errors raised below the HTTP layer.
//!
//! Handlers convert these into [`handler::Error`] values; the kind decides
//! the status code the client sees.
//!
//! [`handler::Error`]: crate::handler::Error

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use strum::IntoStaticStr;

pub type BoxedError = Box<dyn StdError + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse category of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum ErrorKind {
    /// Missing or invalid settings.
    #[strum(serialize = "config")]
    Config,
    /// The identity provider or the account store misbehaved.
    #[strum(serialize = "external_service")]
    External,
    /// A credential or session was rejected.
    #[strum(serialize = "auth")]
    Auth,
    /// A bug or an impossible state.
    #[strum(serialize = "internal_service")]
    Internal,
}

impl ErrorKind {
    #[must_use]
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service failure with an optional component name and cause.
#[derive(thiserror::Error)]
#[error(
    "{kind} error{}: {message}",
    .component.as_deref().map(|c| format!(" in {c}")).unwrap_or_default()
)]
pub struct Error {
    kind: ErrorKind,
    component: Option<Cow<'static, str>>,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    fn new(
        kind: ErrorKind,
        component: Option<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            kind,
            component,
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, None, message)
    }

    /// Failure of the named external component.
    pub fn external(
        component: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(ErrorKind::External, Some(component.into()), message)
    }

    pub fn auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Auth, None, message)
    }

    /// Failure inside the named component of this crate.
    pub fn internal(
        component: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(ErrorKind::Internal, Some(component.into()), message)
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    #[inline]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("component", &self.component)
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl From<portal_postgres::PgError> for Error {
    fn from(err: portal_postgres::PgError) -> Self {
        Error::external("postgres", err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_has_no_component() {
        let error = Error::config("missing client id");
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.message(), "missing client id");
        assert!(error.component().is_none());
        assert_eq!(error.to_string(), "config error: missing client id");
    }

    #[test]
    fn source_is_chained() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "user table missing");
        let error = Error::internal("store", "cannot read role").with_source(source);

        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(
            StdError::source(&error).map(ToString::to_string).as_deref(),
            Some("user table missing")
        );
    }

    #[test]
    fn external_error_names_component() {
        let error = Error::external("identity provider", "Connection refused");

        assert_eq!(error.component(), Some("identity provider"));
        assert_eq!(
            error.to_string(),
            "external_service error in identity provider: Connection refused"
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::External.as_str(), "external_service");
        assert_eq!(ErrorKind::Auth.as_str(), "auth");
        assert_eq!(ErrorKind::Internal.as_str(), "internal_service");
    }
}
