//! Service and store error to HTTP error conversion.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::utility::tracing_targets::TRACING_TARGET_RECOVERY_ERROR as TRACING_TARGET;

impl From<crate::Error> for HttpError<'static> {
    fn from(error: crate::Error) -> Self {
        use crate::ErrorKind as ServiceErrorKind;

        match error.kind() {
            ServiceErrorKind::Config => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Invalid service configuration"
                );
                ErrorKind::InternalServerError
                    .with_message("The service is not configured for this operation")
            }
            ServiceErrorKind::External => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "External service request failed"
                );
                ErrorKind::BadGateway.into_error()
            }
            ServiceErrorKind::Auth => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Authentication failed"
                );
                ErrorKind::Unauthorized.into_error()
            }
            ServiceErrorKind::Internal => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Internal service error"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}

impl From<portal_postgres::PgError> for HttpError<'static> {
    fn from(error: portal_postgres::PgError) -> Self {
        tracing::error!(
            target: TRACING_TARGET,
            error = %error,
            transient = error.is_transient(),
            "Database operation failed"
        );

        ErrorKind::InternalServerError.into_error()
    }
}
