use std::borrow::Cow;

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body of every error response.
///
/// Built from a handler [`Error`]; the status line comes from its kind.
///
/// [`Error`]: crate::handler::Error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// Snake case error name, e.g. `missing_auth_token`.
    pub name: &'static str,
    /// Message safe to show to the user.
    pub message: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::handler::ErrorKind;

    #[test]
    fn falls_back_to_default_message() -> anyhow::Result<()> {
        let error = ErrorKind::NotFound.into_error();
        let json = serde_json::to_value(error.to_body())?;

        assert_eq!(json["name"], "not_found");
        assert_eq!(json["message"], ErrorKind::NotFound.default_message());
        assert!(json.get("resource").is_none());
        assert!(json.get("context").is_none());
        Ok(())
    }

    #[test]
    fn carries_details() -> anyhow::Result<()> {
        let error = ErrorKind::Forbidden
            .with_message("Missing permission")
            .with_resource("admin:events");
        let json = serde_json::to_value(error.to_body())?;

        assert_eq!(json["name"], "forbidden");
        assert_eq!(json["message"], "Missing permission");
        assert_eq!(json["resource"], "admin:events");
        Ok(())
    }
}
