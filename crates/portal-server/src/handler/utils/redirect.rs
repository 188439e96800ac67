//! `302 Found` responses.

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

use crate::utility::tracing_targets::TRACING_TARGET_IDENTITY;

/// Redirects with `302 Found`.
///
/// Locations that cannot be sent as a header value fall back to `/`.
pub(crate) fn found(location: &str) -> Response {
    let location = HeaderValue::from_str(location).unwrap_or_else(|_| {
        tracing::debug!(
            target: TRACING_TARGET_IDENTITY,
            "Redirect location is not a valid header value"
        );
        HeaderValue::from_static("/")
    });

    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

/// Redirects to the home page with a sign-in error code.
pub(crate) fn login_error(code: &str) -> Response {
    let encoded: String = form_urlencoded::byte_serialize(code.as_bytes()).collect();
    found(&format!("/?error={encoded}"))
}
