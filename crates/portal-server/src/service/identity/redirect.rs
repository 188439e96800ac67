//! Post-login destination sanitizing.
//!
//! Destinations are reduced to same-origin relative paths; anything else lands on `/`.

use std::sync::Arc;

use url::Url;

use crate::utility::tracing_targets::TRACING_TARGET_IDENTITY;
use crate::{Error, Result};

/// Path the identity provider redirects back to.
pub(crate) const CALLBACK_PATH: &str = "/api/auth/callback";

/// Reduces a post-login destination to a same-origin relative path.
///
/// - a path starting with a single `/` is returned unchanged, query and
///   fragment included;
/// - an absolute URL with the same scheme, host and port as `base_url` is
///   reduced to its path, query and fragment;
/// - anything else (foreign origin, `//host`, unparsable, empty) becomes `/`.
pub fn sanitize_redirect(base_url: &Url, candidate: &str) -> String {
    if candidate.starts_with('/') {
        return relative_or_root(candidate);
    }

    let Ok(url) = Url::parse(candidate) else {
        return "/".to_owned();
    };

    if url.origin() != base_url.origin() {
        tracing::debug!(
            target: TRACING_TARGET_IDENTITY,
            origin = %url.origin().ascii_serialization(),
            "Rejected cross-origin redirect"
        );
        return "/".to_owned();
    }

    let mut destination = url.path().to_owned();
    if let Some(query) = url.query() {
        destination.push('?');
        destination.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        destination.push('#');
        destination.push_str(fragment);
    }

    relative_or_root(&destination)
}

/// Browsers read `//host` and `/\host` as another origin and drop tabs and
/// newlines before doing so.
fn relative_or_root(path: &str) -> String {
    let second = path.chars().nth(1);
    if path.chars().any(|c| c.is_ascii_control()) || matches!(second, Some('/' | '\\')) {
        tracing::debug!(
            target: TRACING_TARGET_IDENTITY,
            "Rejected protocol-relative redirect"
        );
        return "/".to_owned();
    }

    path.to_owned()
}

/// The portal's public origin, used to sanitize redirects and to build the
/// callback URI registered with the identity provider.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    base_url: Arc<Url>,
}

impl RedirectPolicy {
    /// Creates a policy for the given public base URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::config(format!("APP_BASE_URL is not a valid URL: {base_url}")).with_source(e)
        })?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.host().is_none() {
            return Err(Error::config("APP_BASE_URL must be an http(s) URL"));
        }

        Ok(Self {
            base_url: Arc::new(base_url),
        })
    }

    /// Returns the public base URL.
    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sanitizes an optional destination; a missing one becomes `/`.
    pub fn sanitize(&self, candidate: Option<&str>) -> String {
        sanitize_redirect(&self.base_url, candidate.unwrap_or_default())
    }

    /// Returns the absolute callback URI of the sign-in flow.
    pub fn callback_url(&self) -> String {
        let mut url = (*self.base_url).clone();
        url.set_path(CALLBACK_PATH);
        url.set_query(None);
        url.set_fragment(None);
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.org").unwrap()
    }

    #[test]
    fn keeps_relative_paths() {
        assert_eq!(sanitize_redirect(&base(), "/pt/home?x=1#y"), "/pt/home?x=1#y");
        assert_eq!(sanitize_redirect(&base(), "/"), "/");
    }

    #[test]
    fn reduces_same_origin_urls() {
        assert_eq!(sanitize_redirect(&base(), "https://example.org/pt/home"), "/pt/home");
        assert_eq!(
            sanitize_redirect(&base(), "https://example.org:443/events?id=4#top"),
            "/events?id=4#top"
        );
        assert_eq!(sanitize_redirect(&base(), "https://example.org"), "/");
    }

    #[test]
    fn rejects_other_origins() {
        assert_eq!(sanitize_redirect(&base(), "https://evil.example/x"), "/");
        assert_eq!(sanitize_redirect(&base(), "http://example.org/x"), "/");
        assert_eq!(sanitize_redirect(&base(), "https://example.org:8443/x"), "/");
        assert_eq!(sanitize_redirect(&base(), "javascript:alert(1)"), "/");
    }

    #[test]
    fn rejects_protocol_relative_and_garbage() {
        assert_eq!(sanitize_redirect(&base(), "//evil.example/x"), "/");
        assert_eq!(sanitize_redirect(&base(), "/\\evil.example"), "/");
        assert_eq!(sanitize_redirect(&base(), "/\t/evil.example"), "/");
        assert_eq!(sanitize_redirect(&base(), "https://example.org//evil.example"), "/");
        assert_eq!(sanitize_redirect(&base(), "pt/home"), "/");
        assert_eq!(sanitize_redirect(&base(), ""), "/");
    }

    #[test]
    fn policy_builds_callback_url() {
        let policy = RedirectPolicy::new("http://localhost:3000").unwrap();
        assert_eq!(policy.callback_url(), "http://localhost:3000/api/auth/callback");
        assert_eq!(policy.sanitize(None), "/");
        assert_eq!(
            policy.sanitize(Some("http://localhost:3000/events")),
            "/events"
        );
    }

    #[test]
    fn policy_rejects_invalid_base() {
        assert!(RedirectPolicy::new("not a url").is_err());
        assert!(RedirectPolicy::new("mailto:staff@example.org").is_err());
    }
}
