//! OAuth client for the network's identity provider.
//!
//! Builds the authorization URL, exchanges the callback code for an access
//! token and fetches the user-info document with it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utility::tracing_targets::TRACING_TARGET_IDENTITY;
use crate::{Error, Result};

/// Service name used in external errors.
const SERVICE_NAME: &str = "identity provider";

/// Timeout applied to each request made to the identity provider.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default values for configuration options.
mod defaults {
    pub const AUTHORIZE_URL: &str = "https://auth.vatsim.net/oauth/authorize";
    pub const TOKEN_URL: &str = "https://auth.vatsim.net/oauth/token";
    pub const USERINFO_URL: &str = "https://auth.vatsim.net/api/user";
    pub const SCOPE: &str = "full_name email vatsim_details";
}

/// OAuth client configuration for the network's identity provider.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct IdentityConfig {
    /// OAuth client identifier; sign-in is unavailable without it.
    #[cfg_attr(feature = "config", arg(long, env = "SSO_CLIENT_ID"))]
    pub sso_client_id: Option<String>,

    /// OAuth client secret.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SSO_CLIENT_SECRET", hide_env_values = true)
    )]
    pub sso_client_secret: Option<String>,

    /// Authorization endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SSO_AUTHORIZE_URL", default_value = defaults::AUTHORIZE_URL)
    )]
    pub sso_authorize_url: String,

    /// Token endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SSO_TOKEN_URL", default_value = defaults::TOKEN_URL)
    )]
    pub sso_token_url: String,

    /// User-info endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SSO_USERINFO_URL", default_value = defaults::USERINFO_URL)
    )]
    pub sso_userinfo_url: String,

    /// Space-separated scopes requested at sign-in.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SSO_SCOPE", default_value = defaults::SCOPE)
    )]
    pub sso_scope: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            sso_client_id: None,
            sso_client_secret: None,
            sso_authorize_url: defaults::AUTHORIZE_URL.to_owned(),
            sso_token_url: defaults::TOKEN_URL.to_owned(),
            sso_userinfo_url: defaults::USERINFO_URL.to_owned(),
            sso_scope: defaults::SCOPE.to_owned(),
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("sso_client_id", &self.sso_client_id)
            .field(
                "sso_client_secret",
                &self.sso_client_secret.as_ref().map(|_| "***"),
            )
            .field("sso_authorize_url", &self.sso_authorize_url)
            .field("sso_token_url", &self.sso_token_url)
            .field("sso_userinfo_url", &self.sso_userinfo_url)
            .field("sso_scope", &self.sso_scope)
            .finish()
    }
}

/// Identity asserted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Network identifier (CID).
    pub subject: String,
    /// Full name, if the scope allowed it.
    pub name: Option<String>,
    /// Email address, if the scope allowed it.
    pub email: Option<String>,
}

/// Result of a successful code exchange.
#[derive(Clone)]
pub struct ExchangedIdentity {
    /// Who signed in.
    pub claims: IdentityClaims,
    /// Provider access token, kept so the portal can call provider APIs later.
    pub access_token: String,
}

impl fmt::Debug for ExchangedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangedIdentity")
            .field("claims", &self.claims)
            .field("access_token", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Network identifiers come back as strings or numbers depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum Subject {
    Text(String),
    Number(u64),
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Text(text) => text,
            Subject::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserInfoResponse {
    Network {
        data: NetworkUser,
    },
    Standard {
        sub: Subject,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
}

#[derive(Deserialize)]
struct NetworkUser {
    cid: Subject,
    #[serde(default)]
    personal: Option<NetworkPersonal>,
}

#[derive(Deserialize)]
struct NetworkPersonal {
    #[serde(default)]
    name_full: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserInfoResponse> for IdentityClaims {
    fn from(response: UserInfoResponse) -> Self {
        match response {
            UserInfoResponse::Network { data } => {
                let personal = data.personal;
                Self {
                    subject: data.cid.into(),
                    name: personal.as_ref().and_then(|p| p.name_full.clone()),
                    email: personal.and_then(|p| p.email),
                }
            }
            UserInfoResponse::Standard { sub, name, email } => Self {
                subject: sub.into(),
                name,
                email,
            },
        }
    }
}

/// OAuth client for the network's identity provider.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct IdentityProvider {
    inner: Arc<IdentityProviderInner>,
}

struct IdentityProviderInner {
    client_id: Option<String>,
    client_secret: Option<String>,
    authorize_url: Url,
    token_url: Url,
    userinfo_url: Url,
    scope: String,
    http: reqwest::Client,
}

impl IdentityProvider {
    /// Creates a provider client from configuration.
    ///
    /// A missing client id is not an error here; [`authorize_url`] reports it.
    ///
    /// [`authorize_url`]: Self::authorize_url
    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let parse = |name: &str, value: &str| {
            Url::parse(value).map_err(|e| {
                Error::config(format!("{name} is not a valid URL: {value}")).with_source(e)
            })
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config("failed to build HTTP client").with_source(e))?;

        let client_id = config
            .sso_client_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);

        if client_id.is_none() {
            tracing::warn!(
                target: TRACING_TARGET_IDENTITY,
                "SSO_CLIENT_ID is not set, sign-in is disabled"
            );
        }

        Ok(Self {
            inner: Arc::new(IdentityProviderInner {
                client_id,
                client_secret: config.sso_client_secret.clone(),
                authorize_url: parse("SSO_AUTHORIZE_URL", &config.sso_authorize_url)?,
                token_url: parse("SSO_TOKEN_URL", &config.sso_token_url)?,
                userinfo_url: parse("SSO_USERINFO_URL", &config.sso_userinfo_url)?,
                scope: config.sso_scope.clone(),
                http,
            }),
        })
    }

    /// Returns whether a client id is configured.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.inner.client_id.is_some()
    }

    /// Builds the provider authorization URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no client id is configured.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        let client_id = self.client_id()?;

        let mut url = self.inner.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.inner.scope)
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchanges an authorization code for the caller's identity.
    ///
    /// Posts the code to the token endpoint, then reads the user-info
    /// endpoint with the returned bearer token.
    ///
    /// # Errors
    ///
    /// Returns an external error on transport failures, non-2xx responses or
    /// unexpected payloads.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_IDENTITY)]
    pub async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<ExchangedIdentity> {
        let client_id = self.client_id()?;
        let client_secret = self.inner.client_secret.as_deref().unwrap_or_default();

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self
            .inner
            .http
            .post(self.inner.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE_NAME, "token request failed").with_source(e))?;

        let token: TokenResponse = Self::ensure_success(response, "token exchange")
            .await?
            .json()
            .await
            .map_err(|e| {
                Error::external(SERVICE_NAME, "malformed token response").with_source(e)
            })?;

        let response = self
            .inner
            .http
            .get(self.inner.userinfo_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE_NAME, "user-info request failed").with_source(e))?;

        let user_info: UserInfoResponse = Self::ensure_success(response, "user-info request")
            .await?
            .json()
            .await
            .map_err(|e| {
                Error::external(SERVICE_NAME, "malformed user-info response").with_source(e)
            })?;

        let claims = IdentityClaims::from(user_info);
        if claims.subject.trim().is_empty() {
            return Err(Error::external(SERVICE_NAME, "user-info response has no subject"));
        }

        tracing::info!(
            target: TRACING_TARGET_IDENTITY,
            subject = %claims.subject,
            "Authorization code exchanged"
        );

        Ok(ExchangedIdentity {
            claims,
            access_token: token.access_token,
        })
    }

    fn client_id(&self) -> Result<&str> {
        self.inner
            .client_id
            .as_deref()
            .ok_or_else(|| Error::config("SSO_CLIENT_ID is not configured"))
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::warn!(
            target: TRACING_TARGET_IDENTITY,
            operation,
            status = status.as_u16(),
            "Identity provider returned an error"
        );

        Err(Error::external(
            SERVICE_NAME,
            format!("{operation} failed with status {}", status.as_u16()),
        ))
    }
}

impl fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityProvider")
            .field("configured", &self.is_configured())
            .field("authorize_url", &self.inner.authorize_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::extract::Form;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::ErrorKind;

    pub(crate) const TEST_CODE: &str = "good-code";
    const TEST_ACCESS_TOKEN: &str = "upstream-token";

    async fn token(
        Form(form): Form<std::collections::HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let valid = form.get("grant_type").map(String::as_str) == Some("authorization_code")
            && form.get("code").map(String::as_str) == Some(TEST_CODE)
            && form.get("client_id").map(String::as_str) == Some("portal")
            && form.get("client_secret").map(String::as_str) == Some("shh");

        if valid {
            let body = json!({ "access_token": TEST_ACCESS_TOKEN, "token_type": "Bearer" });
            (StatusCode::OK, Json(body))
        } else {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" })))
        }
    }

    async fn userinfo(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        let bearer = format!("Bearer {TEST_ACCESS_TOKEN}");
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(bearer.as_str()) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }

        let body = json!({
            "data": {
                "cid": 1234567,
                "personal": {
                    "name_first": "Ana",
                    "name_last": "Silva",
                    "name_full": "Ana Silva",
                    "email": "ana@example.org"
                }
            }
        });
        (StatusCode::OK, Json(body))
    }

    /// Starts a fake identity provider and returns a config pointing at it.
    pub(crate) async fn spawn_fake_provider() -> anyhow::Result<IdentityConfig> {
        let router = Router::new()
            .route("/oauth/token", post(token))
            .route("/api/user", get(userinfo));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });

        Ok(IdentityConfig {
            sso_client_id: Some("portal".to_owned()),
            sso_client_secret: Some("shh".to_owned()),
            sso_authorize_url: format!("http://{addr}/oauth/authorize"),
            sso_token_url: format!("http://{addr}/oauth/token"),
            sso_userinfo_url: format!("http://{addr}/api/user"),
            ..IdentityConfig::default()
        })
    }

    #[test]
    fn authorize_url_carries_parameters() -> anyhow::Result<()> {
        let config = IdentityConfig {
            sso_client_id: Some("portal".to_owned()),
            ..IdentityConfig::default()
        };
        let provider = IdentityProvider::from_config(&config)?;
        let url = provider.authorize_url("http://localhost:3000/api/auth/callback", "/events")?;

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("auth.vatsim.net"));
        assert_eq!(pairs["client_id"], "portal");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], "http://localhost:3000/api/auth/callback");
        assert_eq!(pairs["scope"], "full_name email vatsim_details");
        assert_eq!(pairs["state"], "/events");
        Ok(())
    }

    #[test]
    fn authorize_url_requires_client_id() -> anyhow::Result<()> {
        let provider = IdentityProvider::from_config(&IdentityConfig::default())?;
        assert!(!provider.is_configured());

        let error = provider.authorize_url("http://localhost/cb", "/").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        Ok(())
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = IdentityConfig {
            sso_token_url: "not a url".to_owned(),
            ..IdentityConfig::default()
        };
        assert!(IdentityProvider::from_config(&config).is_err());
    }

    #[test]
    fn parses_standard_user_info() {
        let response: UserInfoResponse =
            serde_json::from_str(r#"{"sub":"42","name":"Rui","email":"rui@example.org"}"#).unwrap();
        let claims = IdentityClaims::from(response);
        assert_eq!(claims.subject, "42");
        assert_eq!(claims.name.as_deref(), Some("Rui"));
    }

    #[tokio::test]
    async fn exchanges_code_for_identity() -> anyhow::Result<()> {
        let provider = IdentityProvider::from_config(&spawn_fake_provider().await?)?;
        let identity = provider.exchange(TEST_CODE, "http://localhost/cb").await?;

        assert_eq!(identity.claims.subject, "1234567");
        assert_eq!(identity.claims.name.as_deref(), Some("Ana Silva"));
        assert_eq!(identity.claims.email.as_deref(), Some("ana@example.org"));
        assert_eq!(identity.access_token, TEST_ACCESS_TOKEN);
        assert!(!format!("{identity:?}").contains(TEST_ACCESS_TOKEN));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_code_is_external_error() -> anyhow::Result<()> {
        let provider = IdentityProvider::from_config(&spawn_fake_provider().await?)?;
        let error = provider.exchange("bad-code", "http://localhost/cb").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::External);
        assert!(error.message().contains("400"));
        Ok(())
    }
}
