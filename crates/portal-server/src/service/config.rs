use std::fmt;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use portal_postgres::{PgClient, PgClientMigrationExt, PgConfig};
use serde::{Deserialize, Serialize};

use crate::service::identity::{IdentityConfig, IdentityProvider, RedirectPolicy};
use crate::service::security::{SessionKeys, SessionKeysConfig};
use crate::service::{Error, Result};
use crate::utility::tracing_targets::TRACING_TARGET_STORE;

/// Default values for configuration options.
mod defaults {
    /// Default public base URL for development.
    pub const APP_BASE_URL: &str = "http://localhost:3000";
}

/// Deployment environment.
///
/// Session cookies carry the `Secure` attribute only in production.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Local development over plain HTTP.
    #[default]
    Development,
    /// Public deployment behind TLS.
    Production,
}

impl Environment {
    /// Returns whether this is a production deployment.
    #[inline]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Deployment environment.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Development)
    )]
    #[serde(default)]
    pub app_env: Environment,

    /// Public base URL of the portal.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "APP_BASE_URL", default_value = defaults::APP_BASE_URL)
    )]
    pub app_base_url: String,

    /// Postgres connection and pool settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub postgres: PgConfig,

    /// Session signing settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub session: SessionKeysConfig,

    /// Identity provider client settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub identity: IdentityConfig,
}

impl ServiceConfig {
    /// Creates a development configuration with the given store URL and secret.
    pub fn new(postgres_url: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            app_env: Environment::default(),
            app_base_url: defaults::APP_BASE_URL.to_owned(),
            postgres: PgConfig::new(postgres_url),
            session: SessionKeysConfig::new(session_secret),
            identity: IdentityConfig::default(),
        }
    }

    /// Validates the settings that can be checked without touching the network.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.postgres
            .validate()
            .map_err(|e| Error::config("invalid Postgres configuration").with_source(e))?;
        self.load_session_keys()?;
        self.redirect_policy()?;
        self.identity_provider()?;
        Ok(())
    }

    /// Connects to Postgres database and runs migrations.
    pub async fn connect_postgres(&self) -> Result<PgClient> {
        let pg_client = self.postgres.clone().build().map_err(|e| {
            Error::internal("postgres", "Failed to create database client").with_source(e)
        })?;

        let migrations = pg_client.run_pending_migrations().await.map_err(|e| {
            Error::internal("postgres", "Failed to apply database migrations").with_source(e)
        })?;

        tracing::info!(
            target: TRACING_TARGET_STORE,
            applied = migrations.processed_versions.len(),
            duration = ?migrations.duration,
            "Database ready"
        );

        Ok(pg_client)
    }

    /// Loads the session signing keys.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is missing or too short.
    pub fn load_session_keys(&self) -> Result<SessionKeys> {
        SessionKeys::from_config(&self.session, self.app_env.is_production())
    }

    /// Builds the identity provider client.
    pub fn identity_provider(&self) -> Result<IdentityProvider> {
        IdentityProvider::from_config(&self.identity)
    }

    /// Builds the redirect policy from the public base URL.
    pub fn redirect_policy(&self) -> Result<RedirectPolicy> {
        RedirectPolicy::new(&self.app_base_url)
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("app_env", &self.app_env)
            .field("app_base_url", &self.app_base_url)
            .field("postgres", &self.postgres)
            .field("session", &self.session)
            .field("identity", &self.identity)
            .finish()
    }
}
