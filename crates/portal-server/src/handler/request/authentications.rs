use serde::{Deserialize, Serialize};

/// Query of the login endpoint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginQuery {
    /// Where to land after signing in; sanitized before use.
    pub callback_url: Option<String>,
}

/// Query of the logout endpoint.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutQuery {
    /// Where to land after signing out; sanitized before use.
    pub callback_url: Option<String>,
}

/// Query the identity provider sends back to the callback endpoint.
#[derive(Default, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code.
    pub code: Option<String>,
    /// Destination passed through the provider.
    pub state: Option<String>,
    /// Provider error code.
    pub error: Option<String>,
    /// Human-readable provider error.
    pub error_description: Option<String>,
}

impl std::fmt::Debug for CallbackQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackQuery")
            .field("code", &self.code.as_ref().map(|_| "***"))
            .field("state", &self.state)
            .field("error", &self.error)
            .field("error_description", &self.error_description)
            .finish()
    }
}
