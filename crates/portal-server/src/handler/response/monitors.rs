use serde::{Deserialize, Serialize};

/// Liveness response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
}

impl HealthResponse {
    /// Creates the healthy response.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_owned(),
        }
    }
}
