//! Signing material for session tokens.

mod session_keys;

pub(crate) use session_keys::{SESSION_AUDIENCE, SESSION_ISSUER};
pub use session_keys::{SessionKeys, SessionKeysConfig};
