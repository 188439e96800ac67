use std::io;
use std::net::SocketAddr;

use thiserror::Error;

pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Why the HTTP server could not start or stopped abnormally.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid server configuration: {0}")]
    Config(String),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[source] io::Error),
}

impl ServerError {
    /// Operator hint for the common causes of a failure.
    pub fn hint(&self) -> Option<&'static str> {
        let source = match self {
            Self::Config(_) => return Some("run with --help to see every setting"),
            Self::Bind { source, .. } | Self::Serve(source) => source,
        };

        match source.kind() {
            io::ErrorKind::AddrInUse => Some("another process already uses this port"),
            io::ErrorKind::AddrNotAvailable => Some("HOST is not an address of this machine"),
            io::ErrorKind::PermissionDenied => Some("pick a port from 1024 up"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_in_use_has_hint() {
        let error = ServerError::Bind {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };

        assert_eq!(error.hint(), Some("another process already uses this port"));
        assert!(error.to_string().starts_with("cannot listen on 127.0.0.1:3000"));
    }

    #[test]
    fn unknown_io_failure_has_no_hint() {
        assert!(ServerError::Serve(io::Error::other("boom")).hint().is_none());
    }
}
