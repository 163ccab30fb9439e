//! Unified error type.

use std::fmt;
use std::net::AddrParseError;

/// The error type returned by the server's fallible operations.
///
/// Middleware and handlers have no error channel of their own: they answer
/// with a status on the [`ResponseWriter`](crate::ResponseWriter), and a
/// panic propagates untouched. This type only surfaces infrastructure
/// failures: parsing or binding an address, accepting a connection.
#[derive(Debug)]
pub enum Error {
    Addr(AddrParseError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addr(e) => write!(f, "invalid socket address: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Addr(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<AddrParseError> for Error {
    fn from(e: AddrParseError) -> Self {
        Self::Addr(e)
    }
}
