//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// Body is larger than the per-object limit
    #[error("Object too large: {size} bytes exceeds limit of {limit} bytes")]
    ObjectTooLarge { size: usize, limit: usize },

    /// Body is empty, nothing worth caching
    #[error("Empty object for key: {0}")]
    EmptyObject(String),
}

// == Request Error Enum ==
/// Reasons a client request line is rejected.
///
/// Each variant maps to one validation step; a rejected request gets no
/// response, the connection is simply closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Client closed the connection before sending a request line
    #[error("Connection closed before a request line was received")]
    Empty,

    /// Request line has fewer than two tokens
    #[error("Not enough arguments in request line")]
    TooFewTokens,

    /// Version token does not start with `HTTP/`
    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    /// Method other than GET
    #[error("Not a GET request: {0}")]
    UnsupportedMethod(String),

    /// Target does not start with `http://`
    #[error("Not an http:// target: {0}")]
    UnsupportedScheme(String),

    /// No `/` after the host portion
    #[error("No path found in target: {0}")]
    MissingPath(String),

    /// Empty host portion
    #[error("No host found in target: {0}")]
    MissingHost(String),

    /// Port suffix is not a number in [0, 65535]
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Request line exceeded the line limit or was not valid UTF-8
    #[error("Malformed request line")]
    Malformed,
}

// == Proxy Error Enum ==
/// Unified error type for one proxied connection.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The request line was rejected
    #[error("Error parsing request: {0}")]
    Request(#[from] RequestError),

    /// The origin server could not be reached
    #[error("Error connecting to {host}:{port}: {source}")]
    UpstreamConnect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Socket I/O failed mid-exchange
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the caching proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
