//! Error types for the Zabbix API client.
//!
//! # Design
//! Errors split into two channels. `Configuration` and `Validation` come out
//! of the synchronous half of an operation, before any request exists. Every
//! other variant is produced by the asynchronous half, after the round-trip
//! has started. Remote errors are kept as the raw JSON value the server sent.

use serde_json::Value;

/// Errors returned by `ZabbixClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The client was constructed without a usable server URL.
    #[error("{0}")]
    Configuration(String),

    /// A required argument or envelope field was empty or absent.
    #[error("{field} must be specified")]
    Validation { field: &'static str },

    /// The transport failed before a status code was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with something other than 200.
    #[error("Response statusCode: {status} {body}")]
    HttpStatus { status: u16, body: String },

    /// The response parsed but carried neither a usable `result` nor `error`.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The response carried an `error` member. Passed through untouched.
    #[error("remote error: {0}")]
    Remote(Value),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub(crate) fn missing(field: &'static str) -> Self {
        ApiError::Validation { field }
    }

    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ApiError::Transport(Box::new(err))
    }
}
