//! Error types for the Troia client.
//!
//! # Design
//! The client performs no recovery, so every variant is something the caller
//! sees unchanged: a transport failure from the network layer, or a body that
//! does not parse into an envelope. Application-level failures reported by
//! the service (unknown job, bad parameters) are not errors here; they arrive
//! in the envelope's `status` field.

use thiserror::Error;

/// Errors returned by `TroiaClient` operations and envelope construction.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, or the configured timeout elapsed.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The response body is not valid JSON.
    #[error("response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The response body is JSON, but not an object.
    #[error("response is JSON {0}, expected an object")]
    NotAnObject(&'static str),

    /// A request payload could not be encoded.
    #[error("failed to encode request payload: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Client configuration could not be read.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// True for failures that happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// True when a response arrived but could not be turned into an envelope.
    pub fn is_parse(&self) -> bool {
        matches!(self, ApiError::Parse(_) | ApiError::NotAnObject(_))
    }
}
