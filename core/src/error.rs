//! The single error value returned by every client operation.
//!
//! # Design
//! Transport failures, API error envelopes, undecodable responses and
//! unencodable parameters all surface as one `Error` struct. `kind` tells
//! them apart; `code` and `message` are always populated so callers can
//! present `message` without further checks.

use std::fmt;

use thiserror::Error;

use crate::http::TransportError;
use crate::params::EncodingError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Category of an unsuccessful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The exchange failed before an HTTP status was received.
    Transport,
    /// The API answered with a well-formed error envelope.
    Api,
    /// The body was not JSON, or a non-2xx body lacked the error fields.
    MalformedResponse,
    /// A 2xx JSON body did not fit the requested target shape.
    Decode,
    /// Request parameters could not be serialized.
    Encoding,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Api => "api",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Decode => "decode",
            ErrorKind::Encoding => "encoding",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error ({code}): {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Documentation link supplied by the API alongside its error code.
    pub location: Option<String>,
    /// Raw response body, kept for malformed responses.
    pub body: Option<String>,
}

impl Error {
    fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            status: None,
            location: None,
            body: None,
        }
    }

    /// Error envelope returned by the API. An empty message is replaced with
    /// a generic one mentioning the status.
    pub fn api(status: u16, code: impl Into<String>, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("the API returned HTTP {status} without a message"));
        Self {
            status: Some(status),
            ..Self::new(ErrorKind::Api, code, message)
        }
    }

    pub fn malformed(status: u16, body: &str, detail: impl fmt::Display) -> Self {
        Self {
            status: Some(status),
            body: Some(body.to_string()),
            ..Self::new(
                ErrorKind::MalformedResponse,
                "malformed_response",
                format!("unexpected HTTP {status} response: {detail}"),
            )
        }
    }

    pub fn decode(status: u16, detail: impl fmt::Display) -> Self {
        Self {
            status: Some(status),
            ..Self::new(
                ErrorKind::Decode,
                "decode_error",
                format!("could not decode response: {detail}"),
            )
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    /// The API reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::Api && self.code == "not_found"
    }

    pub fn is_authentication_failure(&self) -> bool {
        self.kind == ErrorKind::Api && self.code == "authentication_failure"
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        let message = if err.message.is_empty() {
            format!("transport failure ({})", err.kind.code())
        } else {
            err.message
        };
        Self::new(ErrorKind::Transport, err.kind.code(), message)
    }
}

impl From<EncodingError> for Error {
    fn from(err: EncodingError) -> Self {
        Self::new(ErrorKind::Encoding, "encoding_error", err.to_string())
    }
}
