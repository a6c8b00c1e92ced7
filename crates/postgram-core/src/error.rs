// SPDX-License-Identifier: Apache-2.0

//! Error types for postgram operations.
//!
//! The Graph API reports failures through a JSON envelope
//! (`{"error": {"code": ..., "error_subcode": ..., ...}}`) regardless of HTTP
//! status. [`ErrorEnvelope`] decodes that envelope at the transport boundary
//! and [`classify`] maps code/subcode pairs onto [`PostgramError`], so only
//! typed errors flow past the HTTP layer.
//!
//! Classification is driven by the numeric `code` alone; `error_subcode`
//! only participates in the rate-limit rules. Media failures are never
//! derived from envelope codes - they are raised locally when a response is
//! missing an expected id or a container never becomes publishable.

use serde::Deserialize;
use thiserror::Error;

/// Codes reported for an invalid or expired access token.
const AUTH_CODES: [i64; 2] = [190, 104];

/// Codes reported for a missing permission or unapproved scope.
const PERMISSION_CODES: [i64; 3] = [200, 10, 803];

/// Codes reported for request throttling.
const RATE_LIMIT_CODES: [i64; 4] = [4, 17, 32, 613];

/// Subcode for the application-level request limit.
pub const APP_REQUEST_LIMIT_SUBCODE: i64 = 2_207_051;

/// Codes reported for transient server-side failures.
const TEMPORARY_CODES: [i64; 2] = [1, 2];

/// Retry window when the API gives no better hint (seconds).
const DEFAULT_RETRY_SECS: u64 = 300;

/// Retry window for the application request limit (seconds).
const APP_REQUEST_LIMIT_RETRY_SECS: u64 = 900;

/// Diagnostic fields carried by classified Graph API errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    /// Error message reported by the API.
    pub message: String,
    /// Graph API error code.
    pub code: Option<i64>,
    /// Graph API error subcode.
    pub subcode: Option<i64>,
    /// Trace id for support escalation.
    pub fbtrace_id: Option<String>,
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        let mut parts = Vec::new();
        if let Some(code) = self.code {
            parts.push(format!("Code: {code}"));
        }
        if let Some(subcode) = self.subcode {
            parts.push(format!("Subcode: {subcode}"));
        }
        if let Some(trace) = &self.fbtrace_id {
            parts.push(format!("Trace ID: {trace}"));
        }
        if !parts.is_empty() {
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Errors that can occur during postgram operations.
#[derive(Error, Debug)]
pub enum PostgramError {
    /// Access token is invalid or expired.
    #[error("Authentication failed: {0}")]
    Authentication(ErrorDetails),

    /// The token is missing a permission required for publishing.
    #[error("Permission denied: {0}")]
    Permission(ErrorDetails),

    /// The API throttled the request.
    #[error("Rate limited, retry after {retry_seconds}s: {details}")]
    RateLimited {
        /// Seconds to wait before the next attempt.
        retry_seconds: u64,
        /// Diagnostic fields from the error envelope.
        details: ErrorDetails,
    },

    /// Media could not be created or published (bad asset, missing id,
    /// failed container processing).
    #[error("Media error: {0}")]
    Media(ErrorDetails),

    /// Transient server-side failure reported by the API.
    #[error("Temporary Graph API error: {0}")]
    TemporaryServer(ErrorDetails),

    /// Any other Graph API failure, including unparseable error payloads.
    #[error("Graph API error: {0}")]
    Api(ErrorDetails),

    /// Configuration error (missing token, bad user id, unreadable file).
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Network error from the HTTP layer.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PostgramError {
    /// Builds a media error from a local message, with no envelope fields.
    pub(crate) fn media(message: impl Into<String>) -> Self {
        Self::Media(ErrorDetails {
            message: message.into(),
            ..ErrorDetails::default()
        })
    }

    /// Builds a generic API error from a local message.
    pub(crate) fn api(message: impl Into<String>) -> Self {
        Self::Api(ErrorDetails {
            message: message.into(),
            ..ErrorDetails::default()
        })
    }

    /// Returns the retry window if this is a rate-limit error.
    #[must_use]
    pub fn retry_seconds(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_seconds, .. } => Some(*retry_seconds),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for PostgramError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

/// Classification buckets for Graph API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or expired token.
    Authentication,
    /// Missing permission or scope.
    Permission,
    /// Request throttled.
    RateLimit,
    /// Media processing failure. Never produced by [`classify`]; raised
    /// locally when a response is missing an id or a container fails.
    Media,
    /// Transient server failure.
    TemporaryServer,
    /// Everything else.
    Generic,
}

/// Maps a Graph API code/subcode pair onto an error kind.
///
/// Rate-limit codes only classify as `RateLimit` when the subcode is absent
/// or is the application request limit; a rate-limit code with any other
/// subcode is `Generic`. A missing code is always `Generic`.
#[must_use]
pub fn classify(code: Option<i64>, subcode: Option<i64>) -> ErrorKind {
    let Some(code) = code else {
        return ErrorKind::Generic;
    };
    if AUTH_CODES.contains(&code) {
        ErrorKind::Authentication
    } else if PERMISSION_CODES.contains(&code) {
        ErrorKind::Permission
    } else if RATE_LIMIT_CODES.contains(&code)
        && subcode.is_none_or(|s| s == APP_REQUEST_LIMIT_SUBCODE)
    {
        ErrorKind::RateLimit
    } else if TEMPORARY_CODES.contains(&code) {
        ErrorKind::TemporaryServer
    } else {
        ErrorKind::Generic
    }
}

/// Returns the recommended wait before retrying a rate-limited call.
///
/// Defaults to 300 seconds; the application request limit subcode carries a
/// longer 900 second window; an explicit `"<N> minutes"` hint in the error
/// message overrides both.
#[must_use]
pub fn recommended_retry_secs(subcode: Option<i64>, message: &str) -> u64 {
    let mut retry = if subcode == Some(APP_REQUEST_LIMIT_SUBCODE) {
        APP_REQUEST_LIMIT_RETRY_SECS
    } else {
        DEFAULT_RETRY_SECS
    };
    if let Ok(re) = regex::Regex::new(r"(?i)(\d+)\s*minutes?")
        && let Some(caps) = re.captures(message)
        && let Some(minutes) = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok())
    {
        retry = minutes * 60;
    }
    retry
}

/// Wire form of the Graph API error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    /// The inner error object.
    pub error: ErrorBody,
}

/// Inner error object of the Graph API envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Numeric error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Numeric error subcode.
    #[serde(default)]
    pub error_subcode: Option<i64>,
    /// Trace id for support escalation.
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

impl ErrorEnvelope {
    /// Converts the decoded envelope into the matching typed error.
    #[must_use]
    pub fn into_error(self) -> PostgramError {
        let details = ErrorDetails {
            message: self.error.message,
            code: self.error.code,
            subcode: self.error.error_subcode,
            fbtrace_id: self.error.fbtrace_id,
        };
        match classify(details.code, details.subcode) {
            ErrorKind::Authentication => PostgramError::Authentication(details),
            ErrorKind::Permission => PostgramError::Permission(details),
            ErrorKind::RateLimit => PostgramError::RateLimited {
                retry_seconds: recommended_retry_secs(details.subcode, &details.message),
                details,
            },
            ErrorKind::Media => PostgramError::Media(details),
            ErrorKind::TemporaryServer => PostgramError::TemporaryServer(details),
            ErrorKind::Generic => PostgramError::Api(details),
        }
    }
}
