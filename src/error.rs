//! Error types.
//!
//! `SeriesError` is the library-facing failure taxonomy of the EIA client.
//! `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Why a single upstream attempt failed in a way that may succeed if repeated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientFailure {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("upstream returned HTTP {status}")]
    ServerStatus { status: u16, body: String },
    #[error("malformed response body: {0}")]
    Malformed(String),
}

impl TransientFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Failures surfaced by [`crate::data::SeriesClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    /// Missing or invalid client configuration (e.g. no API key).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The series name is not a key of the static registry.
    #[error("unknown series '{0}' (run `eia list` to see available series)")]
    UnknownSeries(String),

    /// Timeouts, connection failures or 5xx replies that outlasted the retry budget.
    #[error("EIA request failed after {attempts} attempt(s): {failure}")]
    RetryableTransport { attempts: u32, failure: TransientFailure },

    /// The upstream rejected the request with a 4xx status. Never retried.
    ///
    /// `message` is the decoded upstream error text; `body` is the raw reply.
    #[error("EIA rejected the request (HTTP {status}): {message}")]
    InvalidRequest {
        status: u16,
        message: String,
        body: String,
    },
}

impl SeriesError {
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }

    /// Process exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) | Self::UnknownSeries(_) => 2,
            Self::InvalidRequest { .. } => 3,
            Self::RetryableTransport { .. } => 4,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SeriesError> for AppError {
    fn from(err: SeriesError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}
