//! Error types for the inference client.

use thiserror::Error;

/// A failed network call, before any HTTP status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// reqwest failed after connecting (reset, timeout, body read, ...).
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The endpoint could not be reached at all.
    #[error("connection failed: {0}")]
    Connection(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Request(err)
        }
    }
}

impl TransportError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }
}

/// Terminal outcome of a failed `infer` call.
///
/// Rate limiting, transport failures and other non-success statuses are
/// retried internally; callers only ever see the failure of the last attempt.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Every attempt in the budget ended with HTTP 429 on the final try.
    #[error("rate limited after {attempts} attempts")]
    RateLimitExhausted {
        /// Number of calls issued.
        attempts: u32,
    },

    /// The final attempt failed at the transport level.
    #[error("transport failure after {attempts} attempts: {source}")]
    TransportFailureExhausted {
        /// Number of calls issued.
        attempts: u32,
        /// Error from the final attempt.
        #[source]
        source: TransportError,
    },

    /// The final attempt returned a non-success status other than 429.
    #[error("inference endpoint returned {status}: {body}")]
    NonSuccessStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The retry loop ended without issuing any call.
    #[error("retries exhausted without a response")]
    NoResponseObtained,

    /// The endpoint answered successfully but produced no text.
    #[error("no description produced")]
    NoDescriptionProduced,

    /// The success body was not JSON.
    #[error("malformed response body: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// The caller cancelled the call.
    #[error("request cancelled")]
    Cancelled,
}

impl InferenceError {
    /// Whether this error came out of the shared retry budget.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExhausted { .. }
                | Self::TransportFailureExhausted { .. }
                | Self::NonSuccessStatus { .. }
                | Self::NoResponseObtained
        )
    }

    /// Status message suitable for showing to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimitExhausted { .. } => {
                "The service is busy right now. Please try again in a minute."
            }
            Self::TransportFailureExhausted { .. } => {
                "Could not reach the description service. Check your connection and try again."
            }
            Self::NonSuccessStatus { .. } => {
                "The description service rejected the image. Try a different file."
            }
            Self::NoResponseObtained => {
                "No response from the description service. Please try again."
            }
            Self::NoDescriptionProduced => "No description could be generated for this image.",
            Self::MalformedResponse(_) => "The description service sent an unreadable response.",
            Self::Cancelled => "The request was cancelled.",
        }
    }
}
