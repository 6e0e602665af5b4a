//! Alt text generation for uploaded images.
//!
//! The [`AltTextClient`] sends an image to Gemini and retries rate-limited or
//! failed calls with exponential backoff. The [`server`] module wraps it in a
//! single-page web app.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod server;
pub mod transport;

mod page;

pub use client::{AltTextClient, InferenceResult};
pub use config::{AppConfig, ClientConfig};
pub use error::{InferenceError, TransportError};
pub use payload::{ImagePayload, InferenceRequest};
pub use retry::{RetryPolicy, RetryState};
pub use transport::{HttpTransport, RawResponse, Transport};
