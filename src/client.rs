//! Resilient inference client.
//!
//! One [`AltTextClient::infer`] call issues strictly sequential attempts. HTTP
//! 429, other non-success statuses and transport failures all draw from the
//! same attempt budget and the same doubling delay; only the failure of the
//! final attempt reaches the caller.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{InferenceError, TransportError};
use crate::payload::{extract_description, ImagePayload, InferenceRequest};
use crate::transport::{HttpTransport, Transport};

/// Description text, or the terminal failure of the call.
pub type InferenceResult = Result<String, InferenceError>;

/// Outcome of the final attempt when the budget runs out.
enum LastFailure {
    RateLimited,
    Status { status: u16, body: String },
    Transport(TransportError),
}

/// Generates alt text for images through a [`Transport`].
#[derive(Debug, Clone)]
pub struct AltTextClient<T = HttpTransport> {
    transport: T,
    config: ClientConfig,
}

impl AltTextClient<HttpTransport> {
    /// Client talking to the configured Gemini endpoint over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { transport, config })
    }
}

impl<T: Transport> AltTextClient<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Describe an image, retrying transient failures.
    pub async fn infer(&self, payload: &ImagePayload) -> InferenceResult {
        self.infer_with_cancellation(payload, &CancellationToken::new())
            .await
    }

    /// Like [`infer`](Self::infer), but gives up with
    /// [`InferenceError::Cancelled`] as soon as `cancel` fires, whether a call
    /// is in flight or a backoff delay is pending.
    pub async fn infer_with_cancellation(
        &self,
        payload: &ImagePayload,
        cancel: &CancellationToken,
    ) -> InferenceResult {
        let request = InferenceRequest::new(self.config.prompt.as_str(), payload);
        let mut state = self.config.retry.start();
        let mut last_failure = None;

        while state.has_budget() {
            debug!(
                attempt = state.attempt() + 1,
                max_attempts = self.config.retry.max_attempts,
                mime_type = payload.mime_type(),
                "Requesting description"
            );

            let failure = match cancellable(cancel, self.transport.send(&request)).await? {
                Ok(response) if response.is_success() => {
                    return self.parse(&response.body, state.attempt() + 1);
                }
                Ok(response) if response.is_rate_limited() => LastFailure::RateLimited,
                Ok(response) => LastFailure::Status {
                    status: response.status,
                    body: response.body,
                },
                Err(err) => LastFailure::Transport(err),
            };

            let wait = state.record_failure();
            match &failure {
                LastFailure::RateLimited => {
                    warn!(attempt = state.attempt(), "Rate limited by inference endpoint")
                }
                LastFailure::Status { status, .. } => {
                    warn!(attempt = state.attempt(), status, "Inference request failed")
                }
                LastFailure::Transport(err) => {
                    warn!(attempt = state.attempt(), error = %err, "Inference transport error")
                }
            }
            last_failure = Some(failure);

            if let Some(wait) = wait {
                debug!(wait_ms = wait.as_millis() as u64, "Waiting before retry");
                cancellable(cancel, tokio::time::sleep(wait)).await?;
            }
        }

        let attempts = state.attempt();
        let err = match last_failure {
            None => InferenceError::NoResponseObtained,
            Some(LastFailure::RateLimited) => InferenceError::RateLimitExhausted { attempts },
            Some(LastFailure::Status { status, body }) => {
                InferenceError::NonSuccessStatus { status, body }
            }
            Some(LastFailure::Transport(source)) => {
                InferenceError::TransportFailureExhausted { attempts, source }
            }
        };
        warn!(attempts, error = %err, "Retries exhausted");
        Err(err)
    }

    fn parse(&self, body: &str, attempts: u32) -> InferenceResult {
        let value: serde_json::Value = serde_json::from_str(body)?;
        match extract_description(&value) {
            Some(description) => {
                info!(attempts, chars = description.len(), "Description generated");
                Ok(description)
            }
            None => {
                warn!(attempts, "Endpoint returned no description text");
                Err(InferenceError::NoDescriptionProduced)
            }
        }
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, InferenceError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Inference cancelled");
            Err(InferenceError::Cancelled)
        }
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::transport::RawResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    const SUCCESS: &str =
        r#"{"candidates":[{"content":{"parts":[{"text":"A cat asleep on a keyboard."}]}}]}"#;

    type Scripted = Result<RawResponse, TransportError>;

    /// Replays a fixed script and records when each call happened.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        script: Arc<Mutex<VecDeque<Scripted>>>,
        calls: Arc<Mutex<Vec<Instant>>>,
    }

    impl ScriptedTransport {
        fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into_iter().collect())),
                calls: Arc::default(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &InferenceRequest) -> Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::new(429, "")))
        }
    }

    fn ok(body: &str) -> Scripted {
        Ok(RawResponse::new(200, body))
    }

    fn status(code: u16) -> Scripted {
        Ok(RawResponse::new(code, "{}"))
    }

    fn reset() -> Scripted {
        Err(TransportError::connection("connection reset by peer"))
    }

    fn client(transport: &ScriptedTransport) -> AltTextClient<ScriptedTransport> {
        AltTextClient::with_transport(transport.clone(), ClientConfig::new("test-key"))
    }

    fn payload() -> ImagePayload {
        ImagePayload::new("aGVsbG8=", "image/png")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let transport = ScriptedTransport::new([ok(SUCCESS)]);
        let result = client(&transport).infer(&payload()).await;

        assert_eq!(result.unwrap(), "A cat asleep on a keyboard.");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_success() {
        for k in 0..5 {
            let script = (0..k).map(|_| status(429)).chain([ok(SUCCESS)]);
            let transport = ScriptedTransport::new(script);
            let result = client(&transport).infer(&payload()).await;

            assert_eq!(result.unwrap(), "A cat asleep on a keyboard.");
            assert_eq!(transport.call_count(), k + 1);

            let expected: Vec<_> = [1000, 2000, 4000, 8000][..k]
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect();
            assert_eq!(transport.gaps(), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausted() {
        let transport = ScriptedTransport::new((0..6).map(|_| status(429)));
        let started = Instant::now();
        let err = client(&transport).infer(&payload()).await.unwrap_err();

        assert!(matches!(err, InferenceError::RateLimitExhausted { attempts: 5 }));
        assert_eq!(transport.call_count(), 5);
        // no pointless wait after the final attempt
        assert_eq!(started.elapsed(), Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_then_success() {
        let transport = ScriptedTransport::new([reset(), ok(SUCCESS)]);
        let result = client(&transport).infer(&payload()).await;

        assert_eq!(result.unwrap(), "A cat asleep on a keyboard.");
        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.gaps(), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_exhausted() {
        let transport = ScriptedTransport::new((0..5).map(|_| reset()));
        let err = client(&transport).infer(&payload()).await.unwrap_err();

        assert!(matches!(
            err,
            InferenceError::TransportFailureExhausted { attempts: 5, .. }
        ));
        assert_eq!(transport.call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_success_status_shares_backoff() {
        let transport = ScriptedTransport::new([status(500), status(503), ok(SUCCESS)]);
        let result = client(&transport).infer(&payload()).await;

        assert!(result.is_ok());
        assert_eq!(
            transport.gaps(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_success_status_exhausted() {
        let transport = ScriptedTransport::new((0..5).map(|_| {
            Ok(RawResponse::new(400, r#"{"error":{"message":"bad image"}}"#))
        }));
        let err = client(&transport).infer(&payload()).await.unwrap_err();

        match err {
            InferenceError::NonSuccessStatus { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("bad image"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_failures_share_one_budget() {
        let transport =
            ScriptedTransport::new([status(429), reset(), status(502), status(429), reset()]);
        let err = client(&transport).infer(&payload()).await.unwrap_err();

        // classified by the final attempt
        assert!(matches!(
            err,
            InferenceError::TransportFailureExhausted { attempts: 5, .. }
        ));
        assert_eq!(transport.call_count(), 5);
        assert_eq!(
            transport.gaps(),
            [1000, 2000, 4000, 8000]
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_description_is_not_retried() {
        let transport = ScriptedTransport::new([
            ok(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#),
            ok(SUCCESS),
        ]);
        let err = client(&transport).infer(&payload()).await.unwrap_err();

        assert!(matches!(err, InferenceError::NoDescriptionProduced));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_candidates() {
        let transport = ScriptedTransport::new([ok(r#"{"promptFeedback":{}}"#)]);
        let err = client(&transport).infer(&payload()).await.unwrap_err();
        assert!(matches!(err, InferenceError::NoDescriptionProduced));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body() {
        let transport = ScriptedTransport::new([ok("<html>oops</html>")]);
        let err = client(&transport).infer(&payload()).await.unwrap_err();

        assert!(matches!(err, InferenceError::MalformedResponse(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_makes_no_call() {
        let transport = ScriptedTransport::new([ok(SUCCESS)]);
        let config = ClientConfig::new("k").with_retry(RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        });
        let err = AltTextClient::with_transport(transport.clone(), config)
            .infer(&payload())
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::NoResponseObtained));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = ScriptedTransport::new([status(429), ok(SUCCESS)]);
        let client = client(&transport);
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                cancel.cancel();
            }
        };
        let payload = payload();
        let (result, ()) =
            tokio::join!(client.infer_with_cancellation(&payload, &cancel), canceller);

        assert!(matches!(result, Err(InferenceError::Cancelled)));
        assert_eq!(transport.call_count(), 1);
    }

    /// Never answers, so the call stays in flight until dropped.
    #[derive(Clone, Default)]
    struct HangingTransport {
        calls: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(&self, _request: &InferenceRequest) -> Result<RawResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_request_in_flight() {
        let transport = HangingTransport::default();
        let client = AltTextClient::with_transport(transport.clone(), ClientConfig::new("k"));
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                cancel.cancel();
            }
        };
        let payload = payload();
        let started = Instant::now();
        let (result, ()) =
            tokio::join!(client.infer_with_cancellation(&payload, &cancel), canceller);

        assert!(matches!(result, Err(InferenceError::Cancelled)));
        assert_eq!(*transport.calls.lock().unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let transport = ScriptedTransport::new([ok(SUCCESS)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client(&transport)
            .infer_with_cancellation(&payload(), &cancel)
            .await;

        assert!(matches!(result, Err(InferenceError::Cancelled)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_payloads_identical_outcomes() {
        let transport = ScriptedTransport::new([ok(SUCCESS), ok(SUCCESS)]);
        let client = client(&transport);

        let first = client.infer(&payload()).await.unwrap();
        let second = client.infer(&payload()).await.unwrap();
        assert_eq!(first, second);
    }
}
