//! Exponential-backoff wrapper around a [`JsonTransport`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, warn};

use super::transport::{AttemptError, JsonTransport};

/// Backoff schedule: `base_delay * 2^attempt_index` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Build a policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the failed attempt at `attempt_index` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        2u32.checked_pow(attempt_index)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Failure of a whole retried call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// Every attempt failed with a retryable error.
    #[error("API request failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptError },
    /// The upstream body could not be decoded; not retried.
    #[error("API request returned an unreadable body: {0}")]
    Decode(String),
}

/// Issues a POST, retrying transient failures with exponential backoff.
#[derive(Clone)]
pub struct RetryingCaller {
    transport: Arc<dyn JsonTransport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryingCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingCaller")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryingCaller {
    #[must_use]
    pub fn new(transport: Arc<dyn JsonTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// POST `payload` to `url` and return the JSON body of the first success.
    ///
    /// The wait between attempts is a tokio sleep, so only the calling task
    /// is suspended. No wait follows the final attempt.
    pub async fn call(&self, url: &str, payload: &Value) -> Result<Value, CallError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            let err = match self.transport.post_json(url, payload).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if !err.is_retryable() {
                error!(attempt = attempt + 1, error = %err, "Upstream body could not be decoded");
                return Err(CallError::Decode(err.to_string()));
            }

            attempt += 1;
            if attempt >= max_attempts {
                error!(attempts = max_attempts, error = %err, "Upstream retries exhausted");
                return Err(CallError::Exhausted {
                    attempts: max_attempts,
                    last: err,
                });
            }

            let delay = self.policy.delay_for(attempt - 1);
            warn!(
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Upstream attempt failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted outcomes and records when each attempt happened.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<Value, AttemptError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<Value, AttemptError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl JsonTransport for ScriptedTransport {
        async fn post_json(&self, _url: &str, _payload: &Value) -> Result<Value, AttemptError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AttemptError::Status(500)))
        }
    }

    fn caller(transport: &Arc<ScriptedTransport>) -> RetryingCaller {
        RetryingCaller::new(
            Arc::clone(transport) as Arc<dyn JsonTransport>,
            RetryPolicy::default(),
        )
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let transport = ScriptedTransport::new(vec![
            Err(AttemptError::Status(503)),
            Err(AttemptError::Network("connection reset".into())),
            Ok(json!({"ok": true})),
        ]);

        let body = caller(&transport)
            .call("http://upstream.test", &json!({}))
            .await
            .expect("third attempt succeeds");
        assert_eq!(body, json!({"ok": true}));

        let times = transport.call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(1000));
        assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_gives_up_after_max_attempts() {
        let transport = ScriptedTransport::new(vec![]);
        let start = Instant::now();

        let err = caller(&transport)
            .call("http://upstream.test", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(transport.call_times().len(), 3);
        assert_eq!(
            err,
            CallError::Exhausted {
                attempts: 3,
                last: AttemptError::Status(500)
            }
        );
        assert_eq!(
            err.to_string(),
            "API request failed after 3 attempts: HTTP error! status: 500"
        );
        // 1s + 2s of backoff, nothing after the last attempt.
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(AttemptError::Decode("eof".into()))]);

        let err = caller(&transport)
            .call("http://upstream.test", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(transport.call_times().len(), 1);
        assert!(matches!(err, CallError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_makes_one_call() {
        let transport = ScriptedTransport::new(vec![Ok(json!([1, 2, 3]))]);
        let body = caller(&transport)
            .call("http://upstream.test", &json!({"q": 1}))
            .await
            .unwrap();
        assert_eq!(body, json!([1, 2, 3]));
        assert_eq!(transport.call_times().len(), 1);
    }
}
