//! Timeout and bounded retry for store calls
//!
//! Each call gets its own deadline. Calls failing with a transient kind
//! (`Timeout`, `Unavailable`) are retried with exponential backoff; every
//! other kind is returned on the first failure.

use arborist_core::config::RetrySettings;
use arborist_core::errors::{ExError, ExErrorKind};
use arborist_core::model::{Attributes, Entity, EntityReference};
use arborist_core::store_client::{BatchCommit, DocumentStore, StoreResult};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Resolved retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub call_timeout: Duration,
    /// Total attempts per call, the first one included
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// One attempt, no backoff
    pub fn no_retry(call_timeout: Duration) -> Self {
        Self {
            call_timeout,
            attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): doubles from
    /// `initial_backoff`, capped at `max_backoff`
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            call_timeout: Duration::from_millis(settings.call_timeout_ms),
            attempts: settings.attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

/// Run `call` under the policy's deadline, retrying transient failures
///
/// A call that misses its deadline fails with `ExErrorKind::Timeout`.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error.
pub async fn with_retry<T, F, Fut>(op: &str, policy: &RetryPolicy, mut call: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let max_attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = match tokio::time::timeout(policy.call_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(ExError::new(ExErrorKind::Timeout)
                .with_op(op)
                .with_message(format!(
                    "no response within {} ms",
                    policy.call_timeout.as_millis()
                ))),
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(op, attempt, "store call succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff_for(attempt);
                tracing::warn!(
                    op,
                    error = %error,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "transient store failure, will retry after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if attempt > 1 {
                    tracing::warn!(op, error = %error, attempts = attempt, "store call failed after all retry attempts");
                }
                return Err(error);
            }
        }
    }
}

/// `DocumentStore` decorator applying a `RetryPolicy` to every call
pub struct RetryingStore<'a, S: ?Sized> {
    inner: &'a S,
    policy: RetryPolicy,
}

impl<'a, S: DocumentStore + ?Sized> RetryingStore<'a, S> {
    pub fn new(inner: &'a S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<'a, S: DocumentStore + ?Sized> DocumentStore for RetryingStore<'a, S> {
    async fn check_access(&self) -> StoreResult<()> {
        with_retry("check_access", &self.policy, || self.inner.check_access()).await
    }

    async fn list_top_level(&self, collection: &str) -> StoreResult<Vec<Entity>> {
        with_retry("list_top_level", &self.policy, || {
            self.inner.list_top_level(collection)
        })
        .await
    }

    async fn list_child_collections(&self, path: &EntityReference) -> StoreResult<Vec<String>> {
        with_retry("list_child_collections", &self.policy, || {
            self.inner.list_child_collections(path)
        })
        .await
    }

    async fn list_documents(
        &self,
        path: &EntityReference,
        collection: &str,
    ) -> StoreResult<Vec<Entity>> {
        with_retry("list_documents", &self.policy, || {
            self.inner.list_documents(path, collection)
        })
        .await
    }

    async fn delete_batch(&self, paths: &[EntityReference]) -> StoreResult<BatchCommit> {
        with_retry("delete_batch", &self.policy, || self.inner.delete_batch(paths)).await
    }

    async fn get_by_id(&self, path: &EntityReference) -> StoreResult<Option<Attributes>> {
        with_retry("get_by_id", &self.policy, || self.inner.get_by_id(path)).await
    }
}
