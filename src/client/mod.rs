mod http;
#[cfg(test)]
pub mod testing;

use crate::core::error::MaintenanceError;
use crate::core::models::{MaintenanceState, ToggleEnvelope, ToggleRequest};
use crate::core::retry::RetryPolicy;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub use http::HttpTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRequest {
    FetchStatus,
    Toggle(ToggleRequest),
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One network exchange with the maintenance endpoints. Connection-level
/// failures are reported as [`MaintenanceError::Network`]; HTTP statuses are
/// returned untouched for the client to classify.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest)
        -> Result<TransportResponse, MaintenanceError>;
}

pub struct RemoteClient {
    transport: Arc<dyn Transport>,
    fetch_policy: RetryPolicy,
    toggle_policy: RetryPolicy,
}

impl RemoteClient {
    #[allow(dead_code)]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_policies(transport, RetryPolicy::fetch(), RetryPolicy::toggle())
    }

    pub fn with_policies(
        transport: Arc<dyn Transport>,
        fetch_policy: RetryPolicy,
        toggle_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            fetch_policy,
            toggle_policy,
        }
    }

    pub async fn fetch_status(&self) -> Result<MaintenanceState, MaintenanceError> {
        let transport = &self.transport;
        with_retry("fetch_status", &self.fetch_policy, move || async move {
            let response = transport.send(&TransportRequest::FetchStatus).await?;

            if !response.is_success() {
                return Err(MaintenanceError::from_status(
                    response.status,
                    response.body,
                    None,
                ));
            }

            let value: Value = serde_json::from_str(&response.body).map_err(|e| {
                MaintenanceError::Validation(format!("status response is not JSON: {e}"))
            })?;
            MaintenanceState::from_value(value)
        })
        .await
    }

    /// Sends a toggle. The request is validated before anything goes out on
    /// the wire.
    pub async fn toggle_status(
        &self,
        request: &ToggleRequest,
    ) -> Result<MaintenanceState, MaintenanceError> {
        request.validate()?;

        let transport = &self.transport;
        let wire = &TransportRequest::Toggle(request.clone());
        with_retry("toggle_status", &self.toggle_policy, move || async move {
            let response = transport.send(wire).await?;
            let envelope = serde_json::from_str::<ToggleEnvelope>(&response.body).ok();

            if !response.is_success() {
                let reason = envelope.and_then(|e| e.error);
                return Err(MaintenanceError::from_status(
                    response.status,
                    response.body,
                    reason,
                ));
            }

            let envelope = envelope.ok_or_else(|| {
                MaintenanceError::Validation("toggle response is not a valid envelope".to_string())
            })?;

            if !envelope.success {
                return Err(MaintenanceError::Rejected(
                    envelope
                        .error
                        .unwrap_or_else(|| "unknown error".to_string()),
                ));
            }

            let data = envelope.data.ok_or_else(|| {
                MaintenanceError::Validation("toggle response is missing data".to_string())
            })?;
            MaintenanceState::from_value(data)
        })
        .await
    }
}

async fn with_retry<T, F, Fut>(
    operation: &'static str,
    policy: &RetryPolicy,
    mut attempt_once: F,
) -> Result<T, MaintenanceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MaintenanceError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        // Dropping the attempt future on timeout cancels the in-flight request.
        let result = match tokio::time::timeout(policy.timeout, attempt_once()).await {
            Ok(result) => result,
            Err(_) => Err(MaintenanceError::Timeout(policy.timeout)),
        };

        let error = match result {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(operation, attempts = attempt + 1, "Request recovered");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                tracing::debug!(operation, error = %e, "Request failed, not retrying");
                return Err(e);
            }
            Err(e) => e,
        };

        attempt += 1;
        if attempt >= max_attempts {
            tracing::warn!(operation, attempts = attempt, error = %error, "Retries exhausted");
            return Err(MaintenanceError::ExhaustedRetries {
                attempts: attempt,
                last: Box::new(error),
            });
        }

        let delay = policy.delay_for(attempt - 1);
        tracing::warn!(
            operation,
            attempt,
            error = %error,
            retry_in_ms = delay.as_millis() as u64,
            "Request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
