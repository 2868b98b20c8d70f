use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use crate::errors::BookingError;
use crate::models::{DeliveryOutcome, DispatchStatus, WebhookDeliveryAttempt};

pub const PENDING_CONFIRMATION: &str = "pending_confirmation";
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub fixed_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            fixed_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            fixed_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationPayload<'a> {
    pub event_id: &'a str,
    pub status: &'static str,
}

/// Delivers one confirmation request; returns the HTTP status code.
#[async_trait]
pub trait ConfirmationTransport: Send + Sync {
    async fn post(&self, url: &str, payload: &ConfirmationPayload<'_>) -> anyhow::Result<u16>;
}

pub struct HttpConfirmationTransport {
    client: reqwest::Client,
}

impl HttpConfirmationTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ConfirmationTransport for HttpConfirmationTransport {
    async fn post(&self, url: &str, payload: &ConfirmationPayload<'_>) -> anyhow::Result<u16> {
        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("failed to send confirmation webhook")?;

        Ok(resp.status().as_u16())
    }
}

pub struct ConfirmationDispatcher {
    url: Option<String>,
    transport: Box<dyn ConfirmationTransport>,
    policy: RetryPolicy,
}

impl ConfirmationDispatcher {
    pub fn new(
        url: Option<String>,
        transport: Box<dyn ConfirmationTransport>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            url,
            transport,
            policy,
        }
    }

    /// Tells the confirmation endpoint that `event_id` awaits approval.
    ///
    /// The event itself is never touched here: exhausting the retries only
    /// means the notification failed.
    pub async fn notify(&self, event_id: &str) -> Result<DispatchStatus, BookingError> {
        let Some(url) = self.url.as_deref() else {
            tracing::warn!(event_id, "confirmation webhook not configured, skipping");
            return Ok(DispatchStatus::Skipped);
        };

        let payload = ConfirmationPayload {
            event_id,
            status: PENDING_CONFIRMATION,
        };
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt_number in 1..=max_attempts {
            let outcome = match self.transport.post(url, &payload).await {
                Ok(status) if (200..300).contains(&status) => DeliveryOutcome::Delivered,
                Ok(status) => DeliveryOutcome::Rejected(status),
                Err(e) => DeliveryOutcome::NetworkError(format!("{e:#}")),
            };

            let attempt = WebhookDeliveryAttempt {
                event_id: event_id.to_string(),
                attempt_number,
                outcome,
            };

            if attempt.outcome == DeliveryOutcome::Delivered {
                tracing::info!(event_id, attempt = attempt_number, "confirmation webhook delivered");
                return Ok(DispatchStatus::Delivered {
                    attempts: attempt_number,
                });
            }

            tracing::warn!(
                event_id,
                attempt = attempt.attempt_number,
                outcome = ?attempt.outcome,
                "confirmation webhook attempt failed"
            );

            if attempt_number < max_attempts && !self.policy.fixed_delay.is_zero() {
                tokio::time::sleep(self.policy.fixed_delay).await;
            }
        }

        tracing::error!(event_id, attempts = max_attempts, "confirmation webhook retries exhausted");
        Err(BookingError::DispatchExhausted {
            event_id: event_id.to_string(),
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    struct ScriptedTransport {
        calls: Arc<AtomicU32>,
        statuses: Vec<Option<u16>>,
    }

    #[async_trait]
    impl ConfirmationTransport for ScriptedTransport {
        async fn post(&self, _url: &str, payload: &ConfirmationPayload<'_>) -> anyhow::Result<u16> {
            assert_eq!(payload.status, "pending_confirmation");
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.statuses.get(n).copied().flatten() {
                Some(status) => Ok(status),
                None => anyhow::bail!("connection refused"),
            }
        }
    }

    fn dispatcher(url: Option<&str>, statuses: Vec<Option<u16>>) -> (ConfirmationDispatcher, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let transport = ScriptedTransport {
            calls: Arc::clone(&calls),
            statuses,
        };
        (
            ConfirmationDispatcher::new(
                url.map(str::to_string),
                Box::new(transport),
                RetryPolicy::immediate(3),
            ),
            calls,
        )
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let (d, calls) = dispatcher(Some("http://hook"), vec![Some(200)]);
        let status = d.notify("evt1").await.unwrap();
        assert_eq!(status, DispatchStatus::Delivered { attempts: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (d, calls) = dispatcher(Some("http://hook"), vec![Some(503), None, Some(204)]);
        let status = d.notify("evt1").await.unwrap();
        assert_eq!(status, DispatchStatus::Delivered { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_three_attempts() {
        let (d, calls) = dispatcher(Some("http://hook"), vec![Some(500), Some(404), None, Some(200)]);
        let err = d.notify("evt1").await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::DispatchExhausted { ref event_id, attempts: 3 } if event_id == "evt1"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_url_skips() {
        let (d, calls) = dispatcher(None, vec![]);
        assert_eq!(d.notify("evt1").await.unwrap(), DispatchStatus::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let transport = ScriptedTransport {
            calls: Arc::clone(&calls),
            statuses: vec![],
        };
        let policy = RetryPolicy {
            max_attempts: 3,
            fixed_delay: Duration::from_secs(2),
        };
        let d = ConfirmationDispatcher::new(Some("http://hook".to_string()), Box::new(transport), policy);

        let started = tokio::time::Instant::now();
        assert!(d.notify("evt1").await.is_err());
        // two waits between three attempts, none after the last
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[test]
    fn test_payload_shape() {
        let payload = ConfirmationPayload {
            event_id: "evt1",
            status: PENDING_CONFIRMATION,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"event_id": "evt1", "status": "pending_confirmation"}));
    }
}
