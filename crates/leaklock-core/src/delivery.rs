//! Single delivery attempts.
//!
//! A [`Deliverer`] POSTs one envelope to one target and folds every failure
//! mode into the returned [`DeliveryOutcome`]. It never returns an error and
//! never retries.

use std::error::Error as StdError;
use std::time::Instant;

use async_trait::async_trait;
use leaklock_state::DeliveryTarget;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::DispatchConfig;
use crate::domain::{DeliveryOutcome, Envelope, LeakLockError, Result};

/// Delivers an envelope to a single target.
#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, target: &DeliveryTarget, envelope: &Envelope) -> DeliveryOutcome;
}

/// Reason recorded when an attempt exceeds the configured timeout.
pub const TIMEOUT_REASON: &str = "timeout";

/// reqwest-backed deliverer.
///
/// The underlying client pools connections, so one instance is shared by
/// every delivery task.
#[derive(Debug, Clone)]
pub struct HttpDeliverer {
    client: reqwest::Client,
    config: DispatchConfig,
}

impl HttpDeliverer {
    pub fn new(config: DispatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.delivery_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| LeakLockError::HttpClient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DispatchConfig::default())
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

#[async_trait]
impl Deliverer for HttpDeliverer {
    async fn deliver(&self, target: &DeliveryTarget, envelope: &Envelope) -> DeliveryOutcome {
        let span = info_span!(
            "leaklock.delivery",
            target_id = %target.id,
            target_name = %target.display_name,
        );

        async move {
            let started = Instant::now();
            debug!("Starting delivery");

            let response = match self
                .client
                .post(&target.endpoint)
                .json(envelope)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    if e.is_timeout() {
                        warn!(elapsed_ms, "Delivery timed out");
                        return DeliveryOutcome::failed(&target.display_name, TIMEOUT_REASON);
                    }
                    let reason = error_chain(&e);
                    warn!(elapsed_ms, error = %reason, "Delivery request failed");
                    return DeliveryOutcome::failed(&target.display_name, reason);
                }
            };

            let status = response.status();
            debug!(
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Received response"
            );

            if status.is_success() {
                DeliveryOutcome::success(&target.display_name)
            } else {
                DeliveryOutcome::failed(
                    &target.display_name,
                    format!("webhook {} failed: {}", target.display_name, status),
                )
            }
        }
        .instrument(span)
        .await
    }
}

/// Render an error with every `source()` below it, joined by `": "`.
///
/// reqwest's own message only names the URL; the cause (refused, DNS,
/// TLS) lives further down the chain.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
