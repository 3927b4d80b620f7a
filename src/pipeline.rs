//! Per-message consume → transform → publish → acknowledge.
//!
//! Every delivery ends acknowledged. A message that cannot be parsed or
//! published is logged and dropped (optionally copied to a dead-letter
//! exchange) instead of requeued, since redelivering the same bytes would
//! fail the same way forever.

use std::{
    fmt::{Display, Formatter},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::{
    clients::Broker,
    config::Config,
    error::{ParseError, RelayError},
    models::{message::DeadLetter, notification::OutboundPayload},
    normalizer::normalize,
    renderer::TemplateRenderer,
    utils::format_timestamp,
};

/// The state a message was in when processing failed.
///
/// Rendering is total, so a message either fails as received (undecodable)
/// or as rendered (serialization or publish failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Rendered,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStage::Received => "received",
            DispatchStage::Rendered => "rendered",
        }
    }
}

impl Display for DispatchStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Published { action: String },
    /// Dropped after failing while in `stage`.
    Dropped { stage: DispatchStage, reason: String },
}

impl DispatchOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, DispatchOutcome::Published { .. })
    }
}

#[derive(Debug, Clone)]
struct Route {
    exchange: String,
    routing_key: String,
}

pub struct Dispatcher {
    renderer: TemplateRenderer,
    outbound: Route,
    dead_letter: Option<Route>,
    publish_timeout: Duration,
}

impl Dispatcher {
    pub fn from_config(config: &Config) -> Self {
        Self {
            renderer: TemplateRenderer::new(),
            outbound: Route {
                exchange: config.target_exchange.clone(),
                routing_key: config.target_routing_key.clone(),
            },
            dead_letter: config.dead_letter_exchange.as_ref().map(|exchange| Route {
                exchange: exchange.clone(),
                routing_key: config.dead_letter_routing_key.clone(),
            }),
            publish_timeout: config.publish_timeout(),
        }
    }

    /// Normalizes and renders `body` into the payload for the delivery service.
    pub fn transform(
        &self,
        body: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<OutboundPayload, ParseError> {
        let received_at = format_timestamp(received_at);
        let event = normalize(body, &received_at)?;

        info!(action = %event.action, "Event received");

        let notification = self.renderer.render(&event.action, &event.user);

        Ok(OutboundPayload::new(notification, event, received_at))
    }

    /// Runs one delivery through the pipeline and acknowledges it.
    ///
    /// Never returns an error: failures are logged and reported in the outcome.
    pub async fn dispatch<B: Broker>(
        &self,
        broker: &B,
        delivery_tag: u64,
        body: &[u8],
    ) -> DispatchOutcome {
        let outcome = match self.process(broker, body).await {
            Ok(action) => DispatchOutcome::Published { action },
            Err((stage, e)) => {
                error!(
                    delivery_tag,
                    stage = %stage,
                    error = %e,
                    "Error processing event, dropping message"
                );

                self.dead_letter(broker, body, stage, &e).await;

                DispatchOutcome::Dropped {
                    stage,
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = broker.acknowledge(delivery_tag).await {
            error!(delivery_tag, error = %e, "Failed to acknowledge message");
        }

        outcome
    }

    async fn process<B: Broker>(
        &self,
        broker: &B,
        body: &[u8],
    ) -> Result<String, (DispatchStage, RelayError)> {
        let payload = self
            .transform(body, Utc::now())
            .map_err(|e| (DispatchStage::Received, RelayError::from(e)))?;

        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| (DispatchStage::Rendered, RelayError::from(e)))?;

        self.publish(broker, &self.outbound, &bytes)
            .await
            .map_err(|e| (DispatchStage::Rendered, e))?;

        info!(
            exchange = %self.outbound.exchange,
            routing_key = %self.outbound.routing_key,
            recipient = payload.email.as_deref().unwrap_or(""),
            action = %payload.meta.action,
            "Published notification"
        );

        Ok(payload.meta.action)
    }

    async fn publish<B: Broker>(
        &self,
        broker: &B,
        route: &Route,
        bytes: &[u8],
    ) -> Result<(), RelayError> {
        match timeout(
            self.publish_timeout,
            broker.publish(&route.exchange, &route.routing_key, bytes),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RelayError::Publish {
                exchange: route.exchange.clone(),
                reason: format!("timed out after {}ms", self.publish_timeout.as_millis()),
            }),
        }
    }

    async fn dead_letter<B: Broker>(
        &self,
        broker: &B,
        body: &[u8],
        stage: DispatchStage,
        failure: &RelayError,
    ) {
        let Some(route) = &self.dead_letter else {
            return;
        };

        let dead_letter = DeadLetter::new(
            body,
            failure.to_string(),
            stage.to_string(),
            format_timestamp(Utc::now()),
        );

        let result = match serde_json::to_vec(&dead_letter) {
            Ok(bytes) => self.publish(broker, route, &bytes).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => info!(
                exchange = %route.exchange,
                routing_key = %route.routing_key,
                stage = %stage,
                "Dropped message forwarded to dead-letter exchange"
            ),
            Err(e) => warn!(
                exchange = %route.exchange,
                error = %e,
                "Failed to publish dead letter"
            ),
        }
    }
}
