use std::{sync::Mutex, time::Duration};

use tokio::time::sleep;
use user_event_relay::{clients::Broker, config::Config, error::RelayError};

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).expect("published payload should be JSON")
    }
}

/// In-memory broker that records publishes and acknowledgements.
#[derive(Default)]
pub struct MockBroker {
    published: Mutex<Vec<PublishedMessage>>,
    acknowledged: Mutex<Vec<u64>>,
    failing_exchanges: Vec<String>,
    publish_delay: Option<Duration>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(exchange: &str) -> Self {
        Self {
            failing_exchanges: vec![exchange.to_string()],
            ..Self::default()
        }
    }

    pub fn with_publish_delay(delay: Duration) -> Self {
        Self {
            publish_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, exchange: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|message| message.exchange == exchange)
            .collect()
    }

    pub fn acknowledged(&self) -> Vec<u64> {
        self.acknowledged.lock().unwrap().clone()
    }
}

impl Broker for MockBroker {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), RelayError> {
        if let Some(delay) = self.publish_delay {
            sleep(delay).await;
        }

        if self.failing_exchanges.iter().any(|failing| failing == exchange) {
            return Err(RelayError::Publish {
                exchange: exchange.to_string(),
                reason: "connection reset by peer".to_string(),
            });
        }

        self.published.lock().unwrap().push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_vec(),
        });

        Ok(())
    }

    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), RelayError> {
        self.acknowledged.lock().unwrap().push(delivery_tag);
        Ok(())
    }
}

pub fn config_with(vars: &[(&str, &str)]) -> Config {
    Config::from_vars(
        vars.iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    )
    .expect("test configuration should be valid")
}

pub fn default_config() -> Config {
    config_with(&[])
}
