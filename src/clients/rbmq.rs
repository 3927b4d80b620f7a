use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind,
    options::{
        BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicPublishOptions,
        BasicQosOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clients::Broker, config::Config, error::RelayError, utils::retry_with_fixed_delay,
};

/// One unacknowledged delivery at a time keeps processing strictly ordered.
pub const PREFETCH_COUNT: u16 = 1;

const DELIVERY_MODE_PERSISTENT: u8 = 2;
const REPLY_SUCCESS: u16 = 200;

pub struct RabbitMqClient {
    connection: Connection,
    channel: Channel,
    consumer_tag: String,
    queue_name: String,
    source_exchange: String,
    source_binding: String,
    target_exchange: String,
    dead_letter_exchange: Option<String>,
}

impl RabbitMqClient {
    /// Connects with a fixed-delay retry, then opens the channel and applies QoS.
    ///
    /// Fails with [`RelayError::Connection`] once the retry budget is spent.
    pub async fn connect(config: &Config) -> Result<Self, RelayError> {
        let retry_config = config.retry_config();
        let url = config.rabbitmq_url.as_str();

        let connection = retry_with_fixed_delay(&retry_config, |attempt| async move {
            info!(attempt, "Connecting to RabbitMQ");
            Connection::connect(url, ConnectionProperties::default()).await
        })
        .await
        .map_err(|source| RelayError::Connection {
            attempts: retry_config.max_attempts.max(1),
            source,
        })?;

        info!("RabbitMQ connection established");

        let channel = connection
            .create_channel()
            .await
            .map_err(RelayError::broker("channel creation"))?;

        debug!("RabbitMQ channel created");

        channel
            .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
            .await
            .map_err(RelayError::broker("QoS setup"))?;

        debug!(prefetch_count = PREFETCH_COUNT, "Prefetch count set");

        if config.publisher_confirms {
            channel
                .confirm_select(ConfirmSelectOptions::default())
                .await
                .map_err(RelayError::broker("confirm select"))?;

            debug!("Publisher confirms enabled");
        }

        Ok(Self {
            connection,
            channel,
            consumer_tag: format!("user-event-relay-{}", Uuid::new_v4()),
            queue_name: config.queue_name.clone(),
            source_exchange: config.source_exchange.clone(),
            source_binding: config.source_binding.clone(),
            target_exchange: config.target_exchange.clone(),
            dead_letter_exchange: config.dead_letter_exchange.clone(),
        })
    }

    /// Declares both topic exchanges, the shared queue and its binding.
    ///
    /// Every declaration uses the same arguments on each run, so repeating it
    /// against an existing topology is a no-op on the broker.
    pub async fn declare_topology(&self) -> Result<(), RelayError> {
        self.declare_topic_exchange(&self.source_exchange).await?;
        self.declare_topic_exchange(&self.target_exchange).await?;

        if let Some(dead_letter_exchange) = &self.dead_letter_exchange {
            self.declare_topic_exchange(dead_letter_exchange).await?;
        }

        self.channel
            .queue_declare(
                self.queue_name.as_str(),
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(RelayError::broker("queue declaration"))?;

        self.channel
            .queue_bind(
                self.queue_name.as_str(),
                self.source_exchange.as_str(),
                self.source_binding.as_str(),
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(RelayError::broker("queue binding"))?;

        info!(
            queue = %self.queue_name,
            source_exchange = %self.source_exchange,
            binding = %self.source_binding,
            target_exchange = %self.target_exchange,
            "Topology declared"
        );

        Ok(())
    }

    async fn declare_topic_exchange(&self, exchange: &str) -> Result<(), RelayError> {
        self.channel
            .exchange_declare(
                exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(RelayError::broker("exchange declaration"))?;

        debug!(exchange, "Topic exchange declared");

        Ok(())
    }

    pub async fn create_consumer(&self) -> Result<Consumer, RelayError> {
        let consumer = self
            .channel
            .basic_consume(
                self.queue_name.as_str(),
                self.consumer_tag.as_str(),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(RelayError::broker("consumer creation"))?;

        info!(
            queue = %self.queue_name,
            consumer_tag = %self.consumer_tag,
            "Consumer created for queue"
        );

        Ok(consumer)
    }

    pub async fn cancel_consumer(&self) -> Result<(), RelayError> {
        self.channel
            .basic_cancel(self.consumer_tag.as_str(), BasicCancelOptions::default())
            .await
            .map_err(RelayError::broker("consumer cancellation"))?;

        info!(consumer_tag = %self.consumer_tag, "Consumer cancelled");

        Ok(())
    }

    /// Closes the channel, then the connection.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "Normal shutdown").await {
            warn!(error = %e, "Failed to close RabbitMQ channel");
        } else {
            debug!("RabbitMQ channel closed");
        }

        if let Err(e) = self
            .connection
            .close(REPLY_SUCCESS, "Normal shutdown")
            .await
        {
            warn!(error = %e, "Failed to close RabbitMQ connection");
        } else {
            info!("RabbitMQ connection closed");
        }
    }
}

impl Broker for RabbitMqClient {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), RelayError> {
        let publish_error = |reason: String| RelayError::Publish {
            exchange: exchange.to_string(),
            reason,
        };

        let properties = BasicProperties::default()
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_content_type("application/json".into())
            .with_message_id(Uuid::new_v4().to_string().into());

        let confirmation = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await
            .map_err(|e| publish_error(e.to_string()))?
            .await
            .map_err(|e| publish_error(e.to_string()))?;

        if confirmation.is_nack() {
            return Err(publish_error(
                "broker returned a negative acknowledgement".to_string(),
            ));
        }

        Ok(())
    }

    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), RelayError> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(RelayError::broker("acknowledgement"))?;

        Ok(())
    }
}
