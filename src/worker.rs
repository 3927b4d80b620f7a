use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use lapin::Consumer;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    clients::{Broker, rbmq::RabbitMqClient},
    config::Config,
    error::RelayError,
    models::message::InboundMessage,
    pipeline::Dispatcher,
};

/// Why a consume session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Shutdown,
    /// The delivery stream failed or ended; the runner reconnects.
    ConnectionLost(String),
}

/// Connects, declares topology and relays messages until `shutdown` flips to
/// `true` (or its sender is dropped).
///
/// A lost connection is re-established with the same retry policy and the
/// topology re-declared. Only an exhausted connect budget or a failed setup
/// step ends the relay with an error.
pub async fn run(config: Config, mut shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
    let dispatcher = Dispatcher::from_config(&config);

    loop {
        let (client, consumer) = open_session(&config).await?;

        info!(
            queue = %config.queue_name,
            binding = %config.source_binding,
            "Waiting for messages"
        );

        let deliveries = consumer.map(|next| next.map(InboundMessage::from));

        match consume(&client, deliveries, &dispatcher, &mut shutdown).await {
            SessionEnd::Shutdown => {
                info!("Shutdown requested, stopping consumer");

                if let Err(e) = client.cancel_consumer().await {
                    warn!(error = %e, "Failed to cancel consumer");
                }
                client.close().await;

                info!("Relay stopped");
                return Ok(());
            }
            SessionEnd::ConnectionLost(reason) => {
                warn!(reason = %reason, "Consumer stream interrupted, reconnecting");
                client.close().await;
            }
        }
    }
}

async fn open_session(config: &Config) -> Result<(RabbitMqClient, Consumer), RelayError> {
    let client = RabbitMqClient::connect(config).await?;

    let consumer = match client.declare_topology().await {
        Ok(()) => client.create_consumer().await,
        Err(e) => Err(e),
    };

    match consumer {
        Ok(consumer) => Ok((client, consumer)),
        Err(e) => {
            error!(error = %e, "Failed to prepare consumer");
            client.close().await;
            Err(e)
        }
    }
}

/// Deliveries are handled one at a time; shutdown is only observed between them.
pub async fn consume<B, S, E>(
    broker: &B,
    mut deliveries: S,
    dispatcher: &Dispatcher,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd
where
    B: Broker,
    S: Stream<Item = Result<InboundMessage, E>> + Unpin,
    E: Display,
{
    loop {
        if *shutdown.borrow() {
            return SessionEnd::Shutdown;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return SessionEnd::Shutdown;
                }
            }

            next = deliveries.next() => match next {
                Some(Ok(message)) => {
                    dispatcher
                        .dispatch(broker, message.delivery_tag, &message.body)
                        .await;
                }
                Some(Err(e)) => return SessionEnd::ConnectionLost(e.to_string()),
                None => return SessionEnd::ConnectionLost("consumer stream ended".to_string()),
            },
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received"),
        _ = terminate => info!("SIGTERM received"),
    }
}
