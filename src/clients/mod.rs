use std::future::Future;

use crate::error::RelayError;

pub mod rbmq;

/// The two broker operations the dispatch pipeline needs.
pub trait Broker: Send + Sync {
    /// Publishes a persistent message and resolves once the broker has taken it.
    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), RelayError>> + Send;

    /// Accepts an inbound delivery so it is removed from the queue.
    fn acknowledge(&self, delivery_tag: u64) -> impl Future<Output = Result<(), RelayError>> + Send;
}
