use lapin::message::Delivery;
use serde::{Deserialize, Serialize};

/// An inbound delivery, reduced to what the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub delivery_tag: u64,
    pub body: Vec<u8>,
}

impl From<Delivery> for InboundMessage {
    fn from(delivery: Delivery) -> Self {
        Self {
            delivery_tag: delivery.delivery_tag,
            body: delivery.data,
        }
    }
}

/// A dropped inbound message, forwarded to the dead-letter exchange for inspection.
///
/// Text bodies are stored as `original_payload`. Bodies that are not valid
/// UTF-8 are stored byte for byte in `original_bytes` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_bytes: Option<Vec<u8>>,
    pub failure_reason: String,
    pub failed_stage: String,
    pub failed_at: String,
}

impl DeadLetter {
    pub fn new(
        body: &[u8],
        failure_reason: String,
        failed_stage: String,
        failed_at: String,
    ) -> Self {
        let (original_payload, original_bytes) = match std::str::from_utf8(body) {
            Ok(text) => (Some(text.to_string()), None),
            Err(_) => (None, Some(body.to_vec())),
        };

        Self {
            original_payload,
            original_bytes,
            failure_reason,
            failed_stage,
            failed_at,
        }
    }

    /// The dropped body exactly as it was received.
    pub fn original_body(&self) -> Vec<u8> {
        match (&self.original_payload, &self.original_bytes) {
            (Some(text), _) => text.clone().into_bytes(),
            (None, Some(bytes)) => bytes.clone(),
            (None, None) => Vec::new(),
        }
    }
}
