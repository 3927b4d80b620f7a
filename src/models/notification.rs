use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::event::NormalizedEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub recipient_email: Option<String>,
    pub subject: String,
    pub body: String,
    pub recipient_phone: String,
}

/// Message published on the outbound exchange for the delivery service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub email: Option<String>,
    pub affair: String,
    pub body: String,
    pub number: String,
    pub meta: PayloadMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMeta {
    pub id: JsonValue,
    pub name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub action: String,
    pub timestamp: String,
    pub received_at: String,
}

impl OutboundPayload {
    pub fn new(
        notification: RenderedNotification,
        event: NormalizedEvent,
        received_at: String,
    ) -> Self {
        let NormalizedEvent {
            action,
            user,
            timestamp,
        } = event;

        Self {
            email: notification.recipient_email,
            affair: notification.subject,
            body: notification.body,
            number: notification.recipient_phone,
            meta: PayloadMeta {
                id: user.id,
                name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                phone: user.phone,
                action,
                timestamp,
                received_at,
            },
        }
    }
}
