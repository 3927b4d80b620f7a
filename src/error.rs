use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid or missing environment variable: {0}")]
    Config(#[from] envy::Error),

    #[error("could not connect to RabbitMQ after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: lapin::Error,
    },

    #[error("RabbitMQ {operation} failed: {source}")]
    Broker {
        operation: &'static str,
        #[source]
        source: lapin::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("publish to exchange `{exchange}` failed: {reason}")]
    Publish { exchange: String, reason: String },
}

impl RelayError {
    pub(crate) fn broker(operation: &'static str) -> impl FnOnce(lapin::Error) -> Self {
        move |source| Self::Broker { operation, source }
    }
}

/// Inbound bytes that cannot be read as a JSON object.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },
}
