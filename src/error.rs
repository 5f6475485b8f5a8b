use thiserror::Error;

/// A message body that can never be dispatched, however often it is redelivered.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message body is not a JSON object")]
    NotAnObject,

    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
}

/// Broker setup failure at startup. The worker cannot run without its topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to connect to RabbitMQ: {0}")]
    Connection(#[source] lapin::Error),

    #[error("failed to declare exchange '{name}': {source}")]
    Exchange {
        name: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to declare queue '{name}': {source}")]
    Queue {
        name: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to bind queue '{queue}' to '{exchange}' with key '{routing_key}': {source}")]
    Binding {
        queue: String,
        exchange: String,
        routing_key: String,
        #[source]
        source: lapin::Error,
    },
}
