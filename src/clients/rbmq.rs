use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use lapin::{
    Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{
        BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicQosOptions,
        BasicRejectOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};
use tracing::{debug, info};

use crate::{
    config::Config,
    error::TopologyError,
    models::topology::{RoutingEntry, Topology},
    utils::retry_with_backoff,
};

/// A delivery as the consumer loop sees it, detached from the AMQP types.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub delivery_tag: u64,
    pub routing_key: String,
    pub redelivered: bool,
    pub data: Vec<u8>,
}

/// Settles deliveries back to the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error>;

    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error>;
}

pub struct RabbitMqClient {
    connection: Connection,
    channel: Channel,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, TopologyError> {
        info!("Connecting to RabbitMQ");

        let connection = retry_with_backoff(&config.retry_config(), || {
            Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
        })
        .await
        .map_err(TopologyError::Connection)?;

        let channel = connection
            .create_channel()
            .await
            .map_err(TopologyError::Connection)?;

        info!("RabbitMQ connection established");

        Ok(Self {
            connection,
            channel,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    pub async fn declare_exchange(&self, name: &str) -> Result<(), TopologyError> {
        self.channel
            .exchange_declare(
                name,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|source| TopologyError::Exchange {
                name: name.to_string(),
                source,
            })?;

        info!(exchange = name, kind = "topic", "Exchange declared");

        Ok(())
    }

    pub async fn declare_queue(&self, name: &str) -> Result<(), TopologyError> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|source| TopologyError::Queue {
                name: name.to_string(),
                source,
            })?;

        info!(queue = name, "Queue declared");

        Ok(())
    }

    pub async fn bind_queue(&self, entry: &RoutingEntry) -> Result<(), TopologyError> {
        self.channel
            .queue_bind(
                &entry.queue_name,
                &entry.exchange_name,
                &entry.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| TopologyError::Binding {
                queue: entry.queue_name.clone(),
                exchange: entry.exchange_name.clone(),
                routing_key: entry.routing_key.clone(),
                source,
            })?;

        info!(
            queue = %entry.queue_name,
            exchange = %entry.exchange_name,
            routing_key = %entry.routing_key,
            "Queue bound"
        );

        Ok(())
    }

    /// Declares the exchange, every queue and every binding. Safe to run on
    /// each startup; the broker treats identical declarations as no-ops.
    pub async fn declare_topology(&self, topology: &Topology) -> Result<(), TopologyError> {
        self.declare_exchange(&topology.exchange_name).await?;

        for queue in &topology.queues {
            self.declare_queue(&queue.name).await?;
        }

        for entry in topology.routing_entries() {
            self.bind_queue(&entry).await?;
        }

        Ok(())
    }

    /// Opens a dedicated channel and starts a manual-ack consumer on `queue_name`.
    pub async fn create_consumer(
        &self,
        queue_name: &str,
        prefetch_count: u16,
    ) -> Result<QueueConsumer, Error> {
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|e| anyhow!("RabbitMQ channel creation failed: {}", e))?;

        channel
            .basic_qos(prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set up QoS: {}", e))?;

        let consumer_tag = format!("{}-{}", queue_name, uuid::Uuid::new_v4());

        let consumer = channel
            .basic_consume(
                queue_name,
                &consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer for '{}': {}", queue_name, e))?;

        info!(queue = queue_name, consumer_tag = %consumer_tag, "Consumer created");

        Ok(QueueConsumer {
            channel,
            consumer,
            consumer_tag,
        })
    }

    pub async fn close(&self) -> Result<(), Error> {
        self.connection
            .close(200, "Normal shutdown".into())
            .await
            .map_err(|e| anyhow!("Failed to close RabbitMQ connection: {}", e))?;

        Ok(())
    }
}

pub struct QueueConsumer {
    channel: Channel,
    consumer: lapin::Consumer,
    consumer_tag: String,
}

impl QueueConsumer {
    /// Splits into the delivery stream and the handle that settles deliveries.
    pub fn into_parts(
        self,
    ) -> (
        impl Stream<Item = Result<InboundMessage, Error>> + Unpin,
        ChannelAcknowledger,
    ) {
        let stream = self.consumer.map(|delivery| {
            delivery
                .map(|delivery| InboundMessage {
                    delivery_tag: delivery.delivery_tag,
                    routing_key: delivery.routing_key.as_str().to_string(),
                    redelivered: delivery.redelivered,
                    data: delivery.data,
                })
                .map_err(|e| anyhow!("Consumer stream failed: {}", e))
        });

        let acknowledger = ChannelAcknowledger {
            channel: self.channel,
            consumer_tag: self.consumer_tag,
        };

        (stream, acknowledger)
    }
}

pub struct ChannelAcknowledger {
    channel: Channel,
    consumer_tag: String,
}

impl ChannelAcknowledger {
    /// Stops the broker from pushing further deliveries to this consumer.
    pub async fn cancel(&self) -> Result<(), Error> {
        self.channel
            .basic_cancel(&self.consumer_tag, BasicCancelOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to cancel consumer: {}", e))?;

        debug!(consumer_tag = %self.consumer_tag, "Consumer cancelled");

        Ok(())
    }
}

#[async_trait]
impl Acknowledger for ChannelAcknowledger {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to acknowledge message"))?;

        Ok(())
    }

    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error> {
        self.channel
            .basic_reject(delivery_tag, BasicRejectOptions { requeue })
            .await
            .map_err(|_| anyhow!("Failed to reject message"))?;

        Ok(())
    }
}
