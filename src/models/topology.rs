use crate::models::dispatch::Channel;

pub const DEFAULT_EXCHANGE_NAME: &str = "notification_exchange";

pub const VOLUNTEER_PUSH_QUEUE: &str = "volunteer_push_queue";
pub const NGO_EMAIL_QUEUE: &str = "ngo_email_queue";
pub const NGO_PUSH_QUEUE: &str = "ngo_push_queue";

pub const ROUTING_KEY_APP_STATUS_CHANGED: &str = "application.status_changed";
pub const ROUTING_KEY_APPLICATION_NEW: &str = "application.new";
pub const ROUTING_KEY_OPPORTUNITY_CREATED: &str = "opportunity.created";
pub const ROUTING_KEY_OPPORTUNITY_UPDATED: &str = "opportunity.updated";
pub const ROUTING_KEY_OPPORTUNITY_DELETED: &str = "opportunity.deleted";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingEntry {
    pub queue_name: String,
    pub routing_key: String,
    pub exchange_name: String,
}

/// A durable queue, the keys it is bound with, and the delivery channels its
/// consumer is allowed to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub routing_keys: Vec<String>,
    pub channels: Vec<Channel>,
}

impl QueueSpec {
    pub fn new(name: &str, routing_keys: &[&str], channels: &[Channel]) -> Self {
        Self {
            name: name.to_string(),
            routing_keys: routing_keys.iter().map(|key| key.to_string()).collect(),
            channels: channels.to_vec(),
        }
    }
}

/// Exchange and queue layout. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange_name: String,
    pub queues: Vec<QueueSpec>,
}

impl Topology {
    pub fn standard(exchange_name: &str) -> Self {
        Self {
            exchange_name: exchange_name.to_string(),
            queues: vec![
                QueueSpec::new(
                    VOLUNTEER_PUSH_QUEUE,
                    &[
                        ROUTING_KEY_APP_STATUS_CHANGED,
                        ROUTING_KEY_OPPORTUNITY_CREATED,
                        ROUTING_KEY_OPPORTUNITY_UPDATED,
                        ROUTING_KEY_OPPORTUNITY_DELETED,
                    ],
                    &[Channel::Push, Channel::Email],
                ),
                QueueSpec::new(
                    NGO_EMAIL_QUEUE,
                    &[ROUTING_KEY_APPLICATION_NEW],
                    &[Channel::Email],
                ),
                QueueSpec::new(
                    NGO_PUSH_QUEUE,
                    &[ROUTING_KEY_APPLICATION_NEW],
                    &[Channel::Push],
                ),
            ],
        }
    }

    pub fn queue(&self, name: &str) -> Option<&QueueSpec> {
        self.queues.iter().find(|queue| queue.name == name)
    }

    /// Every binding as a flat triple, first occurrence wins.
    pub fn routing_entries(&self) -> Vec<RoutingEntry> {
        let mut entries: Vec<RoutingEntry> = Vec::new();

        for queue in &self.queues {
            for routing_key in &queue.routing_keys {
                let entry = RoutingEntry {
                    queue_name: queue.name.clone(),
                    routing_key: routing_key.clone(),
                    exchange_name: self.exchange_name.clone(),
                };

                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }

        entries
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::standard(DEFAULT_EXCHANGE_NAME)
    }
}
