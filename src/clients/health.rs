use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::{
    clients::rbmq::RabbitMqClient,
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

/// Liveness flag for one consumer loop, flipped off when the loop exits.
#[derive(Debug, Clone)]
pub struct ConsumerHealth {
    running: Arc<AtomicBool>,
}

impl ConsumerHealth {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for ConsumerHealth {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HealthChecker {
    broker: Option<Arc<RabbitMqClient>>,
    consumers: HashMap<String, ConsumerHealth>,
}

impl HealthChecker {
    pub fn new(broker: Option<Arc<RabbitMqClient>>) -> Self {
        Self {
            broker,
            consumers: HashMap::new(),
        }
    }

    pub fn track_consumer(&mut self, queue_name: &str) -> ConsumerHealth {
        let health = ConsumerHealth::new();
        self.consumers.insert(queue_name.to_string(), health.clone());
        health
    }

    pub fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("message_broker".to_string(), self.check_broker());

        for (queue, health) in &self.consumers {
            let check = if health.is_running() {
                ServiceHealth::healthy()
            } else {
                warn!(queue = %queue, "Consumer loop is not running");
                ServiceHealth::degraded("Consumer loop stopped".to_string())
            };
            checks.insert(format!("consumer:{}", queue), check);
        }

        HealthCheckResponse {
            status: determine_overall_status(&checks),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            checks,
        }
    }

    fn check_broker(&self) -> ServiceHealth {
        match &self.broker {
            Some(broker) if broker.is_connected() => {
                debug!("RabbitMQ health check passed");
                ServiceHealth::healthy()
            }
            Some(_) => {
                warn!("RabbitMQ connection is not open");
                ServiceHealth::unhealthy("Connection is not open".to_string())
            }
            None => ServiceHealth::unhealthy("No broker connection".to_string()),
        }
    }
}

pub fn determine_overall_status(checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
    let has_unhealthy = checks
        .values()
        .any(|health| health.status == HealthStatus::Unhealthy);

    let has_degraded = checks
        .values()
        .any(|health| health.status == HealthStatus::Degraded);

    if has_unhealthy {
        HealthStatus::Unhealthy
    } else if has_degraded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
