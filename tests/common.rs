use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use notification_service::{
    clients::{
        rbmq::{Acknowledger, InboundMessage},
        sender::{EmailSender, PushSender},
    },
    handlers::dispatcher::Dispatcher,
    models::{
        dispatch::DeliveryOutcome,
        message::{NotificationEnvelope, Payload, Preferences, Recipient},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCall {
    pub address: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCall {
    pub device_token: String,
    pub title: String,
    pub body: String,
    pub deep_link: Option<String>,
}

/// Replays scripted outcomes in order, then keeps returning the last one.
pub struct ScriptedEmailSender {
    outcomes: Mutex<VecDeque<DeliveryOutcome>>,
    fallback: DeliveryOutcome,
    pub calls: Mutex<Vec<EmailCall>>,
}

impl ScriptedEmailSender {
    pub fn new(outcomes: Vec<DeliveryOutcome>) -> Arc<Self> {
        let fallback = outcomes.last().cloned().unwrap_or(DeliveryOutcome::Delivered);
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn delivering() -> Arc<Self> {
        Self::new(vec![DeliveryOutcome::Delivered])
    }

    pub fn calls(&self) -> Vec<EmailCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for ScriptedEmailSender {
    async fn send(
        &self,
        address: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> DeliveryOutcome {
        self.calls.lock().unwrap().push(EmailCall {
            address: address.to_string(),
            subject: subject.to_string(),
            text_body: text_body.to_string(),
            html_body: html_body.map(str::to_string),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct ScriptedPushSender {
    outcomes: Mutex<VecDeque<DeliveryOutcome>>,
    fallback: DeliveryOutcome,
    pub calls: Mutex<Vec<PushCall>>,
}

impl ScriptedPushSender {
    pub fn new(outcomes: Vec<DeliveryOutcome>) -> Arc<Self> {
        let fallback = outcomes.last().cloned().unwrap_or(DeliveryOutcome::Delivered);
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn delivering() -> Arc<Self> {
        Self::new(vec![DeliveryOutcome::Delivered])
    }

    pub fn calls(&self) -> Vec<PushCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for ScriptedPushSender {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        deep_link: Option<&str>,
    ) -> DeliveryOutcome {
        self.calls.lock().unwrap().push(PushCall {
            device_token: device_token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            deep_link: deep_link.map(str::to_string),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn dispatcher_with(
    email: &Arc<ScriptedEmailSender>,
    push: &Arc<ScriptedPushSender>,
) -> Dispatcher {
    let email_sender: Arc<dyn EmailSender> = email.clone();
    let push_sender: Arc<dyn PushSender> = push.clone();
    Dispatcher::new(email_sender, push_sender)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack(u64),
    Reject { delivery_tag: u64, requeue: bool },
}

#[derive(Default)]
pub struct RecordingAcknowledger {
    pub settlements: Mutex<Vec<Settlement>>,
    pub fail: bool,
}

impl RecordingAcknowledger {
    pub fn failing() -> Self {
        Self {
            settlements: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.settlements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Acknowledger for RecordingAcknowledger {
    async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        if self.fail {
            return Err(anyhow!("channel closed"));
        }
        self.settlements
            .lock()
            .unwrap()
            .push(Settlement::Ack(delivery_tag));
        Ok(())
    }

    async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error> {
        if self.fail {
            return Err(anyhow!("channel closed"));
        }
        self.settlements.lock().unwrap().push(Settlement::Reject {
            delivery_tag,
            requeue,
        });
        Ok(())
    }
}

pub fn inbound(delivery_tag: u64, body: &[u8]) -> InboundMessage {
    InboundMessage {
        delivery_tag,
        routing_key: "application.new".to_string(),
        redelivered: false,
        data: body.to_vec(),
    }
}

pub fn recipient(push: bool, email: bool) -> Recipient {
    Recipient {
        user_id: "user_42".to_string(),
        platform_type: Some("mobile".to_string()),
        device_token: Some("fcm_token_abcdefghijklmnop".to_string()),
        email_address: Some("volunteer@example.org".to_string()),
        prefs: Preferences {
            receive_push: push,
            receive_email: email,
        },
    }
}

pub fn envelope(notification_type: &str, recipient: Recipient) -> NotificationEnvelope {
    NotificationEnvelope {
        notification_type: notification_type.to_string(),
        recipient,
        payload: Payload {
            title: "Application accepted".to_string(),
            body: "Your application was accepted".to_string(),
            subject: "Good news".to_string(),
            deep_link: "volhub://applications/7".to_string(),
            application_id: 7,
            old_status: "PENDING".to_string(),
            new_status: "ACCEPTED".to_string(),
            ..Default::default()
        },
        sender_service: Some("VolHub_ApplicationsService".to_string()),
        timestamp: Some(1_717_000_000),
    }
}

pub fn to_body(envelope: &NotificationEnvelope) -> Vec<u8> {
    serde_json::to_vec(envelope).unwrap()
}
