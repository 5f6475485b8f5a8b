use async_trait::async_trait;
use tracing::info;

use crate::models::dispatch::DeliveryOutcome;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        address: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> DeliveryOutcome;
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        deep_link: Option<&str>,
    ) -> DeliveryOutcome;
}

/// Stand-in used until an email provider is wired in. Logs and reports delivered.
#[derive(Debug, Default, Clone)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        address: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> DeliveryOutcome {
        info!(
            address,
            subject,
            body_len = text_body.len(),
            has_html = html_body.is_some(),
            "Email send (log only)"
        );
        DeliveryOutcome::Delivered
    }
}

/// Stand-in used when FCM is not configured.
#[derive(Debug, Default, Clone)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        deep_link: Option<&str>,
    ) -> DeliveryOutcome {
        info!(
            device_token,
            title,
            body,
            deep_link = deep_link.unwrap_or_default(),
            "Push send (log only)"
        );
        DeliveryOutcome::Delivered
    }
}
