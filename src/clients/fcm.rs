use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use gcp_auth::TokenProvider;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::{
    clients::sender::PushSender,
    config::Config,
    models::{
        dispatch::DeliveryOutcome,
        fcm::{FcmErrorResponse, FcmMessage, FcmNotification, FcmRequest},
    },
};

const FCM_SCOPES: &[&str] = &["https://www.googleapis.com/auth/firebase.messaging"];

pub enum FcmAuth {
    ServiceAccount(Arc<dyn TokenProvider>),
    Static(String),
}

pub struct FcmClient {
    http_client: Client,
    endpoint: String,
    auth: FcmAuth,
}

impl FcmClient {
    /// Resolves Google credentials up front so a missing service account
    /// fails at startup rather than on the first push.
    pub async fn new(config: &Config, project_id: &str) -> Result<Self, Error> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| anyhow!("Failed to load Google credentials for FCM: {}", e))?;

        let client = Self::with_auth(
            &config.fcm_base_url,
            project_id,
            FcmAuth::ServiceAccount(provider),
            Duration::from_secs(config.fcm_timeout_seconds),
        )?;

        info!(project_id, "FCM client initialized");

        Ok(client)
    }

    pub fn with_auth(
        base_url: &str,
        project_id: &str,
        auth: FcmAuth,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        Ok(Self {
            http_client,
            endpoint: format!(
                "{}/v1/projects/{}/messages:send",
                base_url.trim_end_matches('/'),
                project_id
            ),
            auth,
        })
    }

    async fn bearer_token(&self) -> Result<String, Error> {
        match &self.auth {
            FcmAuth::ServiceAccount(provider) => {
                let token = provider.token(FCM_SCOPES).await?;
                Ok(token.as_str().to_string())
            }
            FcmAuth::Static(token) => Ok(token.clone()),
        }
    }

    fn build_request(
        device_token: &str,
        title: &str,
        body: &str,
        deep_link: Option<&str>,
    ) -> FcmRequest {
        let data = deep_link.map(|link| {
            let mut data = HashMap::new();
            data.insert("deep_link".to_string(), link.to_string());
            data
        });

        FcmRequest {
            message: FcmMessage {
                token: device_token.to_string(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data,
            },
        }
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        deep_link: Option<&str>,
    ) -> DeliveryOutcome {
        debug!(device_token, "Sending FCM push notification");

        let token = match self.bearer_token().await {
            Ok(token) => token,
            Err(e) => {
                return DeliveryOutcome::TransientFailure(format!("FCM token fetch failed: {}", e));
            }
        };

        let request = Self::build_request(device_token, title, body, deep_link);

        let response = match self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DeliveryOutcome::TransientFailure(format!("FCM request failed: {}", e)),
        };

        let status = response.status();

        if status.is_success() {
            info!("FCM push notification sent successfully");
            return DeliveryOutcome::Delivered;
        }

        let error_text = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<FcmErrorResponse>(&error_text)
            .map(|e| format!("{} {}: {}", e.error.code, e.error.status, e.error.message))
            .unwrap_or_else(|_| format!("{}: {}", status, error_text));

        classify_status(status, reason)
    }
}

/// Maps an FCM HTTP v1 error status onto the delivery outcome taxonomy.
pub fn classify_status(status: StatusCode, reason: String) -> DeliveryOutcome {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeliveryOutcome::Misconfigured(reason),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            DeliveryOutcome::TransientFailure(reason)
        }
        s if s.is_server_error() => DeliveryOutcome::TransientFailure(reason),
        _ => DeliveryOutcome::PermanentFailure(reason),
    }
}
