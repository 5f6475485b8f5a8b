use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    clients::sender::{EmailSender, PushSender},
    handlers::{
        gate,
        router::{self, HandlerStrategy},
    },
    models::{
        dispatch::{Channel, DeliveryOutcome, DispatchResult},
        message::{NotificationEnvelope, RenderedNotification},
    },
};

/// Runs the gated channel sends for one message and folds their outcomes.
#[derive(Clone)]
pub struct Dispatcher {
    email_sender: Arc<dyn EmailSender>,
    push_sender: Arc<dyn PushSender>,
    scope: Vec<Channel>,
}

impl Dispatcher {
    pub fn new(email_sender: Arc<dyn EmailSender>, push_sender: Arc<dyn PushSender>) -> Self {
        Self {
            email_sender,
            push_sender,
            scope: Channel::ALL.to_vec(),
        }
    }

    /// Restricts this dispatcher to the channels a queue is allowed to use.
    pub fn scoped(mut self, channels: &[Channel]) -> Self {
        self.scope = channels.to_vec();
        self
    }

    pub fn scope(&self) -> &[Channel] {
        &self.scope
    }

    pub async fn dispatch(
        &self,
        strategy: HandlerStrategy,
        envelope: &NotificationEnvelope,
    ) -> DispatchResult {
        let rendered = router::render(envelope);
        let mut outcomes = Vec::new();

        for &channel in strategy.channels() {
            if !self.scope.contains(&channel) {
                continue;
            }

            if !gate::evaluate(&envelope.recipient, channel) {
                continue;
            }

            let outcome = self.send(channel, envelope, &rendered).await;
            log_outcome(strategy, envelope, channel, &outcome);
            outcomes.push(outcome);
        }

        let result = DispatchResult::aggregate(&outcomes);

        info!(
            handler = strategy.name(),
            audience = strategy.audience().as_str(),
            user_id = %envelope.recipient.user_id,
            attempted = outcomes.len(),
            delivered = outcomes.iter().filter(|o| o.is_delivered()).count(),
            %result,
            "Dispatch finished"
        );

        result
    }

    async fn send(
        &self,
        channel: Channel,
        envelope: &NotificationEnvelope,
        rendered: &RenderedNotification,
    ) -> DeliveryOutcome {
        let recipient = &envelope.recipient;

        match channel {
            Channel::Email => {
                let address = recipient.email_address.as_deref().unwrap_or_default();
                self.email_sender
                    .send(
                        address,
                        &rendered.subject,
                        &rendered.body,
                        rendered.html_body.as_deref(),
                    )
                    .await
            }
            Channel::Push => {
                let token = recipient.device_token.as_deref().unwrap_or_default();
                self.push_sender
                    .send(
                        token,
                        &rendered.title,
                        &rendered.body,
                        rendered.deep_link.as_deref(),
                    )
                    .await
            }
        }
    }
}

fn log_outcome(
    strategy: HandlerStrategy,
    envelope: &NotificationEnvelope,
    channel: Channel,
    outcome: &DeliveryOutcome,
) {
    let user_id = envelope.recipient.user_id.as_str();
    let handler = strategy.name();

    match outcome {
        DeliveryOutcome::Delivered => {
            info!(handler, user_id, %channel, "Notification delivered")
        }
        DeliveryOutcome::TransientFailure(reason) => {
            warn!(handler, user_id, %channel, reason = %reason, "Transient delivery failure")
        }
        DeliveryOutcome::PermanentFailure(reason) => {
            warn!(handler, user_id, %channel, reason = %reason, "Permanent delivery failure, not retrying")
        }
        DeliveryOutcome::Misconfigured(reason) => {
            error!(handler, user_id, %channel, reason = %reason, "Channel sender misconfigured")
        }
    }
}
