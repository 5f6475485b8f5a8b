use tracing::{debug, info};

use crate::models::{dispatch::Channel, message::Recipient, validation::has_address};

/// Whether `channel` should be attempted for `recipient`: the preference must
/// be on and the matching address or token must be present.
pub fn attempt(recipient: &Recipient, channel: Channel) -> bool {
    match channel {
        Channel::Push => {
            recipient.prefs.receive_push && has_address(recipient.device_token.as_deref())
        }
        Channel::Email => {
            recipient.prefs.receive_email && has_address(recipient.email_address.as_deref())
        }
    }
}

/// Same decision as [`attempt`], with the reason logged.
pub fn evaluate(recipient: &Recipient, channel: Channel) -> bool {
    let (preference, address_present) = match channel {
        Channel::Push => (
            recipient.prefs.receive_push,
            has_address(recipient.device_token.as_deref()),
        ),
        Channel::Email => (
            recipient.prefs.receive_email,
            has_address(recipient.email_address.as_deref()),
        ),
    };

    let allowed = attempt(recipient, channel);

    if allowed {
        debug!(user_id = %recipient.user_id, %channel, "Channel gate passed");
    } else {
        info!(
            user_id = %recipient.user_id,
            %channel,
            preference,
            address_present,
            "Skipping channel"
        );
    }

    allowed
}
