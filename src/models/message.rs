use serde::{Deserialize, Deserializer, Serialize};

/// Top-level body of a broker message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub notification_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub recipient: Recipient,

    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: Payload,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub prefs: Preferences,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, deserialize_with = "null_as_default")]
    pub receive_push: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub receive_email: bool,
}

/// Notification content prepared by the producing service. Every field is
/// optional on the wire; handlers read only what their family needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub body_html: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub deep_link: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub template_name: String,

    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub application_id: i64,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub opportunity_id: i64,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub ngo_id: i64,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub volunteer_id: i64,

    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub old_status: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub new_status: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub opportunity_title: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub volunteer_name: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub ngo_name: String,
}

/// Content handed to the channel senders after a handler has read the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedNotification {
    pub title: String,
    pub body: String,
    pub subject: String,
    pub html_body: Option<String>,
    pub deep_link: Option<String>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

// Producers occasionally send explicit nulls for fields they have no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
