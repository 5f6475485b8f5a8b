use serde_json::Value;

use crate::{error::DecodeError, models::message::NotificationEnvelope};

/// Parses a broker body into an envelope. Unknown fields are ignored and
/// missing optional ones take their zero value.
pub fn decode_envelope(body: &[u8]) -> Result<NotificationEnvelope, DecodeError> {
    let value: Value = serde_json::from_slice(body)?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let envelope: NotificationEnvelope = serde_json::from_value(value)?;
    validate_envelope(&envelope)?;

    Ok(envelope)
}

pub fn validate_envelope(envelope: &NotificationEnvelope) -> Result<(), DecodeError> {
    if envelope.notification_type.trim().is_empty() {
        return Err(DecodeError::MissingField("notification_type"));
    }

    if envelope.recipient.user_id.trim().is_empty() {
        return Err(DecodeError::MissingField("recipient.user_id"));
    }

    Ok(())
}

/// True when an optional address or token holds something other than whitespace.
pub fn has_address(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
