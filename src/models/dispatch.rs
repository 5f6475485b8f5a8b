use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Push,
    Email,
}

impl Channel {
    pub const ALL: &'static [Channel] = &[Channel::Email, Channel::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Push => "push",
            Channel::Email => "email",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

/// What a channel sender reports for a single send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Provider or network unavailable; the same send may succeed later.
    TransientFailure(String),
    /// Bad address, token or content; retrying cannot help.
    PermanentFailure(String),
    /// The sender itself is unusable (credentials, project setup).
    Misconfigured(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Message-level result after combining every attempted channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Success,
    RetryableFailure,
    PermanentFailure,
}

impl DispatchResult {
    /// Folds per-channel outcomes. Any transient failure wins so the broker
    /// redelivers; permanent per-channel failures are terminal and count as
    /// done. An empty set means nothing had to be sent.
    pub fn aggregate<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a DeliveryOutcome>,
    {
        let mut misconfigured = false;

        for outcome in outcomes {
            match outcome {
                DeliveryOutcome::TransientFailure(_) => return DispatchResult::RetryableFailure,
                DeliveryOutcome::Misconfigured(_) => misconfigured = true,
                DeliveryOutcome::Delivered | DeliveryOutcome::PermanentFailure(_) => {}
            }
        }

        if misconfigured {
            DispatchResult::PermanentFailure
        } else {
            DispatchResult::Success
        }
    }

    pub fn ack_decision(&self) -> AckDecision {
        match self {
            DispatchResult::Success => AckDecision::Ack,
            DispatchResult::RetryableFailure => AckDecision::Reject { requeue: true },
            DispatchResult::PermanentFailure => AckDecision::Reject { requeue: false },
        }
    }
}

impl Display for DispatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DispatchResult::Success => write!(f, "success"),
            DispatchResult::RetryableFailure => write!(f, "retryable_failure"),
            DispatchResult::PermanentFailure => write!(f, "permanent_failure"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    Ack,
    Reject { requeue: bool },
}
