use tracing::info;

use crate::models::{
    dispatch::Channel,
    message::{NotificationEnvelope, RenderedNotification},
};

/// One variant per event family. Adding a family means a new variant here
/// plus its tags in `ROUTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerStrategy {
    ApplicationStatusUpdate,
    NgoApplicationEvent,
    NgoNewApplication,
    VolunteerNewOpportunity,
    OpportunityUpdated,
    OpportunityDeleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Handler(HandlerStrategy),
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Volunteer,
    Ngo,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Volunteer => "volunteer",
            Audience::Ngo => "ngo",
        }
    }
}

pub const ROUTES: &[(&str, HandlerStrategy)] = &[
    ("APPLICATION_ACCEPTED", HandlerStrategy::ApplicationStatusUpdate),
    ("APPLICATION_REJECTED", HandlerStrategy::ApplicationStatusUpdate),
    ("APPLICATION_COMPLETED", HandlerStrategy::ApplicationStatusUpdate),
    ("APPLICATION_STATUS_CHANGED", HandlerStrategy::ApplicationStatusUpdate),
    ("VOLUNTEER_APPLICATION_STATUS_UPDATE", HandlerStrategy::ApplicationStatusUpdate),
    ("APPLICATION_WITHDRAWN", HandlerStrategy::NgoApplicationEvent),
    ("NGO_NEW_APPLICATION", HandlerStrategy::NgoNewApplication),
    ("VOLUNTEER_NEW_MATCHING_OPPORTUNITY", HandlerStrategy::VolunteerNewOpportunity),
    ("OPPORTUNITY_UPDATED", HandlerStrategy::OpportunityUpdated),
    ("OPPORTUNITY_DELETED", HandlerStrategy::OpportunityDeleted),
];

pub fn route(notification_type: &str) -> Route {
    ROUTES
        .iter()
        .find(|(tag, _)| *tag == notification_type)
        .map(|(_, strategy)| Route::Handler(*strategy))
        .unwrap_or(Route::Unrecognized)
}

impl HandlerStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerStrategy::ApplicationStatusUpdate => "application_status_update",
            HandlerStrategy::NgoApplicationEvent => "ngo_application_event",
            HandlerStrategy::NgoNewApplication => "ngo_new_application",
            HandlerStrategy::VolunteerNewOpportunity => "volunteer_new_opportunity",
            HandlerStrategy::OpportunityUpdated => "opportunity_updated",
            HandlerStrategy::OpportunityDeleted => "opportunity_deleted",
        }
    }

    pub fn audience(&self) -> Audience {
        match self {
            HandlerStrategy::ApplicationStatusUpdate
            | HandlerStrategy::VolunteerNewOpportunity
            | HandlerStrategy::OpportunityDeleted => Audience::Volunteer,
            HandlerStrategy::NgoApplicationEvent
            | HandlerStrategy::NgoNewApplication
            | HandlerStrategy::OpportunityUpdated => Audience::Ngo,
        }
    }

    /// Channels this family delivers on, in attempt order.
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            // New matches are primarily a push experience.
            HandlerStrategy::VolunteerNewOpportunity => &[Channel::Push, Channel::Email],
            HandlerStrategy::ApplicationStatusUpdate
            | HandlerStrategy::NgoApplicationEvent
            | HandlerStrategy::NgoNewApplication
            | HandlerStrategy::OpportunityUpdated
            | HandlerStrategy::OpportunityDeleted => &[Channel::Email, Channel::Push],
        }
    }

    /// Logs the event-specific fields this family cares about.
    pub fn log_event(&self, envelope: &NotificationEnvelope) {
        let payload = &envelope.payload;
        let user_id = envelope.recipient.user_id.as_str();
        let notification_type = envelope.notification_type.as_str();

        match self {
            HandlerStrategy::ApplicationStatusUpdate => info!(
                notification_type,
                user_id,
                application_id = payload.application_id,
                old_status = %payload.old_status,
                new_status = %payload.new_status,
                volunteer_name = %payload.volunteer_name,
                "Handling volunteer application status update"
            ),
            HandlerStrategy::NgoApplicationEvent => info!(
                notification_type,
                user_id,
                application_id = payload.application_id,
                volunteer_name = %payload.volunteer_name,
                opportunity_title = %payload.opportunity_title,
                "Handling NGO application event"
            ),
            HandlerStrategy::NgoNewApplication => info!(
                notification_type,
                user_id,
                application_id = payload.application_id,
                volunteer_id = payload.volunteer_id,
                volunteer_name = %payload.volunteer_name,
                opportunity_title = %payload.opportunity_title,
                "Handling NGO new application"
            ),
            HandlerStrategy::VolunteerNewOpportunity => info!(
                notification_type,
                user_id,
                opportunity_id = payload.opportunity_id,
                opportunity_title = %payload.opportunity_title,
                ngo_name = %payload.ngo_name,
                "Handling volunteer new matching opportunity"
            ),
            HandlerStrategy::OpportunityUpdated => info!(
                notification_type,
                user_id,
                opportunity_id = payload.opportunity_id,
                opportunity_title = %payload.opportunity_title,
                "Handling opportunity update"
            ),
            HandlerStrategy::OpportunityDeleted => info!(
                notification_type,
                user_id,
                opportunity_id = payload.opportunity_id,
                opportunity_title = %payload.opportunity_title,
                ngo_id = payload.ngo_id,
                "Handling opportunity deletion"
            ),
        }
    }
}

/// Payload content arrives already rendered; only the email subject falls
/// back to the title.
pub fn render(envelope: &NotificationEnvelope) -> RenderedNotification {
    let payload = &envelope.payload;

    let subject = if payload.subject.is_empty() {
        payload.title.clone()
    } else {
        payload.subject.clone()
    };

    RenderedNotification {
        title: payload.title.clone(),
        body: payload.body.clone(),
        subject,
        html_body: non_empty(&payload.body_html),
        deep_link: non_empty(&payload.deep_link),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
