use notification_service::handlers::router::{Audience, HandlerStrategy, ROUTES, Route, render, route};

use crate::common::{envelope, recipient};

/// Test: Every status tag shares the volunteer status handler
#[test]
fn test_status_family_shares_handler() {
    for tag in [
        "APPLICATION_ACCEPTED",
        "APPLICATION_REJECTED",
        "APPLICATION_COMPLETED",
        "APPLICATION_STATUS_CHANGED",
        "VOLUNTEER_APPLICATION_STATUS_UPDATE",
    ] {
        assert_eq!(
            route(tag),
            Route::Handler(HandlerStrategy::ApplicationStatusUpdate),
            "tag {} should route to the status handler",
            tag
        );
    }
}

/// Test: Dedicated families route to their own handlers
#[test]
fn test_dedicated_handlers() {
    assert_eq!(
        route("APPLICATION_WITHDRAWN"),
        Route::Handler(HandlerStrategy::NgoApplicationEvent)
    );
    assert_eq!(
        route("NGO_NEW_APPLICATION"),
        Route::Handler(HandlerStrategy::NgoNewApplication)
    );
    assert_eq!(
        route("VOLUNTEER_NEW_MATCHING_OPPORTUNITY"),
        Route::Handler(HandlerStrategy::VolunteerNewOpportunity)
    );
    assert_eq!(
        route("OPPORTUNITY_UPDATED"),
        Route::Handler(HandlerStrategy::OpportunityUpdated)
    );
    assert_eq!(
        route("OPPORTUNITY_DELETED"),
        Route::Handler(HandlerStrategy::OpportunityDeleted)
    );
}

/// Test: Unknown and differently cased tags are unrecognized
#[test]
fn test_unknown_tags_are_unrecognized() {
    assert_eq!(route("UNKNOWN_FUTURE_TYPE"), Route::Unrecognized);
    assert_eq!(route("ngo_new_application"), Route::Unrecognized);
    assert_eq!(route(""), Route::Unrecognized);
}

/// Test: The routing table has no duplicate tags
#[test]
fn test_routing_table_tags_are_unique() {
    let mut tags: Vec<&str> = ROUTES.iter().map(|(tag, _)| *tag).collect();
    let total = tags.len();
    tags.sort_unstable();
    tags.dedup();

    assert_eq!(tags.len(), total);
}

/// Test: Audiences follow the event families
#[test]
fn test_audiences() {
    assert_eq!(HandlerStrategy::ApplicationStatusUpdate.audience(), Audience::Volunteer);
    assert_eq!(HandlerStrategy::NgoNewApplication.audience(), Audience::Ngo);
    assert_eq!(HandlerStrategy::NgoApplicationEvent.audience(), Audience::Ngo);
    assert_eq!(HandlerStrategy::VolunteerNewOpportunity.audience(), Audience::Volunteer);
}

/// Test: Rendering falls back to the title when no subject is given
#[test]
fn test_render_subject_falls_back_to_title() {
    let mut envelope = envelope("NGO_NEW_APPLICATION", recipient(true, true));
    envelope.payload.subject.clear();
    envelope.payload.deep_link.clear();

    let rendered = render(&envelope);

    assert_eq!(rendered.subject, "Application accepted");
    assert_eq!(rendered.deep_link, None);
    assert_eq!(rendered.html_body, None);
}

/// Test: Rendering carries payload content through untouched
#[test]
fn test_render_uses_payload_content() {
    let mut envelope = envelope("APPLICATION_ACCEPTED", recipient(true, true));
    envelope.payload.body_html = "<p>Accepted</p>".to_string();

    let rendered = render(&envelope);

    assert_eq!(rendered.title, "Application accepted");
    assert_eq!(rendered.body, "Your application was accepted");
    assert_eq!(rendered.subject, "Good news");
    assert_eq!(rendered.html_body.as_deref(), Some("<p>Accepted</p>"));
    assert_eq!(rendered.deep_link.as_deref(), Some("volhub://applications/7"));
}
