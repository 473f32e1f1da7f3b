//! Microsoft Graph wire types
//!
//! Serde representations of the Graph payloads this service exchanges:
//! calendar events with attendee RSVP state, legacy online meetings, change
//! notifications, and subscription management bodies.

use serde::{Deserialize, Serialize};

/// Calendar event as returned by `GET /me/events/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphEvent {
    pub id: String,
    pub subject: Option<String>,
    pub start: Option<GraphDateTime>,
    pub end: Option<GraphDateTime>,
    #[serde(default)]
    pub attendees: Vec<GraphAttendee>,
    #[serde(rename = "onlineMeeting")]
    pub online_meeting: Option<GraphOnlineMeetingInfo>,
    #[serde(rename = "webLink")]
    pub web_link: Option<String>,
}

impl GraphEvent {
    /// Join URL of the attached Teams meeting, falling back to the Outlook
    /// web link.
    pub fn join_url(&self) -> Option<&str> {
        self.online_meeting
            .as_ref()
            .and_then(|m| m.join_url.as_deref())
            .or(self.web_link.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAttendee {
    #[serde(rename = "emailAddress")]
    pub email_address: GraphEmailAddress,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attendee_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GraphResponseStatus>,
}

impl GraphAttendee {
    /// Build a required attendee from an email address.
    pub fn required(address: impl Into<String>) -> Self {
        Self {
            email_address: GraphEmailAddress { address: address.into(), name: None },
            attendee_type: Some("required".to_string()),
            status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEmailAddress {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphResponseStatus {
    pub response: Option<String>,
}

/// Legacy `GET /me/onlineMeetings/{id}` shape; participants are keyed by
/// directory object identity rather than email.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphOnlineMeeting {
    pub id: String,
    pub subject: Option<String>,
    #[serde(rename = "startDateTime")]
    pub start_date_time: Option<String>,
    #[serde(rename = "endDateTime")]
    pub end_date_time: Option<String>,
    pub participants: Option<GraphMeetingParticipants>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphMeetingParticipants {
    #[serde(default)]
    pub attendees: Vec<GraphIdentityAttendee>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphIdentityAttendee {
    pub identity: GraphIdentitySet,
}

impl GraphIdentityAttendee {
    pub fn from_object_id(id: impl Into<String>) -> Self {
        Self {
            identity: GraphIdentitySet {
                user: GraphIdentity { id: Some(id.into()), display_name: None, email: None },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphIdentitySet {
    pub user: GraphIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphIdentity {
    pub id: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphOnlineMeetingInfo {
    #[serde(rename = "joinUrl")]
    pub join_url: Option<String>,
}

/// Inbound webhook payload: a batch of change notifications.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotificationBatch {
    #[serde(default)]
    pub value: Vec<ChangeNotification>,
}

/// One entry of a webhook batch, referencing a changed remote resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeNotification {
    pub resource: Option<String>,
    #[serde(rename = "clientState")]
    pub client_state: Option<String>,
}

/// Body for `POST /me/events` when creating a Teams-backed event.
#[derive(Debug, Clone, Serialize)]
pub struct EventCreateRequest {
    pub subject: String,
    pub start: GraphDateTime,
    pub end: GraphDateTime,
    #[serde(rename = "isOnlineMeeting")]
    pub is_online_meeting: bool,
    #[serde(rename = "onlineMeetingProvider")]
    pub online_meeting_provider: String,
    pub attendees: Vec<GraphAttendee>,
}

/// Attendee-only event PATCH body.
#[derive(Debug, Clone, Serialize)]
pub struct EventAttendeesPatch {
    pub attendees: Vec<GraphAttendee>,
}

/// Start/end-only event PATCH body.
#[derive(Debug, Clone, Serialize)]
pub struct EventTimesPatch {
    pub start: GraphDateTime,
    pub end: GraphDateTime,
}

/// Participants PATCH body for the legacy online-meeting shape.
#[derive(Debug, Clone, Serialize)]
pub struct OnlineMeetingParticipantsPatch {
    pub participants: GraphMeetingParticipants,
}

/// Time PATCH body for the legacy online-meeting shape.
#[derive(Debug, Clone, Serialize)]
pub struct OnlineMeetingTimesPatch {
    #[serde(rename = "startDateTime")]
    pub start_date_time: String,
    #[serde(rename = "endDateTime")]
    pub end_date_time: String,
}

/// Body for `POST /subscriptions`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    #[serde(rename = "changeType")]
    pub change_type: String,
    #[serde(rename = "notificationUrl")]
    pub notification_url: String,
    pub resource: String,
    #[serde(rename = "expirationDateTime")]
    pub expiration_date_time: String,
    #[serde(rename = "clientState")]
    pub client_state: String,
}

/// Subscription resource as returned on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSubscription {
    pub id: String,
    #[serde(rename = "expirationDateTime")]
    pub expiration_date_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_deserializes_from_graph_shape() {
        let raw = serde_json::json!({
            "id": "AAMkAGe1",
            "subject": "Kickoff",
            "start": {"dateTime": "2026-03-02T09:00:00", "timeZone": "UTC"},
            "end": {"dateTime": "2026-03-02T10:00:00", "timeZone": "UTC"},
            "attendees": [
                {
                    "emailAddress": {"address": "alice@example.com", "name": "Alice"},
                    "status": {"response": "accepted", "time": "2026-03-01T12:00:00Z"}
                }
            ],
            "onlineMeeting": {"joinUrl": "https://teams.microsoft.com/l/meetup-join/abc"},
            "webLink": "https://outlook.office365.com/calendar/item/AAMkAGe1"
        });
        let event: GraphEvent = serde_json::from_value(raw).expect("event parses");
        assert_eq!(event.id, "AAMkAGe1");
        assert_eq!(event.attendees.len(), 1);
        assert_eq!(
            event.attendees[0].status.as_ref().and_then(|s| s.response.as_deref()),
            Some("accepted")
        );
        assert_eq!(event.join_url(), Some("https://teams.microsoft.com/l/meetup-join/abc"));
    }

    #[test]
    fn join_url_falls_back_to_web_link() {
        let raw = serde_json::json!({
            "id": "AAMkAGe2",
            "webLink": "https://outlook.office365.com/calendar/item/AAMkAGe2"
        });
        let event: GraphEvent = serde_json::from_value(raw).expect("event parses");
        assert_eq!(event.join_url(), Some("https://outlook.office365.com/calendar/item/AAMkAGe2"));
    }

    #[test]
    fn notification_batch_tolerates_missing_value() {
        let batch: NotificationBatch = serde_json::from_str("{}").expect("batch parses");
        assert!(batch.value.is_empty());
    }

    #[test]
    fn subscription_request_serializes_camel_case() {
        let body = SubscriptionRequest {
            change_type: "updated".to_string(),
            notification_url: "https://bridge.example.com/webhook/graph".to_string(),
            resource: "/me/events".to_string(),
            expiration_date_time: "2026-03-04T09:00:00Z".to_string(),
            client_state: "MeetbridgeRsvpSyncV1".to_string(),
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(json["changeType"], "updated");
        assert_eq!(json["notificationUrl"], "https://bridge.example.com/webhook/graph");
        assert_eq!(json["expirationDateTime"], "2026-03-04T09:00:00Z");
        assert_eq!(json["clientState"], "MeetbridgeRsvpSyncV1");
    }
}
