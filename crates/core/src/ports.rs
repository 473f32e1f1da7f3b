//! Port interfaces implemented by the infrastructure layer.

use async_trait::async_trait;
use meetbridge_domain::{
    EventAttendeesPatch, EventCreateRequest, EventTimesPatch, GraphEvent, GraphOnlineMeeting,
    GraphSubscription, MeetingRecord, OnlineMeetingParticipantsPatch, OnlineMeetingTimesPatch,
    RecordKind, Result, SubscriptionRequest,
};

/// Supplies a currently-valid bearer token for the remote API.
///
/// Returns `Ok(None)` when the integration is unauthenticated or the token
/// cannot be refreshed; background callers abort silently on `None`,
/// interactive callers surface an auth error.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>>;
}

/// Thin client over the remote calendar/meeting REST API.
///
/// Non-2xx responses map to `BridgeError::NotFound` (404) or
/// `BridgeError::Network` (anything else, with the response body logged by
/// the implementation).
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Fetch an event resource by absolute URL (webhook `resource` refs).
    async fn fetch_event_resource(&self, token: &str, url: &str) -> Result<GraphEvent>;

    async fn get_event(&self, token: &str, event_id: &str) -> Result<GraphEvent>;
    async fn create_event(&self, token: &str, body: &EventCreateRequest) -> Result<GraphEvent>;
    async fn patch_event_attendees(
        &self,
        token: &str,
        event_id: &str,
        body: &EventAttendeesPatch,
    ) -> Result<()>;
    async fn patch_event_times(
        &self,
        token: &str,
        event_id: &str,
        body: &EventTimesPatch,
    ) -> Result<()>;
    async fn delete_event(&self, token: &str, event_id: &str) -> Result<()>;
    /// Resolve a calendar-event id from a Teams join URL, `None` when the
    /// filter matches nothing.
    async fn find_event_id_by_join_url(&self, token: &str, join_url: &str)
        -> Result<Option<String>>;

    // Legacy online-meeting shape.
    async fn get_online_meeting(&self, token: &str, meeting_id: &str)
        -> Result<GraphOnlineMeeting>;
    async fn patch_online_meeting_participants(
        &self,
        token: &str,
        meeting_id: &str,
        body: &OnlineMeetingParticipantsPatch,
    ) -> Result<()>;
    async fn patch_online_meeting_times(
        &self,
        token: &str,
        meeting_id: &str,
        body: &OnlineMeetingTimesPatch,
    ) -> Result<()>;
    async fn delete_online_meeting(&self, token: &str, meeting_id: &str) -> Result<()>;
    async fn find_online_meeting_id_by_join_url(
        &self,
        token: &str,
        join_url: &str,
    ) -> Result<Option<String>>;

    // Change-notification subscriptions.
    async fn create_subscription(
        &self,
        token: &str,
        request: &SubscriptionRequest,
    ) -> Result<GraphSubscription>;
    /// Extend a subscription's expiry. `Ok(false)` means the provider
    /// rejected the renewal (subscription gone or expired) and the caller
    /// should recreate.
    async fn renew_subscription(
        &self,
        token: &str,
        subscription_id: &str,
        expires_at: &str,
    ) -> Result<bool>;
}

/// Persistence for meeting records and their participant rows.
#[async_trait]
pub trait MeetingRecordRepository: Send + Sync {
    /// Look up the record tracking a remote event id. `Ok(None)` when the
    /// event is not tracked locally — a normal outcome, not an error.
    async fn find_by_remote_event_id(&self, remote_event_id: &str)
        -> Result<Option<MeetingRecord>>;

    /// Load a record by kind and local key. `NotFound` when absent.
    async fn load(&self, kind: RecordKind, name: &str) -> Result<MeetingRecord>;

    /// Persist participant attending-status changes. System-driven write:
    /// validation and permission hooks are bypassed.
    async fn save_participants(&self, record: &MeetingRecord) -> Result<()>;

    /// Store or clear the remote linkage of a record.
    async fn set_remote_link(
        &self,
        kind: RecordKind,
        name: &str,
        remote_event_id: Option<&str>,
        meeting_url: Option<&str>,
    ) -> Result<()>;
}

/// Mapping between local user emails and remote directory object ids.
#[async_trait]
pub trait UserLinkRepository: Send + Sync {
    async fn azure_object_id(&self, email: &str) -> Result<Option<String>>;
    async fn set_azure_object_id(&self, email: &str, azure_id: &str) -> Result<()>;
}

/// Single-value configuration store (subscription id, tokens).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}
