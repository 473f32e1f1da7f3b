//! Shared mock port implementations for service tests.

use std::sync::Mutex;

use async_trait::async_trait;
use meetbridge_domain::{
    BridgeError, EventAttendeesPatch, EventCreateRequest, EventTimesPatch, GraphEvent,
    GraphOnlineMeeting, GraphSubscription, MeetingRecord, OnlineMeetingParticipantsPatch,
    OnlineMeetingTimesPatch, RecordKind, Result, SubscriptionRequest,
};

use crate::ports::{
    AccessTokenProvider, CalendarApi, MeetingRecordRepository, SettingsStore, UserLinkRepository,
};

fn not_stubbed<T>(method: &str) -> Result<T> {
    Err(BridgeError::Internal(format!("mock method not stubbed: {method}")))
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> std::sync::MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("mock mutex poisoned: {what}"),
    }
}

/// Token provider mock, either fixed-token or unauthenticated.
pub struct MockTokens {
    token: Option<String>,
}

impl MockTokens {
    pub fn with_token(token: &str) -> Self {
        Self { token: Some(token.to_string()) }
    }

    pub fn unauthenticated() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl AccessTokenProvider for MockTokens {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }
}

/// Calendar API mock with per-method stubs and call recording.
#[derive(Default)]
pub struct MockCalendarApi {
    fetch_event: Mutex<Option<Result<GraphEvent>>>,
    fetched_urls: Mutex<Vec<String>>,

    get_event: Mutex<Option<Result<GraphEvent>>>,
    create_event: Mutex<Option<Result<GraphEvent>>>,
    created_events: Mutex<Vec<EventCreateRequest>>,
    attendee_patches: Mutex<Vec<(String, EventAttendeesPatch)>>,
    time_patches: Mutex<Vec<(String, EventTimesPatch)>>,
    deleted_events: Mutex<Vec<String>>,
    event_id_for_join_url: Mutex<Option<String>>,

    online_meeting: Mutex<Option<Result<GraphOnlineMeeting>>>,
    meeting_participant_patches: Mutex<Vec<(String, OnlineMeetingParticipantsPatch)>>,
    meeting_time_patches: Mutex<Vec<(String, OnlineMeetingTimesPatch)>>,
    deleted_meetings: Mutex<Vec<String>>,
    meeting_id_for_join_url: Mutex<Option<String>>,

    create_subscription: Mutex<Option<Result<GraphSubscription>>>,
    subscription_requests: Mutex<Vec<SubscriptionRequest>>,
    renew_subscription: Mutex<Option<Result<bool>>>,
    renew_calls: Mutex<Vec<(String, String)>>,
}

impl MockCalendarApi {
    pub fn stub_fetch_event(&self, result: Result<GraphEvent>) {
        *lock(&self.fetch_event, "fetch_event") = Some(result);
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        lock(&self.fetched_urls, "fetched_urls").clone()
    }

    pub fn stub_get_event(&self, result: Result<GraphEvent>) {
        *lock(&self.get_event, "get_event") = Some(result);
    }

    pub fn stub_create_event(&self, result: Result<GraphEvent>) {
        *lock(&self.create_event, "create_event") = Some(result);
    }

    pub fn created_events(&self) -> Vec<EventCreateRequest> {
        lock(&self.created_events, "created_events").clone()
    }

    pub fn stub_event_id_for_join_url(&self, id: Option<&str>) {
        *lock(&self.event_id_for_join_url, "event_id_for_join_url") =
            id.map(ToString::to_string);
    }

    pub fn attendee_patches(&self) -> Vec<(String, EventAttendeesPatch)> {
        lock(&self.attendee_patches, "attendee_patches").clone()
    }

    pub fn time_patches(&self) -> Vec<(String, EventTimesPatch)> {
        lock(&self.time_patches, "time_patches").clone()
    }

    pub fn deleted_events(&self) -> Vec<String> {
        lock(&self.deleted_events, "deleted_events").clone()
    }

    pub fn stub_online_meeting(&self, result: Result<GraphOnlineMeeting>) {
        *lock(&self.online_meeting, "online_meeting") = Some(result);
    }

    pub fn stub_meeting_id_for_join_url(&self, id: Option<&str>) {
        *lock(&self.meeting_id_for_join_url, "meeting_id_for_join_url") =
            id.map(ToString::to_string);
    }

    pub fn meeting_participant_patches(&self) -> Vec<(String, OnlineMeetingParticipantsPatch)> {
        lock(&self.meeting_participant_patches, "meeting_participant_patches").clone()
    }

    pub fn meeting_time_patches(&self) -> Vec<(String, OnlineMeetingTimesPatch)> {
        lock(&self.meeting_time_patches, "meeting_time_patches").clone()
    }

    pub fn deleted_meetings(&self) -> Vec<String> {
        lock(&self.deleted_meetings, "deleted_meetings").clone()
    }

    pub fn stub_create_subscription(&self, result: Result<GraphSubscription>) {
        *lock(&self.create_subscription, "create_subscription") = Some(result);
    }

    pub fn subscription_requests(&self) -> Vec<SubscriptionRequest> {
        lock(&self.subscription_requests, "subscription_requests").clone()
    }

    pub fn stub_renew_subscription(&self, result: Result<bool>) {
        *lock(&self.renew_subscription, "renew_subscription") = Some(result);
    }

    pub fn renew_calls(&self) -> Vec<(String, String)> {
        lock(&self.renew_calls, "renew_calls").clone()
    }
}

#[async_trait]
impl CalendarApi for MockCalendarApi {
    async fn fetch_event_resource(&self, _token: &str, url: &str) -> Result<GraphEvent> {
        lock(&self.fetched_urls, "fetched_urls").push(url.to_string());
        lock(&self.fetch_event, "fetch_event")
            .clone()
            .unwrap_or_else(|| not_stubbed("fetch_event_resource"))
    }

    async fn get_event(&self, _token: &str, _event_id: &str) -> Result<GraphEvent> {
        lock(&self.get_event, "get_event").clone().unwrap_or_else(|| not_stubbed("get_event"))
    }

    async fn create_event(&self, _token: &str, body: &EventCreateRequest) -> Result<GraphEvent> {
        lock(&self.created_events, "created_events").push(body.clone());
        lock(&self.create_event, "create_event")
            .clone()
            .unwrap_or_else(|| not_stubbed("create_event"))
    }

    async fn patch_event_attendees(
        &self,
        _token: &str,
        event_id: &str,
        body: &EventAttendeesPatch,
    ) -> Result<()> {
        lock(&self.attendee_patches, "attendee_patches")
            .push((event_id.to_string(), body.clone()));
        Ok(())
    }

    async fn patch_event_times(
        &self,
        _token: &str,
        event_id: &str,
        body: &EventTimesPatch,
    ) -> Result<()> {
        lock(&self.time_patches, "time_patches").push((event_id.to_string(), body.clone()));
        Ok(())
    }

    async fn delete_event(&self, _token: &str, event_id: &str) -> Result<()> {
        lock(&self.deleted_events, "deleted_events").push(event_id.to_string());
        Ok(())
    }

    async fn find_event_id_by_join_url(
        &self,
        _token: &str,
        _join_url: &str,
    ) -> Result<Option<String>> {
        Ok(lock(&self.event_id_for_join_url, "event_id_for_join_url").clone())
    }

    async fn get_online_meeting(
        &self,
        _token: &str,
        _meeting_id: &str,
    ) -> Result<GraphOnlineMeeting> {
        lock(&self.online_meeting, "online_meeting")
            .clone()
            .unwrap_or_else(|| not_stubbed("get_online_meeting"))
    }

    async fn patch_online_meeting_participants(
        &self,
        _token: &str,
        meeting_id: &str,
        body: &OnlineMeetingParticipantsPatch,
    ) -> Result<()> {
        lock(&self.meeting_participant_patches, "meeting_participant_patches")
            .push((meeting_id.to_string(), body.clone()));
        Ok(())
    }

    async fn patch_online_meeting_times(
        &self,
        _token: &str,
        meeting_id: &str,
        body: &OnlineMeetingTimesPatch,
    ) -> Result<()> {
        lock(&self.meeting_time_patches, "meeting_time_patches")
            .push((meeting_id.to_string(), body.clone()));
        Ok(())
    }

    async fn delete_online_meeting(&self, _token: &str, meeting_id: &str) -> Result<()> {
        lock(&self.deleted_meetings, "deleted_meetings").push(meeting_id.to_string());
        Ok(())
    }

    async fn find_online_meeting_id_by_join_url(
        &self,
        _token: &str,
        _join_url: &str,
    ) -> Result<Option<String>> {
        Ok(lock(&self.meeting_id_for_join_url, "meeting_id_for_join_url").clone())
    }

    async fn create_subscription(
        &self,
        _token: &str,
        request: &SubscriptionRequest,
    ) -> Result<GraphSubscription> {
        lock(&self.subscription_requests, "subscription_requests").push(request.clone());
        lock(&self.create_subscription, "create_subscription")
            .clone()
            .unwrap_or_else(|| not_stubbed("create_subscription"))
    }

    async fn renew_subscription(
        &self,
        _token: &str,
        subscription_id: &str,
        expires_at: &str,
    ) -> Result<bool> {
        lock(&self.renew_calls, "renew_calls")
            .push((subscription_id.to_string(), expires_at.to_string()));
        lock(&self.renew_subscription, "renew_subscription")
            .clone()
            .unwrap_or_else(|| not_stubbed("renew_subscription"))
    }
}

/// Record repository mock holding at most one record.
#[derive(Default)]
pub struct MockRecords {
    record: Mutex<Option<MeetingRecord>>,
    saved: Mutex<Option<MeetingRecord>>,
    links: Mutex<Vec<(RecordKind, String, Option<String>, Option<String>)>>,
}

impl MockRecords {
    pub fn with_record(record: MeetingRecord) -> Self {
        Self { record: Mutex::new(Some(record)), ..Self::default() }
    }

    pub fn saved(&self) -> Option<MeetingRecord> {
        lock(&self.saved, "saved").clone()
    }

    pub fn remote_links(&self) -> Vec<(RecordKind, String, Option<String>, Option<String>)> {
        lock(&self.links, "links").clone()
    }
}

#[async_trait]
impl MeetingRecordRepository for MockRecords {
    async fn find_by_remote_event_id(
        &self,
        remote_event_id: &str,
    ) -> Result<Option<MeetingRecord>> {
        let guard = lock(&self.record, "record");
        Ok(guard
            .as_ref()
            .filter(|r| r.remote_event_id.as_deref() == Some(remote_event_id))
            .cloned())
    }

    async fn load(&self, kind: RecordKind, name: &str) -> Result<MeetingRecord> {
        let guard = lock(&self.record, "record");
        guard
            .as_ref()
            .filter(|r| r.kind == kind && r.name == name)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(format!("{} {name}", kind.label())))
    }

    async fn save_participants(&self, record: &MeetingRecord) -> Result<()> {
        *lock(&self.saved, "saved") = Some(record.clone());
        *lock(&self.record, "record") = Some(record.clone());
        Ok(())
    }

    async fn set_remote_link(
        &self,
        kind: RecordKind,
        name: &str,
        remote_event_id: Option<&str>,
        meeting_url: Option<&str>,
    ) -> Result<()> {
        lock(&self.links, "links").push((
            kind,
            name.to_string(),
            remote_event_id.map(ToString::to_string),
            meeting_url.map(ToString::to_string),
        ));
        let mut guard = lock(&self.record, "record");
        if let Some(record) = guard.as_mut() {
            if record.kind == kind && record.name == name {
                record.remote_event_id = remote_event_id.map(ToString::to_string);
                record.meeting_url = meeting_url.map(ToString::to_string);
            }
        }
        Ok(())
    }
}

/// In-memory user-link mapping.
#[derive(Default)]
pub struct MockUserLinks {
    links: Mutex<Vec<(String, String)>>,
}

impl MockUserLinks {
    pub fn with_links(links: &[(&str, &str)]) -> Self {
        Self {
            links: Mutex::new(
                links.iter().map(|(e, id)| (e.to_string(), id.to_string())).collect(),
            ),
        }
    }
}

#[async_trait]
impl UserLinkRepository for MockUserLinks {
    async fn azure_object_id(&self, email: &str) -> Result<Option<String>> {
        let email = email.to_lowercase();
        Ok(lock(&self.links, "links")
            .iter()
            .find(|(e, _)| e.to_lowercase() == email)
            .map(|(_, id)| id.clone()))
    }

    async fn set_azure_object_id(&self, email: &str, azure_id: &str) -> Result<()> {
        lock(&self.links, "links").push((email.to_string(), azure_id.to_string()));
        Ok(())
    }
}

/// In-memory settings store.
#[derive(Default)]
pub struct MockSettings {
    values: Mutex<Vec<(String, String)>>,
}

impl MockSettings {
    pub fn with_value(key: &str, value: &str) -> Self {
        Self { values: Mutex::new(vec![(key.to_string(), value.to_string())]) }
    }

    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.values, "values").iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl SettingsStore for MockSettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = lock(&self.values, "values");
        guard.retain(|(k, _)| k != key);
        guard.push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        lock(&self.values, "values").retain(|(k, _)| k != key);
        Ok(())
    }
}
