//! Interactive meeting operations
//!
//! Create/update/reschedule/delete a Teams-backed calendar event for a
//! business record. A record's stored join URL is the correlation handle:
//! the remote id is re-derived from it by filter query, trying the calendar
//! event shape first and falling back to the legacy online-meeting shape.
//!
//! These are interactive paths: configuration and provider failures surface
//! to the caller, with authentication distinguished from provider rejection.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use meetbridge_domain::{
    BridgeError, EventAttendeesPatch, EventCreateRequest, EventTimesPatch, GraphAttendee,
    GraphDateTime, GraphIdentityAttendee, GraphMeetingParticipants, MeetingRecord,
    OnlineMeetingParticipantsPatch, OnlineMeetingTimesPatch, RecordKind, Result,
    MAX_MEETING_DURATION_SECS, MIN_MEETING_DURATION_SECS,
};
use tracing::{info, instrument, warn};

use crate::ports::{
    AccessTokenProvider, CalendarApi, MeetingRecordRepository, UserLinkRepository,
};

/// Result of a create-or-update meeting call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingOutcome {
    Created { meeting_url: String },
    AttendeesUpdated,
    NoNewParticipants,
}

/// Result of a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The remote event or meeting was deleted and the local link cleared.
    Deleted,
    /// The record had no meeting to begin with.
    NoMeeting,
    /// No remote id could be resolved; only the stale local URL was cleared.
    ClearedOnly,
}

/// Which remote shape a meeting resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingShape {
    OutlookEvent,
    TeamsMeeting,
}

/// Read-model for the details view.
#[derive(Debug, Clone)]
pub struct MeetingDetails {
    pub meeting_url: String,
    pub subject: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub participant_count: usize,
    pub shape: MeetingShape,
}

/// One remote attendee, from either shape.
#[derive(Debug, Clone)]
pub struct AttendeeInfo {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub object_id: Option<String>,
}

/// Pure validation result for proposed meeting times.
#[derive(Debug, Clone)]
pub struct MeetingTimeReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub duration_hours: f64,
}

/// Interactive meeting CRUD over the calendar API and record store.
pub struct MeetingService {
    tokens: Arc<dyn AccessTokenProvider>,
    api: Arc<dyn CalendarApi>,
    records: Arc<dyn MeetingRecordRepository>,
    user_links: Arc<dyn UserLinkRepository>,
}

impl MeetingService {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        api: Arc<dyn CalendarApi>,
        records: Arc<dyn MeetingRecordRepository>,
        user_links: Arc<dyn UserLinkRepository>,
    ) -> Self {
        Self { tokens, api, records, user_links }
    }

    /// Create a Teams-backed calendar event for the record, or bring its
    /// existing meeting's attendee list up to date.
    #[instrument(skip(self))]
    pub async fn create_meeting(&self, kind: RecordKind, name: &str) -> Result<MeetingOutcome> {
        let token = self.require_token().await?;
        let record = self.records.load(kind, name).await?;

        if let Some(join_url) = record.meeting_url.clone() {
            return self.update_attendees_inner(&token, &record, &join_url).await;
        }

        let (start, end) = resolve_times(&record);
        let attendees = self
            .linked_emails(&record)
            .await?
            .into_iter()
            .map(GraphAttendee::required)
            .collect();

        let request = EventCreateRequest {
            subject: record.resolved_subject(),
            start: graph_time(start),
            end: graph_time(end),
            is_online_meeting: true,
            online_meeting_provider: "teamsForBusiness".to_string(),
            attendees,
        };

        let event = self.api.create_event(&token, &request).await?;
        let Some(join_url) = event.join_url().map(ToString::to_string) else {
            return Err(BridgeError::Internal(
                "Event created but no meeting link returned.".to_string(),
            ));
        };

        self.records.set_remote_link(kind, name, Some(&event.id), Some(&join_url)).await?;
        info!(kind = kind.as_str(), name, event_id = %event.id, "meeting created");
        Ok(MeetingOutcome::Created { meeting_url: join_url })
    }

    /// Add record participants missing from the remote attendee list.
    /// Merge-only: existing remote attendees are never removed.
    #[instrument(skip(self))]
    pub async fn update_attendees(&self, kind: RecordKind, name: &str) -> Result<MeetingOutcome> {
        let token = self.require_token().await?;
        let record = self.records.load(kind, name).await?;
        let Some(join_url) = record.meeting_url.clone() else {
            return Err(BridgeError::NotFound("No meeting found.".to_string()));
        };
        self.update_attendees_inner(&token, &record, &join_url).await
    }

    async fn update_attendees_inner(
        &self,
        token: &str,
        record: &MeetingRecord,
        join_url: &str,
    ) -> Result<MeetingOutcome> {
        if let Some(event_id) = self.api.find_event_id_by_join_url(token, join_url).await? {
            let event = self.api.get_event(token, &event_id).await?;
            let existing: HashSet<String> = event
                .attendees
                .iter()
                .map(|a| a.email_address.address.to_lowercase())
                .collect();

            let mut merged = event.attendees.clone();
            for email in self.linked_emails(record).await? {
                if !existing.contains(&email.to_lowercase()) {
                    merged.push(GraphAttendee::required(email));
                }
            }

            if merged.len() == event.attendees.len() {
                return Ok(MeetingOutcome::NoNewParticipants);
            }

            self.api
                .patch_event_attendees(token, &event_id, &EventAttendeesPatch { attendees: merged })
                .await?;
            return Ok(MeetingOutcome::AttendeesUpdated);
        }

        if let Some(meeting_id) =
            self.api.find_online_meeting_id_by_join_url(token, join_url).await?
        {
            let attendees = self
                .linked_object_ids(record)
                .await?
                .into_iter()
                .map(GraphIdentityAttendee::from_object_id)
                .collect();
            let body = OnlineMeetingParticipantsPatch {
                participants: GraphMeetingParticipants { attendees },
            };
            self.api.patch_online_meeting_participants(token, &meeting_id, &body).await?;
            return Ok(MeetingOutcome::AttendeesUpdated);
        }

        Err(BridgeError::NotFound("Could not find meeting on the remote calendar.".to_string()))
    }

    /// Move the meeting to new times, defaulting missing bounds from the
    /// record and the kind's working hours.
    #[instrument(skip(self))]
    pub async fn reschedule_meeting(
        &self,
        kind: RecordKind,
        name: &str,
        new_start: Option<NaiveDateTime>,
        new_end: Option<NaiveDateTime>,
    ) -> Result<()> {
        let token = self.require_token().await?;
        let record = self.records.load(kind, name).await?;
        let Some(join_url) = record.meeting_url.clone() else {
            return Err(BridgeError::NotFound("No meeting found.".to_string()));
        };

        let (start, end) = match (new_start, new_end) {
            (Some(s), Some(e)) => clamp_end(kind.anchor_start(s), kind.anchor_end(e)),
            _ => resolve_times(&record),
        };

        if let Some(event_id) = self.api.find_event_id_by_join_url(&token, &join_url).await? {
            let body = EventTimesPatch { start: graph_time(start), end: graph_time(end) };
            self.api.patch_event_times(&token, &event_id, &body).await?;
            return Ok(());
        }

        if let Some(meeting_id) =
            self.api.find_online_meeting_id_by_join_url(&token, &join_url).await?
        {
            let body = OnlineMeetingTimesPatch {
                start_date_time: to_utc_iso(start),
                end_date_time: to_utc_iso(end),
            };
            self.api.patch_online_meeting_times(&token, &meeting_id, &body).await?;
            return Ok(());
        }

        Err(BridgeError::NotFound("Could not update meeting (id not found).".to_string()))
    }

    /// Delete the remote meeting and clear the local link. Best-effort on
    /// the remote side: the local URL is cleared even when the remote id
    /// cannot be resolved (deleted out-of-band).
    #[instrument(skip(self))]
    pub async fn delete_meeting(&self, kind: RecordKind, name: &str) -> Result<DeleteOutcome> {
        let record = self.records.load(kind, name).await?;
        if record.meeting_url.is_none() {
            return Ok(DeleteOutcome::NoMeeting);
        }
        let token = self.require_token().await?;
        let join_url = record.meeting_url.clone().unwrap_or_default();

        if let Some(event_id) = self.api.find_event_id_by_join_url(&token, &join_url).await? {
            if let Err(err) = self.api.delete_event(&token, &event_id).await {
                warn!(event_id, error = %err, "remote event delete failed; clearing link anyway");
            }
            self.records.set_remote_link(kind, name, None, None).await?;
            return Ok(DeleteOutcome::Deleted);
        }

        if let Some(meeting_id) =
            self.api.find_online_meeting_id_by_join_url(&token, &join_url).await?
        {
            if let Err(err) = self.api.delete_online_meeting(&token, &meeting_id).await {
                warn!(meeting_id, error = %err, "remote meeting delete failed; clearing link anyway");
            }
            self.records.set_remote_link(kind, name, None, None).await?;
            return Ok(DeleteOutcome::Deleted);
        }

        self.records.set_remote_link(kind, name, None, None).await?;
        Ok(DeleteOutcome::ClearedOnly)
    }

    /// Current remote details of the record's meeting, `None` when the
    /// record owns no meeting.
    #[instrument(skip(self))]
    pub async fn meeting_details(
        &self,
        kind: RecordKind,
        name: &str,
    ) -> Result<Option<MeetingDetails>> {
        let record = self.records.load(kind, name).await?;
        let Some(join_url) = record.meeting_url.clone() else {
            return Ok(None);
        };
        let token = self.require_token().await?;

        if let Some(event_id) = self.api.find_event_id_by_join_url(&token, &join_url).await? {
            let event = self.api.get_event(&token, &event_id).await?;
            return Ok(Some(MeetingDetails {
                meeting_url: join_url,
                subject: event.subject,
                starts_at: event.start.map(|t| t.date_time),
                ends_at: event.end.map(|t| t.date_time),
                participant_count: event.attendees.len(),
                shape: MeetingShape::OutlookEvent,
            }));
        }

        if let Some(meeting_id) =
            self.api.find_online_meeting_id_by_join_url(&token, &join_url).await?
        {
            let meeting = self.api.get_online_meeting(&token, &meeting_id).await?;
            return Ok(Some(MeetingDetails {
                meeting_url: join_url,
                subject: meeting.subject,
                starts_at: meeting.start_date_time,
                ends_at: meeting.end_date_time,
                participant_count: meeting
                    .participants
                    .as_ref()
                    .map_or(0, |p| p.attendees.len()),
                shape: MeetingShape::TeamsMeeting,
            }));
        }

        Err(BridgeError::NotFound("Meeting details unavailable.".to_string()))
    }

    /// Current remote attendee list, empty when the record owns no meeting
    /// or the remote id cannot be resolved.
    #[instrument(skip(self))]
    pub async fn meeting_attendees(
        &self,
        kind: RecordKind,
        name: &str,
    ) -> Result<Vec<AttendeeInfo>> {
        let record = self.records.load(kind, name).await?;
        let Some(join_url) = record.meeting_url.clone() else {
            return Ok(Vec::new());
        };
        let token = self.require_token().await?;

        if let Some(event_id) = self.api.find_event_id_by_join_url(&token, &join_url).await? {
            let event = self.api.get_event(&token, &event_id).await?;
            return Ok(event
                .attendees
                .into_iter()
                .map(|a| AttendeeInfo {
                    email: Some(a.email_address.address),
                    display_name: a.email_address.name,
                    object_id: None,
                })
                .collect());
        }

        if let Some(meeting_id) =
            self.api.find_online_meeting_id_by_join_url(&token, &join_url).await?
        {
            let meeting = self.api.get_online_meeting(&token, &meeting_id).await?;
            return Ok(meeting
                .participants
                .unwrap_or_default()
                .attendees
                .into_iter()
                .map(|a| AttendeeInfo {
                    email: a.identity.user.email,
                    display_name: a.identity.user.display_name,
                    object_id: a.identity.user.id,
                })
                .collect());
        }

        Ok(Vec::new())
    }

    async fn require_token(&self) -> Result<String> {
        match self.tokens.access_token().await? {
            Some(token) => Ok(token),
            None => Err(BridgeError::Auth("Authentication required.".to_string())),
        }
    }

    /// Participant emails resolvable to a linked directory user, deduped,
    /// original order preserved.
    async fn linked_emails(&self, record: &MeetingRecord) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut emails = Vec::new();
        for participant in &record.participants {
            let email = participant.email.trim();
            if email.is_empty() || !seen.insert(email.to_lowercase()) {
                continue;
            }
            if self.user_links.azure_object_id(email).await?.is_some() {
                emails.push(email.to_string());
            }
        }
        Ok(emails)
    }

    async fn linked_object_ids(&self, record: &MeetingRecord) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for participant in &record.participants {
            let email = participant.email.trim();
            if email.is_empty() {
                continue;
            }
            if let Some(id) = self.user_links.azure_object_id(email).await? {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }
}

/// Validate a proposed meeting window against business rules.
pub fn validate_meeting_time(
    start: NaiveDateTime,
    end: NaiveDateTime,
    now: NaiveDateTime,
) -> MeetingTimeReport {
    let mut errors = Vec::new();
    if start >= end {
        errors.push("End time must be after start time.".to_string());
    }
    let duration_secs = (end - start).num_seconds();
    if duration_secs > MAX_MEETING_DURATION_SECS {
        errors.push("Meeting duration cannot exceed 24 hours.".to_string());
    }
    if duration_secs < MIN_MEETING_DURATION_SECS {
        errors.push("Meeting duration should be at least 15 minutes.".to_string());
    }
    if start < now {
        errors.push("Meeting cannot be scheduled in the past.".to_string());
    }
    MeetingTimeReport {
        valid: errors.is_empty(),
        errors,
        duration_hours: (duration_secs as f64 / 3600.0 * 100.0).round() / 100.0,
    }
}

/// Resolve the record's meeting window: kind-anchored times with a
/// now-anchored fallback and a one-hour minimum.
fn resolve_times(record: &MeetingRecord) -> (NaiveDateTime, NaiveDateTime) {
    let start = record
        .starts_at
        .map(|dt| record.kind.anchor_start(dt))
        .unwrap_or_else(|| Utc::now().naive_utc());
    let end = record
        .ends_at
        .map(|dt| record.kind.anchor_end(dt))
        .unwrap_or(start);
    clamp_end(start, end)
}

fn clamp_end(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    if end <= start {
        (start, start + Duration::hours(1))
    } else {
        (start, end)
    }
}

fn to_utc_iso(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn graph_time(dt: NaiveDateTime) -> GraphDateTime {
    GraphDateTime { date_time: to_utc_iso(dt), time_zone: Some("UTC".to_string()) }
}
