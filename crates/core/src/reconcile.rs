//! Webhook-driven RSVP reconciliation
//!
//! One reconciler invocation per change notification: pull the referenced
//! event from the provider and merge attendee response state into the
//! matching local record. The merge is idempotent (guarded by a
//! status-differs check) and keyed by remote state at fetch time, so
//! out-of-order notifications for the same event converge on last-fetch-wins.

use std::collections::HashMap;
use std::sync::Arc;

use meetbridge_domain::{AttendingStatus, BridgeError, Result};
use tracing::{debug, info, instrument, warn};

use crate::ports::{AccessTokenProvider, CalendarApi, MeetingRecordRepository};
use crate::resource::ResourceRef;

/// Terminal outcome of one reconciler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Participant rows were updated and the record was persisted.
    Updated(usize),
    /// Remote state already matched local state.
    NoChange,
    /// The remote event is not tracked by any local record.
    NotTracked,
    /// The resource had no event id or no attendees, or it no longer exists.
    NothingToReconcile,
    /// No bearer token available; background path aborts silently.
    NotAuthenticated,
}

/// Background task that pulls current remote truth and merges it into local
/// participant rows.
pub struct RsvpReconciler {
    tokens: Arc<dyn AccessTokenProvider>,
    api: Arc<dyn CalendarApi>,
    records: Arc<dyn MeetingRecordRepository>,
    api_base: String,
}

impl RsvpReconciler {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        api: Arc<dyn CalendarApi>,
        records: Arc<dyn MeetingRecordRepository>,
        api_base: impl Into<String>,
    ) -> Self {
        Self { tokens, api, records, api_base: api_base.into() }
    }

    /// Entry point for spawned webhook tasks. Logs the outcome and swallows
    /// every error: nothing may cross back into the request cycle.
    pub async fn run(self: Arc<Self>, resource: String) {
        match self.reconcile(&resource).await {
            Ok(ReconcileOutcome::Updated(rows)) => {
                info!(resource, rows, "rsvp reconciliation updated participants");
            }
            Ok(outcome) => debug!(resource, ?outcome, "rsvp reconciliation finished"),
            Err(err) => warn!(resource, error = %err, "rsvp reconciliation failed"),
        }
    }

    /// Reconcile one notification resource reference.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, resource: &str) -> Result<ReconcileOutcome> {
        let Some(token) = self.tokens.access_token().await? else {
            debug!("no access token; skipping reconciliation");
            return Ok(ReconcileOutcome::NotAuthenticated);
        };

        let url = ResourceRef::parse(resource).into_absolute(&self.api_base);

        let event = match self.api.fetch_event_resource(&token, &url).await {
            Ok(event) => event,
            Err(BridgeError::NotFound(_)) => {
                info!(url, "notified resource no longer exists");
                return Ok(ReconcileOutcome::NothingToReconcile);
            }
            Err(err) => return Err(err),
        };

        if event.id.is_empty() || event.attendees.is_empty() {
            return Ok(ReconcileOutcome::NothingToReconcile);
        }

        let Some(mut record) = self.records.find_by_remote_event_id(&event.id).await? else {
            debug!(event_id = %event.id, "remote event not tracked locally");
            return Ok(ReconcileOutcome::NotTracked);
        };

        // Lower-cased attendee email -> local status. Responses without a
        // local mapping (none, notResponded, unrecognized) are dropped here
        // and never clear an existing status.
        let responses: HashMap<String, AttendingStatus> = event
            .attendees
            .iter()
            .filter_map(|attendee| {
                let email = attendee.email_address.address.trim().to_lowercase();
                if email.is_empty() {
                    return None;
                }
                let status = attendee
                    .status
                    .as_ref()
                    .and_then(|s| s.response.as_deref())
                    .and_then(AttendingStatus::from_graph_response)?;
                Some((email, status))
            })
            .collect();

        if responses.is_empty() {
            return Ok(ReconcileOutcome::NoChange);
        }

        let mut changed = 0usize;
        for participant in &mut record.participants {
            let email = participant.email.trim().to_lowercase();
            if let Some(&status) = responses.get(&email) {
                if participant.attending != Some(status) {
                    participant.attending = Some(status);
                    changed += 1;
                }
            }
        }

        if changed == 0 {
            return Ok(ReconcileOutcome::NoChange);
        }

        self.records.save_participants(&record).await?;
        Ok(ReconcileOutcome::Updated(changed))
    }
}
