//! Interactive admin routes
//!
//! Thin wrappers over the core services. Domain errors map onto status
//! codes here and nowhere else: 401 authentication required, 502 provider
//! rejected the call, 404 unknown record or meeting, 400 bad input, 500
//! everything else.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use meetbridge_core::{
    validate_meeting_time, DeleteOutcome, EnsureOutcome, MeetingOutcome, MeetingShape,
};
use meetbridge_domain::{BridgeError, RecordKind};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct RescheduleBody {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

pub async fn ensure_subscription(State(state): State<AppState>) -> Response {
    match state.subscriptions.ensure_subscription().await {
        Ok(EnsureOutcome::Renewed(id)) => {
            Json(json!({ "status": "renewed", "subscription_id": id })).into_response()
        }
        Ok(EnsureOutcome::Created(id)) => {
            Json(json!({ "status": "created", "subscription_id": id })).into_response()
        }
        Ok(EnsureOutcome::NotAuthenticated) => {
            error_response(&BridgeError::Auth("Authentication required.".to_string()))
        }
        Err(err) => error_response(&err),
    }
}

pub async fn auth_status(State(state): State<AppState>) -> Response {
    match state.auth.auth_status().await {
        Ok(connected) => Json(json!({ "connected": connected })).into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(code) = params.get("code") else {
        return error_response(&BridgeError::InvalidInput(
            "missing authorization code".to_string(),
        ));
    };

    match state.auth.exchange_code(code).await {
        Ok(()) => Json(json!({ "connected": true })).into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn revoke_auth(State(state): State<AppState>) -> Response {
    match state.auth.revoke().await {
        Ok(()) => Json(json!({ "status": "revoked" })).into_response(),
        Err(err) => error_response(&err),
    }
}

pub async fn meeting_details(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Response {
    let Some(kind) = RecordKind::parse(&kind) else {
        return error_response(&BridgeError::InvalidInput(format!("unknown record kind: {kind}")));
    };

    let details = match state.meetings.meeting_details(kind, &name).await {
        Ok(Some(details)) => details,
        Ok(None) => return Json(json!({ "linked": false })).into_response(),
        Err(err) => return error_response(&err),
    };
    let attendees = match state.meetings.meeting_attendees(kind, &name).await {
        Ok(attendees) => attendees,
        Err(err) => return error_response(&err),
    };

    let attendees: Vec<_> = attendees
        .iter()
        .map(|a| {
            json!({
                "email": a.email,
                "display_name": a.display_name,
                "object_id": a.object_id,
            })
        })
        .collect();
    Json(json!({
        "linked": true,
        "meeting_url": details.meeting_url,
        "subject": details.subject,
        "starts_at": details.starts_at,
        "ends_at": details.ends_at,
        "participant_count": details.participant_count,
        "shape": match details.shape {
            MeetingShape::OutlookEvent => "event",
            MeetingShape::TeamsMeeting => "online_meeting",
        },
        "attendees": attendees,
    }))
    .into_response()
}

pub async fn create_meeting(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Response {
    let Some(kind) = RecordKind::parse(&kind) else {
        return error_response(&BridgeError::InvalidInput(format!("unknown record kind: {kind}")));
    };

    match state.meetings.create_meeting(kind, &name).await {
        Ok(MeetingOutcome::Created { meeting_url }) => (
            StatusCode::CREATED,
            Json(json!({ "status": "created", "meeting_url": meeting_url })),
        )
            .into_response(),
        Ok(MeetingOutcome::AttendeesUpdated) => {
            Json(json!({ "status": "attendees_updated" })).into_response()
        }
        Ok(MeetingOutcome::NoNewParticipants) => {
            Json(json!({ "status": "no_new_participants" })).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub async fn delete_meeting(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Response {
    let Some(kind) = RecordKind::parse(&kind) else {
        return error_response(&BridgeError::InvalidInput(format!("unknown record kind: {kind}")));
    };

    match state.meetings.delete_meeting(kind, &name).await {
        Ok(DeleteOutcome::Deleted) => Json(json!({ "status": "deleted" })).into_response(),
        Ok(DeleteOutcome::NoMeeting) => Json(json!({ "status": "no_meeting" })).into_response(),
        Ok(DeleteOutcome::ClearedOnly) => {
            Json(json!({ "status": "cleared_stale_link" })).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub async fn reschedule_meeting(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    body: Option<Json<RescheduleBody>>,
) -> Response {
    let Some(kind) = RecordKind::parse(&kind) else {
        return error_response(&BridgeError::InvalidInput(format!("unknown record kind: {kind}")));
    };
    let Json(body) = body.unwrap_or_default();

    match state.meetings.reschedule_meeting(kind, &name, body.start, body.end).await {
        Ok(()) => Json(json!({ "status": "rescheduled" })).into_response(),
        Err(err) => error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

pub async fn validate_times(Json(body): Json<ValidateBody>) -> Response {
    let report = validate_meeting_time(body.start, body.end, Utc::now().naive_utc());
    Json(json!({
        "valid": report.valid,
        "errors": report.errors,
        "duration_hours": report.duration_hours,
    }))
    .into_response()
}

fn error_response(err: &BridgeError) -> Response {
    let status = match err {
        BridgeError::Auth(_) => StatusCode::UNAUTHORIZED,
        BridgeError::NotFound(_) => StatusCode::NOT_FOUND,
        BridgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        BridgeError::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "admin request failed");
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
