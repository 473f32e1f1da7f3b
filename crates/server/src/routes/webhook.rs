//! Graph change-notification endpoint
//!
//! Two contracts the provider holds us to:
//! - Subscription validation: a request carrying a `validationToken` query
//!   parameter must be answered `200 text/plain` with the token verbatim,
//!   never JSON-wrapped.
//! - Notification delivery: always `202 Accepted`, fast. Reconciliation work
//!   is spawned per notification and never awaited; a slow or failing merge
//!   must not push Graph into retry backoff.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use meetbridge_domain::NotificationBatch;
use tracing::{debug, warn};

use crate::state::AppState;

pub async fn graph_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    if let Some(token) = params.get("validationToken") {
        debug!("answering subscription validation handshake");
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], token.clone())
            .into_response();
    }

    match serde_json::from_str::<NotificationBatch>(&body) {
        Ok(batch) => {
            for notification in batch.value {
                let Some(resource) = notification.resource else {
                    debug!("notification without resource; skipped");
                    continue;
                };
                tokio::spawn(state.reconciler.clone().run(resource));
            }
        }
        Err(err) => warn!(error = %err, "unparseable notification payload; acknowledged anyway"),
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
