//! HTTP routes

pub mod admin;
pub mod webhook;

#[cfg(test)]
pub mod test_support;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/graph", get(webhook::graph_webhook).post(webhook::graph_webhook))
        .route("/admin/subscription", post(admin::ensure_subscription))
        .route("/admin/meetings/validate", post(admin::validate_times))
        .route("/admin/auth/status", get(admin::auth_status))
        .route("/admin/auth/callback", get(admin::auth_callback))
        .route("/admin/auth/revoke", post(admin::revoke_auth))
        .route(
            "/admin/meetings/{kind}/{name}",
            get(admin::meeting_details)
                .post(admin::create_meeting)
                .delete(admin::delete_meeting)
                .patch(admin::reschedule_meeting),
        )
        .with_state(state)
}
