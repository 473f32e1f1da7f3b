//! Shared application state for request handlers.

use std::sync::Arc;

use meetbridge_core::{MeetingService, RsvpReconciler, SubscriptionManager};
use meetbridge_infra::SettingsTokenProvider;

/// Handler state: the wired application services.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<RsvpReconciler>,
    pub subscriptions: Arc<SubscriptionManager>,
    pub meetings: Arc<MeetingService>,
    pub auth: Arc<SettingsTokenProvider>,
}
