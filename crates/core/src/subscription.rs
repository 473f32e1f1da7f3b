//! Subscription lifecycle management
//!
//! Guarantees a single live Graph change-notification subscription pointed at
//! this deployment's webhook endpoint. Remote subscriptions expire (provider
//! cap ~2.9 days) and can vanish between renewal runs, so the cycle is
//! renew-then-recreate: a failed PATCH falls through to a fresh POST, and the
//! persisted subscription id is replaced.

use std::sync::Arc;

use chrono::{Duration, Utc};
use meetbridge_domain::{
    BridgeError, Result, SubscriptionRequest, SETTING_SUBSCRIPTION_ID, SUBSCRIPTION_CHANGE_TYPE,
    SUBSCRIPTION_CLIENT_STATE, SUBSCRIPTION_RESOURCE, SUBSCRIPTION_TTL_DAYS,
};
use tracing::{debug, info, instrument, warn};

use crate::ports::{AccessTokenProvider, CalendarApi, SettingsStore};

/// Outcome of a scheduled `ensure_subscription` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The existing subscription's expiry was extended.
    Renewed(String),
    /// A new subscription was created (none existed, or renewal failed).
    Created(String),
    /// No bearer token available; scheduled path aborts silently.
    NotAuthenticated,
}

/// Keeps exactly one remote subscription alive.
pub struct SubscriptionManager {
    tokens: Arc<dyn AccessTokenProvider>,
    api: Arc<dyn CalendarApi>,
    settings: Arc<dyn SettingsStore>,
    notification_url: String,
}

impl SubscriptionManager {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        api: Arc<dyn CalendarApi>,
        settings: Arc<dyn SettingsStore>,
        notification_url: impl Into<String>,
    ) -> Self {
        Self { tokens, api, settings, notification_url: notification_url.into() }
    }

    /// Renew the persisted subscription, recreating it when renewal fails or
    /// no subscription exists. Invoked on a recurring schedule and from the
    /// interactive admin route.
    #[instrument(skip(self))]
    pub async fn ensure_subscription(&self) -> Result<EnsureOutcome> {
        let Some(token) = self.tokens.access_token().await? else {
            debug!("no access token; skipping subscription renewal");
            return Ok(EnsureOutcome::NotAuthenticated);
        };

        if let Some(subscription_id) = self.settings.get(SETTING_SUBSCRIPTION_ID).await? {
            match self.api.renew_subscription(&token, &subscription_id, &expiry()).await {
                Ok(true) => {
                    info!(subscription_id, "subscription renewed");
                    return Ok(EnsureOutcome::Renewed(subscription_id));
                }
                Ok(false) => {
                    warn!(subscription_id, "renewal rejected; recreating subscription");
                }
                Err(err) => {
                    warn!(subscription_id, error = %err, "renewal failed; recreating subscription");
                }
            }
        }

        let id = self.create_subscription().await?;
        Ok(EnsureOutcome::Created(id))
    }

    /// Create a fresh subscription and persist its id. Interactive callers
    /// expect a usable result, so failures surface instead of being
    /// swallowed.
    #[instrument(skip(self))]
    pub async fn create_subscription(&self) -> Result<String> {
        let Some(token) = self.tokens.access_token().await? else {
            return Err(BridgeError::Auth("Authentication required.".to_string()));
        };

        let request = SubscriptionRequest {
            change_type: SUBSCRIPTION_CHANGE_TYPE.to_string(),
            notification_url: self.notification_url.clone(),
            resource: SUBSCRIPTION_RESOURCE.to_string(),
            expiration_date_time: expiry(),
            client_state: SUBSCRIPTION_CLIENT_STATE.to_string(),
        };

        let subscription = self.api.create_subscription(&token, &request).await?;
        self.settings.set(SETTING_SUBSCRIPTION_ID, &subscription.id).await?;
        info!(subscription_id = %subscription.id, "subscription created");
        Ok(subscription.id)
    }
}

fn expiry() -> String {
    (Utc::now() + Duration::days(SUBSCRIPTION_TTL_DAYS))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}
