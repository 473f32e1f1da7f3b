//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Microsoft Graph API
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const LOGIN_AUTHORITY_BASE: &str = "https://login.microsoftonline.com";
pub const OAUTH_SCOPE: &str = "https://graph.microsoft.com/.default";

// Subscription lifecycle. Graph caps calendar subscriptions at 4230 minutes
// (~2.9 days); we renew with a 2-day expiry as a safety margin.
pub const SUBSCRIPTION_TTL_DAYS: i64 = 2;
pub const SUBSCRIPTION_CHANGE_TYPE: &str = "updated";
pub const SUBSCRIPTION_RESOURCE: &str = "/me/events";
pub const SUBSCRIPTION_CLIENT_STATE: &str = "MeetbridgeRsvpSyncV1";

// Settings keys (single-row configuration values in the record store)
pub const SETTING_SUBSCRIPTION_ID: &str = "graph_subscription_id";
pub const SETTING_ACCESS_TOKEN: &str = "graph_access_token";
pub const SETTING_REFRESH_TOKEN: &str = "graph_refresh_token";
pub const SETTING_TOKEN_EXPIRY: &str = "graph_token_expiry";

// Outbound HTTP timeouts
pub const GRAPH_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const GRAPH_PROBE_TIMEOUT_SECS: u64 = 10;

// Token expiry is stored with a safety buffer so a token is refreshed
// shortly before Graph would reject it.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

// Meeting time validation bounds
pub const MIN_MEETING_DURATION_SECS: i64 = 15 * 60;
pub const MAX_MEETING_DURATION_SECS: i64 = 24 * 3600;
