//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::GRAPH_API_BASE;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub graph: GraphConfig,
    pub webhook: WebhookConfig,
    pub renewal: RenewalConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Microsoft Graph / OAuth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub api_base: String,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Inbound webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Address the server binds to, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Public base URL Graph delivers notifications to.
    pub public_base_url: String,
}

/// Subscription renewal schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalConfig {
    pub cron_expression: String,
    pub enabled: bool,
}

impl WebhookConfig {
    /// Full notification URL registered with the provider.
    pub fn notification_url(&self) -> String {
        format!("{}/webhook/graph", self.public_base_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "meetbridge.db".to_string(), pool_size: 8 },
            graph: GraphConfig {
                api_base: GRAPH_API_BASE.to_string(),
                tenant_id: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
            },
            webhook: WebhookConfig {
                bind_addr: "0.0.0.0:8080".to_string(),
                public_base_url: String::new(),
            },
            renewal: RenewalConfig {
                cron_expression: "0 0 3 * * *".to_string(), // daily at 03:00 UTC
                enabled: true,
            },
        }
    }
}
