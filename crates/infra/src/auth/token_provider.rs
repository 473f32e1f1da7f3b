//! Settings-backed OAuth token provider
//!
//! Tokens live in the settings store. `access_token` hands out the stored
//! token while it is still fresh and otherwise runs the refresh grant; the
//! delegated flow starts with `exchange_code` after the user consents in the
//! browser. Refresh failures degrade to "unauthenticated" rather than
//! erroring, so background jobs skip quietly until someone re-connects.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use meetbridge_core::{AccessTokenProvider, SettingsStore};
use meetbridge_domain::{
    BridgeError, GraphConfig, Result, GRAPH_PROBE_TIMEOUT_SECS, GRAPH_REQUEST_TIMEOUT_SECS,
    LOGIN_AUTHORITY_BASE, OAUTH_SCOPE, SETTING_ACCESS_TOKEN, SETTING_REFRESH_TOKEN,
    SETTING_TOKEN_EXPIRY, TOKEN_EXPIRY_BUFFER_SECS,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

/// OAuth token provider persisting tokens in the settings store.
pub struct SettingsTokenProvider {
    client: Client,
    settings: Arc<dyn SettingsStore>,
    config: GraphConfig,
    authority_base: String,
    probe_base: String,
}

impl SettingsTokenProvider {
    pub fn new(settings: Arc<dyn SettingsStore>, config: GraphConfig) -> Result<Self> {
        Self::with_endpoints(settings, config, LOGIN_AUTHORITY_BASE, None)
    }

    /// Construct with explicit authority and probe endpoints. The probe base
    /// defaults to the configured Graph API base.
    pub fn with_endpoints(
        settings: Arc<dyn SettingsStore>,
        config: GraphConfig,
        authority_base: impl Into<String>,
        probe_base: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GRAPH_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(InfraError::from)?;
        let probe_base = probe_base.unwrap_or_else(|| config.api_base.clone());
        Ok(Self {
            client,
            settings,
            config,
            authority_base: authority_base.into().trim_end_matches('/').to_string(),
            probe_base: probe_base.trim_end_matches('/').to_string(),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_base, self.config.tenant_id)
    }

    /// Redeem an authorization code from the delegated consent flow.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<()> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("scope", OAUTH_SCOPE),
        ];
        let tokens = self.request_tokens(&params).await?;
        self.store_tokens(tokens).await?;
        info!("authorization code exchanged");
        Ok(())
    }

    /// True when the stored token is accepted by the API. Uses a short probe
    /// timeout so status checks stay snappy.
    pub async fn auth_status(&self) -> Result<bool> {
        let Some(token) = self.access_token().await? else {
            return Ok(false);
        };

        let response = self
            .client
            .get(format!("{}/me", self.probe_base))
            .bearer_auth(&token)
            .timeout(Duration::from_secs(GRAPH_PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(InfraError::from)?;

        Ok(response.status().is_success())
    }

    /// Drop all stored tokens, returning the integration to the
    /// unauthenticated state.
    pub async fn revoke(&self) -> Result<()> {
        self.settings.delete(SETTING_ACCESS_TOKEN).await?;
        self.settings.delete(SETTING_REFRESH_TOKEN).await?;
        self.settings.delete(SETTING_TOKEN_EXPIRY).await?;
        info!("stored tokens revoked");
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("scope", OAUTH_SCOPE),
        ];
        let tokens = self.request_tokens(&params).await?;
        let access_token = tokens.access_token.clone();
        self.store_tokens(tokens).await?;
        Ok(access_token)
    }

    async fn request_tokens(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(self.token_url())
            .form(params)
            .send()
            .await
            .map_err(|e| BridgeError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BridgeError::Auth(format!("token request failed ({status}): {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| BridgeError::Auth(format!("failed to parse token response: {e}")))
    }

    async fn store_tokens(&self, tokens: TokenResponse) -> Result<()> {
        let expiry = Utc::now().timestamp() + tokens.expires_in;
        self.settings.set(SETTING_ACCESS_TOKEN, &tokens.access_token).await?;
        self.settings.set(SETTING_TOKEN_EXPIRY, &expiry.to_string()).await?;
        // Microsoft rotates refresh tokens; keep the old one if the response
        // omitted a replacement.
        if let Some(refresh_token) = tokens.refresh_token {
            self.settings.set(SETTING_REFRESH_TOKEN, &refresh_token).await?;
        }
        Ok(())
    }

    async fn stored_token_if_fresh(&self) -> Result<Option<String>> {
        let Some(token) = self.settings.get(SETTING_ACCESS_TOKEN).await? else {
            return Ok(None);
        };
        let Some(expiry) = self.settings.get(SETTING_TOKEN_EXPIRY).await? else {
            return Ok(None);
        };
        let Ok(expiry) = expiry.parse::<i64>() else {
            warn!("stored token expiry is not a timestamp; forcing refresh");
            return Ok(None);
        };

        if Utc::now().timestamp() + TOKEN_EXPIRY_BUFFER_SECS < expiry {
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl AccessTokenProvider for SettingsTokenProvider {
    async fn access_token(&self) -> Result<Option<String>> {
        if let Some(token) = self.stored_token_if_fresh().await? {
            return Ok(Some(token));
        }

        let Some(refresh_token) = self.settings.get(SETTING_REFRESH_TOKEN).await? else {
            debug!("no refresh token stored; unauthenticated");
            return Ok(None);
        };

        match self.refresh(&refresh_token).await {
            Ok(token) => Ok(Some(token)),
            Err(err) => {
                warn!(error = %err, "token refresh failed; treating as unauthenticated");
                Ok(None)
            }
        }
    }
}
