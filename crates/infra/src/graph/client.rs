//! Microsoft Graph HTTP client
//!
//! Implements the `CalendarApi` port against the Graph REST surface. All
//! requests carry a caller-supplied bearer token; 404 maps to `NotFound` and
//! every other non-2xx maps to `Network` with the response body logged.

use std::time::Duration;

use async_trait::async_trait;
use meetbridge_core::CalendarApi;
use meetbridge_domain::{
    BridgeError, EventAttendeesPatch, EventCreateRequest, EventTimesPatch, GraphEvent,
    GraphOnlineMeeting, GraphSubscription, OnlineMeetingParticipantsPatch, OnlineMeetingTimesPatch,
    Result, SubscriptionRequest, GRAPH_REQUEST_TIMEOUT_SECS,
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Graph REST client with an injectable base URL.
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

impl GraphClient {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GRAPH_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(InfraError::from)?;
        Ok(Self { client, api_base: api_base.into().trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    /// Map a Graph response to the domain error contract, returning the
    /// response untouched on 2xx.
    async fn check(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
        if status == StatusCode::NOT_FOUND {
            debug!(context, "Graph resource not found");
            return Err(BridgeError::NotFound(format!("{context}: not found")));
        }

        warn!(context, status = %status, body, "Graph API request failed");
        Err(BridgeError::Network(format!("{context} failed ({status}): {body}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        context: &str,
    ) -> Result<T> {
        let response =
            self.client.get(url).bearer_auth(token).send().await.map_err(InfraError::from)?;
        let response = Self::check(response, context).await?;
        response.json::<T>().await.map_err(|e| {
            BridgeError::Network(format!("failed to parse {context} response: {e}"))
        })
    }

    async fn patch_json<B: serde::Serialize + ?Sized>(
        &self,
        token: &str,
        url: &str,
        body: &B,
        context: &str,
    ) -> Result<()> {
        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(InfraError::from)?;
        Self::check(response, context).await?;
        Ok(())
    }

    async fn delete(&self, token: &str, url: &str, context: &str) -> Result<()> {
        let response =
            self.client.delete(url).bearer_auth(token).send().await.map_err(InfraError::from)?;
        Self::check(response, context).await?;
        Ok(())
    }

    async fn find_id(
        &self,
        token: &str,
        url: &str,
        filter: &str,
        context: &str,
    ) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("$filter", filter), ("$select", "id")])
            .send()
            .await
            .map_err(InfraError::from)?;
        let response = Self::check(response, context).await?;
        let list: ListResponse<IdOnly> = response.json().await.map_err(|e| {
            BridgeError::Network(format!("failed to parse {context} response: {e}"))
        })?;
        Ok(list.value.into_iter().next().map(|item| item.id))
    }
}

#[async_trait]
impl CalendarApi for GraphClient {
    async fn fetch_event_resource(&self, token: &str, url: &str) -> Result<GraphEvent> {
        self.get_json(token, url, "fetch event resource").await
    }

    async fn get_event(&self, token: &str, event_id: &str) -> Result<GraphEvent> {
        self.get_json(token, &self.url(&format!("/me/events/{event_id}")), "get event").await
    }

    async fn create_event(&self, token: &str, body: &EventCreateRequest) -> Result<GraphEvent> {
        let response = self
            .client
            .post(self.url("/me/events"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(InfraError::from)?;
        let response = Self::check(response, "create event").await?;
        response.json().await.map_err(|e| {
            BridgeError::Network(format!("failed to parse create event response: {e}"))
        })
    }

    async fn patch_event_attendees(
        &self,
        token: &str,
        event_id: &str,
        body: &EventAttendeesPatch,
    ) -> Result<()> {
        self.patch_json(
            token,
            &self.url(&format!("/me/events/{event_id}")),
            body,
            "patch event attendees",
        )
        .await
    }

    async fn patch_event_times(
        &self,
        token: &str,
        event_id: &str,
        body: &EventTimesPatch,
    ) -> Result<()> {
        self.patch_json(
            token,
            &self.url(&format!("/me/events/{event_id}")),
            body,
            "patch event times",
        )
        .await
    }

    async fn delete_event(&self, token: &str, event_id: &str) -> Result<()> {
        self.delete(token, &self.url(&format!("/me/events/{event_id}")), "delete event").await
    }

    async fn find_event_id_by_join_url(
        &self,
        token: &str,
        join_url: &str,
    ) -> Result<Option<String>> {
        let filter = format!("onlineMeeting/joinUrl eq '{join_url}'");
        self.find_id(token, &self.url("/me/events"), &filter, "find event by join url").await
    }

    async fn get_online_meeting(
        &self,
        token: &str,
        meeting_id: &str,
    ) -> Result<GraphOnlineMeeting> {
        self.get_json(
            token,
            &self.url(&format!("/me/onlineMeetings/{meeting_id}")),
            "get online meeting",
        )
        .await
    }

    async fn patch_online_meeting_participants(
        &self,
        token: &str,
        meeting_id: &str,
        body: &OnlineMeetingParticipantsPatch,
    ) -> Result<()> {
        self.patch_json(
            token,
            &self.url(&format!("/me/onlineMeetings/{meeting_id}")),
            body,
            "patch online meeting participants",
        )
        .await
    }

    async fn patch_online_meeting_times(
        &self,
        token: &str,
        meeting_id: &str,
        body: &OnlineMeetingTimesPatch,
    ) -> Result<()> {
        self.patch_json(
            token,
            &self.url(&format!("/me/onlineMeetings/{meeting_id}")),
            body,
            "patch online meeting times",
        )
        .await
    }

    async fn delete_online_meeting(&self, token: &str, meeting_id: &str) -> Result<()> {
        self.delete(
            token,
            &self.url(&format!("/me/onlineMeetings/{meeting_id}")),
            "delete online meeting",
        )
        .await
    }

    async fn find_online_meeting_id_by_join_url(
        &self,
        token: &str,
        join_url: &str,
    ) -> Result<Option<String>> {
        let filter = format!("JoinWebUrl eq '{join_url}'");
        self.find_id(
            token,
            &self.url("/me/onlineMeetings"),
            &filter,
            "find online meeting by join url",
        )
        .await
    }

    async fn create_subscription(
        &self,
        token: &str,
        request: &SubscriptionRequest,
    ) -> Result<GraphSubscription> {
        let response = self
            .client
            .post(self.url("/subscriptions"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(InfraError::from)?;
        let response = Self::check(response, "create subscription").await?;
        response.json().await.map_err(|e| {
            BridgeError::Network(format!("failed to parse create subscription response: {e}"))
        })
    }

    async fn renew_subscription(
        &self,
        token: &str,
        subscription_id: &str,
        expires_at: &str,
    ) -> Result<bool> {
        let response = self
            .client
            .patch(self.url(&format!("/subscriptions/{subscription_id}")))
            .bearer_auth(token)
            .json(&serde_json::json!({ "expirationDateTime": expires_at }))
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        // A rejected renewal (gone or already expired) is a signal to
        // recreate, not a transport failure.
        let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
        warn!(subscription_id, status = %status, body, "subscription renewal rejected");
        Ok(false)
    }
}
