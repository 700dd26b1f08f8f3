use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use scoreboard_entities::{domain::referee::NewReferee, prelude::*};
use scoreboard_server::{
    auth::{ChangePasswordRequest, LoginRequest, LoginResponse, SessionUser},
    events::{SubEventRequest, UpdateInfoRequest},
    response::APIErrorResponse,
    roster::RosterBatchRequest,
};
use sea_orm::prelude::Uuid;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::RemoteStore;
use crate::error::ClientError;

const USER_AGENT: &str = concat!("scoreboard/", env!("CARGO_PKG_VERSION"));

/// `RemoteStore` over the HTTP API of a scoreboard server.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl RestStore {
    /// `base_url` is the server root, without the `/api` suffix.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(RestStore {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_ref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<APIErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        debug!(status = status.as_u16(), message = %message, "Request rejected");

        Err(match status.as_u16() {
            400 => ClientError::validation_from_message(&message),
            401 | 403 => ClientError::Unauthorized(message),
            404 => ClientError::NotFound(message),
            code => ClientError::RemoteIO(format!("{}: {}", code, message)),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(builder).await.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        let response = self.authorized(builder).await.send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn sub_event_query(sub_event_id: Option<Uuid>) -> Vec<(&'static str, String)> {
        sub_event_id.map(|id| vec![("subEventId", id.to_string())]).unwrap_or_default()
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn login(&self, username: &str, password: &str) -> Result<SessionUser, ClientError> {
        let request = LoginRequest { username: username.to_string(), password: password.to_string() };
        let response: LoginResponse = self.send_json(self.client.post(self.url("/login")).json(&request)).await?;
        *self.token.write().await = Some(response.token);
        Ok(response.user)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let result = self.send(self.client.post(self.url("/logout"))).await;
        if let Err(e) = &result {
            warn!("Logout failed on server, dropping token anyway: {}", e);
        }
        *self.token.write().await = None;
        result
    }

    async fn change_admin_password(&self, password: &str) -> Result<(), ClientError> {
        let request = ChangePasswordRequest { password: password.to_string() };
        self.send(self.client.post(self.url("/admin/password")).json(&request)).await
    }

    async fn get_info(&self) -> Result<CompetitionInfo, ClientError> {
        self.send_json(self.client.get(self.url("/info"))).await
    }

    async fn update_info(&self, info: &CompetitionInfo) -> Result<(), ClientError> {
        let request = UpdateInfoRequest { name: info.name.clone(), config: info.award_config };
        self.send(self.client.post(self.url("/info")).json(&request)).await
    }

    async fn get_sub_events(&self) -> Result<Vec<SubEvent>, ClientError> {
        self.send_json(self.client.get(self.url("/events"))).await
    }

    async fn create_sub_event(&self, name: &str) -> Result<SubEvent, ClientError> {
        let request = SubEventRequest { name: name.to_string() };
        self.send_json(self.client.post(self.url("/events")).json(&request)).await
    }

    async fn rename_sub_event(&self, id: Uuid, name: &str) -> Result<SubEvent, ClientError> {
        let request = SubEventRequest { name: name.to_string() };
        self.send_json(self.client.put(self.url(&format!("/events/{}", id))).json(&request)).await
    }

    async fn delete_sub_event(&self, id: Uuid) -> Result<(), ClientError> {
        self.send(self.client.delete(self.url(&format!("/events/{}", id)))).await
    }

    async fn get_referees(&self) -> Result<Vec<Referee>, ClientError> {
        self.send_json(self.client.get(self.url("/referees"))).await
    }

    async fn create_referee(&self, referee: &NewReferee) -> Result<Referee, ClientError> {
        self.send_json(self.client.post(self.url("/referees")).json(referee)).await
    }

    async fn delete_referee(&self, id: Uuid) -> Result<(), ClientError> {
        self.send(self.client.delete(self.url(&format!("/referees/{}", id)))).await
    }

    async fn get_entries(&self, sub_event_id: Option<Uuid>) -> Result<Vec<Entry>, ClientError> {
        let query = Self::sub_event_query(sub_event_id);
        self.send_json(self.client.get(self.url("/entries")).query(&query)).await
    }

    async fn create_entry(&self, entry: &Entry) -> Result<Entry, ClientError> {
        self.send_json(self.client.post(self.url("/entries")).json(entry)).await
    }

    async fn update_entry(&self, id: Uuid, draft: &EntryDraft) -> Result<Entry, ClientError> {
        self.send_json(self.client.put(self.url(&format!("/entries/{}", id))).json(draft)).await
    }

    async fn delete_entry(&self, id: Uuid) -> Result<(), ClientError> {
        self.send(self.client.delete(self.url(&format!("/entries/{}", id)))).await
    }

    async fn get_roster(&self, sub_event_id: Option<Uuid>) -> Result<Vec<RosterItem>, ClientError> {
        let query = Self::sub_event_query(sub_event_id);
        self.send_json(self.client.get(self.url("/roster")).query(&query)).await
    }

    async fn upload_roster(&self, items: &[RosterItem]) -> Result<(), ClientError> {
        let request = RosterBatchRequest { items: items.to_vec() };
        self.send(self.client.post(self.url("/roster/batch")).json(&request)).await
    }
}
