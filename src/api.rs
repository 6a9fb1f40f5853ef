//! Administrative HTTP calls: starting and stopping games, managing sessions.
//!
//! Results are only reported, never retried.

use crate::config::ServerAddress;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `{ "message": ... }` reply shared by all admin endpoints
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AdminReply {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct SessionList {
    #[serde(default)]
    sessions: Vec<String>,
}

/// Error body, either FastAPI style `detail` or our own `message`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    game_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    game_id: &'a str,
    target_song_count: u32,
    music_service_type: &'a str,
}

#[derive(Debug, Serialize)]
struct JoinRequest<'a> {
    game_id: &'a str,
    user_name: &'a str,
}

pub struct AdminClient {
    server: ServerAddress,
    client: reqwest::Client,
}

impl AdminClient {
    pub fn new(server: ServerAddress, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { server, client })
    }

    /// Start the game. Multi-session servers need the `game_id`.
    pub async fn start(&self, game_id: Option<&str>) -> ClientResult<AdminReply> {
        let request = self.client.post(self.server.http_url("start"));
        let request = match game_id {
            Some(game_id) => request.json(&StartRequest { game_id }),
            None => request,
        };
        let reply: AdminReply = self.send(request).await?;
        tracing::info!("Game started: {}", reply.message);
        Ok(reply)
    }

    pub async fn shutdown(&self) -> ClientResult<AdminReply> {
        let reply: AdminReply = self
            .send(self.client.post(self.server.http_url("shutdown")))
            .await?;
        tracing::info!("Server shutting down: {}", reply.message);
        Ok(reply)
    }

    pub async fn create_session(
        &self,
        game_id: &str,
        target_song_count: u32,
        music_service_type: &str,
    ) -> ClientResult<AdminReply> {
        let request = self
            .client
            .post(self.server.http_url("create"))
            .json(&CreateRequest {
                game_id,
                target_song_count,
                music_service_type,
            });
        let reply: AdminReply = self.send(request).await?;
        tracing::info!("Created session {}: {}", game_id, reply.message);
        Ok(reply)
    }

    pub async fn join_session(&self, game_id: &str, user_name: &str) -> ClientResult<AdminReply> {
        let request = self
            .client
            .post(self.server.http_url("join"))
            .json(&JoinRequest { game_id, user_name });
        let reply: AdminReply = self.send(request).await?;
        tracing::info!("Joined session {} as {}", game_id, user_name);
        Ok(reply)
    }

    /// Sessions that have not started yet
    pub async fn list_sessions(&self) -> ClientResult<Vec<String>> {
        let list: SessionList = self
            .send(self.client.get(self.server.http_url("list-sessions")))
            .await?;
        Ok(list.sessions)
    }

    async fn send<T>(&self, request: reqwest::RequestBuilder) -> ClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Admin request failed: {}", e);
            ClientError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!("Server answered {}: {}", status, message);
            return Err(ClientError::Admin {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
            ..
        }) => detail,
        Ok(ErrorBody {
            detail: Some(detail),
            ..
        }) => detail.to_string(),
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.trim().to_string(),
    }
}
