//! HTTP client for a running Ninebets server

use async_trait::async_trait;
use ninebets_core::clock::TrackRemaining;
use ninebets_core::round::HistoryRecord;
use ninebets_core::store::{DrawRecord, HistorySink, StoreError};
use ninebets_web::handlers::TimersResponse;
use reqwest::{Response, StatusCode};
use url::Url;

/// Errors talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid server URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Server rejected {endpoint} with status {status}: {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },
}

/// Thin JSON client over the server endpoints.
#[derive(Debug, Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base: Url,
}

impl ServerClient {
    /// # Errors
    /// - `ClientError::InvalidUrl` - `base` is not an absolute URL
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base).map_err(|e| ClientError::InvalidUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|e| ClientError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    /// Current countdown of every track.
    ///
    /// # Errors
    /// - `ClientError::Request` - Server unreachable or response malformed
    /// - `ClientError::Rejected` - Non-success status
    pub async fn fetch_timers(&self) -> Result<Vec<TrackRemaining>, ClientError> {
        let url = self.endpoint("timer")?;
        let response = self.http.get(url).send().await.map_err(request_error("timer"))?;
        let timers: TimersResponse = checked(response, "timer")
            .await?
            .json()
            .await
            .map_err(request_error("timer"))?;
        Ok(timers.timers)
    }

    /// Restarts the shared cycle.
    ///
    /// # Errors
    /// - `ClientError::Request` - Server unreachable
    /// - `ClientError::Rejected` - Token refused or non-success status
    pub async fn reset_timers(&self, admin_token: &str) -> Result<(), ClientError> {
        let url = self.endpoint("timer?reset")?;
        let response = self
            .http
            .post(url)
            .header("x-admin-token", admin_token)
            .send()
            .await
            .map_err(request_error("timer?reset"))?;
        checked(response, "timer?reset").await?;
        Ok(())
    }

    /// Registers `user_id` unless the server already knows it.
    ///
    /// # Errors
    /// - `ClientError::Request` - Server unreachable
    /// - `ClientError::Rejected` - Registration refused
    pub async fn ensure_user(&self, user_id: &str) -> Result<(), ClientError> {
        let path = format!("users/{user_id}");
        let response = self
            .http
            .get(self.endpoint(&path)?)
            .send()
            .await
            .map_err(request_error(&path))?;
        if response.status() != StatusCode::NOT_FOUND {
            checked(response, &path).await?;
            return Ok(());
        }

        let response = self
            .http
            .post(self.endpoint("users")?)
            .json(&serde_json::json!({ "id": user_id }))
            .send()
            .await
            .map_err(request_error("users"))?;
        checked(response, "users").await?;
        tracing::info!(user_id, "Registered user");
        Ok(())
    }

    /// # Errors
    /// - `ClientError::Request` - Server unreachable
    /// - `ClientError::Rejected` - Unknown user or non-success status
    pub async fn post_history(&self, user_id: &str, record: &HistoryRecord) -> Result<(), ClientError> {
        let path = format!("users/{user_id}/history");
        let response = self
            .http
            .post(self.endpoint(&path)?)
            .json(record)
            .send()
            .await
            .map_err(request_error(&path))?;
        checked(response, &path).await?;
        Ok(())
    }

    /// # Errors
    /// - `ClientError::Request` - Server unreachable
    /// - `ClientError::Rejected` - Non-success status
    pub async fn post_draw(&self, draw: &DrawRecord) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint("draws")?)
            .json(draw)
            .send()
            .await
            .map_err(request_error("draws"))?;
        checked(response, "draws").await?;
        Ok(())
    }
}

fn request_error(endpoint: &str) -> impl Fn(reqwest::Error) -> ClientError + '_ {
    move |e| ClientError::Request {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

async fn checked(response: Response, endpoint: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    Err(ClientError::Rejected {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Persists scheduler output through the server API.
pub struct HttpHistorySink {
    client: ServerClient,
}

impl HttpHistorySink {
    pub fn new(client: ServerClient) -> Self {
        Self { client }
    }
}

fn into_store_error(error: ClientError, user_id: Option<&str>) -> StoreError {
    match (error, user_id) {
        (ClientError::Rejected { status: 404, .. }, Some(user_id)) => StoreError::UserNotFound {
            user_id: user_id.to_string(),
        },
        (error, _) => StoreError::Unavailable {
            reason: error.to_string(),
        },
    }
}

#[async_trait]
impl HistorySink for HttpHistorySink {
    async fn append_history(&self, user_id: &str, record: HistoryRecord) -> Result<(), StoreError> {
        self.client
            .post_history(user_id, &record)
            .await
            .map_err(|e| into_store_error(e, Some(user_id)))
    }

    async fn record_draw(&self, draw: DrawRecord) -> Result<(), StoreError> {
        self.client
            .post_draw(&draw)
            .await
            .map_err(|e| into_store_error(e, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_base() {
        let client = ServerClient::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(
            client.endpoint("timer?reset").unwrap().as_str(),
            "http://127.0.0.1:3000/timer?reset"
        );
        assert_eq!(
            client.endpoint("users/alice/history").unwrap().as_str(),
            "http://127.0.0.1:3000/users/alice/history"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ServerClient::new("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_rejections_map_to_store_errors() {
        let missing = ClientError::Rejected {
            endpoint: "users/bob/history".to_string(),
            status: 404,
            message: "User not found".to_string(),
        };
        assert_eq!(
            into_store_error(missing, Some("bob")),
            StoreError::UserNotFound {
                user_id: "bob".to_string()
            }
        );

        let down = ClientError::Request {
            endpoint: "draws".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(matches!(
            into_store_error(down, None),
            StoreError::Unavailable { .. }
        ));
    }
}
