//! REST client for the hosted data service.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use orderchat_core::{
    AuthUser, ChatMessage, NewChatMessage, ReservationNumber, UserId, UserProfile,
};

use crate::backend::ChatBackend;
use crate::config::ServiceConfig;
use crate::error::ClientError;
use crate::realtime;
use crate::subscription::Subscription;

/// Error body returned by the row API and functions.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Extract the service's own reason from an error response body.
fn service_reason(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => {
            debug!(
                details = ?parsed.details,
                hint = ?parsed.hint,
                code = ?parsed.code,
                "Service error body"
            );
            parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| format!("HTTP {}", status))
        }
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("HTTP {}", status),
    }
}

/// Data service backend over HTTP, with a websocket change feed.
pub struct RestBackend {
    inner: reqwest::Client,
    config: ServiceConfig,
}

impl RestBackend {
    /// Create a new REST backend.
    pub fn new(config: ServiceConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            inner: reqwest::Client::new(),
            config,
        })
    }

    /// The settings this backend was built with.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.config.bearer())
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Service {
            status: status.as_u16(),
            message: service_reason(status, &body),
        })
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ClientError> {
        let url = self.config.rest_url(table);
        debug!(url = %url, ?query, "GET rows");

        let response = self
            .authorized(self.inner.get(&url))
            .query(query)
            .send()
            .await?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for RestBackend {
    async fn fetch_messages(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        self.get_rows(
            &self.config.messages_table,
            &[
                ("select", "*".to_string()),
                ("reservation_number", format!("eq.{}", reservation)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn fetch_untranslated(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        self.get_rows(
            &self.config.messages_table,
            &[
                ("select", "*".to_string()),
                ("reservation_number", format!("eq.{}", reservation)),
                ("translated_message", "is.null".to_string()),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_message(&self, message: &NewChatMessage) -> Result<ChatMessage, ClientError> {
        let url = self.config.rest_url(&self.config.messages_table);
        debug!(url = %url, reservation = %message.reservation_number, "Inserting message");

        let response = self
            .authorized(self.inner.post(&url))
            .header("Prefer", "return=representation")
            .json(message)
            .send()
            .await?;

        let rows: Vec<ChatMessage> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound("insert returned no row".to_string()))
    }

    async fn subscribe(
        &self,
        reservation: &ReservationNumber,
    ) -> Result<Subscription, ClientError> {
        realtime::connect(&self.config, reservation).await
    }

    async fn invoke_translation(&self, record: &ChatMessage) -> Result<(), ClientError> {
        let url = self.config.function_url(&self.config.translate_function);
        debug!(url = %url, message_id = %record.id, "Invoking translation");

        let response = self
            .authorized(self.inner.post(&url))
            .json(&json!({ "record": record }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, ClientError> {
        if self.config.access_token.is_none() {
            return Ok(None);
        }

        let url = self.config.auth_user_url();
        debug!(url = %url, "Fetching current user");

        let response = self.authorized(self.inner.get(&url)).send().await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(Some(user))
    }

    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ClientError> {
        let rows: Vec<UserProfile> = self
            .get_rows(
                &self.config.profiles_table,
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{}", user_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_reason_prefers_message() {
        let body = r#"{"message":"new row violates row-level security policy","code":"42501","details":null,"hint":null}"#;
        assert_eq!(
            service_reason(StatusCode::FORBIDDEN, body),
            "new row violates row-level security policy"
        );
    }

    #[test]
    fn test_service_reason_falls_back() {
        assert_eq!(
            service_reason(StatusCode::BAD_GATEWAY, r#"{"error":"Function timed out"}"#),
            "Function timed out"
        );
        assert_eq!(service_reason(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(
            service_reason(StatusCode::BAD_GATEWAY, ""),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(RestBackend::new(ServiceConfig::new("ftp://x", "anon")).is_err());
        assert!(RestBackend::new(ServiceConfig::new("http://localhost:54321", "anon")).is_ok());
    }
}
