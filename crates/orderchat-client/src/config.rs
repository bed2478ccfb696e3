//! Data service configuration.

use crate::error::ClientError;

/// Connection settings for the hosted data service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub url: String,

    /// Public API key sent with every request.
    pub anon_key: String,

    /// User access token. Without one there is no authenticated session.
    pub access_token: Option<String>,

    /// Table holding chat rows.
    pub messages_table: String,

    /// Table holding user profiles.
    pub profiles_table: String,

    /// Serverless function that translates a stored message.
    pub translate_function: String,

    /// Realtime heartbeat interval (seconds).
    pub heartbeat_interval_secs: u64,

    /// Change events buffered per subscription.
    pub event_buffer: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".to_string(),
            anon_key: String::new(),
            access_token: None,
            messages_table: "chat_messages".to_string(),
            profiles_table: "user_profiles".to_string(),
            translate_function: "translate-message".to_string(),
            heartbeat_interval_secs: 30,
            event_buffer: 256,
        }
    }
}

impl ServiceConfig {
    /// Create a config for a project URL and key, with defaults elsewhere.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    /// Set the user access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Check the settings before any request goes out.
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "url must start with http:// or https://, got '{}'",
                self.url
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ClientError::Config("anon key is empty".to_string()));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(ClientError::Config(
                "heartbeat interval must be positive".to_string(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(ClientError::Config("event buffer must be positive".to_string()));
        }
        Ok(())
    }

    /// Token for the `Authorization` header.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    /// REST endpoint of a table.
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Endpoint of a serverless function.
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.url, name)
    }

    /// Endpoint returning the current auth user.
    pub fn auth_user_url(&self) -> String {
        format!("{}/auth/v1/user", self.url)
    }

    /// Websocket endpoint of the realtime change feed.
    pub fn realtime_url(&self) -> Result<String, ClientError> {
        let ws_base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(ClientError::Config(format!(
                "cannot derive realtime url from '{}'",
                self.url
            )));
        };
        Ok(format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.anon_key
        ))
    }
}
