use crate::domain::errors::NotificationError;
use crate::domain::ports::AlertSink;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Delivers alerts through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: Option<String>, chat_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        let token = token.filter(|t| !t.trim().is_empty());
        let chat_id = chat_id.filter(|c| !c.trim().is_empty());
        if token.is_none() || chat_id.is_none() {
            warn!("TelegramNotifier: credentials not set, alerts will only be logged");
        }

        Self {
            client,
            api_url: TELEGRAM_API.to_string(),
            token,
            chat_id,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotificationError> {
        let (Some(token), Some(chat_id)) = (&self.token, &self.chat_id) else {
            return Err(NotificationError::MissingCredentials);
        };

        let url = format!("{}/bot{}/sendMessage", self.api_url, token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id,
                text: message,
            })
            .send()
            .await
            .map_err(|e| NotificationError::Transport {
                // reqwest errors embed the URL, which carries the token
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!("TelegramNotifier: alert delivered to chat {}", chat_id);
        Ok(())
    }
}
