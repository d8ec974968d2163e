//! Connection settings shared by every request a session makes.

use crate::api::models::fetch_models;
use crate::api::ModelsResponse;
use crate::core::chat_stream::StreamParams;
use crate::core::config::Config;
use crate::core::manager::StreamTicket;
use crate::utils::url::normalize_base_url;
use std::error::Error;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SessionContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub chat_endpoint: String,
    pub models_endpoint: String,
}

impl SessionContext {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: normalize_base_url(&config.api.base_url),
            chat_endpoint: config.api.chat_endpoint.clone(),
            models_endpoint: config.api.models_endpoint.clone(),
        }
    }

    /// Build a session with its own HTTP client. Streams are long-lived, so
    /// only connecting is bounded by a timeout.
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::new(client, config))
    }

    pub fn build_stream_params(&self, ticket: &StreamTicket) -> StreamParams {
        StreamParams {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            chat_endpoint: self.chat_endpoint.clone(),
            model: ticket.model.clone(),
            api_messages: ticket.api_messages.clone(),
            cancel_token: ticket.cancel_token.clone(),
            stream_id: ticket.stream_id,
        }
    }

    pub async fn fetch_models(&self) -> Result<ModelsResponse, Box<dyn Error>> {
        fetch_models(&self.client, &self.base_url, &self.models_endpoint).await
    }
}
