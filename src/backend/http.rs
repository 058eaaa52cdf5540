//! HTTP agent backend — JSON over reqwest

use super::{AgentBackend, Endpoint};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::types::{
    AgentRequest, AgentResponse, ConversationResponse, HealthStatus, SystemPromptBody,
    ToolCatalog, UpdateToolsRequest, UpdateToolsResponse,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Agent backend reached over HTTP
///
/// Every endpoint is resolved against `base_url`. Requests and responses
/// are JSON; any non-2xx status is a failure regardless of body.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend with no request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None)
    }

    /// Create a backend from console configuration
    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        config.validate()?;
        Self::build(config.base_url.clone(), config.request_timeout())
    }

    fn build(base_url: String, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Send a request and reject transport failures and non-2xx statuses
    async fn send(
        &self,
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ConsoleError::transport(endpoint.path(), e))?;

        let status = response.status();
        tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Backend responded");

        if !status.is_success() {
            return Err(ConsoleError::Http {
                endpoint: endpoint.path().to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Decode a 2xx body into its typed shape
    async fn decode<T: DeserializeOwned>(
        endpoint: Endpoint,
        response: reqwest::Response,
    ) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|e| ConsoleError::transport(endpoint.path(), e))?;
        serde_json::from_str(&body).map_err(|e| ConsoleError::malformed(endpoint.path(), e))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let request = self.client.get(self.url(endpoint));
        let response = self.send(endpoint, request).await?;
        Self::decode(endpoint, response).await
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<reqwest::Response> {
        // `json` also sets `Content-Type: application/json`
        let request = self.client.post(self.url(endpoint)).json(body);
        self.send(endpoint, request).await
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn conversation(&self, user_id: &str) -> Result<ConversationResponse> {
        let endpoint = Endpoint::Conversations;
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("userId", user_id)]);
        let response = self.send(endpoint, request).await?;
        Self::decode(endpoint, response).await
    }

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let response = self.post(Endpoint::Agent, request).await?;
        Self::decode(Endpoint::Agent, response).await
    }

    async fn system_prompt(&self) -> Result<String> {
        let body: SystemPromptBody = self.get(Endpoint::GetSystemPrompt).await?;
        Ok(body.system_prompt)
    }

    async fn set_system_prompt(&self, prompt: &str) -> Result<()> {
        let body = SystemPromptBody {
            system_prompt: prompt.to_string(),
        };
        // Only the status matters
        self.post(Endpoint::SetSystemPrompt, &body).await?;
        Ok(())
    }

    async fn tool_catalog(&self) -> Result<ToolCatalog> {
        self.get(Endpoint::Tools).await
    }

    async fn update_tools(&self, tools: &[String]) -> Result<UpdateToolsResponse> {
        let body = UpdateToolsRequest {
            tools: tools.to_vec(),
        };
        let response = self.post(Endpoint::UpdateTools, &body).await?;
        Self::decode(Endpoint::UpdateTools, response).await
    }

    fn name(&self) -> &str {
        "http"
    }

    async fn health(&self) -> Result<bool> {
        let status: HealthStatus = self.get(Endpoint::Health).await?;
        Ok(status.status == "healthy")
    }
}
