//! HTTP Conversation Store
//!
//! Client for the backend's `/conversations` resource. Reads and saves
//! degrade after logging; delete propagates its failure.

use std::time::Duration;

use async_trait::async_trait;
use shuka_core::{AgentError, Conversation, ConversationHeader, ConversationStore, Settings};

use crate::error::{BackendError, Result};

const STORE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpConversationStore {
    client: reqwest::Client,
    /// API root, e.g. `http://localhost:5000/api`
    base_url: String,
}

impl HttpConversationStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(STORE_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.store_url.trim().is_empty() {
            return Err(BackendError::Config("Conversation store URL is not set".into()));
        }
        Self::new(settings.store_url.clone())
    }

    fn collection(&self) -> String {
        format!("{}/conversations", self.base_url)
    }

    fn item(&self, id: &str) -> String {
        format!("{}/conversations/{id}", self.base_url)
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn try_list(&self) -> Result<Vec<ConversationHeader>> {
        let response = self.client.get(self.collection()).send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn try_get(&self, id: &str) -> Result<Option<Conversation>> {
        let response = self.client.get(self.item(id)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::expect_success(response).await?.json().await?))
    }

    async fn try_save(&self, conversation: &Conversation) -> Result<()> {
        let response = self.client.post(self.collection()).json(conversation).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn try_delete(&self, id: &str) -> Result<()> {
        let response = self.client.delete(self.item(id)).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn list(&self) -> Vec<ConversationHeader> {
        self.try_list().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list conversations");
            Vec::new()
        })
    }

    async fn get(&self, id: &str) -> Option<Conversation> {
        self.try_get(id).await.unwrap_or_else(|e| {
            tracing::warn!(id, error = %e, "failed to load conversation");
            None
        })
    }

    async fn save(&self, conversation: &Conversation) -> bool {
        match self.try_save(conversation).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id = %conversation.id, error = %e, "failed to save conversation");
                false
            }
        }
    }

    async fn delete(&self, id: &str) -> shuka_core::Result<()> {
        self.try_delete(id).await.map_err(|e| {
            tracing::error!(id, error = %e, "failed to delete conversation");
            AgentError::Store(e.to_string())
        })
    }
}
