use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ChatMessage, ChatReply, ChatRequest, ConversationDetail, ConversationSummary};

/// Error body the service attaches to non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ConversationsResponse {
    #[serde(default)]
    conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The service rejected the bearer token. Callers treat this as the end of
    /// the session, not as an ordinary request failure.
    #[error("authorization rejected")]
    Unauthorized { detail: Option<String> },
    #[error("API error ({status})")]
    Status { status: u16, detail: Option<String> },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => detail.as_deref(),
            ApiError::Transport(_) => None,
        }
    }

    /// User-facing message: the service's `detail` when it sent one, the
    /// per-operation fallback otherwise. Transport failures surface verbatim.
    pub fn surface(&self, fallback: &str) -> String {
        match self {
            ApiError::Transport(err) => err.to_string(),
            other => other
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

/// Client for the Agent Console chat service
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for long replies
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a new account; returns the bearer token for the new session.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, ApiError> {
        self.credential_exchange("/api/register", username, password)
            .await
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        self.credential_exchange("/api/login", username, password)
            .await
    }

    async fn credential_exchange(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the saved-conversation list, in server order.
    pub async fn conversations(&self, token: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/api/conversations"))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: ConversationsResponse = response.json().await?;
        Ok(body.conversations)
    }

    /// Fetch one conversation with its full message history.
    pub async fn conversation(&self, token: &str, id: i64) -> Result<ConversationDetail, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/api/conversations/{}", id)))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(response.json().await?)
    }

    /// Send the current message history; the service persists it, produces the
    /// assistant reply, and returns the conversation id (assigning one when
    /// `conversation_id` was null).
    pub async fn chat(
        &self,
        token: &str,
        messages: Vec<ChatMessage>,
        conversation_id: Option<i64>,
    ) -> Result<ChatReply, ApiError> {
        let request = ChatRequest {
            messages,
            conversation_id,
        };

        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .header("Authorization", format!("Bearer {}", token))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(response.json().await?)
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { detail }
        } else {
            ApiError::Status {
                status: status.as_u16(),
                detail,
            }
        }
    }
}
