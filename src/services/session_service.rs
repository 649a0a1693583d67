use std::sync::Arc;
use tracing::{info, warn};

use super::api_client::{ApiClient, ApiError};
use super::token_store::TokenStore;
use crate::models::{ChatMessage, ConversationSummary, Role};

const AUTH_FAILED: &str = "Authentication failed";
const LOAD_CONVERSATION_FAILED: &str = "Failed to load conversation";
const SEND_FAILED: &str = "Request failed";
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
const NOT_SIGNED_IN: &str = "Not signed in";

/// A message as the session holds it: the wire message plus delivery state.
/// A user message whose send failed stays in the list, marked unsent; the next
/// successful send transmits the whole list and clears the marks.
#[derive(Debug, Clone)]
pub struct SessionMessage {
    pub message: ChatMessage,
    pub unsent: bool,
}

impl SessionMessage {
    fn sent(message: ChatMessage) -> Self {
        Self {
            message,
            unsent: false,
        }
    }
}

/// Owns the session state machine: bearer-token lifecycle, the active
/// conversation, its message list, the saved-conversation list, and the
/// composer draft. Every network exchange goes through here.
///
/// Operations take `&mut self`, so a second mutating call cannot start while
/// one is awaiting; that is the whole concurrency story.
pub struct SessionController {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    token: Option<String>,
    conversation_id: Option<i64>,
    conversation_title: Option<String>,
    messages: Vec<SessionMessage>,
    conversations: Vec<ConversationSummary>,
    draft: String,
    error: Option<String>,
}

impl SessionController {
    /// Reads the persisted token once; a found token starts the session in the
    /// authenticated state. Call [`resume`](Self::resume) afterwards to prime
    /// the conversation list.
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!("failed to read stored token: {}", err);
                None
            }
        };

        Self {
            api,
            store,
            token,
            conversation_id: None,
            conversation_title: None,
            messages: Vec::new(),
            conversations: Vec::new(),
            draft: String::new(),
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    pub fn conversation_title(&self) -> Option<&str> {
        self.conversation_title.as_deref()
    }

    pub fn messages(&self) -> &[SessionMessage] {
        &self.messages
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Startup trigger: when construction found a persisted token, the session
    /// is already authenticated and the conversation list gets its first
    /// refresh here.
    pub async fn resume(&mut self) {
        if self.is_authenticated() {
            self.refresh_conversations().await;
        }
    }

    /// Exchange credentials for a session. Blank input (after trimming) is
    /// refused locally: no request, no message.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), String> {
        let (username, password) = (username.trim(), password.trim());
        if username.is_empty() || password.is_empty() {
            return Ok(());
        }

        self.error = None;
        match self.api.login(username, password).await {
            Ok(token) => self.adopt_token(token).await,
            Err(err) => Err(self.fail(err.surface(AUTH_FAILED))),
        }
    }

    /// Create an account and start its session. Same input rules as login.
    pub async fn register(&mut self, username: &str, password: &str) -> Result<(), String> {
        let (username, password) = (username.trim(), password.trim());
        if username.is_empty() || password.is_empty() {
            return Ok(());
        }

        self.error = None;
        match self.api.register(username, password).await {
            Ok(token) => self.adopt_token(token).await,
            Err(err) => Err(self.fail(err.surface(AUTH_FAILED))),
        }
    }

    async fn adopt_token(&mut self, token: String) -> Result<(), String> {
        if let Err(err) = self.store.save(&token) {
            warn!("failed to persist session token: {}", err);
        }
        self.token = Some(token);
        self.refresh_conversations().await;
        Ok(())
    }

    /// Replace the saved-conversation list wholesale. Best-effort: failures
    /// keep the previous list and stay out of the user's way, except a
    /// rejected token, which ends the session.
    pub async fn refresh_conversations(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };

        match self.api.conversations(&token).await {
            Ok(conversations) => self.conversations = conversations,
            Err(ApiError::Unauthorized { .. }) => self.expire_session(),
            Err(err) => warn!("conversation list refresh failed: {}", err),
        }
    }

    /// Fetch a saved conversation and make it active. System messages are
    /// dropped from the fetched history; the rest keeps server order. On
    /// failure the previously active conversation stays in place.
    pub async fn open_conversation(&mut self, id: i64) -> Result<(), String> {
        let Some(token) = self.token.clone() else {
            return Err(NOT_SIGNED_IN.to_string());
        };

        self.error = None;
        match self.api.conversation(&token, id).await {
            Ok(detail) => {
                self.conversation_id = Some(detail.conversation.id);
                self.conversation_title = detail.conversation.title;
                self.messages = detail
                    .messages
                    .into_iter()
                    .filter(|message| message.role != Role::System)
                    .map(SessionMessage::sent)
                    .collect();
                Ok(())
            }
            Err(ApiError::Unauthorized { .. }) => {
                self.expire_session();
                Err(SESSION_EXPIRED.to_string())
            }
            Err(err) => Err(self.fail(err.surface(LOAD_CONVERSATION_FAILED))),
        }
    }

    /// Drop back to a fresh, unsaved chat. Purely local, never fails.
    pub fn start_new_chat(&mut self) {
        self.conversation_id = None;
        self.conversation_title = None;
        self.messages.clear();
        self.draft.clear();
        self.error = None;
    }

    /// Send the composer draft. A blank draft is a no-op that leaves both the
    /// draft and the message list untouched. Otherwise the user message is
    /// appended before the request goes out and is never rolled back; a failed
    /// send only marks it unsent.
    pub async fn send_message(&mut self) -> Result<(), String> {
        let Some(token) = self.token.clone() else {
            return Err(NOT_SIGNED_IN.to_string());
        };

        let text = self.draft.trim().to_string();
        if text.is_empty() {
            return Ok(());
        }

        self.error = None;
        self.messages
            .push(SessionMessage::sent(ChatMessage::user(&text)));
        self.draft.clear();

        let outgoing: Vec<ChatMessage> = self
            .messages
            .iter()
            .map(|held| held.message.clone())
            .collect();

        match self.api.chat(&token, outgoing, self.conversation_id).await {
            Ok(reply) => {
                self.conversation_id = Some(reply.conversation_id);
                // The request carried the full list, so everything in it is
                // now delivered, including earlier failures.
                for held in &mut self.messages {
                    held.unsent = false;
                }
                self.messages
                    .push(SessionMessage::sent(ChatMessage::assistant(&reply.reply)));
                self.refresh_conversations().await;
                Ok(())
            }
            Err(ApiError::Unauthorized { .. }) => {
                self.expire_session();
                Err(SESSION_EXPIRED.to_string())
            }
            Err(err) => {
                if let Some(last) = self.messages.last_mut() {
                    last.unsent = true;
                }
                Err(self.fail(err.surface(SEND_FAILED)))
            }
        }
    }

    /// End the session: token gone from durable storage, all in-memory state
    /// back to initial values. No network call.
    pub fn logout(&mut self) -> Result<(), String> {
        self.reset();
        self.store.clear()
    }

    fn expire_session(&mut self) {
        info!("authorization rejected; ending session");
        self.reset();
        if let Err(err) = self.store.clear() {
            warn!("failed to clear stored token: {}", err);
        }
        self.error = Some(SESSION_EXPIRED.to_string());
    }

    fn reset(&mut self) {
        self.token = None;
        self.conversation_id = None;
        self.conversation_title = None;
        self.messages.clear();
        self.conversations.clear();
        self.draft.clear();
        self.error = None;
    }

    fn fail(&mut self, message: String) -> String {
        self.error = Some(message.clone());
        message
    }
}
