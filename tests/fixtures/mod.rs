use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Agent Console service for driving the session controller in tests.
pub struct ConsoleMockServer {
    server: MockServer,
}

impl ConsoleMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }

    pub async fn mock_login_success(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_string_contains("username="))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": token })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login_failure(&self, status: u16, detail: Option<&str>) {
        let body = match detail {
            Some(detail) => json!({ "detail": detail }),
            None => json!({}),
        };
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_register_success(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": token })),
            )
            .mount(&self.server)
            .await;
    }

    /// Conversation-list endpoint, gated on the expected bearer token.
    pub async fn mock_conversations(&self, token: &str, conversations: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/conversations"))
            .and(header("Authorization", format!("Bearer {}", token)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "conversations": conversations })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_conversations_failure(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/conversations"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_conversation(&self, id: i64, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/conversations/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_conversation_failure(&self, id: i64, status: u16, detail: Option<&str>) {
        let body = match detail {
            Some(detail) => json!({ "detail": detail }),
            None => json!({}),
        };
        Mock::given(method("GET"))
            .and(path(format!("/api/conversations/{}", id)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_chat_success(&self, conversation_id: i64, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": conversation_id,
                "reply": reply,
            })))
            .mount(&self.server)
            .await;
    }

    /// One-shot chat failure; a later mounted success mock takes over after it
    /// has matched once.
    pub async fn mock_chat_failure_once(&self, status: u16, detail: Option<&str>) {
        let body = match detail {
            Some(detail) => json!({ "detail": detail }),
            None => json!({}),
        };
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_chat_unauthorized(&self) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Could not validate credentials",
            })))
            .mount(&self.server)
            .await;
    }
}
