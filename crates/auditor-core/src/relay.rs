//! Prompt relay for the hosted chat-completion API.
//!
//! A prompt goes out as one chat-completion request and whatever JSON comes
//! back is handed to the caller pretty-printed. HTTP status codes are not
//! inspected, and every failure collapses to [`ERROR_TEXT`] at the display
//! boundary after being logged.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::audit::{self, AuditReport};
use crate::config::Config;
use crate::mode::RelayMode;

/// Text shown in place of a result whenever the relay fails.
pub const ERROR_TEXT: &str = "Error running model";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A single-message conversation carrying the prompt as the user turn.
    pub fn user(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
        }
    }
}

/// Errors that can occur while relaying a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The request never produced a response body
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body was not valid JSON
    #[error("response is not valid json: {0}")]
    Decode(String),

    /// The provider reported an error inside an otherwise valid JSON body
    #[error("provider reported an error: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Transport(e.to_string())
    }
}

/// Sends a request body somewhere and returns the raw response text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ChatRequest) -> Result<String, RelayError>;
}

/// reqwest-backed transport for an OpenAI-compatible endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &ChatRequest) -> Result<String, RelayError> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.json(request).send().await?;
        debug!(status = %response.status(), endpoint = %self.endpoint, "completion response received");

        Ok(response.text().await?)
    }
}

#[derive(Clone)]
pub struct Relay {
    transport: Arc<dyn Transport>,
    model: String,
}

impl Relay {
    pub fn new(transport: Arc<dyn Transport>, model: &str) -> Self {
        Self {
            transport,
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.api_key.is_none() {
            warn!("no API key configured, requests will be sent without authorization");
        }
        let transport = HttpTransport::new(&config.endpoint, config.api_key.clone());
        Self::new(Arc::new(transport), &config.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Relay `prompt` verbatim as a single user message.
    pub async fn run(&self, prompt: &str) -> Result<Value, RelayError> {
        let request = ChatRequest::user(&self.model, prompt);
        self.dispatch(&request).await
    }

    /// Relay `contract` wrapped in the security audit prompt.
    pub async fn audit(&self, contract: &str) -> Result<Value, RelayError> {
        let request = audit::audit_request(&self.model, contract);
        self.dispatch(&request).await
    }

    /// Relay `prompt` and return the text to display.
    pub async fn submit(&self, prompt: &str) -> String {
        render(self.run(prompt).await)
    }

    /// Audit `contract` and return the text to display plus the parsed report.
    pub async fn submit_audit(&self, contract: &str) -> (String, Option<AuditReport>) {
        let outcome = self.audit(contract).await;
        let report = outcome
            .as_ref()
            .ok()
            .and_then(reply_content)
            .map(AuditReport::parse);
        (render(outcome), report)
    }

    pub async fn submit_as(&self, mode: RelayMode, input: &str) -> (String, Option<AuditReport>) {
        match mode {
            RelayMode::Ask => (self.submit(input).await, None),
            RelayMode::Audit => self.submit_audit(input).await,
        }
    }

    async fn dispatch(&self, request: &ChatRequest) -> Result<Value, RelayError> {
        debug!(model = %request.model, messages = request.messages.len(), "relaying prompt");

        let body = self.transport.post(request).await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| RelayError::Decode(e.to_string()))?;

        // Provider errors are still displayed as-is
        if let Some(message) = remote_error(&value) {
            warn!(error = %RelayError::Remote(message), "completion API returned an error payload");
        }

        Ok(value)
    }
}

/// Turn a relay outcome into display text, logging failures.
pub fn render(outcome: Result<Value, RelayError>) -> String {
    match outcome {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|e| {
            error!(error = %e, "failed to format completion response");
            ERROR_TEXT.to_string()
        }),
        Err(e) => {
            error!(error = %e, "relay request failed");
            ERROR_TEXT.to_string()
        }
    }
}

/// Error message embedded in a provider response, if any.
pub fn remote_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}

/// Assistant text of the first choice in a chat-completion response.
pub fn reply_content(value: &Value) -> Option<&str> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use serde_json::json;
    use mockito::{Matcher, Server};
    use tokio::net::TcpListener;

    /// Records every request body and replays a canned reply.
    struct MockTransport {
        reply: Result<String, RelayError>,
        sent: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn replying(body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body.to_string()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(RelayError::Transport(message.to_string())),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn last_body(&self) -> Value {
            let sent = self.sent.lock().unwrap();
            serde_json::from_str(sent.last().expect("no request sent")).unwrap()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn post(&self, request: &ChatRequest) -> Result<String, RelayError> {
            self.sent
                .lock()
                .unwrap()
                .push(serde_json::to_string(request).unwrap());
            self.reply.clone()
        }
    }

    fn relay_with(transport: Arc<MockTransport>) -> Relay {
        Relay::new(transport, "gpt-4o")
    }

    #[tokio::test]
    async fn test_prompt_is_serialized_losslessly() {
        let long = "a".repeat(100_000);
        let prompts = [
            "",
            "reentrancy check",
            "quote \" backslash \\ newline \n tab \t",
            "unicode ✓ 日本語 \u{1F600} \u{0007}",
            "function withdraw() { msg.sender.call{value: bal}(\"\"); }",
            long.as_str(),
        ];

        for prompt in prompts {
            let transport = MockTransport::replying("{}");
            relay_with(transport.clone()).submit(prompt).await;

            let body = transport.last_body();
            assert_eq!(body["model"], "gpt-4o");
            assert_eq!(body["messages"].as_array().unwrap().len(), 1);
            assert_eq!(body["messages"][0]["role"], "user");
            assert_eq!(body["messages"][0]["content"].as_str().unwrap(), prompt);
        }
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest::user("gpt-4o", "hi");
        let body = serde_json::to_string(&request).unwrap();
        assert_eq!(
            body,
            r#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}]}"#
        );
    }

    #[tokio::test]
    async fn test_reply_is_pretty_printed() {
        let reply = r#"{"choices":[{"message":{"content":"No issues found"}}]}"#;
        let transport = MockTransport::replying(reply);

        let result = relay_with(transport).submit("reentrancy check").await;

        let expected = serde_json::to_string_pretty(&json!({
            "choices": [{ "message": { "content": "No issues found" } }]
        }))
        .unwrap();
        assert_eq!(result, expected);
        assert!(result.contains("\n  \"choices\": ["));
    }

    #[tokio::test]
    async fn test_error_payload_is_still_displayed() {
        let reply = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let transport = MockTransport::replying(reply);

        let result = relay_with(transport).submit("hello").await;

        assert_ne!(result, ERROR_TEXT);
        let shown: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(shown["error"]["message"], "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_key_order_is_preserved() {
        let transport = MockTransport::replying(r#"{"zeta":1,"alpha":2,"id":"x"}"#);

        let result = relay_with(transport).submit("order").await;

        let zeta = result.find("zeta").unwrap();
        let alpha = result.find("alpha").unwrap();
        let id = result.find("\"id\"").unwrap();
        assert!(zeta < alpha && alpha < id);
    }

    #[tokio::test]
    async fn test_connection_failure_shows_error_text() {
        let transport = MockTransport::failing("connection refused");

        let result = relay_with(transport).submit("").await;

        assert_eq!(result, ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_malformed_json_shows_error_text() {
        for body in ["<html>502 Bad Gateway</html>", "", "{\"choices\": [", "null trailing"] {
            let transport = MockTransport::replying(body);
            let result = relay_with(transport).submit("reentrancy check").await;
            assert_eq!(result, ERROR_TEXT, "body {:?} should not render", body);
        }
    }

    #[tokio::test]
    async fn test_run_tags_failures() {
        let transport = MockTransport::replying("not json");
        let err = relay_with(transport).run("x").await.unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));

        let transport = MockTransport::failing("dns error");
        let err = relay_with(transport).run("x").await.unwrap_err();
        assert_eq!(err, RelayError::Transport("dns error".to_string()));
    }

    #[test]
    fn test_remote_error_extraction() {
        assert_eq!(
            remote_error(&json!({"error": {"message": "rate limited"}})),
            Some("rate limited".to_string())
        );
        assert_eq!(
            remote_error(&json!({"error": "prompt required"})),
            Some("prompt required".to_string())
        );
        assert_eq!(
            remote_error(&json!({"error": {"code": 500}})),
            Some(r#"{"code":500}"#.to_string())
        );
        assert_eq!(remote_error(&json!({"error": null})), None);
        assert_eq!(remote_error(&json!({"choices": []})), None);
        assert_eq!(remote_error(&json!([1, 2])), None);
    }

    #[test]
    fn test_reply_content() {
        let value = json!({"choices":[{"message":{"role":"assistant","content":"No issues found"}}]});
        assert_eq!(reply_content(&value), Some("No issues found"));
        assert_eq!(reply_content(&json!({"choices": []})), None);
        assert_eq!(reply_content(&json!({"error": "x"})), None);
    }

    #[tokio::test]
    async fn test_submit_as_ask_sends_prompt_verbatim() {
        let transport = MockTransport::replying("{}");
        let (text, report) = relay_with(transport.clone())
            .submit_as(RelayMode::Ask, "contract A {}")
            .await;

        assert_eq!(text, "{}");
        assert!(report.is_none());
        assert_eq!(transport.last_body()["messages"][0]["content"], "contract A {}");
    }

    #[tokio::test]
    async fn test_submit_audit_parses_report() {
        let reply = json!({
            "choices": [{ "message": { "content": "SCORE: 72\nCRITICAL: 1\nHIGH: 2\nMEDIUM: 0\nSUMMARY: Reentrancy in withdraw\nISSUES: reentrancy, tx.origin auth" } }]
        });
        let transport = MockTransport::replying(&reply.to_string());

        let (text, report) = relay_with(transport.clone())
            .submit_audit("contract Vault {}")
            .await;

        assert_eq!(text, serde_json::to_string_pretty(&reply).unwrap());
        let report = report.unwrap();
        assert_eq!(report.score, 72);
        assert_eq!(report.critical, 1);
        assert_eq!(report.summary, "Reentrancy in withdraw");

        let body = transport.last_body();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("contract Vault {}"));
    }

    #[tokio::test]
    async fn test_submit_audit_failure_has_no_report() {
        let transport = MockTransport::failing("timeout");
        let (text, report) = relay_with(transport).submit_audit("contract A {}").await;
        assert_eq!(text, ERROR_TEXT);
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_http_transport_sends_headers_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .match_body(r#"{"model":"gpt-4o","messages":[{"role":"user","content":"reentrancy check"}]}"#)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"cmpl-1"}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let transport = HttpTransport::new(&endpoint, Some("test-key".to_string()));
        let relay = Relay::new(Arc::new(transport), "gpt-4o");
        let result = relay.submit("reentrancy check").await;

        mock.assert_async().await;
        assert_eq!(result, "{\n  \"id\": \"cmpl-1\"\n}");
    }

    #[tokio::test]
    async fn test_http_status_is_not_inspected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .match_header("content-type", "application/json")
            .with_status(401)
            .with_body(r#"{"error":{"message":"bad key"}}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let relay = Relay::new(Arc::new(HttpTransport::new(&endpoint, None)), "gpt-4o");
        let result = relay.submit("hi").await;

        mock.assert_async().await;
        assert_eq!(
            result,
            "{\n  \"error\": {\n    \"message\": \"bad key\"\n  }\n}"
        );
    }

    #[tokio::test]
    async fn test_http_connection_refused_shows_error_text() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        drop(listener);

        let relay = Relay::new(Arc::new(HttpTransport::new(&endpoint, None)), "gpt-4o");
        let err = relay.run("").await.unwrap_err();

        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(render(Err(err)), ERROR_TEXT);
    }
}
