use crate::domain::entities::turn::Turn;
use crate::domain::error::DomainError;
use crate::domain::ports::completion::{CompletionError, CompletionProvider, CompletionRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stand-in credential used when `OPENAI_API_KEY` is unset. A provider built
/// with it reports itself as unconfigured.
pub const PLACEHOLDER_API_KEY: &str = "sk-dummy-key-please-add-real-key";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client for OpenAI: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        if !self.is_configured() {
            return Err(CompletionError::NotConfigured);
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: &request.messages,
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            })
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let result: ChatResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn provider(server: &Server, key: &str) -> OpenAiProvider {
        OpenAiProvider::new(key.into(), None, Some(server.url()), Duration::from_secs(5)).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![Turn::system("You are helpful."), Turn::user("Hi")],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    #[test]
    fn test_placeholder_key_is_unconfigured() {
        let p = OpenAiProvider::new(PLACEHOLDER_API_KEY.into(), None, None, Duration::from_secs(1)).unwrap();
        assert!(!p.is_configured());
        let p = OpenAiProvider::new("  ".into(), None, None, Duration::from_secs(1)).unwrap();
        assert!(!p.is_configured());
        let p = OpenAiProvider::new("sk-live".into(), None, None, Duration::from_secs(1)).unwrap();
        assert!(p.is_configured());
        assert_eq!(p.model(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_complete_sends_messages_and_params() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4",
                "temperature": 0.7,
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "You are helpful."},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Hello!"}}]}"#)
            .create_async()
            .await;

        let reply = provider(&server, "sk-test").complete(&request()).await.unwrap();

        assert_eq!(reply, "Hello!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "Rate limit reached"}}"#)
            .create_async()
            .await;

        let err = provider(&server, "sk-test").complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let err = provider(&server, "sk-test").complete(&request()).await.unwrap_err();
        assert_eq!(err, CompletionError::Empty);
    }

    #[tokio::test]
    async fn test_unconfigured_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let err = provider(&server, PLACEHOLDER_API_KEY).complete(&request()).await.unwrap_err();
        assert_eq!(err, CompletionError::NotConfigured);
        mock.assert_async().await;
    }
}
