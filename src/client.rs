use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::error::AskResult;
use crate::model::{Message, question_messages};
use crate::providers::completion::{self, CompletionEndpoint};

pub type AskFuture<'a> = Pin<Box<dyn Future<Output = AskResult> + Send + 'a>>;

/// Turns one question into one answer.
///
/// Implementations must be safe to share between concurrent HTTP requests.
/// Dropping the returned future abandons the in-flight call.
pub trait Answerer: Send + Sync {
    fn ask<'a>(&'a self, question: &'a str) -> AskFuture<'a>;
}

/// Collapses a result into the text shown to interactive users and written to
/// the interaction log. Failures become their `[ERROR] ...` sentinel.
pub fn answer_text(result: AskResult) -> String {
    result.unwrap_or_else(|err| err.to_string())
}

pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(
        &'a self,
        client: &'a Client,
        endpoint: &'a CompletionEndpoint,
        messages: &'a [Message],
    ) -> AskFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpBackend;

impl CompletionBackend for HttpBackend {
    fn complete<'a>(
        &'a self,
        client: &'a Client,
        endpoint: &'a CompletionEndpoint,
        messages: &'a [Message],
    ) -> AskFuture<'a> {
        Box::pin(completion::complete(client, endpoint, messages))
    }
}

pub struct CompletionClient<B = HttpBackend> {
    client: Client,
    endpoint: CompletionEndpoint,
    system_prompt: String,
    backend: B,
}

impl CompletionClient<HttpBackend> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to initialize HTTP client")?;
        Ok(Self::with_backend(client, cfg, HttpBackend))
    }
}

impl<B> CompletionClient<B> {
    pub fn with_backend(client: Client, cfg: &Config, backend: B) -> Self {
        Self {
            client,
            endpoint: CompletionEndpoint {
                api_url: cfg.api_url.clone(),
                api_key: cfg.api_key.clone(),
                model: cfg.model.clone(),
                timeout: cfg.request_timeout(),
            },
            system_prompt: cfg.system_prompt.clone(),
            backend,
        }
    }
}

impl<B> Answerer for CompletionClient<B>
where
    B: CompletionBackend,
{
    fn ask<'a>(&'a self, question: &'a str) -> AskFuture<'a> {
        Box::pin(async move {
            let messages = question_messages(&self.system_prompt, question);
            self.backend
                .complete(&self.client, &self.endpoint, &messages)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{AskFuture, Answerer, CompletionBackend, CompletionClient, answer_text};
    use crate::config::Config;
    use crate::error::{AskError, TransportKind};
    use crate::model::{Message, MessageRole};
    use crate::providers::completion::CompletionEndpoint;

    #[derive(Debug)]
    struct StubBackend {
        calls: Mutex<Vec<(String, Vec<Message>)>>,
        outcome: Result<String, AskError>,
    }

    impl StubBackend {
        fn new(outcome: Result<String, AskError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            }
        }
    }

    impl CompletionBackend for StubBackend {
        fn complete<'a>(
            &'a self,
            _client: &'a reqwest::Client,
            endpoint: &'a CompletionEndpoint,
            messages: &'a [Message],
        ) -> AskFuture<'a> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((endpoint.model.clone(), messages.to_vec()));
            let result = self.outcome.clone();
            Box::pin(async move { result })
        }
    }

    fn test_config() -> Config {
        Config::from_vars(|key| match key {
            "EURI_API_URL" => Some("http://localhost:9/v1/chat/completions".to_string()),
            "EURI_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
        .expect("test config should load")
    }

    #[tokio::test]
    async fn ask_sends_system_prompt_and_question() {
        let cfg = test_config();
        let client = CompletionClient::with_backend(
            reqwest::Client::new(),
            &cfg,
            StubBackend::new(Ok("4".to_string())),
        );

        let answer = client.ask("2+2?").await;

        assert_eq!(answer, Ok("4".to_string()));
        let calls = client.backend.calls.lock().expect("calls lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "gpt-4.1-mini");
        assert_eq!(calls[0].1[0].role, MessageRole::System);
        assert_eq!(calls[0].1[0].content, "You are a helpful assistant.");
        assert_eq!(calls[0].1[1].role, MessageRole::User);
        assert_eq!(calls[0].1[1].content, "2+2?");
    }

    #[tokio::test]
    async fn ask_passes_empty_questions_through() {
        let cfg = test_config();
        let client = CompletionClient::with_backend(
            reqwest::Client::new(),
            &cfg,
            StubBackend::new(Ok("".to_string())),
        );

        assert_eq!(client.ask("").await, Ok(String::new()));
        assert_eq!(client.backend.calls.lock().expect("calls lock")[0].1[1].content, "");
    }

    #[tokio::test]
    async fn ask_preserves_backend_errors() {
        let cfg = test_config();
        let failure = AskError::transport(TransportKind::Connect, "unreachable");
        let client = CompletionClient::with_backend(
            reqwest::Client::new(),
            &cfg,
            StubBackend::new(Err(failure.clone())),
        );

        assert_eq!(client.ask("ping").await, Err(failure));
    }

    #[test]
    fn answer_text_renders_sentinel_for_failures() {
        assert_eq!(answer_text(Ok("Paris".to_string())), "Paris");
        assert_eq!(
            answer_text(Err(AskError::unexpected_format("no choices"))),
            "[ERROR] Unexpected response format from API"
        );
        assert!(
            answer_text(Err(AskError::transport(TransportKind::Timeout, "slow")))
                .starts_with("[ERROR] Failed to contact API:")
        );
    }
}
