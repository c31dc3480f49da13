use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AskError, AskResult};
use crate::model::Message;
use crate::providers::http_errors::{completion_request_error, completion_status_error};

/// Where and how to reach the chat completion endpoint.
#[derive(Clone)]
pub struct CompletionEndpoint {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pulls `choices[0].message.content` out of a success body.
pub(crate) fn extract_answer(body: &[u8]) -> AskResult {
    let parsed: CompletionResponse = serde_json::from_slice(body)
        .map_err(|err| AskError::unexpected_format(err.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AskError::unexpected_format("`choices` is empty"))?
        .message
        .content
        .ok_or_else(|| AskError::unexpected_format("`choices[0].message.content` is null"))?;

    Ok(content.trim().to_string())
}

pub async fn complete(
    client: &Client,
    endpoint: &CompletionEndpoint,
    messages: &[Message],
) -> AskResult {
    let api_url = endpoint.api_url.as_str();
    let timeout_secs = endpoint.timeout.as_secs();
    let body = CompletionRequest {
        model: &endpoint.model,
        messages,
    };
    debug!(
        api_url = %api_url,
        model = %endpoint.model,
        message_count = messages.len(),
        "sending chat completion request"
    );

    let response = client
        .post(api_url)
        .bearer_auth(&endpoint.api_key)
        .timeout(endpoint.timeout)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %endpoint.model,
                error = %err,
                "chat completion request failed"
            );
            completion_request_error(err, api_url, timeout_secs)
        })?;

    let status = response.status();
    if !status.is_success() {
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %endpoint.model,
            status = %status,
            response_body_len = response_body.len(),
            "completion endpoint returned non-success status"
        );
        return Err(completion_status_error(status, api_url, &response_body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| completion_request_error(err, api_url, timeout_secs))?;

    let answer = extract_answer(&bytes).inspect_err(|err| {
        if let AskError::UnexpectedFormat { detail } = err {
            warn!(
                api_url = %api_url,
                detail = %detail,
                response_body_len = bytes.len(),
                "completion response did not match the expected shape"
            );
        }
    })?;
    debug!(
        model = %endpoint.model,
        response_len = answer.len(),
        "received chat completion response"
    );
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CompletionRequest, extract_answer};
    use crate::error::AskError;
    use crate::model::question_messages;

    #[test]
    fn request_body_matches_wire_format() {
        let messages = question_messages("You are a helpful assistant.", "What is the capital of France?");
        let body = serde_json::to_value(CompletionRequest {
            model: "gpt-4.1-mini",
            messages: &messages,
        })
        .expect("serialize");

        assert_eq!(
            body,
            json!({
                "model": "gpt-4.1-mini",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "What is the capital of France?"}
                ]
            })
        );
    }

    #[test]
    fn extract_answer_trims_content() {
        let body = br#"{"choices":[{"message":{"content":" Paris "}}]}"#;
        assert_eq!(extract_answer(body), Ok("Paris".to_string()));
    }

    #[test]
    fn extract_answer_ignores_extra_fields() {
        let body = br#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"4"},"finish_reason":"stop"}],"usage":{}}"#;
        assert_eq!(extract_answer(body), Ok("4".to_string()));
    }

    #[test]
    fn extract_answer_rejects_unexpected_shapes() {
        let cases: [&[u8]; 6] = [
            br#"{}"#,
            br#"{"choices":[]}"#,
            br#"{"choices":[{}]}"#,
            br#"{"choices":[{"message":{"content":null}}]}"#,
            br#"{"choices":{"message":{"content":"x"}}}"#,
            b"<html>gateway</html>",
        ];

        for body in cases {
            let err = extract_answer(body).expect_err("shape should be rejected");
            assert!(
                matches!(err, AskError::UnexpectedFormat { .. }),
                "unexpected error for {}: {err:?}",
                String::from_utf8_lossy(body)
            );
            assert_eq!(err.to_string(), "[ERROR] Unexpected response format from API");
        }
    }
}
