//! OpenAI adapter: streamed completions over the Responses API.
//!
//! A response's `id` doubles as the conversation continuation token; passing
//! it back as `previous_response_id` resumes the server-side thread.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use saybot_core::{
    completion::{CompletionClient, CompletionOutcome, CompletionRequest},
    domain::ConversationToken,
    errors::Error,
    Result,
};

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        // Connect timeout only; the overall turn budget is the caller's.
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http,
        }
    }

    fn build_body(&self, req: &CompletionRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "input": req.prompt,
            "stream": true,
        });
        if let Some(prev) = &req.previous {
            body["previous_response_id"] = json!(prev.0);
        }
        body
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        req: CompletionRequest,
        on_progress: &mut (dyn FnMut(String) -> Result<()> + Send),
    ) -> Result<CompletionOutcome> {
        debug!(
            "openai: starting streamed response (model: {}, resumed: {})",
            self.model,
            req.previous.is_some()
        );

        let resp = self
            .http
            .post(RESPONSES_URL)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(&req))
            .send()
            .await
            .map_err(|e| Error::External(format!("openai request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "openai responses failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let mut stream = resp.bytes_stream().eventsource();
        let mut state = StreamState::default();

        while let Some(item) = stream.next().await {
            let event =
                item.map_err(|e| Error::External(format!("openai stream error: {e}")))?;
            if event.data.trim() == "[DONE]" {
                break;
            }
            if let Some(snapshot) = state.apply(&event.event, &event.data)? {
                on_progress(snapshot)?;
            }
        }

        state.into_outcome()
    }
}

/// Accumulates Responses API stream events into cumulative text snapshots.
#[derive(Default)]
struct StreamState {
    text: String,
    response_id: Option<String>,
}

impl StreamState {
    /// Feed one SSE event. Returns the new cumulative snapshot when the event
    /// carried an output-text delta.
    fn apply(&mut self, event: &str, data: &str) -> Result<Option<String>> {
        match event {
            "response.output_text.delta" => {
                let ev: DeltaEvent = serde_json::from_str(data)?;
                self.text.push_str(&ev.delta);
                Ok(Some(self.text.clone()))
            }
            // `incomplete` still names a resumable response, keep its id.
            "response.created" | "response.completed" | "response.incomplete" => {
                let env: ResponseEnvelope = serde_json::from_str(data)?;
                self.response_id = Some(env.response.id);
                Ok(None)
            }
            "response.failed" => {
                let env: FailedEnvelope = serde_json::from_str(data)?;
                let msg = env
                    .response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "unknown error".to_string());
                Err(Error::External(format!("openai response failed: {msg}")))
            }
            "error" => Err(Error::External(format!("openai stream reported: {data}"))),
            _ => Ok(None),
        }
    }

    fn into_outcome(self) -> Result<CompletionOutcome> {
        let id = self.response_id.ok_or_else(|| {
            Error::External("openai stream ended without a response id".to_string())
        })?;
        Ok(CompletionOutcome {
            text: self.text,
            token: ConversationToken(id),
        })
    }
}

#[derive(Deserialize)]
struct DeltaEvent {
    delta: String,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    response: ResponseHead,
}

#[derive(Deserialize)]
struct ResponseHead {
    id: String,
}

#[derive(Deserialize)]
struct FailedEnvelope {
    response: FailedResponse,
}

#[derive(Deserialize)]
struct FailedResponse {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_accumulate_into_cumulative_snapshots() {
        let mut state = StreamState::default();
        let first = state
            .apply(
                "response.output_text.delta",
                r#"{"type":"response.output_text.delta","delta":"Hel"}"#,
            )
            .unwrap();
        assert_eq!(first, Some("Hel".to_string()));

        let second = state
            .apply(
                "response.output_text.delta",
                r#"{"type":"response.output_text.delta","delta":"lo"}"#,
            )
            .unwrap();
        assert_eq!(second, Some("Hello".to_string()));
    }

    #[test]
    fn completed_event_supplies_the_token() {
        let mut state = StreamState::default();
        state
            .apply(
                "response.created",
                r#"{"type":"response.created","response":{"id":"resp_a","status":"in_progress"}}"#,
            )
            .unwrap();
        state
            .apply(
                "response.output_text.delta",
                r#"{"delta":"Hi"}"#,
            )
            .unwrap();
        state
            .apply(
                "response.completed",
                r#"{"type":"response.completed","response":{"id":"resp_a","status":"completed"}}"#,
            )
            .unwrap();

        let outcome = state.into_outcome().unwrap();
        assert_eq!(outcome.text, "Hi");
        assert_eq!(outcome.token, ConversationToken("resp_a".to_string()));
    }

    #[test]
    fn unrelated_events_produce_no_snapshot() {
        let mut state = StreamState::default();
        let out = state
            .apply(
                "response.output_item.added",
                r#"{"type":"response.output_item.added","output_index":0}"#,
            )
            .unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn failed_event_surfaces_the_api_message() {
        let mut state = StreamState::default();
        let err = state
            .apply(
                "response.failed",
                r#"{"response":{"id":"resp_b","status":"failed","error":{"code":"server_error","message":"boom"}}}"#,
            )
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn stream_without_response_id_is_an_error() {
        let mut state = StreamState::default();
        state
            .apply("response.output_text.delta", r#"{"delta":"Hi"}"#)
            .unwrap();
        assert!(state.into_outcome().is_err());
    }

    #[test]
    fn resumed_requests_carry_previous_response_id() {
        let client = OpenAiClient::new("key", "gpt-test");

        let fresh = client.build_body(&CompletionRequest {
            prompt: "hi".to_string(),
            previous: None,
        });
        assert!(fresh.get("previous_response_id").is_none());
        assert_eq!(fresh["stream"], json!(true));

        let resumed = client.build_body(&CompletionRequest {
            prompt: "hi again".to_string(),
            previous: Some(ConversationToken("resp_a".to_string())),
        });
        assert_eq!(resumed["previous_response_id"], json!("resp_a"));
    }
}
