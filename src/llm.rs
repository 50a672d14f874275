//! Language model clients and the response contract they share.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ModelConfig;
use crate::error::{BriefError, Result};
use crate::tool::ToolSpec;

/// What the model wants next: a terminal answer for this call, or a tool
/// invocation whose result is fed back into the transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    FinalAnswer { text: String },
    ToolCall { name: String, query: String },
}

/// Minimal abstraction around a remote text-generation service.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    async fn generate(&self, prompt: &str, tools: &[ToolSpec]) -> Result<ModelResponse>;
}

enum RequestFailure {
    /// Network-level trouble worth another attempt.
    Transient(String),
    Fatal(BriefError),
}

/// Chat-completions client for OpenRouter's OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    max_retries: u32,
    backoff: Duration,
}

impl OpenRouterClient {
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            BriefError::Model("missing OpenRouter API key (set OPENROUTER_API_KEY)".into())
        })?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_secs))
                .build()
                .map_err(|err| BriefError::Model(format!("http client error: {err}")))?,
            model: cfg.model.clone(),
            api_key,
            base_url: cfg.base_url.clone(),
            temperature: cfg.temperature,
            max_retries: 2,
            backoff: Duration::from_millis(500),
        })
    }

    fn to_tools(tools: &[ToolSpec]) -> Option<Vec<Value>> {
        if tools.is_empty() {
            return None;
        }
        // Every tool takes a single free-text `query` argument.
        Some(
            tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": {
                                "type": "object",
                                "properties": { "query": { "type": "string" } },
                                "required": ["query"]
                            }
                        }
                    })
                })
                .collect(),
        )
    }

    async fn send(&self, payload: &Value) -> std::result::Result<ChatResponse, RequestFailure> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .json(payload)
            .send()
            .await
            .map_err(|err| RequestFailure::Transient(format!("request error: {err}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RequestFailure::Transient(format!(
                "request failed with {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RequestFailure::Fatal(BriefError::Model(format!(
                "request failed with {status}: {body}"
            ))));
        }

        resp.json().await.map_err(|err| {
            RequestFailure::Fatal(BriefError::Model(format!("response parse error: {err}")))
        })
    }
}

#[async_trait]
impl LanguageModelClient for OpenRouterClient {
    async fn generate(&self, prompt: &str, tools: &[ToolSpec]) -> Result<ModelResponse> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "tools": Self::to_tools(tools),
            "tool_choice": if tools.is_empty() { Value::Null } else { Value::String("auto".into()) },
            "temperature": self.temperature,
        });

        let mut attempt = 0;
        let body = loop {
            match self.send(&payload).await {
                Ok(body) => break body,
                Err(RequestFailure::Transient(reason)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, %reason, "retrying model call");
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(RequestFailure::Transient(reason)) => return Err(BriefError::Model(reason)),
                Err(RequestFailure::Fatal(err)) => return Err(err),
            }
        };

        completion_to_response(body)
    }
}

/// Map a raw chat completion to the tagged response. A silently-empty answer
/// is a protocol violation, not a degenerate report.
fn completion_to_response(body: ChatResponse) -> Result<ModelResponse> {
    let first = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BriefError::Model("model returned no choices".into()))?;

    if let Some(call) = first.message.tool_calls.unwrap_or_default().into_iter().next() {
        let args: Value = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .or_else(|| args.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                BriefError::Model(format!(
                    "tool call `{}` carried no query argument",
                    call.function.name
                ))
            })?;
        return Ok(ModelResponse::ToolCall {
            name: call.function.name,
            query,
        });
    }

    match first.message.content {
        Some(text) if !text.trim().is_empty() => Ok(ModelResponse::FinalAnswer { text }),
        _ => Err(BriefError::Model("model returned an empty answer".into())),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    function: FunctionPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionPayload {
    name: String,
    arguments: String,
}

/// A deterministic client used for tests and demos.
pub struct StubClient {
    responses: Mutex<VecDeque<ModelResponse>>,
}

impl StubClient {
    pub fn new(responses: Vec<ModelResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl LanguageModelClient for StubClient {
    async fn generate(&self, _prompt: &str, _tools: &[ToolSpec]) -> Result<ModelResponse> {
        self.responses
            .lock()
            .expect("stub client poisoned")
            .pop_front()
            .ok_or_else(|| BriefError::Model("StubClient ran out of scripted responses".into()))
    }
}
