//! OpenAI Chat Completions backend.
//!
//! See: <https://platform.openai.com/docs/api-reference/chat>

use super::status_error;
use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolSpec,
    Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
enum ApiMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ApiToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    base_url: String,
}

impl OpenAiBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: None,
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Override the endpoint, e.g. for an OpenAI-compatible server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            base_url: self.base_url,
        }
    }
}

/// OpenAI Chat Completions backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    base_url: String,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key, model)
    }

    fn encode_arguments(input: &Value) -> String {
        match input {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }

    /// Encode one history message. Tool-result messages expand to one `tool`
    /// message per result, each carrying its `tool_call_id`.
    fn message_to_api(msg: &Message, out: &mut Vec<ApiMessage>) {
        match msg.role {
            Role::System => out.push(ApiMessage::System {
                content: msg.text(),
            }),
            Role::User => out.push(ApiMessage::User {
                content: msg.text(),
            }),
            Role::Assistant => {
                let text = msg.text();
                let tool_calls = msg
                    .tool_calls()
                    .into_iter()
                    .map(|call| ApiToolCall {
                        function: ApiFunctionCall {
                            name: call.name,
                            arguments: Self::encode_arguments(&call.input),
                        },
                        id: call.id,
                        call_type: function_type(),
                    })
                    .collect();
                out.push(ApiMessage::Assistant {
                    content: (!text.is_empty()).then_some(text),
                    tool_calls,
                });
            }
            Role::Tool => {
                out.extend(msg.tool_results().into_iter().map(|result| ApiMessage::Tool {
                    tool_call_id: result.tool_call_id.clone(),
                    content: result.output_text(),
                }));
            }
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.schema.clone(),
            },
        }
    }

    /// Arguments stay JSON-encoded; the session decodes them before dispatch.
    fn response_to_message(message: ApiResponseMessage) -> Message {
        let mut parts = Vec::new();
        if let Some(text) = message.content.filter(|t| !t.is_empty()) {
            parts.push(Part::Text(text));
        }
        parts.extend(message.tool_calls.into_iter().map(|call| {
            Part::ToolCall(ToolCall {
                id: call.id,
                name: call.function.name,
                input: Value::String(call.function.arguments),
            })
        }));

        Message {
            role: Role::Assistant,
            parts,
        }
    }

    fn build_request(&self, request: &ModelRequest<'_>) -> ApiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            messages.push(ApiMessage::System {
                content: system.to_string(),
            });
        }
        for msg in request.messages {
            Self::message_to_api(msg, &mut messages);
        }

        let tools: Vec<ApiTool> = request.tools.iter().map(Self::tool_to_api).collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");

        ApiRequest {
            model: self.model.clone(),
            messages,
            tools,
            tool_choice,
            max_completion_tokens: self.max_tokens,
        }
    }

    fn error_body(body: String) -> String {
        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(parsed) => match parsed.error.error_type {
                Some(kind) => format!("{kind}: {}", parsed.error.message),
                None => parsed.error.message,
            },
            Err(_) => body,
        }
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({})", self.model)
    }
}

impl Backend for OpenAiBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = self.build_request(&request);
        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "openai request"
        );

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, Self::error_body(body)));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".into()))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            message: Self::response_to_message(choice.message),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use serde_json::json;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::builder("test", "o3-mini").build()
    }

    #[test]
    fn tools_use_function_shape() {
        let spec = ToolSpec {
            name: "search_posts".into(),
            description: "Search posts".into(),
            schema: json!({"type": "object"}),
        };
        let tool = serde_json::to_value(OpenAiBackend::tool_to_api(&spec)).unwrap();
        assert_eq!(
            tool,
            json!({
                "type": "function",
                "function": {
                    "name": "search_posts",
                    "description": "Search posts",
                    "parameters": {"type": "object"}
                }
            })
        );
    }

    #[test]
    fn system_prompt_leads_history() {
        let messages = vec![Message::user("hi")];
        let specs = vec![ToolSpec {
            name: "t".into(),
            description: String::new(),
            schema: json!({"type": "object"}),
        }];
        let request = ModelRequest {
            system: Some("be brief"),
            messages: &messages,
            tools: &specs,
        };
        let body = serde_json::to_value(backend().build_request(&request)).unwrap();
        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ])
        );
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn tool_round_trip_encoding() {
        let messages = vec![
            Message {
                role: Role::Assistant,
                parts: vec![Part::ToolCall(ToolCall {
                    id: "call_1".into(),
                    name: "T".into(),
                    input: json!({"a": 1}),
                })],
            },
            Message::tool_result(ToolResult::new("call_1", json!("ok"))),
        ];
        let mut out = Vec::new();
        for msg in &messages {
            OpenAiBackend::message_to_api(msg, &mut out);
        }
        let encoded = serde_json::to_value(out).unwrap();
        assert_eq!(
            encoded,
            json!([
                {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "T", "arguments": "{\"a\":1}"}
                    }]
                },
                {"role": "tool", "tool_call_id": "call_1", "content": "ok"}
            ])
        );
    }

    #[test]
    fn response_keeps_encoded_arguments() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "search_posts", "arguments": "{\"query\":\"rust\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        });
        let parsed: ApiResponse = serde_json::from_value(raw).unwrap();
        let choice = parsed.choices.into_iter().next().unwrap();
        let message = OpenAiBackend::response_to_message(choice.message);

        assert!(message.text().is_empty());
        let calls = message.tool_calls();
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].input, Value::String(r#"{"query":"rust"}"#.into()));
    }

    #[test]
    fn error_body_prefers_provider_message() {
        let body = r#"{"error":{"message":"bad key","type":"invalid_request_error"}}"#;
        assert_eq!(
            OpenAiBackend::error_body(body.to_string()),
            "invalid_request_error: bad key"
        );
        assert_eq!(OpenAiBackend::error_body("oops".into()), "oops");
    }
}
