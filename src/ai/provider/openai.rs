//! OpenAI API Provider
//!
//! Uses the Responses API (`POST {api_base}/responses`). Structured output is
//! requested through `text.format` with a strict `json_schema`, and the answer
//! is read from the first `message` output item whose first content part is
//! `output_text`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::{
    CredentialResolver, LlmProvider, extract_output_schema, normalize_base,
    parse_structured_output, resolve_api_key,
};
use crate::constants::provider::{OPENAI, OPENAI_API_BASE, STRUCTURED_OUTPUT_NAME};
use crate::types::{AgentRunRequest, ChatMessage, ClarionError, Result, StructuredOutput};

pub struct OpenAiProvider {
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), OPENAI_API_BASE)
    }
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_base: &str) -> Self {
        Self {
            api_base: normalize_base(api_base),
            client,
        }
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        request: &AgentRunRequest,
    ) -> Result<ResponsesRequest> {
        let text = extract_output_schema(&request.output_schema)?.map(|schema| TextConfig {
            format: TextFormat {
                format_type: "json_schema".to_string(),
                name: STRUCTURED_OUTPUT_NAME.to_string(),
                schema,
                strict: true,
            },
        });

        let config = &request.llm_config;
        Ok(ResponsesRequest {
            model: config.model.clone(),
            reasoning: config.param_str("reasoning_effort").map(|effort| Reasoning {
                effort: effort.to_string(),
            }),
            input: messages
                .iter()
                .map(|m| InputMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            text,
            temperature: config.param_f64("temperature"),
            top_p: config.param_f64("top_p"),
            max_output_tokens: config.param_u64("max_output_tokens"),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        OPENAI
    }

    fn build_payload(&self, messages: &[ChatMessage], request: &AgentRunRequest) -> Result<Value> {
        Ok(serde_json::to_value(self.build_request(messages, request)?)?)
    }

    #[instrument(skip_all, fields(model = %request.llm_config.model))]
    async fn generate(
        &self,
        messages: &[ChatMessage],
        request: &AgentRunRequest,
        credentials: &dyn CredentialResolver,
    ) -> Result<StructuredOutput> {
        let api_key = resolve_api_key(credentials, &request.llm_config).await?;
        let body = self.build_request(messages, request)?;
        let url = format!("{}/responses", self.api_base);

        info!("Generating with OpenAI");
        let start_time = Instant::now();

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ClarionError::http(OPENAI, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClarionError::ProviderApi {
                provider: OPENAI.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| ClarionError::http(OPENAI, e))?;
        debug!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Received OpenAI response"
        );

        let parsed: ResponsesResponse = serde_json::from_str(&raw).map_err(|e| {
            ClarionError::response_shape(OPENAI, format!("failed to decode response: {}", e))
        })?;

        if let Some(error) = parsed.error.filter(|e| !e.is_null()) {
            return Err(ClarionError::response_shape(
                OPENAI,
                format!("API returned an error in the response body: {}", error),
            ));
        }

        let text = parsed
            .output
            .iter()
            .filter(|item| item.item_type == "message")
            .find_map(|item| {
                item.content
                    .first()
                    .filter(|c| c.content_type == "output_text")
                    .map(|c| c.text.as_str())
            })
            .ok_or_else(|| {
                ClarionError::response_shape(
                    OPENAI,
                    "could not find a 'message' with 'output_text' in the API response",
                )
            })?;

        parse_structured_output(text)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning>,
    input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u64>,
}

#[derive(Debug, Serialize)]
struct Reasoning {
    effort: String,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct TextConfig {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    format_type: String,
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
